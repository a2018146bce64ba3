// Prompt for turning a resume PDF into an attendee profile. The field names
// match `attendees::models::Attendee` so the result can be synced as-is.

use crate::llm_client::prompts::JSON_ONLY_SUFFIX;

const EXTRACTION_SCHEMA: &str = r#"Extract structured profile data from this resume. Return a JSON object with the following structure:

{
  "name": "Full name",
  "headline": "Current role or professional summary (synthesize from most recent position)",
  "location": "Location if mentioned",
  "about": "Personal statement, mission statement, or summary section if present",
  "experience": [
    {
      "title": "Job title",
      "company": "Company name",
      "duration": "Date range (e.g., 'June 2021 - Present')",
      "description": "Job description/bullet points combined"
    }
  ],
  "education": [
    {
      "school": "School name",
      "degree": "Degree type and field (e.g., 'BA in Philosophy')",
      "duration": "Date range"
    }
  ],
  "projects": [
    {
      "name": "Project name",
      "role": "Role on project",
      "duration": "Date range",
      "description": "Project description"
    }
  ],
  "awards": [
    {
      "name": "Award name",
      "date": "Date or year",
      "description": "Award description"
    }
  ],
  "skills": ["skill1", "skill2", ...],
  "interests": ["interest1", "interest2", ...],
  "organizations": [
    {
      "name": "Organization name",
      "role": "Role",
      "duration": "Date range"
    }
  ],
  "volunteering": [
    {
      "role": "Volunteer role",
      "organization": "Organization name",
      "duration": "Date range"
    }
  ]
}

IMPORTANT GUIDELINES:
1. Only include sections that are present in the resume. Omit empty arrays.
2. For "experience", only include actual jobs/employment. Put side projects, personal projects in "projects".
3. For "skills", extract technical skills, tools, programming languages. Keep as simple strings.
4. For "interests", extract hobbies, extracurriculars, personal interests if mentioned.
5. For "about", look for personal statements, mission statements, objective sections, or any narrative text about the person.
6. Synthesize a "headline" from the most recent/prominent role if not explicitly stated.
7. Preserve the original text as much as possible - don't paraphrase excessively.
8. If a section header doesn't match exactly (e.g., "Work History" instead of "Experience"), map it to the appropriate field."#;

pub fn extraction_prompt() -> String {
    format!("{EXTRACTION_SCHEMA}\n\n{JSON_ONLY_SUFFIX}")
}
