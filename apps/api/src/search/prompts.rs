// Prompts for attendee search. The base prompt is shared by every provider
// and by both the full-list and the vector-prefiltered endpoints, so a score
// means the same thing whichever path produced it.

use serde_json::Value;

pub const SEARCH_SYSTEM: &str = "You are a precise JSON generator. You MUST include a \"score\" field (integer 0-100) for every match object. This field is absolutely mandatory and cannot be omitted under any circumstances.";

pub const SCORE_REMINDER: &str = "*** CRITICAL: Every match object MUST include a \"score\" field (integer 0-100). DO NOT OMIT THIS FIELD. ***";

pub const PREFILTER_NOTE: &str = "These attendees were pre-filtered by vector similarity search. Analyze them carefully for the search query.";

pub const BASE_PROMPT: &str = r#"SCORING RULES (score field is REQUIRED):
Assign scores based on how well they satisfy the search criteria:
- 95-100: Perfect match - directly and explicitly meets the search criteria (e.g., currently works at the company being searched for)
- 85-94: Exceptional match - meets all or nearly all criteria with strong, direct evidence
- 75-84: Strong match - meets most criteria with good evidence
- 60-74: Good match - meets several criteria or partially meets many criteria
- 40-59: Moderate match - meets some criteria or weakly meets several criteria
- 20-39: Weak match - barely meets criteria or only tangentially related
- 0-19: Very weak match - minimal relevance

SCORING EXAMPLES:
- Searching for "connection to Company X" + person currently works at Company X = 95-100
- Searching for "connection to Company X" + person previously worked at Company X = 85-94
- Searching for "experience in field Y" + person has 3+ years direct experience = 90-100
- Searching for "experience in field Y" + person has 1 year direct experience = 75-85

MATCHING GUIDELINES:
- Direct matches: The search term appears explicitly in the text (e.g., searching "Boston" and finding "Boston University")
- Inferred matches: Requires factual knowledge (e.g., searching "Maine" and finding "Berwick Academy" which is actually located in Maine)
- For INFERRED matches, you MUST be certain of the connection - do NOT guess or make assumptions
- For INFERRED matches, always provide the factual context in the reason field
- Partial matches: The profile satisfies some but not all of the search parameters

SCORING CRITERIA:
- Weight matches based on relevance and directness
- Consider the strength of evidence for each criterion
- Account for multiple parameters in complex queries
- Penalize profiles that only weakly satisfy criteria
- Reward profiles that exceed expectations

CRITICAL RULES FOR HIGHLIGHTS:
- ONLY highlight experiences/sections that DIRECTLY relate to the search query
- If searching for "investing experience", ONLY highlight roles explicitly involving investing (e.g., "Investor", "Investment Analyst")
- Do NOT highlight "Co-Founder" just because the person is an investor elsewhere
- If searching for a location like "Maine or New Hampshire":
  * ONLY highlight schools/companies actually located in those states
  * Do NOT highlight schools just because they're in the same region (e.g., Boston University is NOT in Maine/New Hampshire)
  * You MUST know the actual location - if uncertain, do NOT highlight it
- If searching for "connection to Company X" or "experience at Company X":
  * ONLY highlight experiences at Company X itself
  * Do NOT highlight other companies, even if they're in the same industry
  * Do NOT highlight unrelated experiences just because the person worked at Company X elsewhere
  * Example: If searching for "Twitch experience", only highlight the Twitch role, NOT MongoDB roles
- If searching for "experience with Technology Y":
  * ONLY highlight experiences explicitly involving Technology Y
  * Do NOT highlight unrelated roles at companies that use Technology Y
- Be PRECISE and CONSERVATIVE with highlights - when in doubt, don't highlight it
- Be rigorous with scoring - don't inflate scores without strong justification

Return a JSON object with this EXACT structure:
{
  "summary": "string",
  "matches": [
    {
      "id": number,
      "score": number (REQUIRED - 0 to 100),
      "relevance": "string",
      "highlights": [
        {
          "section": "string (experience/education/skills/languages/headline/organizations/volunteering/projects/awards/interests)",
          "index": number (the array index of the item to highlight, e.g., 0 for first experience, 2 for third education),
          "field": "string (optional - which specific field: title/company/school/degree/name/role/organization)",
          "reason": "string (why this specific item matches)",
          "weight": "low/medium/high"
        }
      ]
    }
  ]
}

CRITICAL: For highlights with section="experience", "education", "organizations", "volunteering", "projects", or "awards":
- You MUST provide the "index" field specifying which array item (0-indexed)
- You MUST provide the "field" to specify what to highlight (e.g., "title", "company", "school", "role", "name", "description")
- Do NOT use vague text matching - be explicit about the exact array index
- Example: {"section": "experience", "index": 2, "field": "company", "reason": "Worked at Twitch"} means highlight the company field of the 3rd experience entry

Return ONLY the JSON, nothing else. THE "score" FIELD IS MANDATORY FOR EVERY MATCH.

Example format:
{
  "summary": "Found 2 people with connection to Palantir (1 perfect match, 1 good match)",
  "matches": [
    {
      "id": "123",
      "score": 98,
      "relevance": "Perfect match: Currently employed at Palantir Technologies as Tech Lead",
      "highlights": [
        {
          "section": "experience",
          "index": 0,
          "field": "title",
          "reason": "Currently works at Palantir as Tech Lead",
          "weight": "high"
        },
        {
          "section": "headline",
          "reason": "Headline mentions Palantir",
          "weight": "high"
        }
      ]
    },
    {
      "id": "456",
      "score": 88,
      "relevance": "Exceptional match: Previously worked at Palantir as Software Engineer for 2 years",
      "highlights": [
        {
          "section": "experience",
          "index": 1,
          "field": "company",
          "reason": "Past employment at Palantir",
          "weight": "high"
        }
      ]
    }
  ]
}

CRITICAL SCORING REMINDER:
- If someone CURRENTLY works at a company being searched = score 95-100 (PERFECT MATCH)
- If someone PREVIOUSLY worked at a company being searched = score 85-94 (EXCEPTIONAL MATCH)
- DO NOT give scores below 95 for current employees of companies being explicitly searched for"#;

/// Summary returned when the similarity search finds nobody.
pub const NO_VECTOR_MATCHES: &str =
    "No matching attendees found in cloud database. Make sure you have synced your profiles.";

/// Renders the attendee list for the prompt. Clients usually send it
/// pre-serialized; anything else is pretty-printed.
pub fn attendees_text(attendees: &Value) -> String {
    match attendees {
        Value::String(text) => text.clone(),
        Value::Null => "[]".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Stable, cacheable part of a full-list search prompt.
pub fn search_context(attendees: &str) -> String {
    format!("{SCORE_REMINDER}\n\nAttendee database:\n{attendees}\n\n{BASE_PROMPT}")
}

/// Context for the vector endpoint, where the list is already a prefiltered
/// slice and differs per query.
pub fn prefiltered_context(attendees: &str) -> String {
    format!(
        "{SCORE_REMINDER}\n\n{PREFILTER_NOTE}\n\nAttendee database:\n{attendees}\n\n{BASE_PROMPT}"
    )
}

pub fn search_question(query: &str) -> String {
    format!("Search query: \"{query}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attendees_text_passes_strings_through() {
        assert_eq!(attendees_text(&json!("[{\"id\":1}]")), "[{\"id\":1}]");
        assert_eq!(attendees_text(&Value::Null), "[]");
        assert_eq!(
            attendees_text(&json!([{ "id": 1 }])),
            "[\n  {\n    \"id\": 1\n  }\n]"
        );
    }

    #[test]
    fn test_search_context_order() {
        let context = search_context("[]");
        assert!(context.starts_with(SCORE_REMINDER));
        let db = context.find("Attendee database:\n[]").unwrap();
        let rules = context.find("SCORING RULES").unwrap();
        assert!(db < rules);
        assert!(!context.contains(PREFILTER_NOTE));
    }

    #[test]
    fn test_prefiltered_context_mentions_prefilter() {
        assert!(prefiltered_context("[]").contains(PREFILTER_NOTE));
    }

    #[test]
    fn test_question_quotes_query() {
        assert_eq!(search_question("rust devs"), "Search query: \"rust devs\"");
    }
}
