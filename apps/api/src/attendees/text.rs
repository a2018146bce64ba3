use serde_json::{Map, Value};

use super::models::Attendee;

/// Scalar columns always sent to the model, `null` when missing.
const SCALAR_FIELDS: &[&str] = &[
    "id", "name", "headline", "location", "school", "url", "image", "about",
];

/// Columns stored as JSON-encoded text.
const JSON_TEXT_FIELDS: &[&str] = &[
    "experience",
    "education",
    "organizations",
    "volunteering",
    "projects",
    "awards",
];

/// Columns stored as arrays.
const ARRAY_FIELDS: &[&str] = &["skills", "languages", "interests"];

/// Builds the text that gets embedded for an attendee. One labelled line per
/// non-empty section.
pub fn embedding_text(attendee: &Attendee) -> String {
    let mut lines: Vec<String> = Vec::new();

    let scalars = [
        ("Name", &attendee.name),
        ("Headline", &attendee.headline),
        ("Location", &attendee.location),
        ("School", &attendee.school),
    ];
    for (label, value) in scalars {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {value}"));
        }
    }

    if let Some(about) = attendee.about.as_ref().map(|a| a.as_text()) {
        if !about.is_empty() {
            lines.push(format!("About: {about}"));
        }
    }

    if !attendee.experience.is_empty() {
        let entries: Vec<String> = attendee
            .experience
            .iter()
            .map(|exp| {
                let mut entry = format!(
                    "{} at {}",
                    exp.title.as_deref().unwrap_or(""),
                    exp.company.as_deref().unwrap_or("")
                );
                if let Some(desc) = exp.description.as_deref().filter(|d| !d.is_empty()) {
                    entry.push_str(" - ");
                    entry.push_str(desc);
                }
                entry
            })
            .collect();
        lines.push(format!("Experience: {}", entries.join("; ")));
    }

    if !attendee.education.is_empty() {
        let entries: Vec<String> = attendee
            .education
            .iter()
            .map(|edu| {
                format!(
                    "{} from {}",
                    edu.degree.as_deref().unwrap_or(""),
                    edu.school.as_deref().unwrap_or("")
                )
            })
            .collect();
        lines.push(format!("Education: {}", entries.join("; ")));
    }

    if !attendee.skills.is_empty() {
        lines.push(format!("Skills: {}", attendee.skills.join(", ")));
    }

    if !attendee.interests.is_empty() {
        lines.push(format!("Interests: {}", attendee.interests.join(", ")));
    }

    if !attendee.projects.is_empty() {
        let entries: Vec<String> = attendee
            .projects
            .iter()
            .map(|proj| {
                let mut entry = proj.name.clone().unwrap_or_default();
                if let Some(desc) = proj.description.as_deref().filter(|d| !d.is_empty()) {
                    entry.push_str(" - ");
                    entry.push_str(desc);
                }
                entry
            })
            .collect();
        lines.push(format!("Projects: {}", entries.join("; ")));
    }

    if !attendee.organizations.is_empty() {
        let entries: Vec<String> = attendee
            .organizations
            .iter()
            .map(|org| {
                let mut entry = org.name.clone().unwrap_or_default();
                if let Some(role) = org.role.as_deref().filter(|r| !r.is_empty()) {
                    entry.push_str(&format!(" ({role})"));
                }
                entry
            })
            .collect();
        lines.push(format!("Organizations: {}", entries.join("; ")));
    }

    lines.join("\n")
}

/// Reshapes rows returned by the store into the profile shape the search
/// prompt describes: JSON-text columns decoded back into structures, empty
/// sections dropped.
pub fn format_for_ai(rows: &[Value]) -> Vec<Value> {
    rows.iter().map(format_row).collect()
}

fn format_row(row: &Value) -> Value {
    let mut profile = Map::new();

    for field in SCALAR_FIELDS {
        profile.insert(
            field.to_string(),
            row.get(field).cloned().unwrap_or(Value::Null),
        );
    }

    for field in JSON_TEXT_FIELDS {
        let Some(value) = row.get(field).filter(|v| is_truthy(v)) else {
            continue;
        };
        let decoded = match value {
            Value::String(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| value.clone())
            }
            other => other.clone(),
        };
        profile.insert(field.to_string(), decoded);
    }

    for field in ARRAY_FIELDS {
        if let Some(value) = row.get(field).filter(|v| is_truthy(v)) {
            profile.insert(field.to_string(), value.clone());
        }
    }

    Value::Object(profile)
}

/// JSON truthiness: null, false, 0, "" and empty containers are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
