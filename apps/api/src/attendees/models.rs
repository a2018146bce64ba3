use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An attendee profile as the browser client holds it: extracted from a
/// resume PDF or a LinkedIn page, then edited by hand.
///
/// Every field is optional on the wire. Lists that arrive as `null` are read
/// as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attendee {
    /// Number or string, depending on where the profile came from.
    #[serde(default)]
    pub id: Option<Value>,
    pub name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub school: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub about: Option<About>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<Experience>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub volunteering: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub awards: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub languages: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub interests: Vec<String>,
}

/// The LinkedIn scraper stores `about` as `{"text": ...}`; resume extraction
/// stores a plain string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum About {
    Text(String),
    Section {
        #[serde(default)]
        text: Option<String>,
    },
}

impl About {
    pub fn as_text(&self) -> &str {
        match self {
            About::Text(text) => text,
            About::Section { text } => text.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Attendee {
    /// Stable string form of the id used as the store's primary key.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Row written to the `attendees` table. Structured lists are stored as
/// JSON-encoded text columns; flat lists as Postgres arrays.
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeRow {
    pub id: String,
    pub name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub school: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub about: Option<String>,
    pub experience: String,
    pub education: String,
    pub skills: Vec<String>,
    pub languages: Vec<Value>,
    pub interests: Vec<String>,
    pub organizations: String,
    pub volunteering: String,
    pub projects: String,
    pub awards: String,
    pub embedding: Vec<f32>,
}

impl AttendeeRow {
    pub fn new(id: String, attendee: &Attendee, embedding: Vec<f32>) -> serde_json::Result<Self> {
        Ok(Self {
            id,
            name: attendee.name.clone(),
            headline: attendee.headline.clone(),
            location: attendee.location.clone(),
            school: attendee.school.clone(),
            url: attendee.url.clone(),
            image: attendee.image.clone(),
            about: attendee.about.as_ref().map(|a| a.as_text().to_string()),
            experience: serde_json::to_string(&attendee.experience)?,
            education: serde_json::to_string(&attendee.education)?,
            skills: attendee.skills.clone(),
            languages: attendee.languages.clone(),
            interests: attendee.interests.clone(),
            organizations: serde_json::to_string(&attendee.organizations)?,
            volunteering: serde_json::to_string(&attendee.volunteering)?,
            projects: serde_json::to_string(&attendee.projects)?,
            awards: serde_json::to_string(&attendee.awards)?,
            embedding,
        })
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
