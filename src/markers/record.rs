//! Marker records as exchanged with the persistence layer

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::anchor::Anchor;

/// Opaque marker identifier assigned by the persistence layer
///
/// The server hands out integers while DOM attributes yield strings, so
/// both forms are accepted and compared on their textual form. Strings are
/// normalized through [`MarkerId::parse`] wherever they enter.
#[derive(Debug, Clone, Eq, Serialize)]
#[serde(untagged)]
pub enum MarkerId {
    Num(u64),
    Text(String),
}

impl MarkerId {
    /// Parse an attribute value, preferring the numeric form
    ///
    /// Only canonical decimals become numbers, so `"007"` keeps its text.
    pub fn parse(value: &str) -> Self {
        match value.parse::<u64>() {
            Ok(n) if n.to_string() == value => MarkerId::Num(n),
            _ => MarkerId::Text(value.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for MarkerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => MarkerId::Num(n),
            Raw::Text(s) => MarkerId::parse(&s),
        })
    }
}

impl PartialEq for MarkerId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MarkerId::Num(a), MarkerId::Num(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Hash for MarkerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerId::Num(n) => write!(f, "{}", n),
            MarkerId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for MarkerId {
    fn from(value: u64) -> Self {
        MarkerId::Num(value)
    }
}

impl From<&str> for MarkerId {
    fn from(value: &str) -> Self {
        MarkerId::parse(value)
    }
}

/// Accept `17`, `"17"` or null for numeric foreign keys
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// A stored marker (annotation or highlight)
///
/// Annotations carry `content_type_tag` and `comment_text`; highlights only
/// `commentary_id`. `id` is absent until the first successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MarkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_tag: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub question_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub commentary_id: Option<u64>,
    pub selected_text: String,
    #[serde(default)]
    pub occurrence_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
}

impl MarkerRecord {
    /// Attach the id returned by a successful create
    pub fn from_draft(draft: MarkerDraft, id: MarkerId) -> Self {
        Self {
            id: Some(id),
            content_type_tag: draft.content_type_tag,
            question_id: draft.question_id,
            commentary_id: draft.commentary_id,
            selected_text: draft.selected_text,
            occurrence_index: draft.occurrence_index,
            comment_text: draft.comment_text,
        }
    }

    pub fn anchor(&self) -> Anchor {
        Anchor::new(self.selected_text.clone(), self.occurrence_index)
    }
}

/// Create payload: a record without an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_tag: Option<String>,
    pub commentary_id: Option<u64>,
    pub selected_text: String,
    pub occurrence_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
}

impl MarkerDraft {
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.comment_text = Some(note.into());
        self
    }

    pub fn anchor(&self) -> Anchor {
        Anchor::new(self.selected_text.clone(), self.occurrence_index)
    }
}

/// Identity of the rendered region a marker belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContainerKey {
    /// Question-level content (`question`, `answer`, ...) of one document
    Content { content_type: String, question_id: u64 },
    /// A commentary block, possibly inside a lazily loaded pane
    Commentary { commentary_id: u64 },
}

impl ContainerKey {
    /// CSS selector matching the container element
    pub fn selector(&self) -> String {
        match self {
            ContainerKey::Content {
                content_type,
                question_id,
            } => format!(
                "[data-content-type=\"{}\"][data-question-id=\"{}\"]",
                content_type, question_id
            ),
            ContainerKey::Commentary { commentary_id } => {
                format!("[data-commentary-id=\"{}\"]", commentary_id)
            }
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKey::Content {
                content_type,
                question_id,
            } => write!(f, "{}#{}", content_type, question_id),
            ContainerKey::Commentary { commentary_id } => write!(f, "commentary#{}", commentary_id),
        }
    }
}
