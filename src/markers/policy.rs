//! Rendering policies
//!
//! Annotations and highlights share one engine. What differs is captured
//! here: whether spans may overlap, how wrappers are tagged, and how a
//! record maps to its container key.

use serde::{Deserialize, Serialize};

use super::record::{ContainerKey, MarkerRecord};
use crate::dom::TextTree;

/// Content type tag used for commentary containers
pub const COMMENTARY_TAG: &str = "commentary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Free-form note attached to text
    Annotation,
    /// Plain highlight, no note
    Highlight,
}

/// Qualifier every container element of a policy carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMatch {
    /// Attribute that must be present (any value)
    #[serde(default)]
    pub attribute: Option<String>,
    /// Class that must be present
    #[serde(default)]
    pub class: Option<String>,
}

impl ContainerMatch {
    pub fn matches<T: TextTree>(&self, tree: &T, node: &T::Node) -> bool {
        if tree.tag_name(node).is_none() {
            return false;
        }
        let attribute_ok = self
            .attribute
            .as_deref()
            .map(|name| tree.attribute(node, name).is_some())
            .unwrap_or(true);
        let class_ok = self
            .class
            .as_deref()
            .map(|class| tree.has_class(node, class))
            .unwrap_or(true);
        attribute_ok && class_ok
    }

    /// CSS form, e.g. `.commentary-text` or `[data-annotatable]`
    pub fn selector(&self) -> String {
        let mut out = String::new();
        if let Some(class) = &self.class {
            out.push('.');
            out.push_str(class);
        }
        if let Some(attribute) = &self.attribute {
            out.push('[');
            out.push_str(attribute);
            out.push(']');
        }
        out
    }
}

/// How one kind of marker is anchored and rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPolicy {
    pub kind: MarkerKind,
    /// Forbid a marker's span from nesting inside another of the same kind
    pub exclusive: bool,
    /// Wrapper element tag
    pub tag: String,
    /// Class identifying wrappers of this kind
    pub class_name: String,
    /// Attribute carrying the marker id on each wrapper
    pub id_attribute: String,
    pub container: ContainerMatch,
}

impl MarkerPolicy {
    /// Notes on question, answer and commentary text
    pub fn annotations() -> Self {
        Self {
            kind: MarkerKind::Annotation,
            exclusive: true,
            tag: "mark".to_string(),
            class_name: "user-annotation".to_string(),
            id_attribute: "data-comment-id".to_string(),
            container: ContainerMatch {
                attribute: Some("data-annotatable".to_string()),
                class: None,
            },
        }
    }

    /// Highlights on commentary text
    pub fn highlights() -> Self {
        Self {
            kind: MarkerKind::Highlight,
            exclusive: false,
            tag: "mark".to_string(),
            class_name: "user-highlight".to_string(),
            id_attribute: "data-highlight-id".to_string(),
            container: ContainerMatch {
                attribute: None,
                class: Some("commentary-text".to_string()),
            },
        }
    }

    /// Whether markers of this kind carry an editable note
    pub fn has_notes(&self) -> bool {
        self.kind == MarkerKind::Annotation
    }

    /// Container key for a record
    ///
    /// Annotation records outside commentary fall back to the page's
    /// question id when they do not carry their own.
    pub fn key_for(&self, record: &MarkerRecord, page_question_id: Option<u64>) -> Option<ContainerKey> {
        match self.kind {
            MarkerKind::Highlight => record
                .commentary_id
                .map(|commentary_id| ContainerKey::Commentary { commentary_id }),
            MarkerKind::Annotation => {
                let tag = record.content_type_tag.as_deref()?;
                match (tag, record.commentary_id) {
                    (COMMENTARY_TAG, Some(commentary_id)) => Some(ContainerKey::Commentary { commentary_id }),
                    _ => Some(ContainerKey::Content {
                        content_type: tag.to_string(),
                        question_id: record.question_id.or(page_question_id)?,
                    }),
                }
            }
        }
    }

    /// Container key read back from a container element's attributes
    pub fn key_of<T: TextTree>(&self, tree: &T, container: &T::Node) -> Option<ContainerKey> {
        let commentary_id = tree
            .attribute(container, "data-commentary-id")
            .and_then(|v| v.parse().ok());
        let content_type = tree.attribute(container, "data-content-type");

        match self.kind {
            MarkerKind::Highlight => commentary_id.map(|commentary_id| ContainerKey::Commentary { commentary_id }),
            MarkerKind::Annotation => match (content_type.as_deref(), commentary_id) {
                (Some(COMMENTARY_TAG), Some(commentary_id)) => Some(ContainerKey::Commentary { commentary_id }),
                (Some(tag), _) => Some(ContainerKey::Content {
                    content_type: tag.to_string(),
                    question_id: tree.attribute(container, "data-question-id")?.parse().ok()?,
                }),
                (None, _) => None,
            },
        }
    }

    /// Full selector for the container of `key`
    ///
    /// Annotation commentary containers must also carry the commentary
    /// content type, the same attributes `key_of` reads back.
    pub fn container_selector(&self, key: &ContainerKey) -> String {
        match (self.kind, key) {
            (MarkerKind::Annotation, ContainerKey::Commentary { .. }) => format!(
                "{}[data-content-type=\"{}\"]{}",
                self.container.selector(),
                COMMENTARY_TAG,
                key.selector()
            ),
            _ => format!("{}{}", self.container.selector(), key.selector()),
        }
    }

    /// Whether `node` is a wrapper element of this policy
    pub fn is_wrapper<T: TextTree>(&self, tree: &T, node: &T::Node) -> bool {
        tree.tag_name(node).as_deref() == Some(self.tag.as_str()) && tree.has_class(node, &self.class_name)
    }
}

impl Default for MarkerPolicy {
    fn default() -> Self {
        Self::annotations()
    }
}
