//! Engine configuration
//!
//! The host page passes one configuration object (from JS or as JSON)
//! describing its question, the endpoints of each marker kind, and,
//! optionally, overrides for the two marker policies. Every field has a
//! default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markers::{MarkerId, MarkerKind, MarkerPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(String),

    #[error("{policy} policy: {field} must not be empty")]
    EmptyField { policy: &'static str, field: &'static str },

    #[error("{kind} {template} URL template must contain an {{id}} placeholder")]
    MissingPlaceholder { kind: &'static str, template: &'static str },
}

/// Server endpoints of one marker kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
    pub list_create_url: String,
    /// Update URL with an `{id}` placeholder
    pub update_url_template: String,
    /// Delete URL with an `{id}` placeholder
    pub delete_url_template: String,
}

impl Endpoints {
    pub fn update_url(&self, id: &MarkerId) -> String {
        self.update_url_template.replace("{id}", &id.to_string())
    }

    pub fn delete_url(&self, id: &MarkerId) -> String {
        self.delete_url_template.replace("{id}", &id.to_string())
    }

    /// List URL filtered by the given query pairs
    pub fn list_url(&self, query: &[(&str, u64)]) -> String {
        if query.is_empty() {
            return self.list_create_url.clone();
        }
        let query: Vec<String> = query.iter().map(|(key, value)| format!("{}={}", key, value)).collect();
        format!("{}?{}", self.list_create_url, query.join("&"))
    }

    fn validate(&self, kind: &'static str) -> Result<(), ConfigError> {
        let templates = [
            ("update", &self.update_url_template),
            ("delete", &self.delete_url_template),
        ];
        for (template, value) in templates {
            if !value.is_empty() && !value.contains("{id}") {
                return Err(ConfigError::MissingPlaceholder { kind, template });
            }
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Question the page renders; owner of non-commentary containers
    pub question_id: Option<u64>,
    pub annotations: MarkerPolicy,
    pub highlights: MarkerPolicy,
    pub annotation_endpoints: Endpoints,
    pub highlight_endpoints: Endpoints,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_id: None,
            annotations: MarkerPolicy::annotations(),
            highlights: MarkerPolicy::highlights(),
            annotation_endpoints: Endpoints::default(),
            highlight_endpoints: Endpoints::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_policy("annotations", &self.annotations)?;
        validate_policy("highlights", &self.highlights)?;
        self.annotation_endpoints.validate("annotation")?;
        self.highlight_endpoints.validate("highlight")?;
        Ok(())
    }

    pub fn policy(&self, kind: MarkerKind) -> &MarkerPolicy {
        match kind {
            MarkerKind::Annotation => &self.annotations,
            MarkerKind::Highlight => &self.highlights,
        }
    }

    pub fn endpoints(&self, kind: MarkerKind) -> &Endpoints {
        match kind {
            MarkerKind::Annotation => &self.annotation_endpoints,
            MarkerKind::Highlight => &self.highlight_endpoints,
        }
    }

    /// List URL for `kind`
    ///
    /// Annotations are listed per question, highlights per commentary block.
    pub fn list_url(&self, kind: MarkerKind, commentary_ids: &[u64]) -> String {
        let endpoints = self.endpoints(kind);
        match kind {
            MarkerKind::Annotation => {
                let query: Vec<(&str, u64)> = self.question_id.map(|q| ("question_id", q)).into_iter().collect();
                endpoints.list_url(&query)
            }
            MarkerKind::Highlight => {
                let query: Vec<(&str, u64)> = commentary_ids.iter().map(|id| ("commentary_id", *id)).collect();
                endpoints.list_url(&query)
            }
        }
    }
}

fn validate_policy(name: &'static str, policy: &MarkerPolicy) -> Result<(), ConfigError> {
    let fields = [
        ("tag", &policy.tag),
        ("class_name", &policy.class_name),
        ("id_attribute", &policy.id_attribute),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyField { policy: name, field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.annotations.exclusive);
        assert!(!config.highlights.exclusive);
    }

    #[test]
    fn test_endpoint_urls() {
        let json = r#"{
            "questionId": 42,
            "annotationEndpoints": {
                "listCreateUrl": "/api/comments/",
                "updateUrlTemplate": "/api/comments/{id}/",
                "deleteUrlTemplate": "/api/comments/{id}/delete/"
            }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        let endpoints = config.endpoints(MarkerKind::Annotation);

        assert_eq!(config.list_url(MarkerKind::Annotation, &[]), "/api/comments/?question_id=42");
        assert_eq!(endpoints.update_url(&MarkerId::Num(7)), "/api/comments/7/");
        assert_eq!(endpoints.delete_url(&MarkerId::Num(7)), "/api/comments/7/delete/");
    }

    #[test]
    fn test_each_kind_has_its_own_endpoints() {
        let json = r#"{
            "annotationEndpoints": {
                "listCreateUrl": "/accounts/comments/",
                "updateUrlTemplate": "/accounts/comments/{id}/update/",
                "deleteUrlTemplate": "/accounts/comments/{id}/delete/"
            },
            "highlightEndpoints": {
                "listCreateUrl": "/accounts/highlights/",
                "deleteUrlTemplate": "/accounts/highlights/{id}/delete/"
            }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        let id = MarkerId::Num(8);

        assert_eq!(
            config.endpoints(MarkerKind::Annotation).delete_url(&id),
            "/accounts/comments/8/delete/"
        );
        assert_eq!(
            config.endpoints(MarkerKind::Highlight).delete_url(&id),
            "/accounts/highlights/8/delete/"
        );
        assert_eq!(
            config.list_url(MarkerKind::Highlight, &[3, 4]),
            "/accounts/highlights/?commentary_id=3&commentary_id=4"
        );
        assert_eq!(config.list_url(MarkerKind::Annotation, &[3]), "/accounts/comments/");
    }

    #[test]
    fn test_empty_policy_field_rejected() {
        let mut config = EngineConfig::default();
        config.highlights.id_attribute = " ".to_string();

        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyField {
                policy: "highlights",
                field: "id_attribute"
            })
        );
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let json = r#"{"highlightEndpoints": {"deleteUrlTemplate": "/api/highlights/delete/"}}"#;
        assert_eq!(
            EngineConfig::from_json(json),
            Err(ConfigError::MissingPlaceholder {
                kind: "highlight",
                template: "delete"
            })
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
