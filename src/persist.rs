//! Wire shapes exchanged with the persistence endpoints
//!
//! The host page performs the requests; these types only describe the JSON
//! it sends and receives. A marker is rendered only after a create response
//! carrying an id, so a failed save never leaves a half-applied marker.

use serde::{Deserialize, Serialize};

use crate::markers::{MarkerId, MarkerRecord};

pub use crate::config::Endpoints;

/// Response of the list endpoint
///
/// Annotation lists arrive as `{"comments": [...]}`, highlight lists as
/// `{"highlights": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<MarkerRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<MarkerRecord>>,
}

impl ListResponse {
    /// Records in server order, whichever key carried them
    pub fn into_records(self) -> Vec<MarkerRecord> {
        let mut records = self.comments.unwrap_or_default();
        records.extend(self.highlights.unwrap_or_default());
        records
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub id: Option<MarkerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub comment_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub updated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub deleted: bool,
}
