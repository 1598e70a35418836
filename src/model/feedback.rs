use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{record_id, timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    #[serde(
        rename = "feedbackId",
        alias = "id",
        default,
        deserialize_with = "record_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(rename = "feedback")]
    pub body: String,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}
