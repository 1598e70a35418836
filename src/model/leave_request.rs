use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use strum_macros::{Display, EnumIter, EnumString};

use crate::utils::{record_id, timestamp};

/// Status the client stamps on every new request. Only the backend moves it on.
pub const DEFAULT_LEAVE_STATUS: &str = "Pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Sick,
    Casual,
    Earned,
    Maternity,
    Paternity,
}

/// Rows are read with the same case-insensitive rule the form uses.
impl<'de> Deserialize<'de> for LeaveType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LeaveType::from_str(raw.trim())
            .map_err(|_| de::Error::custom(format!("unknown leave type \"{raw}\"")))
    }
}

impl LeaveType {
    pub fn label(&self) -> &'static str {
        match self {
            LeaveType::Sick => "Sick Leave",
            LeaveType::Casual => "Casual Leave",
            LeaveType::Earned => "Earned Leave",
            LeaveType::Maternity => "Maternity Leave",
            LeaveType::Paternity => "Paternity Leave",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[serde(
        rename = "leaveId",
        alias = "id",
        default,
        deserialize_with = "record_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, with = "timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    DEFAULT_LEAVE_STATUS.to_string()
}

impl LeaveRequest {
    /// Inclusive day count. Zero or negative when the dates are reversed,
    /// which the client does not reject.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}
