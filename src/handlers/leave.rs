use std::str::FromStr;

use chrono::NaiveDate;
use futures::future::BoxFuture;

use super::{BuildContext, Submission, non_blank, require_filled};
use crate::api::{Collection, RecordWriter, WriteAck};
use crate::error::{ApiError, PortalError};
use crate::model::leave_request::DEFAULT_LEAVE_STATUS;
use crate::model::{Identity, LeaveRequest, LeaveType};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw leave form fields, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveForm {
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
}

impl LeaveForm {
    pub fn new(
        leave_type: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            leave_type: leave_type.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            reason: reason.into(),
        }
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, PortalError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        PortalError::Validation(format!("{field} must be a date like 2025-01-31."))
    })
}

impl Submission for LeaveForm {
    type Record = LeaveRequest;

    const ACTION: &'static str = "submit a leave request";
    const COLLECTION: Collection = Collection::Leaves;
    const SUCCESS: &'static str = "Leave request submitted successfully!";
    const FAILURE: &'static str = "Error submitting leave request";

    /// Dates are only checked for shape. An end date before the start date
    /// goes through as typed.
    fn build(
        &self,
        _identity: &Identity,
        ctx: &BuildContext<'_>,
    ) -> Result<LeaveRequest, PortalError> {
        require_filled(&[
            ("leave type", &self.leave_type),
            ("start date", &self.start_date),
            ("end date", &self.end_date),
        ])?;

        let leave_type = LeaveType::from_str(self.leave_type.trim()).map_err(|_| {
            PortalError::Validation(format!(
                "Unknown leave type \"{}\".",
                self.leave_type.trim()
            ))
        })?;

        Ok(LeaveRequest {
            id: None,
            leave_type,
            start_date: parse_date("Start date", &self.start_date)?,
            end_date: parse_date("End date", &self.end_date)?,
            reason: non_blank(&self.reason),
            status: DEFAULT_LEAVE_STATUS.to_string(),
            submitted_at: Some(ctx.now),
        })
    }

    fn send<'a>(
        writer: &'a dyn RecordWriter,
        identity: &'a Identity,
        record: &'a LeaveRequest,
    ) -> BoxFuture<'a, Result<WriteAck, ApiError>> {
        writer.add_leave(identity, record)
    }
}
