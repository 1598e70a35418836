//! Form → record → single write, one module per panel.
//!
//! Forms only check that required fields are present. Everything else is the
//! backend's call.

pub mod document;
pub mod feedback;
pub mod leave;
pub mod profile;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::api::{Collection, RecordWriter, WriteAck};
use crate::error::{ApiError, PortalError};
use crate::model::Identity;
use crate::state::HrData;

pub use document::DocumentForm;
pub use feedback::FeedbackForm;
pub use leave::LeaveForm;
pub use profile::ProfileForm;

/// What a form may stamp onto its record besides its own fields.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub now: DateTime<Utc>,
    pub document_url_base: &'a str,
}

/// One panel's submit path.
pub trait Submission {
    type Record: Send + Sync;

    /// Completes "Please log in to {ACTION}."
    const ACTION: &'static str;
    const COLLECTION: Collection;
    const SUCCESS: &'static str;
    /// Prefix of the failure notice, e.g. "Error submitting feedback".
    const FAILURE: &'static str;

    fn build(&self, identity: &Identity, ctx: &BuildContext<'_>)
    -> Result<Self::Record, PortalError>;

    fn send<'a>(
        writer: &'a dyn RecordWriter,
        identity: &'a Identity,
        record: &'a Self::Record,
    ) -> BoxFuture<'a, Result<WriteAck, ApiError>>;

    /// Local effect of a successful write. Lists wait for the next snapshot.
    fn saved(_record: Self::Record, _data: &mut HrData) {}
}

/// Notice text for a failed write: the backend's message or status text,
/// or the transport error for network failures.
pub fn failure_notice(prefix: &str, err: &ApiError) -> String {
    match err {
        ApiError::Network(e) => format!("Network error or backend issue: {e}"),
        other => format!("{prefix}: {other}"),
    }
}

fn require_filled(fields: &[(&str, &str)]) -> Result<(), PortalError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PortalError::Validation(format!(
            "Please fill in: {}.",
            missing.join(", ")
        )))
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
