use futures::future::BoxFuture;

use super::{BuildContext, Submission, require_filled};
use crate::api::{Collection, RecordWriter, WriteAck};
use crate::error::{ApiError, PortalError};
use crate::model::{FeedbackEntry, Identity};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackForm {
    pub body: String,
}

impl FeedbackForm {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl Submission for FeedbackForm {
    type Record = FeedbackEntry;

    const ACTION: &'static str = "submit feedback";
    const COLLECTION: Collection = Collection::Feedback;
    const SUCCESS: &'static str = "Feedback submitted successfully!";
    const FAILURE: &'static str = "Error submitting feedback";

    fn build(
        &self,
        _identity: &Identity,
        ctx: &BuildContext<'_>,
    ) -> Result<FeedbackEntry, PortalError> {
        require_filled(&[("feedback", &self.body)])?;
        Ok(FeedbackEntry {
            id: None,
            body: self.body.clone(),
            timestamp: Some(ctx.now),
        })
    }

    fn send<'a>(
        writer: &'a dyn RecordWriter,
        identity: &'a Identity,
        record: &'a FeedbackEntry,
    ) -> BoxFuture<'a, Result<WriteAck, ApiError>> {
        writer.add_feedback(identity, record)
    }
}
