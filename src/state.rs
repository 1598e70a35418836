use crate::api::{Collection, Snapshot};
use crate::model::{DocumentMetadata, FeedbackEntry, LeaveRequest, Profile};
use crate::utils::ordering::sort_newest_first;

/// The four collections the portal renders. Only ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HrData {
    pub profile: Profile,
    pub leaves: Vec<LeaveRequest>,
    pub feedback: Vec<FeedbackEntry>,
    pub documents: Vec<DocumentMetadata>,
}

impl HrData {
    pub fn is_empty(&self) -> bool {
        self.profile.is_blank()
            && self.leaves.is_empty()
            && self.feedback.is_empty()
            && self.documents.is_empty()
    }

    /// Replaces one collection with a snapshot, sorting lists newest first.
    pub fn apply(&mut self, snapshot: Snapshot) -> Collection {
        let collection = snapshot.collection();
        match snapshot {
            Snapshot::Profile(profile) => self.profile = profile.unwrap_or_default(),
            Snapshot::Leaves(mut rows) => {
                sort_newest_first(&mut rows, |leave| leave.submitted_at);
                self.leaves = rows;
            }
            Snapshot::Feedback(mut rows) => {
                sort_newest_first(&mut rows, |entry| entry.timestamp);
                self.feedback = rows;
            }
            Snapshot::Documents(mut rows) => {
                sort_newest_first(&mut rows, |doc| doc.upload_date);
                self.documents = rows;
            }
        }
        collection
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
