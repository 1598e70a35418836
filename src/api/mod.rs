//! Seams between the portal and whatever backend stores its data.
//!
//! A REST gateway implements [`AuthApi`], [`RecordWriter`] and
//! [`SnapshotSource`] (pull). A live document store implements [`AuthApi`],
//! [`RecordWriter`] and [`SnapshotFeed`] (push).

pub mod gateway;
pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use strum_macros::{Display, EnumIter};

use crate::error::ApiError;
use crate::model::{DocumentMetadata, FeedbackEntry, Identity, LeaveRequest, Profile, UserId};
pub use crate::models::WriteAck;

/// The four per-user collections every portal panel renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    Profile,
    Leaves,
    Feedback,
    Documents,
}

impl Collection {
    /// Panel name used in notices ("Failed to load leave history.").
    pub fn description(&self) -> &'static str {
        match self {
            Collection::Profile => "employee profile",
            Collection::Leaves => "leave history",
            Collection::Feedback => "performance feedback",
            Collection::Documents => "document list",
        }
    }
}

/// Full replacement payload for one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Profile(Option<Profile>),
    Leaves(Vec<LeaveRequest>),
    Feedback(Vec<FeedbackEntry>),
    Documents(Vec<DocumentMetadata>),
}

impl Snapshot {
    pub fn collection(&self) -> Collection {
        match self {
            Snapshot::Profile(_) => Collection::Profile,
            Snapshot::Leaves(_) => Collection::Leaves,
            Snapshot::Feedback(_) => Collection::Feedback,
            Snapshot::Documents(_) => Collection::Documents,
        }
    }

    pub fn empty(collection: Collection) -> Self {
        match collection {
            Collection::Profile => Snapshot::Profile(None),
            Collection::Leaves => Snapshot::Leaves(Vec::new()),
            Collection::Feedback => Snapshot::Feedback(Vec::new()),
            Collection::Documents => Snapshot::Documents(Vec::new()),
        }
    }
}

/// What signup produced on the backend side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupAck {
    pub message: Option<String>,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError>;

    async fn signup(&self, email: &str, password: &str) -> Result<SignupAck, ApiError>;

    async fn confirm_signup(&self, _email: &str, _code: &str) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("account verification"))
    }

    async fn resend_code(&self, _email: &str) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("verification code resend"))
    }

    async fn sign_in_with_token(&self, _token: &str) -> Result<Identity, ApiError> {
        Err(ApiError::Unsupported("custom token sign-in"))
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, ApiError> {
        Err(ApiError::Unsupported("anonymous sign-in"))
    }

    /// Backend-side sign out. Stateless backends have nothing to do.
    async fn sign_out(&self, _identity: &Identity) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Single-shot writes. No idempotency key, no retry.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn save_profile(&self, identity: &Identity, profile: &Profile)
    -> Result<WriteAck, ApiError>;

    async fn add_leave(&self, identity: &Identity, leave: &LeaveRequest)
    -> Result<WriteAck, ApiError>;

    async fn add_feedback(
        &self,
        identity: &Identity,
        entry: &FeedbackEntry,
    ) -> Result<WriteAck, ApiError>;

    async fn add_document(
        &self,
        identity: &Identity,
        document: &DocumentMetadata,
    ) -> Result<WriteAck, ApiError>;
}

/// Pull side: one request per collection.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, identity: &Identity, collection: Collection)
    -> Result<Snapshot, ApiError>;
}

/// Live stream of snapshots for one collection. Dropping it unsubscribes.
pub type Listener = BoxStream<'static, Result<Snapshot, ApiError>>;

/// Push side: one listener per collection, first item is the current state.
pub trait SnapshotFeed: Send + Sync {
    fn subscribe(&self, user: &UserId, collection: Collection) -> Result<Listener, ApiError>;
}
