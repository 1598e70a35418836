pub mod document;
pub mod feedback;
pub mod leave_request;
pub mod profile;
pub mod user;

pub use document::{DocumentMetadata, DocumentType};
pub use feedback::FeedbackEntry;
pub use leave_request::{LeaveRequest, LeaveType};
pub use profile::Profile;
pub use user::{Identity, SignInMethod, UserId};
