//! Keeping local collections in step with the backend.
//!
//! Pull: fetch each collection once per identity (and after writes).
//! Push: hold one listener per collection for as long as the identity lasts.

pub mod pull;
pub mod push;

pub use pull::{PullReport, pull_all, pull_one};
pub use push::{EventReceiver, EventSender, SubscriptionSet, SyncEvent, channel};
