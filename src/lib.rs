//! Client for an employee self-service HR portal: profile, leave requests,
//! performance feedback and document metadata, over either a REST gateway
//! (pull) or a live document store (push).

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod model;
pub mod models;
pub mod notice;
pub mod portal;
pub mod state;
pub mod sync;
pub mod utils;

pub use config::{BackendKind, Config};
pub use error::{ApiError, PortalError, PortalResult};
pub use portal::{Backend, Portal, PortalOptions};
