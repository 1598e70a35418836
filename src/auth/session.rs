use tracing::{info, instrument, warn};

use super::store::SessionStore;
use crate::api::AuthApi;
use crate::error::{ApiError, PortalError};
use crate::model::{Identity, UserId};

/// How a session may be established on start when none was persisted.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    pub initial_auth_token: Option<String>,
    pub anonymous_sign_in: bool,
}

/// The identity value plus an epoch that moves on every sign in / sign out.
///
/// Anything started under an older epoch (listeners, in-flight snapshots) is
/// stale once the epoch moves.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
    epoch: u64,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.user_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Gate for every data-mutating handler.
    pub fn require(&self, action: &str) -> Result<&Identity, PortalError> {
        self.identity
            .as_ref()
            .ok_or_else(|| PortalError::NotSignedIn(format!("Please log in to {action}.")))
    }

    pub fn begin(&mut self, identity: Identity) -> u64 {
        self.epoch += 1;
        info!(user_id = %identity.user_id, epoch = self.epoch, "session started");
        self.identity = Some(identity);
        self.epoch
    }

    /// Same identity, new epoch. Used when listeners are reopened.
    pub fn renew(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn end(&mut self) -> Option<Identity> {
        self.epoch += 1;
        let previous = self.identity.take();
        if let Some(identity) = &previous {
            info!(user_id = %identity.user_id, epoch = self.epoch, "session ended");
        }
        previous
    }
}

/// Where a restored session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoredFrom {
    Store,
    CustomToken,
    Anonymous,
}

/// Resolves the session on load: persisted identity first, then the
/// configured custom token, then anonymous sign-in if enabled.
///
/// A broken session file is logged and ignored; sign-in failures are returned.
#[instrument(name = "session_restore", skip_all)]
pub async fn restore(
    store: &dyn SessionStore,
    auth: &dyn AuthApi,
    bootstrap: &Bootstrap,
) -> Result<Option<(Identity, RestoredFrom)>, ApiError> {
    match store.load() {
        Ok(Some(identity)) => return Ok(Some((identity, RestoredFrom::Store))),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "ignoring unreadable session"),
    }

    if let Some(token) = &bootstrap.initial_auth_token {
        let identity = auth.sign_in_with_token(token).await?;
        return Ok(Some((identity, RestoredFrom::CustomToken)));
    }

    if bootstrap.anonymous_sign_in {
        let identity = auth.sign_in_anonymously().await?;
        return Ok(Some((identity, RestoredFrom::Anonymous)));
    }

    Ok(None)
}
