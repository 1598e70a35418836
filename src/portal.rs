//! The portal: one identity, four collections, one notice board.
//!
//! Every public operation takes `&mut self` and runs to completion before the
//! next one starts. Listener tasks never touch portal state; they forward
//! into the event channel and the caller feeds those events back through
//! [`Portal::apply`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::api::gateway::GatewayClient;
use crate::api::memory::MemoryStore;
use crate::api::{AuthApi, Collection, RecordWriter, SnapshotFeed, SnapshotSource, WriteAck};
use crate::auth::password::{POLICY_MESSAGE, meets_policy};
use crate::auth::session::{Bootstrap, RestoredFrom, Session, restore};
use crate::auth::store::SessionStore;
use crate::auth::verification::{VerificationFlow, VerificationReject, VerificationState};
use crate::config::Config;
use crate::error::{ApiError, PortalError, PortalResult};
use crate::handlers::{
    BuildContext, DocumentForm, FeedbackForm, LeaveForm, ProfileForm, Submission, failure_notice,
};
use crate::model::{Identity, UserId};
use crate::notice::{Notice, NoticeBoard};
use crate::state::HrData;
use crate::sync::{EventSender, PullReport, SubscriptionSet, SyncEvent, pull_all, pull_one};

const DEFAULT_DOCUMENT_URL_BASE: &str = "https://hrms-documents.s3.amazonaws.com";

/// How the local collections follow the backend.
#[derive(Clone)]
pub enum SyncMode {
    Pull(Arc<dyn SnapshotSource>),
    Push(Arc<dyn SnapshotFeed>),
}

/// The backend handles a portal is built from.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthApi>,
    pub writer: Arc<dyn RecordWriter>,
    pub sync: SyncMode,
}

impl Backend {
    pub fn gateway(client: GatewayClient) -> Self {
        let client = Arc::new(client);
        Self {
            auth: client.clone(),
            writer: client.clone(),
            sync: SyncMode::Pull(client),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            auth: store.clone(),
            writer: store.clone(),
            sync: SyncMode::Push(store),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortalOptions {
    pub bootstrap: Bootstrap,
    pub require_verification: bool,
    pub password_policy: bool,
    pub refresh_after_submit: bool,
    pub document_url_base: String,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            require_verification: true,
            password_policy: true,
            refresh_after_submit: true,
            document_url_base: DEFAULT_DOCUMENT_URL_BASE.to_string(),
        }
    }
}

impl PortalOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bootstrap: Bootstrap {
                initial_auth_token: config.initial_auth_token.clone(),
                anonymous_sign_in: config.anonymous_sign_in,
            },
            require_verification: config.require_verification,
            password_policy: config.password_policy,
            refresh_after_submit: config.refresh_after_submit,
            document_url_base: config.document_url_base.clone(),
        }
    }
}

/// Which screen a signed-out user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthView {
    #[default]
    Login,
    Signup,
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth(AuthView),
    Dashboard,
}

pub struct Portal {
    auth: Arc<dyn AuthApi>,
    writer: Arc<dyn RecordWriter>,
    sync: SyncMode,
    store: Box<dyn SessionStore>,
    options: PortalOptions,
    events: EventSender,

    session: Session,
    subscriptions: Option<SubscriptionSet>,
    data: HrData,
    notices: NoticeBoard,
    auth_message: Option<Notice>,
    auth_view: AuthView,
    verification: VerificationFlow,
    login_prefill: Option<String>,
}

impl Portal {
    pub fn new(
        backend: Backend,
        store: Box<dyn SessionStore>,
        options: PortalOptions,
        events: EventSender,
    ) -> Self {
        Self {
            auth: backend.auth,
            writer: backend.writer,
            sync: backend.sync,
            store,
            options,
            events,
            session: Session::default(),
            subscriptions: None,
            data: HrData::default(),
            notices: NoticeBoard::default(),
            auth_message: None,
            auth_view: AuthView::default(),
            verification: VerificationFlow::default(),
            login_prefill: None,
        }
    }

    /* =========================
       Read side
    ========================= */

    pub fn data(&self) -> &HrData {
        &self.data
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.session.user_id()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    pub fn epoch(&self) -> u64 {
        self.session.epoch()
    }

    pub fn view(&self) -> View {
        if self.session.is_signed_in() {
            View::Dashboard
        } else {
            View::Auth(self.auth_view)
        }
    }

    /// Open listeners, zero in pull mode.
    pub fn live_listeners(&self) -> usize {
        self.subscriptions.as_ref().map_or(0, SubscriptionSet::len)
    }

    pub fn auth_message(&self) -> Option<&Notice> {
        self.auth_message.as_ref()
    }

    pub fn verification(&self) -> &VerificationState {
        self.verification.state()
    }

    /// Email to put in the login form after signup or verification.
    pub fn login_prefill(&self) -> Option<&str> {
        self.login_prefill.as_deref()
    }

    pub fn notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn show_signup(&mut self) {
        self.auth_message = None;
        self.auth_view = AuthView::Signup;
    }

    pub fn show_login(&mut self) {
        self.auth_message = None;
        self.auth_view = AuthView::Login;
    }

    /* =========================
       Session lifecycle
    ========================= */

    /// Resolves the starting session. Returns whether someone is signed in.
    #[instrument(name = "portal_start", skip(self))]
    pub async fn start(&mut self) -> PortalResult<bool> {
        let restored = restore(self.store.as_ref(), self.auth.as_ref(), &self.options.bootstrap).await;

        match restored {
            Ok(Some((identity, from))) => {
                info!(user_id = %identity.user_id, ?from, "session resolved");
                if from != RestoredFrom::Store {
                    self.persist(&identity);
                }
                self.establish(identity).await;
                Ok(true)
            }
            Ok(None) => {
                debug!("no session, showing login");
                Ok(false)
            }
            Err(e) => {
                error!(error = %e, "auth initialization failed");
                self.auth_message = Some(Notice::error(
                    "Error initializing authentication. Please refresh.",
                ));
                Err(e.into())
            }
        }
    }

    #[instrument(name = "portal_login", skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> PortalResult<()> {
        self.auth_message = None;

        match self.auth.login(email.trim(), password).await {
            Ok(identity) => {
                info!(user_id = %identity.user_id, "login successful");
                self.persist(&identity);
                self.auth_message = Some(Notice::success("Login successful!"));
                self.establish(identity).await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.auth_message = Some(Notice::error(auth_failure(
                    &e,
                    "Login failed. Please check your credentials.",
                    "Network error or backend issue. Please try again.",
                )));
                Err(e.into())
            }
        }
    }

    #[instrument(name = "portal_signup", skip(self, password, confirm))]
    pub async fn signup(&mut self, email: &str, password: &str, confirm: &str) -> PortalResult<()> {
        self.auth_message = None;
        let email = email.trim();

        if password != confirm {
            return Err(self.reject_auth("Passwords do not match."));
        }
        if self.options.password_policy && !meets_policy(password) {
            return Err(self.reject_auth(POLICY_MESSAGE));
        }

        match self.auth.signup(email, password).await {
            Ok(_) if self.options.require_verification => {
                self.verification.code_sent(email);
                self.auth_view = AuthView::Verify;
                self.auth_message = Some(Notice::success(
                    "Account created successfully! A verification code has been sent to your email.",
                ));
                Ok(())
            }
            Ok(_) => {
                self.verification.skip_to_verified(email);
                self.login_prefill = Some(email.to_string());
                self.auth_view = AuthView::Login;
                self.auth_message = Some(Notice::success(
                    "Account created successfully! Please login.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "signup failed");
                self.auth_message = Some(Notice::error(auth_failure(
                    &e,
                    "Signup failed. Please try again.",
                    "Network error or backend issue. Please try again.",
                )));
                Err(e.into())
            }
        }
    }

    /// Confirms the pending signup. Shape checks run before any network call.
    #[instrument(name = "portal_verify", skip(self, code))]
    pub async fn verify(&mut self, code: &str) -> PortalResult<()> {
        self.auth_message = None;

        let email = match self.verification.check_code(code) {
            Ok(email) => email.to_string(),
            Err(reject) => return Err(self.reject_auth(&reject.message("for verification"))),
        };

        match self.auth.confirm_signup(&email, code).await {
            Ok(()) => {
                self.verification.confirmed();
                self.login_prefill = Some(email);
                self.auth_view = AuthView::Login;
                self.auth_message = Some(Notice::success(
                    "Account verified successfully! You can now log in.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "verification failed");
                self.auth_message = Some(Notice::error(auth_failure(
                    &e,
                    "Verification failed. Please check the code or try again.",
                    "Network error or backend issue during verification. Please try again.",
                )));
                Err(e.into())
            }
        }
    }

    #[instrument(name = "portal_resend_code", skip(self))]
    pub async fn resend_code(&mut self) -> PortalResult<()> {
        self.auth_message = None;

        let Some(email) = self.verification.pending_email().map(str::to_string) else {
            let text = VerificationReject::NoPendingEmail.message("to resend code to");
            return Err(self.reject_auth(&text));
        };

        match self.auth.resend_code(&email).await {
            Ok(()) => {
                self.auth_message = Some(Notice::success(
                    "New verification code sent! Check your email.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "resend failed");
                self.auth_message = Some(Notice::error(auth_failure(
                    &e,
                    "Failed to resend code. Please try again.",
                    "Network error or backend issue during resend. Please try again.",
                )));
                Err(e.into())
            }
        }
    }

    /// Signs out and drops everything held for the identity.
    #[instrument(name = "portal_logout", skip(self))]
    pub async fn logout(&mut self) -> PortalResult<()> {
        let Some(identity) = self.session.identity().cloned() else {
            debug!("logout without a session");
            return Ok(());
        };

        if let Err(e) = self.auth.sign_out(&identity).await {
            error!(error = %e, "sign out failed");
            self.notices.post(Notice::error(format!("Error logging out: {e}")));
            return Err(e.into());
        }

        self.subscriptions = None;
        self.session.end();
        self.data.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear persisted session");
        }
        self.verification.reset();
        self.login_prefill = None;
        self.auth_message = None;
        self.auth_view = AuthView::Login;

        self.notices.post(Notice::info("You have been logged out successfully!"));
        Ok(())
    }

    /// Switches to a new identity: releases the old listeners, empties the
    /// collections and loads them again under a fresh epoch.
    async fn establish(&mut self, identity: Identity) {
        self.subscriptions = None;
        self.data.clear();
        self.auth_view = AuthView::Login;
        let epoch = self.session.begin(identity.clone());
        self.load(&identity, epoch).await;
    }

    async fn load(&mut self, identity: &Identity, epoch: u64) {
        match &self.sync {
            SyncMode::Push(feed) => {
                let set = SubscriptionSet::open(feed.as_ref(), &identity.user_id, epoch, &self.events);
                self.subscriptions = Some(set);
            }
            SyncMode::Pull(source) => {
                let source = Arc::clone(source);
                let report = pull_all(source.as_ref(), identity).await;
                let failed: Vec<_> = report.failed().collect();
                if !failed.is_empty() {
                    warn!(?failed, "initial load incomplete");
                }
                self.apply_report(report);
            }
        }
    }

    fn persist(&self, identity: &Identity) {
        if let Err(e) = self.store.save(identity) {
            warn!(error = %e, "could not persist session");
        }
    }

    fn reject_auth(&mut self, text: &str) -> PortalError {
        self.auth_message = Some(Notice::error(text));
        PortalError::Validation(text.to_string())
    }

    /* =========================
       Sync
    ========================= */

    fn apply_report(&mut self, report: PullReport) {
        for (collection, outcome) in report.outcomes {
            match outcome {
                Ok(snapshot) => {
                    self.data.apply(snapshot);
                }
                Err(_) => self.notices.post(Notice::error(format!(
                    "Failed to load {}.",
                    collection.description()
                ))),
            }
        }
    }

    /// Applies one listener delivery. Returns the collection that changed,
    /// or `None` for errors and events from a released identity.
    pub fn apply(&mut self, event: SyncEvent) -> Option<Collection> {
        let current = self.subscriptions.as_ref().map(SubscriptionSet::epoch);
        if current != Some(event.epoch) || event.epoch != self.session.epoch() {
            debug!(
                epoch = event.epoch,
                current = self.session.epoch(),
                collection = %event.collection,
                "dropping stale sync event"
            );
            return None;
        }

        match event.outcome {
            Ok(snapshot) => Some(self.data.apply(snapshot)),
            Err(e) => {
                error!(collection = %event.collection, error = %e, "listener error");
                self.notices.post(Notice::error(format!(
                    "Error fetching {}: {e}",
                    event.collection
                )));
                None
            }
        }
    }

    /// Loads everything again: four fetches in pull mode, fresh listeners
    /// under a new epoch in push mode.
    #[instrument(name = "portal_refresh", skip(self))]
    pub async fn refresh(&mut self) -> PortalResult<()> {
        let identity = self.signed_in("refresh your data")?;
        self.subscriptions = None;
        // events queued by the released listeners must not pass as current
        let epoch = self.session.renew();
        self.load(&identity, epoch).await;
        Ok(())
    }

    async fn refresh_collection(&mut self, identity: &Identity, collection: Collection) {
        let SyncMode::Pull(source) = &self.sync else {
            return;
        };
        let source = Arc::clone(source);
        let outcome = pull_one(source.as_ref(), identity, collection).await;
        self.apply_report(PullReport {
            outcomes: vec![(collection, outcome)],
        });
    }

    /* =========================
       Submissions
    ========================= */

    pub async fn save_profile(&mut self, form: &ProfileForm) -> PortalResult<WriteAck> {
        self.submit(form).await
    }

    pub async fn submit_leave(&mut self, form: &LeaveForm) -> PortalResult<WriteAck> {
        self.submit(form).await
    }

    pub async fn submit_feedback(&mut self, form: &FeedbackForm) -> PortalResult<WriteAck> {
        self.submit(form).await
    }

    pub async fn upload_document(&mut self, form: &DocumentForm) -> PortalResult<WriteAck> {
        self.submit(form).await
    }

    /// Gate → build → one write → notice. A successful write in pull mode
    /// re-fetches the collection it touched.
    #[instrument(name = "portal_submit", skip_all, fields(collection = %S::COLLECTION))]
    pub async fn submit<S: Submission>(&mut self, form: &S) -> PortalResult<WriteAck> {
        let identity = self.signed_in(S::ACTION)?;

        let ctx = BuildContext {
            now: Utc::now(),
            document_url_base: &self.options.document_url_base,
        };
        let record = match form.build(&identity, &ctx) {
            Ok(record) => record,
            Err(e) => {
                self.notices.post(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        let writer = Arc::clone(&self.writer);
        match S::send(writer.as_ref(), &identity, &record).await {
            Ok(ack) => {
                info!(id = ?ack.id, "write accepted");
                S::saved(record, &mut self.data);
                self.notices.post(Notice::success(S::SUCCESS));
                if self.options.refresh_after_submit {
                    self.refresh_collection(&identity, S::COLLECTION).await;
                }
                Ok(ack)
            }
            Err(e) => {
                error!(error = %e, "write failed");
                self.notices.post(Notice::error(failure_notice(S::FAILURE, &e)));
                Err(e.into())
            }
        }
    }

    /// The identity gate every mutating operation goes through.
    fn signed_in(&mut self, action: &str) -> PortalResult<Identity> {
        match self.session.require(action) {
            Ok(identity) => Ok(identity.clone()),
            Err(e) => {
                self.notices.post(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Inline auth message for a failed auth call: the backend's own message,
/// a fixed text for network failures, else `fallback`.
fn auth_failure(err: &ApiError, fallback: &str, network: &str) -> String {
    if err.is_network() {
        return network.to_string();
    }
    err.backend_message().unwrap_or(fallback).to_string()
}
