//! In-process document store with live listeners.
//!
//! Data is laid out the way the hosted store scopes it,
//! `artifacts/{appId}/users/{userId}/{collection}`, and every path is backed
//! by a `watch` channel: writers modify the current snapshot, listeners get
//! the current value first and every change after it. Used as the push
//! backend for local runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthApi, Collection, Listener, RecordWriter, SignupAck, Snapshot, SnapshotFeed, WriteAck};
use crate::error::ApiError;
use crate::model::{DocumentMetadata, FeedbackEntry, Identity, LeaveRequest, Profile, SignInMethod, UserId};

const MIN_PASSWORD_LEN: usize = 6;

type Slot = watch::Sender<Result<Snapshot, ApiError>>;

struct Account {
    user_id: UserId,
    password: String,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    custom_tokens: HashMap<String, UserId>,
    slots: HashMap<String, Slot>,
    revoked: HashSet<String>,
}

pub struct MemoryStore {
    app_id: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store path of a user's collection. The profile is a single document.
    pub fn path(&self, user: &UserId, collection: Collection) -> String {
        let base = format!("artifacts/{}/users/{}/{}", self.app_id, user, collection);
        match collection {
            Collection::Profile => format!("{base}/myProfile"),
            _ => base,
        }
    }

    /// Mints a token that `sign_in_with_token` exchanges for `user`.
    pub fn issue_custom_token(&self, user: &UserId) -> String {
        let token = Uuid::new_v4().to_simple().to_string();
        self.lock().custom_tokens.insert(token.clone(), user.clone());
        token
    }

    /// Accepts a token minted elsewhere, e.g. one handed over in configuration.
    pub fn register_custom_token(&self, token: &str, user: UserId) {
        self.lock().custom_tokens.insert(token.to_string(), user);
    }

    /// Cuts off reads and writes for one collection, the way a rules change
    /// would. Open listeners receive the error and end.
    pub fn revoke_access(&self, user: &UserId, collection: Collection, message: &str) {
        let path = self.path(user, collection);
        let mut inner = self.lock();
        inner.revoked.insert(path.clone());
        let sender = slot(&mut inner, &path, collection);
        sender.send_replace(Err(ApiError::Denied(message.to_string())));
        info!(%path, "access revoked");
    }

    /// Open listeners on one collection.
    pub fn listener_count(&self, user: &UserId, collection: Collection) -> usize {
        let path = self.path(user, collection);
        self.lock()
            .slots
            .get(&path)
            .map(|slot| slot.receiver_count())
            .unwrap_or(0)
    }

    fn modify<F>(&self, user: &UserId, collection: Collection, apply: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut Snapshot),
    {
        let path = self.path(user, collection);
        let mut inner = self.lock();
        if inner.revoked.contains(&path) {
            return Err(ApiError::Denied("Missing or insufficient permissions.".into()));
        }

        slot(&mut inner, &path, collection).send_modify(|current| {
            if current.is_err() {
                *current = Ok(Snapshot::empty(collection));
            }
            if let Ok(snapshot) = current {
                apply(snapshot);
            }
        });
        debug!(%path, "document written");
        Ok(())
    }

    fn append<T, F>(
        &self,
        user: &UserId,
        collection: Collection,
        record: T,
        push: F,
    ) -> Result<WriteAck, ApiError>
    where
        F: FnOnce(&mut Snapshot, T),
    {
        self.modify(user, collection, |snapshot| push(snapshot, record))?;
        Ok(WriteAck::default())
    }
}

fn slot<'a>(inner: &'a mut Inner, path: &str, collection: Collection) -> &'a Slot {
    inner
        .slots
        .entry(path.to_string())
        .or_insert_with(|| watch::channel(Ok(Snapshot::empty(collection))).0)
}

fn new_id() -> String {
    Uuid::new_v4().to_simple().to_string()
}

/// Current value first, then every change. An error ends the stream.
fn listen(rx: watch::Receiver<Result<Snapshot, ApiError>>) -> Listener {
    stream::unfold(Some((rx, true)), |state| async move {
        let (mut rx, first) = state?;
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let item = rx.borrow_and_update().clone();
        let next = if item.is_ok() { Some((rx, false)) } else { None };
        Some((item, next))
    })
    .boxed()
}

#[async_trait]
impl AuthApi for MemoryStore {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let inner = self.lock();
        let account = inner
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .ok_or_else(|| ApiError::Denied("Invalid username or password.".into()))?;

        Ok(Identity {
            user_id: account.user_id.clone(),
            email: Some(email.trim().to_string()),
            id_token: None,
            access_token: None,
            method: SignInMethod::Password,
        })
    }

    async fn signup(&self, email: &str, password: &str) -> Result<SignupAck, ApiError> {
        let key = email.trim().to_lowercase();
        if !key.contains('@') {
            return Err(ApiError::Denied("Invalid email format.".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Denied(
                "Password is too weak. Must be at least 6 characters.".into(),
            ));
        }

        let mut inner = self.lock();
        if inner.accounts.contains_key(&key) {
            return Err(ApiError::Denied(
                "Email already in use. Try logging in or use a different email.".into(),
            ));
        }

        let user_id = UserId::new(new_id());
        info!(%user_id, "account created");
        inner.accounts.insert(
            key,
            Account {
                user_id,
                password: password.to_string(),
            },
        );
        Ok(SignupAck::default())
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<Identity, ApiError> {
        let user_id = self
            .lock()
            .custom_tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Denied("Invalid custom token.".into()))?;

        Ok(Identity {
            user_id,
            email: None,
            id_token: None,
            access_token: None,
            method: SignInMethod::CustomToken,
        })
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, ApiError> {
        Ok(Identity::anonymous(UserId::new(new_id())))
    }
}

#[async_trait]
impl RecordWriter for MemoryStore {
    async fn save_profile(
        &self,
        identity: &Identity,
        profile: &Profile,
    ) -> Result<WriteAck, ApiError> {
        let profile = profile.clone();
        self.modify(&identity.user_id, Collection::Profile, |snapshot| {
            *snapshot = Snapshot::Profile(Some(profile));
        })?;
        Ok(WriteAck::default())
    }

    async fn add_leave(
        &self,
        identity: &Identity,
        leave: &LeaveRequest,
    ) -> Result<WriteAck, ApiError> {
        let id = new_id();
        let record = LeaveRequest {
            id: Some(id.clone()),
            ..leave.clone()
        };
        let ack = self.append(&identity.user_id, Collection::Leaves, record, |snapshot, record| {
            if let Snapshot::Leaves(rows) = snapshot {
                rows.push(record);
            }
        })?;
        Ok(WriteAck { id: Some(id), ..ack })
    }

    async fn add_feedback(
        &self,
        identity: &Identity,
        entry: &FeedbackEntry,
    ) -> Result<WriteAck, ApiError> {
        let id = new_id();
        let record = FeedbackEntry {
            id: Some(id.clone()),
            ..entry.clone()
        };
        let ack = self.append(&identity.user_id, Collection::Feedback, record, |snapshot, record| {
            if let Snapshot::Feedback(rows) = snapshot {
                rows.push(record);
            }
        })?;
        Ok(WriteAck { id: Some(id), ..ack })
    }

    async fn add_document(
        &self,
        identity: &Identity,
        document: &DocumentMetadata,
    ) -> Result<WriteAck, ApiError> {
        let id = new_id();
        let record = DocumentMetadata {
            id: Some(id.clone()),
            ..document.clone()
        };
        let ack = self.append(&identity.user_id, Collection::Documents, record, |snapshot, record| {
            if let Snapshot::Documents(rows) = snapshot {
                rows.push(record);
            }
        })?;
        Ok(WriteAck { id: Some(id), ..ack })
    }
}

impl SnapshotFeed for MemoryStore {
    fn subscribe(&self, user: &UserId, collection: Collection) -> Result<Listener, ApiError> {
        let path = self.path(user, collection);
        let rx = slot(&mut self.lock(), &path, collection).subscribe();
        debug!(%path, "listener attached");
        Ok(listen(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LeaveType;
    use chrono::{NaiveDate, Utc};

    fn leave(day: u32) -> LeaveRequest {
        LeaveRequest {
            id: None,
            leave_type: LeaveType::Casual,
            start_date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            reason: Some("errand".into()),
            status: "Pending".into(),
            submitted_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let store = MemoryStore::new("hrms");
        store.signup("Ana@Example.com", "hunter22").await.unwrap();

        let identity = store.login("ana@example.com", "hunter22").await.unwrap();
        assert_eq!(identity.method, SignInMethod::Password);

        let err = store.login("ana@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.backend_message(), Some("Invalid username or password."));

        let dup = store.signup("ana@example.com", "another1").await.unwrap_err();
        assert!(dup.to_string().starts_with("Email already in use"));
    }

    #[tokio::test]
    async fn weak_password_and_bad_email_are_refused() {
        let store = MemoryStore::new("hrms");
        assert!(store.signup("no-at-sign", "longenough").await.is_err());
        assert!(store.signup("a@b.c", "short").await.is_err());
    }

    #[tokio::test]
    async fn custom_token_maps_to_its_user() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-token");
        let token = store.issue_custom_token(&user);

        let identity = store.sign_in_with_token(&token).await.unwrap();
        assert_eq!(identity.user_id, user);
        assert!(store.sign_in_with_token("forged").await.is_err());
    }

    #[tokio::test]
    async fn listener_sees_current_state_then_changes() {
        let store = MemoryStore::new("hrms");
        let identity = store.sign_in_anonymously().await.unwrap();

        let mut listener = store.subscribe(&identity.user_id, Collection::Leaves).unwrap();
        assert_eq!(listener.next().await, Some(Ok(Snapshot::Leaves(vec![]))));

        let ack = store.add_leave(&identity, &leave(3)).await.unwrap();
        match listener.next().await {
            Some(Ok(Snapshot::Leaves(rows))) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].id, ack.id);
            }
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[tokio::test]
    async fn revoked_listener_gets_one_error_then_ends() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-1");

        let mut listener = store.subscribe(&user, Collection::Feedback).unwrap();
        let _ = listener.next().await;

        store.revoke_access(&user, Collection::Feedback, "Missing or insufficient permissions.");

        assert!(matches!(listener.next().await, Some(Err(ApiError::Denied(_)))));
        assert!(listener.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_listener_detaches_it() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-1");

        let listener = store.subscribe(&user, Collection::Documents).unwrap();
        assert_eq!(store.listener_count(&user, Collection::Documents), 1);
        drop(listener);
        assert_eq!(store.listener_count(&user, Collection::Documents), 0);
    }

    #[test]
    fn paths_are_scoped_by_app_and_user() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-1");
        assert_eq!(store.path(&user, Collection::Leaves), "artifacts/hrms/users/u-1/leaves");
        assert_eq!(
            store.path(&user, Collection::Profile),
            "artifacts/hrms/users/u-1/profile/myProfile"
        );
    }
}
