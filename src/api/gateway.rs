use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{AuthApi, Collection, RecordWriter, SignupAck, Snapshot, SnapshotSource, WriteAck};
use crate::auth::jwt;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::{DocumentMetadata, FeedbackEntry, Identity, LeaveRequest, Profile, SignInMethod, UserId};
use crate::models::{
    ConfirmSignupReq, CredentialsReq, DocumentsEnvelope, FeedbackEnvelope, LeavesEnvelope,
    LoginResponse, MessageBody, ProfileEnvelope, ResendCodeReq, UserScoped,
};

/// REST gateway in front of the identity provider and the HR tables.
///
/// Every call is a single request: no retry, no backoff, no cancellation.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    forward_token: bool,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            forward_token: false,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let base_url = config
            .api_base_url
            .clone()
            .ok_or(ApiError::Unsupported("gateway without a base url"))?;
        Ok(Self::new(base_url, config.request_timeout)?.forward_token(config.forward_token))
    }

    /// Send `Authorization: Bearer <idToken>` on data calls.
    pub fn forward_token(mut self, on: bool) -> Self {
        self.forward_token = on;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        match (&identity.id_token, self.forward_token) {
            (Some(token), true) => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        identity: Option<&Identity>,
    ) -> Result<Response, ApiError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(identity) = identity {
            request = self.authorize(request, identity);
        }
        debug!(path, "POST");
        ensure_success(request.send().await?).await
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        collection: Collection,
        identity: &Identity,
    ) -> Result<T, ApiError> {
        let request = self
            .http
            .get(self.url(&collection.to_string()))
            .query(&[("userId", identity.user_id.as_str())]);
        let request = self.authorize(request, identity);

        debug!(%collection, "GET");
        let response = ensure_success(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn write<T: Serialize>(
        &self,
        path: &str,
        identity: &Identity,
        record: &T,
    ) -> Result<WriteAck, ApiError> {
        let body = UserScoped {
            user_id: &identity.user_id,
            record,
        };
        let response = self.post(path, &body, Some(identity)).await?;
        Ok(read_ack(response).await)
    }
}

/// Non-2xx → `Rejected`, carrying the body's `message` when it has one.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %text, "gateway rejected request");

    let message = serde_json::from_str::<MessageBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty());

    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
        status_text: status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string(),
    })
}

/// Writes usually answer with `{message, <kind>Id, s3Key?}`. Any 2xx is a
/// success, so a body that doesn't fit that shape only loses the ack fields.
async fn read_ack(response: Response) -> WriteAck {
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "write accepted, body unreadable");
            return WriteAck::default();
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return WriteAck::default();
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        debug!(error = %e, "write accepted, ack not recognised");
        WriteAck::default()
    })
}

#[async_trait]
impl AuthApi for GatewayClient {
    #[instrument(name = "gateway_login", skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let response = self
            .post("/auth/login", &CredentialsReq { email, password }, None)
            .await?;
        let body: LoginResponse = response.json().await?;

        // Prefer the explicit userId; fall back to the token's `sub`.
        let user_id = body
            .user_id
            .filter(|id| !id.is_empty())
            .or_else(|| body.id_token.as_deref().and_then(jwt::subject))
            .ok_or(ApiError::MissingIdentity)?;

        Ok(Identity {
            user_id: UserId::new(user_id),
            email: Some(email.to_string()),
            id_token: body.id_token,
            access_token: body.access_token,
            method: SignInMethod::Password,
        })
    }

    #[instrument(name = "gateway_signup", skip(self, password))]
    async fn signup(&self, email: &str, password: &str) -> Result<SignupAck, ApiError> {
        let response = self
            .post("/auth/signup", &CredentialsReq { email, password }, None)
            .await?;
        let body: MessageBody = response.json().await.unwrap_or_default();
        Ok(SignupAck {
            message: body.message,
        })
    }

    #[instrument(name = "gateway_confirm_signup", skip(self, code))]
    async fn confirm_signup(&self, email: &str, code: &str) -> Result<(), ApiError> {
        self.post("/auth/confirm-signup", &ConfirmSignupReq { email, code }, None)
            .await?;
        Ok(())
    }

    #[instrument(name = "gateway_resend_code", skip(self))]
    async fn resend_code(&self, email: &str) -> Result<(), ApiError> {
        self.post("/auth/resend-code", &ResendCodeReq { email }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordWriter for GatewayClient {
    async fn save_profile(
        &self,
        identity: &Identity,
        profile: &Profile,
    ) -> Result<WriteAck, ApiError> {
        self.write("/profile", identity, profile).await
    }

    async fn add_leave(
        &self,
        identity: &Identity,
        leave: &LeaveRequest,
    ) -> Result<WriteAck, ApiError> {
        self.write("/leaves", identity, leave).await
    }

    async fn add_feedback(
        &self,
        identity: &Identity,
        entry: &FeedbackEntry,
    ) -> Result<WriteAck, ApiError> {
        self.write("/feedback", identity, entry).await
    }

    async fn add_document(
        &self,
        identity: &Identity,
        document: &DocumentMetadata,
    ) -> Result<WriteAck, ApiError> {
        self.write("/documents/upload", identity, document).await
    }
}

#[async_trait]
impl SnapshotSource for GatewayClient {
    async fn fetch(
        &self,
        identity: &Identity,
        collection: Collection,
    ) -> Result<Snapshot, ApiError> {
        let snapshot = match collection {
            Collection::Profile => {
                let body: ProfileEnvelope = self.get_envelope(collection, identity).await?;
                Snapshot::Profile(body.profile)
            }
            Collection::Leaves => {
                let body: LeavesEnvelope = self.get_envelope(collection, identity).await?;
                Snapshot::Leaves(body.leaves.unwrap_or_default())
            }
            Collection::Feedback => {
                let body: FeedbackEnvelope = self.get_envelope(collection, identity).await?;
                Snapshot::Feedback(body.feedback.unwrap_or_default())
            }
            Collection::Documents => {
                let body: DocumentsEnvelope = self.get_envelope(collection, identity).await?;
                Snapshot::Documents(body.documents.unwrap_or_default())
            }
        };
        Ok(snapshot)
    }
}
