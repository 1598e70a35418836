use serde::{Deserialize, Serialize};

use crate::model::{DocumentMetadata, FeedbackEntry, LeaveRequest, Profile, UserId};
use crate::utils::{record_id, rows};

#[derive(Serialize)]
pub struct CredentialsReq<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct ConfirmSignupReq<'a> {
    pub email: &'a str,
    pub code: &'a str,
}

#[derive(Serialize)]
pub struct ResendCodeReq<'a> {
    pub email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    pub message: Option<String>,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

/// Body the gateway attaches to every answer, successful or not.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageBody {
    pub message: Option<String>,
}

/// Acknowledgement of a write. Which id field is set depends on the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteAck {
    pub message: Option<String>,
    #[serde(
        alias = "leaveId",
        alias = "feedbackId",
        alias = "documentId",
        deserialize_with = "record_id::deserialize"
    )]
    pub id: Option<String>,
    #[serde(rename = "s3Key")]
    pub storage_key: Option<String>,
}

/// `{ "userId": ..., ...record }`, the shape every gateway write takes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScoped<'a, T: Serialize> {
    pub user_id: &'a UserId,
    #[serde(flatten)]
    pub record: &'a T,
}

/* =========================
   GET envelopes. A missing key means "nothing yet"; an unreadable row is
   skipped.
========================= */

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileEnvelope {
    pub profile: Option<Profile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeavesEnvelope {
    #[serde(deserialize_with = "rows::deserialize")]
    pub leaves: Option<Vec<LeaveRequest>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackEnvelope {
    #[serde(deserialize_with = "rows::deserialize")]
    pub feedback: Option<Vec<FeedbackEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocumentsEnvelope {
    #[serde(deserialize_with = "rows::deserialize")]
    pub documents: Option<Vec<DocumentMetadata>>,
}

/// The part of an identity-provider id token the client reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<usize>,
}
