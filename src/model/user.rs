use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Opaque per-user identifier issued by the identity provider.
///
/// Every read and write is scoped by it; the client never makes one up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignInMethod {
    Password,
    Anonymous,
    CustomToken,
}

/// The signed-in user as the portal sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    pub method: SignInMethod,
}

impl Identity {
    pub fn anonymous(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            id_token: None,
            access_token: None,
            method: SignInMethod::Anonymous,
        }
    }
}
