use thiserror::Error;

/// Failure talking to a backend. Cloneable so it can travel inside sync events.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Non-2xx response. Shows the body's `message` field, or the status text without one.
    #[error("{}", .message.as_deref().unwrap_or(.status_text.as_str()))]
    Rejected {
        status: u16,
        message: Option<String>,
        status_text: String,
    },

    #[error("{0}")]
    Network(String),

    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Store-side refusal on the push path (rules, revoked listener, unknown user)
    #[error("{0}")]
    Denied(String),

    #[error("login response carried neither a userId nor a usable id token")]
    MissingIdentity,

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

impl ApiError {
    /// The `message` a backend attached to a rejection, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            ApiError::Denied(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// What a portal operation reports back to its caller.
///
/// Every variant has already been turned into a notice or auth message by the
/// time the caller sees it; the value is for control flow and tests.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PortalError {
    #[error("{0}")]
    NotSignedIn(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type PortalResult<T> = Result<T, PortalError>;
