use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Which backend the portal talks to. Also picks the sync strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// REST gateway, pull-based sync
    Gateway,
    /// In-process document store, push-based sync
    Memory,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub api_base_url: Option<String>,
    pub app_id: Option<String>,
    pub initial_auth_token: Option<String>,
    pub anonymous_sign_in: bool,

    // Signup
    pub require_verification: bool,
    pub password_policy: bool,

    pub forward_token: bool,
    pub refresh_after_submit: bool,
    pub session_file: Option<PathBuf>,
    pub document_url_base: String,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend: BackendKind = parse_or(&get, "HR_BACKEND", BackendKind::Gateway)?;

        let api_base_url = get("HR_API_BASE_URL").map(|url| url.trim_end_matches('/').to_string());
        let app_id = get("HR_APP_ID");

        match backend {
            BackendKind::Gateway if api_base_url.is_none() => {
                return Err(ConfigError::Missing("HR_API_BASE_URL"));
            }
            BackendKind::Memory if app_id.is_none() => {
                return Err(ConfigError::Missing("HR_APP_ID"));
            }
            _ => {}
        }

        let timeout_secs: u64 = parse_or(&get, "HR_REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            backend,
            api_base_url,
            app_id,
            initial_auth_token: get("HR_INITIAL_AUTH_TOKEN"),
            anonymous_sign_in: parse_or(&get, "HR_ANONYMOUS_SIGN_IN", false)?,
            require_verification: parse_or(&get, "HR_REQUIRE_VERIFICATION", true)?,
            password_policy: parse_or(&get, "HR_PASSWORD_POLICY", true)?,
            forward_token: parse_or(&get, "HR_FORWARD_TOKEN", false)?,
            refresh_after_submit: parse_or(&get, "HR_REFRESH_AFTER_SUBMIT", true)?,
            session_file: get("HR_SESSION_FILE").map(PathBuf::from),
            document_url_base: get("HR_DOCUMENT_URL_BASE")
                .unwrap_or_else(|| "https://hrms-documents.s3.amazonaws.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            log_dir: get("HR_LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs")),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
