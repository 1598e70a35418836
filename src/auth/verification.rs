//! Signup → code entry → verified. Linear, no expiry, no lockout.

use tracing::debug;

pub const CODE_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VerificationState {
    #[default]
    AwaitingSignup,
    AwaitingCode {
        email: String,
    },
    Verified {
        email: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationReject {
    NoPendingEmail,
    BadCodeLength,
}

impl VerificationReject {
    pub fn message(&self, action: &str) -> String {
        match self {
            VerificationReject::NoPendingEmail => {
                format!("No email found {action}. Please sign up again.")
            }
            VerificationReject::BadCodeLength => {
                "Please enter a valid 6-digit verification code.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationFlow {
    state: VerificationState,
}

impl VerificationFlow {
    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    /// Email waiting for a code, if any.
    pub fn pending_email(&self) -> Option<&str> {
        match &self.state {
            VerificationState::AwaitingCode { email } => Some(email),
            _ => None,
        }
    }

    /// Signup succeeded and the provider sent a code.
    pub fn code_sent(&mut self, email: &str) {
        debug!(email, "awaiting verification code");
        self.state = VerificationState::AwaitingCode {
            email: email.to_string(),
        };
    }

    /// Signup succeeded on a backend that verifies nothing.
    pub fn skip_to_verified(&mut self, email: &str) {
        self.state = VerificationState::Verified {
            email: email.to_string(),
        };
    }

    /// Local checks before a confirm call. Returns the email the code is for.
    pub fn check_code(&self, code: &str) -> Result<&str, VerificationReject> {
        let email = self
            .pending_email()
            .ok_or(VerificationReject::NoPendingEmail)?;
        if code.chars().count() != CODE_LEN {
            return Err(VerificationReject::BadCodeLength);
        }
        Ok(email)
    }

    /// The confirm call succeeded.
    pub fn confirmed(&mut self) -> Option<String> {
        let email = self.pending_email()?.to_string();
        self.state = VerificationState::Verified {
            email: email.clone(),
        };
        Some(email)
    }

    pub fn reset(&mut self) {
        self.state = VerificationState::AwaitingSignup;
    }
}
