const MIN_LEN: usize = 8;
const SPECIALS: &str = "!@#$%^&*()";

pub const POLICY_MESSAGE: &str = "Password must be at least 8 characters long and include numbers, uppercase, lowercase, and special characters.";

/// Signup password policy mirrored from the identity provider, checked before
/// the signup call so the user sees the rule instead of a provider error.
pub fn meets_policy(password: &str) -> bool {
    password.chars().count() >= MIN_LEN
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| SPECIALS.contains(c))
}
