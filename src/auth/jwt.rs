use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::models::IdTokenClaims;

/// Reads the claims of an identity-provider id token.
///
/// The signature is NOT checked: the token came straight from the login call
/// over TLS and the client only needs the `sub` claim to scope its requests.
/// Verification is the gateway's job.
pub fn read_id_token(token: &str) -> Result<IdTokenClaims, String> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| e.to_string())
}

/// The `sub` claim, i.e. the identity value, if the token carries one.
pub fn subject(token: &str) -> Option<String> {
    read_id_token(token)
        .ok()
        .map(|claims| claims.sub)
        .filter(|sub| !sub.is_empty())
}
