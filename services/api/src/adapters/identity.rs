//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for the third-party identity provider.
//! It implements the `IdentityVerifier` port by validating signed JWTs.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;
use tutoring_core::domain::VerifiedIdentity;
use tutoring_core::ports::{IdentityVerifier, PortError, PortResult};

/// Claims read from an identity token. Only `email` is required.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    email: Option<String>,
    sub: Option<String>,
    name: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Verifies HS256-signed identity tokens against a shared secret.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("algorithm", &"HS256")
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

impl JwtIdentityVerifier {
    /// Creates a new `JwtIdentityVerifier`.
    pub fn new(secret: &[u8], issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

//=========================================================================================
// `IdentityVerifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> PortResult<VerifiedIdentity> {
        let data = decode::<IdentityClaims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => debug!("Identity token expired"),
                    _ => debug!("Identity token rejected: {:?}", e),
                }
                PortError::Unauthorized
            })?;

        let email = data
            .claims
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .ok_or(PortError::Unauthorized)?;

        Ok(VerifiedIdentity {
            email,
            subject: data.claims.sub,
            name: data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"identity-test-secret-at-least-32-bytes";

    fn token(claims: serde_json::Value) -> String {
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_valid_token_yields_lowercased_email() {
        let verifier = JwtIdentityVerifier::new(SECRET, None, None);
        let jwt = token(json!({"email": "Alice@X.com", "sub": "u1", "exp": far_future()}));

        let identity = verifier.verify(&jwt).await.unwrap();
        assert_eq!(identity.email, "alice@x.com");
        assert_eq!(identity.subject.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_token_without_email_is_rejected() {
        let verifier = JwtIdentityVerifier::new(SECRET, None, None);
        let jwt = token(json!({"sub": "u1", "exp": far_future()}));
        assert!(matches!(verifier.verify(&jwt).await, Err(PortError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_are_rejected() {
        let verifier = JwtIdentityVerifier::new(SECRET, None, None);
        let expired = token(json!({"email": "a@x.com", "exp": 1_000}));
        assert!(matches!(verifier.verify(&expired).await, Err(PortError::Unauthorized)));

        let foreign = encode(
            &Header::new(Algorithm::HS256),
            &json!({"email": "a@x.com", "exp": far_future()}),
            &EncodingKey::from_secret(b"some-other-secret-entirely-32-bytes!"),
        )
        .unwrap();
        assert!(matches!(verifier.verify(&foreign).await, Err(PortError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_issuer_is_enforced_when_configured() {
        let verifier = JwtIdentityVerifier::new(SECRET, Some("https://id.example"), None);
        let wrong = token(json!({"email": "a@x.com", "iss": "https://evil", "exp": far_future()}));
        assert!(matches!(verifier.verify(&wrong).await, Err(PortError::Unauthorized)));

        let right =
            token(json!({"email": "a@x.com", "iss": "https://id.example", "exp": far_future()}));
        assert!(verifier.verify(&right).await.is_ok());
    }
}
