//! Stateless identity tokens: HS256 JWTs bound to a user id.
//!
//! Validity is purely a function of signature and expiry. There is no
//! server-side revocation: a leaked token stays valid until `exp`
//! unless the signing secret is rotated.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id the token is bound to.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Issues and verifies identity tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Config("JWT secret must not be empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.token_leeway_secs;
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            lifetime: Duration::seconds(config.token_lifetime_secs as i64),
        })
    }

    /// Lifetime of newly issued tokens, in seconds.
    pub fn lifetime_secs(&self) -> u64 {
        self.lifetime.num_seconds().max(0) as u64
    }

    /// Issue a token for `subject`, valid from now.
    pub fn issue(&self, subject: Uuid) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if it had been minted at `issued_at`.
    pub fn issue_at(&self, subject: Uuid, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Decode and verify a token, returning its full claims.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Verify a token and return the subject it is bound to.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.decode(token)?;
        Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("subject is not a UUID: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            jwt_issuer: "neurofetch-test".into(),
            token_leeway_secs: 0,
            ..Default::default()
        }
    }

    #[test]
    fn issue_then_verify_returns_subject() {
        let svc = TokenService::new(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let token = svc.issue(user_id).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn token_expires_after_lifetime() {
        let svc = TokenService::new(&test_config()).unwrap();
        let issued_at = Utc::now() - Duration::hours(25);

        let token = svc.issue_at(Uuid::new_v4(), issued_at).unwrap();
        let err = svc.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)), "got {err:?}");
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let config = AuthConfig {
            token_leeway_secs: 120,
            ..test_config()
        };
        let svc = TokenService::new(&config).unwrap();
        // Expired one minute ago, inside the two-minute leeway.
        let issued_at = Utc::now() - Duration::hours(24) - Duration::minutes(1);

        let token = svc.issue_at(Uuid::new_v4(), issued_at).unwrap();
        assert!(svc.verify(&token).is_ok());
    }

    #[test]
    fn lifetime_defaults_to_one_day() {
        let svc = TokenService::new(&test_config()).unwrap();
        assert_eq!(svc.lifetime_secs(), 86_400);

        let token = svc.issue(Uuid::new_v4()).unwrap();
        let claims = svc.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert_eq!(claims.iss, "neurofetch-test");
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let svc = TokenService::new(&test_config()).unwrap();
        let other = TokenService::new(&AuthConfig {
            jwt_secret: "another-secret".into(),
            ..test_config()
        })
        .unwrap();

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(svc.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let svc = TokenService::new(&test_config()).unwrap();
        assert!(matches!(
            svc.verify("not.a.token"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(svc.verify(""), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn jti_is_unique() {
        let svc = TokenService::new(&test_config()).unwrap();
        let uid = Uuid::new_v4();

        let c1 = svc.decode(&svc.issue(uid).unwrap()).unwrap();
        let c2 = svc.decode(&svc.issue(uid).unwrap()).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let config = AuthConfig {
            jwt_secret: String::new(),
            ..test_config()
        };
        assert!(matches!(
            TokenService::new(&config),
            Err(AuthError::Config(_))
        ));
    }
}
