//! Secret hashing and verification using Argon2id.
//!
//! Hashing uses OWASP-recommended parameters (memory: 19 MiB,
//! iterations: 2, parallelism: 1) with a random salt per hash. An
//! optional pepper is prepended to the secret on both paths.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::DbError;

fn peppered_input<'a>(secret: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{secret}");
            buf.as_bytes()
        }
        None => secret.as_bytes(),
    }
}

/// Hash a secret into an Argon2id PHC string.
pub fn hash_secret(secret: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut buf = String::new();
    let input = peppered_input(secret, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| DbError::Hash(format!("hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a secret against an Argon2id PHC-format hash.
///
/// Returns `Ok(false)` on mismatch and `Err(DbError::Hash)` if the
/// stored hash is malformed. Parameters are read from the PHC string.
pub fn verify_secret(secret: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
    let mut buf = String::new();
    let input = peppered_input(secret, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| DbError::Hash(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_secret_matches() {
        let hash = hash_secret("hunter2", None).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_secret_does_not_match() {
        let hash = hash_secret("hunter2", None).unwrap();
        assert!(!verify_secret("wrong", &hash, None).unwrap());
    }

    #[test]
    fn same_secret_hashes_differently() {
        let a = hash_secret("hunter2", None).unwrap();
        let b = hash_secret("hunter2", None).unwrap();
        assert_ne!(a, b, "salt must differ per hash");
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_secret("hunter2", Some("pepper!")).unwrap();
        assert!(verify_secret("hunter2", &hash, Some("pepper!")).unwrap());
        assert!(!verify_secret("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        let result = verify_secret("pw", "not-a-hash", None);
        assert!(matches!(result, Err(DbError::Hash(_))));
    }
}
