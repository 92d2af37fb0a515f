use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHash as PhcHash, SaltString},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const PASSWORD_SALT_LEN: usize = 16;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(password_hash::Error);

/// A plaintext password as received from a client.
#[derive(Clone, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ClearTextPassword(String);

/// Argon2 digest of a password in PHC string format, salt included.
#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl ClearTextPassword {
    #[must_use]
    pub fn new(password: String) -> Self {
        Self(password)
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl PasswordHash {
    /// Hashes the password with a fresh random salt.
    pub fn hash(password: &ClearTextPassword) -> Result<Self, PasswordHashError> {
        let salt_bytes: [u8; PASSWORD_SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordHashError)?;

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(Self(hash.to_string()))
    }

    /// Wraps a digest loaded from storage. It is not parsed here, a malformed
    /// digest simply never verifies.
    #[must_use]
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let Ok(parsed) = PhcHash::new(&self.0) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Checks a login attempt against the stored hash, if there is one. Without a
/// stored hash the password is hashed anyway so that an unknown user costs as
/// much argon2 work as a wrong password.
#[must_use]
pub fn verify_login(stored: Option<&PasswordHash>, password: &ClearTextPassword) -> bool {
    match stored {
        Some(hash) => hash.verify(password),
        None => {
            let _ = PasswordHash::hash(password);
            false
        }
    }
}

impl Debug for ClearTextPassword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[redacted]")
            .finish()
    }
}

impl Debug for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::auth::{ClearTextPassword, PasswordHash, verify_login};

    #[test]
    fn hash_and_verify() {
        let password = ClearTextPassword::new("pw1".to_owned());
        let hash = PasswordHash::hash(&password).unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hash.verify(&password));
        assert!(!hash.verify(&ClearTextPassword::new("pw2".to_owned())));
        assert!(!hash.verify(&ClearTextPassword::new(String::new())));
    }

    #[test]
    fn salts_differ() {
        let password = ClearTextPassword::new("same password".to_owned());

        let first = PasswordHash::hash(&password).unwrap();
        let second = PasswordHash::hash(&password).unwrap();

        assert_ne!(first, second);
        assert!(first.verify(&password));
        assert!(second.verify(&password));
    }

    #[test]
    fn malformed_digest_never_verifies() {
        let password = ClearTextPassword::new("pw1".to_owned());

        for digest in ["", "pw1", "$argon2id$", "$argon2id$v=19$m=19456,t=2,p=1$$"] {
            assert!(!PasswordHash::from_stored(digest.to_owned()).verify(&password));
        }
    }

    #[test]
    fn login_without_stored_hash_fails() {
        let password = ClearTextPassword::new("pw1".to_owned());
        let hash = PasswordHash::hash(&password).unwrap();

        assert!(verify_login(Some(&hash), &password));
        assert!(!verify_login(Some(&hash), &ClearTextPassword::new("pw2".to_owned())));
        assert!(!verify_login(None, &password));
        assert!(!verify_login(None, &ClearTextPassword::new(String::new())));
    }

    #[test]
    fn debug_output_is_redacted() {
        let password = ClearTextPassword::new("hunter2".to_owned());
        let hash = PasswordHash::hash(&password).unwrap();

        assert!(!format!("{password:?}").contains("hunter2"));
        assert!(!format!("{hash:?}").contains(hash.as_str()));
    }
}
