//! Signed, time-limited access tokens.
//!
//! Tokens are HS256 JWTs whose subject is the username. The signing secret
//! and the token lifetime live in [`TokenKeys`], which is built once at
//! startup and handed to whoever issues or checks tokens.

use crate::{model::user::UserHandle, util::PositiveDuration};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use time::UtcDateTime;

pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;
pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("The token has expired")]
    Expired,
    #[error("The token is invalid: {0}")]
    Invalid(JwtError),
    #[error("Encoding the token failed: {0}")]
    Encode(JwtError),
    #[error("The token expiry is out of range")]
    ExpiryOutOfRange,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserHandle,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: PositiveDuration,
}

impl AccessToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &[u8], ttl: PositiveDuration) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, subject: &UserHandle) -> Result<AccessToken, TokenError> {
        self.issue_at(subject, UtcDateTime::now())
    }

    pub fn issue_at(
        &self,
        subject: &UserHandle,
        issued_at: UtcDateTime,
    ) -> Result<AccessToken, TokenError> {
        let expires_at = issued_at
            .checked_add(self.ttl.get())
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = Claims {
            sub: subject.clone(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding)
            .map(AccessToken)
            .map_err(TokenError::Encode)
    }

    /// Checks signature, algorithm and expiry. Does not check that the
    /// subject still exists.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            })
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken").field(&"[redacted]").finish()
    }
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::user::UserHandle,
        token::{TokenError, TokenKeys},
        util::PositiveDuration,
    };
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use time::{Duration, UtcDateTime, macros::utc_datetime};

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(
            secret.as_bytes(),
            PositiveDuration::new(Duration::minutes(30)).unwrap(),
        )
    }

    fn alice() -> UserHandle {
        UserHandle::new("alice".to_owned())
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys("secret");
        let issued_at = UtcDateTime::now();

        let token = keys.issue_at(&alice(), issued_at).unwrap();
        let claims = keys.verify(token.as_str()).unwrap();

        assert_eq!(claims.sub, alice());
        assert_eq!(claims.iat, issued_at.unix_timestamp());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("secret");
        let issued_at = UtcDateTime::now() - Duration::minutes(31);

        let token = keys.issue_at(&alice(), issued_at).unwrap();

        assert!(matches!(
            keys.verify(token.as_str()),
            Err(TokenError::Expired)
        ));

        let ancient = keys
            .issue_at(&alice(), utc_datetime!(2001-01-01 00:00))
            .unwrap();
        assert!(matches!(
            keys.verify(ancient.as_str()),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = keys("other secret").issue(&alice()).unwrap();

        assert!(matches!(
            keys("secret").verify(token.as_str()),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = keys("secret");
        let token = keys.issue(&alice()).unwrap().into_inner();
        let forged_payload = keys.issue(&UserHandle::new("mallory".to_owned()));
        let forged_payload = forged_payload.unwrap().into_inner();

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload.split('.').nth(1).unwrap();
        let forged = parts.join(".");

        assert!(matches!(keys.verify(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let keys = keys("secret");
        let claims = keys.verify(keys.issue(&alice()).unwrap().as_str()).unwrap();

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = keys("secret");

        for token in ["", "not a token", "a.b.c", "...."] {
            assert!(matches!(keys.verify(token), Err(TokenError::Invalid(_))));
        }
    }

    #[test]
    fn debug_output_is_redacted() {
        let keys = keys("very secret");
        let token = keys.issue(&alice()).unwrap();

        assert!(!format!("{keys:?}").contains("very secret"));
        assert!(!format!("{token:?}").contains(token.as_str()));
    }
}
