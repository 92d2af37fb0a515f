use crate::server::{Result, ServerError};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use postboard_common::{
    model::{
        Id,
        user::{User, UserMarker},
    },
    token::TokenKeys,
};
use postboard_db::client::DbClient;
use std::sync::Arc;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The user a request acts as, resolved from its bearer token.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(&self) -> Id<UserMarker> {
        self.user.id
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }
}

/// Verifies the token and looks its subject up. A token for a user that
/// doesn't exist is as invalid as a forged one.
pub async fn resolve_current_user(db: &DbClient, keys: &TokenKeys, token: &str) -> Result<User> {
    let claims = keys.verify(token).map_err(ServerError::InvalidToken)?;

    db.fetch_user_by_handle(&claims.sub)
        .await?
        .ok_or(ServerError::UnknownTokenSubject)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    Arc<TokenKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(ServerError::InvalidAuthorizationHeader)?;

        let db = Arc::<DbClient>::from_ref(state);
        let keys = Arc::<TokenKeys>::from_ref(state);

        let user = resolve_current_user(&db, &keys, header.token()).await?;

        Ok(Self { user })
    }
}
