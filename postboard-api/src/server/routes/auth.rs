use crate::server::{
    Result, ServerError, ServerRouter,
    body::{Form, Json},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use postboard_common::{
    model::{
        auth::{ClearTextPassword, PasswordHash, verify_login},
        user::{CreateUser, UserCredentials, UserHandle},
    },
    token::{AccessToken, TOKEN_TYPE, TokenKeys},
};
use postboard_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::info;

const PASSWORD_GRANT_TYPE: &str = "password";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login_for_access_token)
}

#[derive(TypedPath)]
#[typed_path("/register")]
struct RegisterPath;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: UserHandle,
    password: ClearTextPassword,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    username: UserHandle,
}

async fn register(
    RegisterPath: RegisterPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let RegisterRequest { username, password } = request;

    let password_hash = spawn_blocking(move || PasswordHash::hash(&password)).await??;
    let user = db
        .create_user(&CreateUser {
            username,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "Registered user");

    Ok(Json(RegisterResponse {
        username: user.username,
    }))
}

#[derive(TypedPath)]
#[typed_path("/token")]
struct TokenPath;

/// OAuth2 password grant form. Clients may omit `grant_type`.
#[derive(Debug, Deserialize)]
struct LoginForm {
    username: UserHandle,
    password: ClearTextPassword,
    grant_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: AccessToken,
    token_type: &'static str,
}

async fn login_for_access_token(
    TokenPath: TokenPath,
    State(db): State<Arc<DbClient>>,
    State(keys): State<Arc<TokenKeys>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>> {
    let LoginForm {
        username,
        password,
        grant_type,
    } = form;

    if let Some(grant_type) = grant_type
        && grant_type != PASSWORD_GRANT_TYPE
    {
        return Err(ServerError::UnsupportedGrantType(grant_type));
    }

    let credentials = db.fetch_user_credentials_by_handle(&username).await?;

    // Unknown users still go through argon2 so response times don't tell
    // them apart from wrong passwords.
    let stored_hash = credentials
        .as_ref()
        .map(|credentials| credentials.password_hash.clone());
    let password_matches =
        spawn_blocking(move || verify_login(stored_hash.as_ref(), &password)).await?;

    let Some(UserCredentials { user, .. }) = credentials.filter(|_| password_matches) else {
        return Err(ServerError::IncorrectCredentials);
    };

    let access_token = keys
        .issue(&user.username)
        .map_err(ServerError::TokenIssue)?;

    info!(user_id = %user.id, "Issued access token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE,
    }))
}
