use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use body::Json;
use postboard_common::{
    model::{Id, auth::PasswordHashError, post::PostMarker, user::UserMarker},
    token::{TokenError, TokenKeys},
};
use postboard_db::client::{DbClient, DbError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tower_http::trace::TraceLayer;
use tracing::error;

mod auth;
mod body;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub token_keys: Arc<TokenKeys>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub fn app(state: ServerState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("Incoming form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided token was invalid: {0}")]
    InvalidToken(TokenError),
    #[error("The token subject does not exist")]
    UnknownTokenSubject,
    #[error("Issuing a token failed: {0}")]
    TokenIssue(TokenError),
    #[error("Incorrect username or password")]
    IncorrectCredentials,
    #[error("Unsupported grant type {0:?}")]
    UnsupportedGrantType(String),
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error("Blocking task failed: {0}")]
    BlockingTask(#[from] JoinError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::Database(DbError::PostNotFound(_))
            | ServerError::PostByIdNotFound(_)
            | ServerError::UserByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidToken(_)
            | ServerError::UnknownTokenSubject => StatusCode::UNAUTHORIZED,
            ServerError::JsonRejection(_)
            | ServerError::FormRejection(_)
            | ServerError::UnsupportedGrantType(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::IncorrectCredentials
            | ServerError::Database(DbError::UsernameTaken(_)) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::TokenIssue(_)
            | ServerError::PasswordHash(_)
            | ServerError::BlockingTask(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client. Internal failures stay generic and
    /// all token failures look the same.
    pub fn detail(&self) -> String {
        match self {
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                "Not authenticated".to_owned()
            }
            ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidToken(_)
            | ServerError::UnknownTokenSubject => "Could not validate credentials".to_owned(),
            ServerError::Database(DbError::UsernameTaken(_)) => {
                "Username already registered".to_owned()
            }
            err if err.status().is_server_error() => "Internal server error".to_owned(),
            err => err.to_string(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            detail: self.detail(),
        };

        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Bearer")], Json(error_response)).into_response()
        } else {
            (status, Json(error_response)).into_response()
        }
    }
}
