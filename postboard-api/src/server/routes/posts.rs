use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, body::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use postboard_common::model::{
    Id,
    comment::{CommentContent, CreateComment, PartialComment},
    like::{CreateLike, PartialLike},
    post::{CreatePost, Post, PostContent, PostMarker},
};
use postboard_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_post(add_comment)
        .typed_get(get_post_comments)
        .typed_post(like_post)
        .typed_get(get_post_likes)
}

#[derive(TypedPath)]
#[typed_path("/posts/")]
struct CreatePostPath;

async fn create_post(
    CreatePostPath: CreatePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(content): Json<PostContent>,
) -> Result<Json<Post>> {
    let post = db
        .create_post(&CreatePost {
            author: user.user_id(),
            content,
        })
        .await?;

    info!(post_id = %post.id, user = user.user().username.get(), "Created post");

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

async fn add_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(content): Json<CommentContent>,
) -> Result<Json<PartialComment>> {
    let comment = db
        .create_comment(&CreateComment {
            post: id,
            author: user.user_id(),
            content,
        })
        .await?;

    debug!(comment_id = %comment.id, post_id = %id, "Added comment");

    Ok(Json(comment.into()))
}

async fn get_post_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<PartialComment>>> {
    let comments = db
        .fetch_post_comments(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(comments.into_iter().map(PartialComment::from).collect()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePostPath {
    id: Id<PostMarker>,
}

async fn like_post(
    LikePostPath { id }: LikePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<PartialLike>> {
    let like = db
        .create_like(&CreateLike {
            post: id,
            author: user.user_id(),
        })
        .await?;

    debug!(like_id = %like.id, post_id = %id, "Liked post");

    Ok(Json(like.into()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/likes", rejection(ServerError))]
struct PostLikesPath {
    id: Id<PostMarker>,
}

async fn get_post_likes(
    PostLikesPath { id }: PostLikesPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<PartialLike>>> {
    let likes = db
        .fetch_post_likes(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(likes.into_iter().map(PartialLike::from).collect()))
}
