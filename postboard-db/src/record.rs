use postboard_common::model::{
    ModelValidationError,
    auth::PasswordHash,
    comment::Comment,
    like::Like,
    post::Post,
    user::{User, UserCredentials, UserHandle},
};
use sqlx::FromRow;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserCredentialsRecord {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct LikeRecord {
    pub like_id: i64,
    pub post_id: i64,
    pub user_id: i64,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.try_into()?,
            username: UserHandle::new(value.username),
        })
    }
}

impl TryFrom<UserCredentialsRecord> for UserCredentials {
    type Error = ModelValidationError;

    fn try_from(value: UserCredentialsRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: User {
                id: value.user_id.try_into()?,
                username: UserHandle::new(value.username),
            },
            password_hash: PasswordHash::from_stored(value.password_hash),
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.try_into()?,
            title: value.title,
            content: value.content,
            user_id: value.user_id.try_into()?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.try_into()?,
            content: value.content,
            post_id: value.post_id.try_into()?,
            user_id: value.user_id.try_into()?,
        })
    }
}

impl TryFrom<LikeRecord> for Like {
    type Error = ModelValidationError;

    fn try_from(value: LikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.like_id.try_into()?,
            post_id: value.post_id.try_into()?,
            user_id: value.user_id.try_into()?,
        })
    }
}
