use crate::model::{Id, post::PostMarker, user::UserMarker};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub content: String,
    pub post_id: Id<PostMarker>,
    pub user_id: Id<UserMarker>,
}

/// What clients see of a comment. The post is implied by the route.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PartialComment {
    pub id: Id<CommentMarker>,
    pub content: String,
    pub user_id: Id<UserMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CommentContent {
    pub content: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateComment {
    pub post: Id<PostMarker>,
    pub author: Id<UserMarker>,
    pub content: CommentContent,
}

impl From<Comment> for PartialComment {
    fn from(value: Comment) -> Self {
        Self {
            id: value.id,
            content: value.content,
            user_id: value.user_id,
        }
    }
}
