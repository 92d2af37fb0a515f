use crate::model::{Id, post::PostMarker, user::UserMarker};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LikeMarker;

/// A single like. The same user may like the same post any number of times,
/// every like gets its own id.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Like {
    pub id: Id<LikeMarker>,
    pub post_id: Id<PostMarker>,
    pub user_id: Id<UserMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PartialLike {
    pub post_id: Id<PostMarker>,
    pub user_id: Id<UserMarker>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateLike {
    pub post: Id<PostMarker>,
    pub author: Id<UserMarker>,
}

impl From<Like> for PartialLike {
    fn from(value: Like) -> Self {
        Self {
            post_id: value.post_id,
            user_id: value.user_id,
        }
    }
}
