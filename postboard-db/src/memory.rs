use crate::client::{DbError, Result};
use postboard_common::model::{
    Id,
    comment::{Comment, CommentMarker, CreateComment},
    like::{CreateLike, Like, LikeMarker},
    post::{CreatePost, Post, PostMarker},
    user::{CreateUser, User, UserCredentials, UserHandle, UserMarker},
};
use tokio::sync::Mutex;

#[derive(Debug)]
struct Table<Row, Marker> {
    rows: Vec<Row>,
    last_id: Id<Marker>,
}

impl<Row, Marker> Default for Table<Row, Marker> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            last_id: Id::new(0),
        }
    }
}

impl<Row: Clone, Marker> Table<Row, Marker> {
    fn insert_with(&mut self, make_row: impl FnOnce(Id<Marker>) -> Row) -> Row {
        self.last_id = Id::new(self.last_id.get() + 1);
        let row = make_row(self.last_id);
        self.rows.push(row.clone());
        row
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<UserCredentials, UserMarker>,
    posts: Table<Post, PostMarker>,
    comments: Table<Comment, CommentMarker>,
    likes: Table<Like, LikeMarker>,
}

impl Tables {
    fn user_exists(&self, user_id: Id<UserMarker>) -> bool {
        self.users.rows.iter().any(|row| row.user.id == user_id)
    }

    fn post_exists(&self, post_id: Id<PostMarker>) -> bool {
        self.posts.rows.iter().any(|row| row.id == post_id)
    }
}

/// Process-local store with the same constraints as the Postgres schema.
/// Every operation runs under one lock, so the uniqueness and foreign key
/// checks can't race with concurrent writes.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let tables = self.tables.lock().await;

        Ok(tables
            .users
            .rows
            .iter()
            .find(|row| row.user.id == user_id)
            .map(|row| row.user.clone()))
    }

    pub async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let credentials = self.fetch_user_credentials_by_handle(handle).await?;
        Ok(credentials.map(|credentials| credentials.user))
    }

    pub async fn fetch_user_credentials_by_handle(
        &self,
        handle: &UserHandle,
    ) -> Result<Option<UserCredentials>> {
        let tables = self.tables.lock().await;

        Ok(tables
            .users
            .rows
            .iter()
            .find(|row| &row.user.username == handle)
            .cloned())
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables.lock().await;

        if tables
            .users
            .rows
            .iter()
            .any(|row| row.user.username == user.username)
        {
            return Err(DbError::UsernameTaken(user.username.clone()));
        }

        let credentials = tables.users.insert_with(|id| UserCredentials {
            user: User {
                id,
                username: user.username.clone(),
            },
            password_hash: user.password_hash.clone(),
        });

        Ok(credentials.user)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables.lock().await;

        Ok(tables
            .posts
            .rows
            .iter()
            .find(|row| row.id == post_id)
            .cloned())
    }

    pub async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut tables = self.tables.lock().await;

        Ok(tables.posts.insert_with(|id| Post {
            id,
            title: post.content.title.clone(),
            content: post.content.content.clone(),
            user_id: post.author,
        }))
    }

    pub async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Option<Vec<Post>>> {
        let tables = self.tables.lock().await;

        if !tables.user_exists(user_id) {
            return Ok(None);
        }

        Ok(Some(
            tables
                .posts
                .rows
                .iter()
                .filter(|row| row.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let mut tables = self.tables.lock().await;

        if !tables.post_exists(comment.post) {
            return Err(DbError::PostNotFound(comment.post));
        }

        Ok(tables.comments.insert_with(|id| Comment {
            id,
            content: comment.content.content.clone(),
            post_id: comment.post,
            user_id: comment.author,
        }))
    }

    pub async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
    ) -> Result<Option<Vec<Comment>>> {
        let tables = self.tables.lock().await;

        if !tables.post_exists(post_id) {
            return Ok(None);
        }

        Ok(Some(
            tables
                .comments
                .rows
                .iter()
                .filter(|row| row.post_id == post_id)
                .cloned()
                .collect(),
        ))
    }

    pub async fn create_like(&self, like: &CreateLike) -> Result<Like> {
        let mut tables = self.tables.lock().await;

        if !tables.post_exists(like.post) {
            return Err(DbError::PostNotFound(like.post));
        }

        Ok(tables.likes.insert_with(|id| Like {
            id,
            post_id: like.post,
            user_id: like.author,
        }))
    }

    pub async fn fetch_post_likes(&self, post_id: Id<PostMarker>) -> Result<Option<Vec<Like>>> {
        let tables = self.tables.lock().await;

        if !tables.post_exists(post_id) {
            return Ok(None);
        }

        Ok(Some(
            tables
                .likes
                .rows
                .iter()
                .filter(|row| row.post_id == post_id)
                .copied()
                .collect(),
        ))
    }
}
