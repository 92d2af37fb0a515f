use crate::{
    client::{DbError, Result},
    record::{CommentRecord, LikeRecord, PostRecord, UserCredentialsRecord, UserRecord},
};
use postboard_common::model::{
    Id,
    comment::{Comment, CreateComment},
    like::{CreateLike, Like},
    post::{CreatePost, Post, PostMarker},
    user::{CreateUser, User, UserCredentials, UserHandle, UserMarker},
};
use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions, query_as, query_scalar};

static MIGRATOR: Migrator = sqlx::migrate!();

const COMMENTS_POST_ID_FKEY: &str = "comments_post_id_fkey";
const LIKES_POST_ID_FKEY: &str = "likes_post_id_fkey";

#[derive(Clone, Debug)]
pub(crate) struct PgStore {
    pool: PgPool,
}

/// Turns a foreign key violation on `post_id` into [`DbError::PostNotFound`].
fn map_missing_post(err: sqlx::Error, constraint: &str, post_id: Id<PostMarker>) -> DbError {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.is_foreign_key_violation() && db_err.constraint() == Some(constraint) =>
        {
            DbError::PostNotFound(post_id)
        }
        err => DbError::Sqlx(err),
    }
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_id, username
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(i64::from(user_id))
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_id, username
            FROM users
            WHERE username = $1
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn fetch_user_credentials_by_handle(
        &self,
        handle: &UserHandle,
    ) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, UserCredentialsRecord>(
            "
            SELECT user_id, username, password_hash
            FROM users
            WHERE username = $1
            ",
        )
        .bind(handle.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(UserCredentials::try_from).transpose()?;
        Ok(credentials)
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING user_id, username
            ",
        )
        .bind(user.username.get())
        .bind(user.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::UsernameTaken(user.username.clone())
            }
            err => DbError::Sqlx(err),
        })?;

        Ok(User::try_from(record)?)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT post_id, title, content, user_id
            FROM posts
            WHERE post_id = $1
            ",
        )
        .bind(i64::from(post_id))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            "
            INSERT INTO posts (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING post_id, title, content, user_id
            ",
        )
        .bind(&post.content.title)
        .bind(&post.content.content)
        .bind(i64::from(post.author))
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    pub async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Option<Vec<Post>>> {
        if !self.user_exists(user_id).await? {
            return Ok(None);
        }

        let records = query_as::<_, PostRecord>(
            "
            SELECT post_id, title, content, user_id
            FROM posts
            WHERE user_id = $1
            ORDER BY post_id
            ",
        )
        .bind(i64::from(user_id))
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(posts))
    }

    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let record = query_as::<_, CommentRecord>(
            "
            INSERT INTO comments (content, post_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING comment_id, content, post_id, user_id
            ",
        )
        .bind(&comment.content.content)
        .bind(i64::from(comment.post))
        .bind(i64::from(comment.author))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_missing_post(err, COMMENTS_POST_ID_FKEY, comment.post))?;

        Ok(Comment::try_from(record)?)
    }

    pub async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
    ) -> Result<Option<Vec<Comment>>> {
        if !self.post_exists(post_id).await? {
            return Ok(None);
        }

        let records = query_as::<_, CommentRecord>(
            "
            SELECT comment_id, content, post_id, user_id
            FROM comments
            WHERE post_id = $1
            ORDER BY comment_id
            ",
        )
        .bind(i64::from(post_id))
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(comments))
    }

    pub async fn create_like(&self, like: &CreateLike) -> Result<Like> {
        let record = query_as::<_, LikeRecord>(
            "
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            RETURNING like_id, post_id, user_id
            ",
        )
        .bind(i64::from(like.post))
        .bind(i64::from(like.author))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_missing_post(err, LIKES_POST_ID_FKEY, like.post))?;

        Ok(Like::try_from(record)?)
    }

    pub async fn fetch_post_likes(&self, post_id: Id<PostMarker>) -> Result<Option<Vec<Like>>> {
        if !self.post_exists(post_id).await? {
            return Ok(None);
        }

        let records = query_as::<_, LikeRecord>(
            "
            SELECT like_id, post_id, user_id
            FROM likes
            WHERE post_id = $1
            ORDER BY like_id
            ",
        )
        .bind(i64::from(post_id))
        .fetch_all(&self.pool)
        .await?;

        let likes = records
            .into_iter()
            .map(Like::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Some(likes))
    }

    async fn user_exists(&self, user_id: Id<UserMarker>) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)",
            i64::from(user_id),
        )
        .await
    }

    async fn post_exists(&self, post_id: Id<PostMarker>) -> Result<bool> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = $1)",
            i64::from(post_id),
        )
        .await
    }

    async fn exists(&self, query: &'static str, id: i64) -> Result<bool> {
        let exists = query_scalar::<_, bool>(query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
