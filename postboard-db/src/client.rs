use crate::{memory::MemoryStore, postgres::PgStore};
use postboard_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CreateComment},
    like::{CreateLike, Like},
    post::{CreatePost, Post, PostMarker},
    user::{CreateUser, User, UserCredentials, UserHandle, UserMarker},
};
use sqlx::{PgPool, migrate::MigrateError};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Username {:?} is already registered", .0.get())]
    UsernameTaken(UserHandle),
    #[error("Post with id {0} does not exist")]
    PostNotFound(Id<PostMarker>),
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Running database migrations failed: {0}")]
    Migrate(#[from] MigrateError),
}

#[derive(Debug)]
enum Backend {
    Postgres(PgStore),
    Memory(MemoryStore),
}

/// Credential and content store.
///
/// Every write is a single statement. Usernames are unique and comments and
/// likes must point at an existing post; both are enforced by the backend
/// itself and reported as [`DbError::UsernameTaken`] and
/// [`DbError::PostNotFound`].
#[derive(Debug)]
pub struct DbClient {
    backend: Backend,
}

macro_rules! dispatch {
    ($self:ident.$method:ident($($arg:expr),*)) => {
        match &$self.backend {
            Backend::Postgres(store) => store.$method($($arg),*).await,
            Backend::Memory(store) => store.$method($($arg),*).await,
        }
    };
}

impl DbClient {
    /// Connects to Postgres and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        Ok(Self {
            backend: Backend::Postgres(PgStore::connect(database_url, max_connections).await?),
        })
    }

    /// Wraps an existing pool. The schema must already be migrated.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            backend: Backend::Postgres(PgStore::new(pool)),
        }
    }

    /// A fresh, empty store that lives only as long as this client.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::default()),
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory(_) => "memory",
        }
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        dispatch!(self.fetch_user(user_id))
    }

    pub async fn fetch_user_by_handle(&self, handle: &UserHandle) -> Result<Option<User>> {
        dispatch!(self.fetch_user_by_handle(handle))
    }

    pub async fn fetch_user_credentials_by_handle(
        &self,
        handle: &UserHandle,
    ) -> Result<Option<UserCredentials>> {
        dispatch!(self.fetch_user_credentials_by_handle(handle))
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        dispatch!(self.create_user(user))
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        dispatch!(self.fetch_post(post_id))
    }

    pub async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        dispatch!(self.create_post(post))
    }

    /// Returns `None` if the user does not exist.
    pub async fn fetch_user_posts(&self, user_id: Id<UserMarker>) -> Result<Option<Vec<Post>>> {
        dispatch!(self.fetch_user_posts(user_id))
    }

    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        dispatch!(self.create_comment(comment))
    }

    /// Returns `None` if the post does not exist.
    pub async fn fetch_post_comments(
        &self,
        post_id: Id<PostMarker>,
    ) -> Result<Option<Vec<Comment>>> {
        dispatch!(self.fetch_post_comments(post_id))
    }

    pub async fn create_like(&self, like: &CreateLike) -> Result<Like> {
        dispatch!(self.create_like(like))
    }

    /// Returns `None` if the post does not exist.
    pub async fn fetch_post_likes(&self, post_id: Id<PostMarker>) -> Result<Option<Vec<Like>>> {
        dispatch!(self.fetch_post_likes(post_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{DbClient, DbError};
    use postboard_common::model::{
        Id,
        auth::PasswordHash,
        comment::{CommentContent, CreateComment},
        like::CreateLike,
        post::{CreatePost, PostContent},
        user::{CreateUser, User, UserHandle},
    };

    fn create_user(username: &str) -> CreateUser {
        CreateUser {
            username: UserHandle::new(username.to_owned()),
            password_hash: PasswordHash::from_stored(format!("digest of {username}")),
        }
    }

    async fn db_with_post() -> (DbClient, User) {
        let db = DbClient::in_memory();
        let user = db.create_user(&create_user("alice")).await.unwrap();
        db.create_post(&CreatePost {
            author: user.id,
            content: PostContent {
                title: "t".to_owned(),
                content: "c".to_owned(),
            },
        })
        .await
        .unwrap();

        (db, user)
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let db = DbClient::in_memory();

        let alice = db.create_user(&create_user("alice")).await.unwrap();
        assert_eq!(alice.id, Id::new(1));

        let err = db.create_user(&create_user("alice")).await.unwrap_err();
        assert!(matches!(err, DbError::UsernameTaken(handle) if handle.get() == "alice"));

        let bob = db.create_user(&create_user("bob")).await.unwrap();
        assert_eq!(bob.id, Id::new(2));

        let credentials = db
            .fetch_user_credentials_by_handle(&alice.username)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.user, alice);
        assert_eq!(credentials.password_hash.as_str(), "digest of alice");
    }

    #[tokio::test]
    async fn user_lookups() {
        let db = DbClient::in_memory();
        let alice = db.create_user(&create_user("alice")).await.unwrap();

        assert_eq!(db.fetch_user(alice.id).await.unwrap(), Some(alice.clone()));
        assert_eq!(
            db.fetch_user_by_handle(&alice.username).await.unwrap(),
            Some(alice)
        );
        assert_eq!(db.fetch_user(Id::new(7)).await.unwrap(), None);
        assert_eq!(
            db.fetch_user_by_handle(&UserHandle::new("nobody".to_owned()))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn posts_belong_to_their_author() {
        let (db, alice) = db_with_post().await;
        let bob = db.create_user(&create_user("bob")).await.unwrap();

        let post = db.fetch_post(Id::new(1)).await.unwrap().unwrap();
        assert_eq!(post.user_id, alice.id);
        assert_eq!(post.title, "t");

        assert_eq!(db.fetch_user_posts(alice.id).await.unwrap(), Some(vec![post]));
        assert_eq!(db.fetch_user_posts(bob.id).await.unwrap(), Some(vec![]));
        assert_eq!(db.fetch_user_posts(Id::new(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn likes_are_not_deduplicated() {
        let (db, alice) = db_with_post().await;
        let like = CreateLike {
            post: Id::new(1),
            author: alice.id,
        };

        let first = db.create_like(&like).await.unwrap();
        let second = db.create_like(&like).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(
            db.fetch_post_likes(Id::new(1)).await.unwrap(),
            Some(vec![first, second])
        );
    }

    #[tokio::test]
    async fn comments_and_likes_need_an_existing_post() {
        let (db, alice) = db_with_post().await;
        let missing = Id::new(42);

        let err = db
            .create_comment(&CreateComment {
                post: missing,
                author: alice.id,
                content: CommentContent {
                    content: "hello".to_owned(),
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PostNotFound(id) if id == missing));

        let err = db
            .create_like(&CreateLike {
                post: missing,
                author: alice.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PostNotFound(id) if id == missing));

        assert_eq!(db.fetch_post_comments(missing).await.unwrap(), None);
        assert_eq!(db.fetch_post_likes(missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn comments_are_listed_per_post() {
        let (db, alice) = db_with_post().await;

        let comment = db
            .create_comment(&CreateComment {
                post: Id::new(1),
                author: alice.id,
                content: CommentContent {
                    content: "first".to_owned(),
                },
            })
            .await
            .unwrap();

        assert_eq!(comment.post_id, Id::new(1));
        assert_eq!(comment.user_id, alice.id);
        assert_eq!(
            db.fetch_post_comments(Id::new(1)).await.unwrap(),
            Some(vec![comment])
        );
    }
}
