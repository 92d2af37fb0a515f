use crate::model::{Id, auth::PasswordHash};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// Public view of a user. Never carries the password hash.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: UserHandle,
}

/// A user together with the stored password hash, used only for logging in.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateUser {
    pub username: UserHandle,
    pub password_hash: PasswordHash,
}

/// A username as chosen at registration. Any string is accepted; uniqueness
/// is the store's concern.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserHandle(String);

impl UserHandle {
    #[must_use]
    pub fn new(handle: String) -> Self {
        Self(handle)
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::UserHandle;

    #[test]
    fn any_name_is_a_handle() {
        for name in [String::new(), "alice".to_owned(), "a".repeat(60), "ü".repeat(51)] {
            let handle: UserHandle = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(handle.get(), name);
            assert_eq!(serde_json::to_value(&handle).unwrap(), serde_json::json!(name));
        }
    }
}
