use serde::{Deserialize, Serialize};

/// A row of the `users` dimension.
///
/// `level` is the only mutable attribute; reloading a user overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
}
