use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user. `password` holds the bcrypt hash and is never sent
/// back to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}
