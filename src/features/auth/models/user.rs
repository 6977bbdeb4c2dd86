use sqlx::FromRow;

/// Database model for a registered user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// PHC-formatted Argon2id hash, never the raw password
    pub password_hash: String,
}

/// Data for inserting a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
