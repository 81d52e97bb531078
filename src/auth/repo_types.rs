use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,                // stored trimmed and lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2, never exposed in JSON
    pub created_at: OffsetDateTime,
}
