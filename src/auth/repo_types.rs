use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                       // unique user ID
    pub display_name: String,           // shown in rankings and timetables
    pub username: Option<String>,       // local login name, unset for social-login users
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,  // Argon2 hash, not exposed in JSON
    pub external_id: Option<String>,    // social-login subject
    pub created_at: OffsetDateTime,     // creation timestamp
}
