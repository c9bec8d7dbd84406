use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One work interval. `end_at == None` means the user is still clocked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct AttendanceSession {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_at: Option<OffsetDateTime>,
}

impl AttendanceSession {
    pub fn is_open(&self) -> bool {
        self.end_at.is_none()
    }
}

/// Session row joined with its owner's display name, for multi-user views.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SessionWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub start_at: OffsetDateTime,
    pub end_at: Option<OffsetDateTime>,
}
