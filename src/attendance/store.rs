use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{AttendanceSession, SessionWithUser};

/// Persistence for attendance sessions.
///
/// `open_session` and `close_session` must each be a single atomic step: the
/// "is anything open?" check and the write cannot be split across calls.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts an open session starting at `at`, unless the user already has one.
    /// Returns `None` when a session was already open.
    async fn open_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>>;

    /// Closes the user's most recent open session at `max(at, start_at)`.
    /// Returns `None` when nothing was open.
    async fn close_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>>;

    async fn find_open_session(&self, user_id: Uuid) -> anyhow::Result<Option<AttendanceSession>>;

    /// Display name of a registered user; `None` for unknown ids.
    async fn display_name(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;

    /// All sessions with `from <= start_at < until`, oldest first.
    async fn sessions_started_between(
        &self,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<SessionWithUser>>;
}

#[derive(Clone)]
pub struct PgAttendanceStore {
    db: PgPool,
}

impl PgAttendanceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn open_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>> {
        // Conflicts on the partial unique index `attendance_one_open_per_user`.
        let row = sqlx::query_as::<_, AttendanceSession>(
            r#"
            INSERT INTO attendance (user_id, start_at, end_at)
            VALUES ($1, $2, NULL)
            ON CONFLICT (user_id) WHERE end_at IS NULL DO NOTHING
            RETURNING id, user_id, start_at, end_at
            "#,
        )
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.db)
        .await
        .context("insert open attendance session")?;
        Ok(row)
    }

    async fn close_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>> {
        let row = sqlx::query_as::<_, AttendanceSession>(
            r#"
            UPDATE attendance
               SET end_at = GREATEST($2, start_at)
             WHERE id = (
                    SELECT id
                      FROM attendance
                     WHERE user_id = $1 AND end_at IS NULL
                     ORDER BY start_at DESC
                     LIMIT 1
                       FOR UPDATE
                   )
               AND end_at IS NULL
            RETURNING id, user_id, start_at, end_at
            "#,
        )
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.db)
        .await
        .context("close open attendance session")?;
        Ok(row)
    }

    async fn find_open_session(&self, user_id: Uuid) -> anyhow::Result<Option<AttendanceSession>> {
        let row = sqlx::query_as::<_, AttendanceSession>(
            r#"
            SELECT id, user_id, start_at, end_at
              FROM attendance
             WHERE user_id = $1 AND end_at IS NULL
             ORDER BY start_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find open attendance session")?;
        Ok(row)
    }

    async fn display_name(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT display_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .context("look up display name")?;
        Ok(name)
    }

    async fn sessions_started_between(
        &self,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<SessionWithUser>> {
        let rows = sqlx::query_as::<_, SessionWithUser>(
            r#"
            SELECT a.id, a.user_id, u.display_name, a.start_at, a.end_at
              FROM attendance a
              JOIN users u ON u.id = a.user_id
             WHERE a.start_at >= $1 AND a.start_at < $2
             ORDER BY a.start_at ASC, a.id ASC
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await
        .context("list attendance sessions in range")?;
        Ok(rows)
    }
}
