use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo_types::{AttendanceSession, SessionWithUser},
    store::AttendanceStore,
};

/// In-process store; the open-session check and the write happen under one lock.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    sessions: Mutex<Vec<AttendanceSession>>,
    names: Mutex<HashMap<Uuid, String>>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, display_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.names.lock().unwrap().insert(id, display_name.to_string());
        id
    }

    /// Seeds a session directly, bypassing the clock rules.
    pub fn insert(&self, user_id: Uuid, start_at: OffsetDateTime, end_at: Option<OffsetDateTime>) {
        self.sessions.lock().unwrap().push(AttendanceSession {
            id: Uuid::new_v4(),
            user_id,
            start_at,
            end_at,
        });
    }

    pub fn sessions_of(&self, user_id: Uuid) -> Vec<AttendanceSession> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn open_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.iter().any(|s| s.user_id == user_id && s.is_open()) {
            return Ok(None);
        }
        let session = AttendanceSession {
            id: Uuid::new_v4(),
            user_id,
            start_at: at,
            end_at: None,
        };
        sessions.push(session.clone());
        Ok(Some(session))
    }

    async fn close_session(
        &self,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<AttendanceSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        let latest = sessions
            .iter_mut()
            .filter(|s| s.user_id == user_id && s.is_open())
            .max_by_key(|s| s.start_at);
        Ok(latest.map(|s| {
            s.end_at = Some(at.max(s.start_at));
            s.clone()
        }))
    }

    async fn find_open_session(&self, user_id: Uuid) -> anyhow::Result<Option<AttendanceSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.is_open())
            .max_by_key(|s| s.start_at)
            .cloned())
    }

    async fn display_name(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        Ok(self.names.lock().unwrap().get(&user_id).cloned())
    }

    async fn sessions_started_between(
        &self,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<SessionWithUser>> {
        let names = self.names.lock().unwrap();
        let mut rows: Vec<SessionWithUser> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.start_at >= from && s.start_at < until)
            .filter_map(|s| {
                names.get(&s.user_id).map(|name| SessionWithUser {
                    id: s.id,
                    user_id: s.user_id,
                    display_name: name.clone(),
                    start_at: s.start_at,
                    end_at: s.end_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
