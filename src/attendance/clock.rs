use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{repo_types::AttendanceSession, store::AttendanceStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockOutcome {
    Started(AttendanceSession),
    /// A start press while already clocked in; nothing written.
    AlreadyOpen,
    Closed(AttendanceSession),
    /// An end press with nothing open; nothing written.
    NoOpenSession,
}

/// Clocks `user_id` in at `now`. Repeated presses are benign no-ops.
pub async fn start(
    store: &dyn AttendanceStore,
    user_id: Uuid,
    now: OffsetDateTime,
) -> anyhow::Result<ClockOutcome> {
    match store.open_session(user_id, now).await? {
        Some(session) => {
            info!(%user_id, session_id = %session.id, "clocked in");
            Ok(ClockOutcome::Started(session))
        }
        None => {
            debug!(%user_id, "start ignored, session already open");
            Ok(ClockOutcome::AlreadyOpen)
        }
    }
}

/// Clocks `user_id` out of their most recent open session.
pub async fn end(
    store: &dyn AttendanceStore,
    user_id: Uuid,
    now: OffsetDateTime,
) -> anyhow::Result<ClockOutcome> {
    match store.close_session(user_id, now).await? {
        Some(session) => {
            info!(%user_id, session_id = %session.id, "clocked out");
            Ok(ClockOutcome::Closed(session))
        }
        None => {
            debug!(%user_id, "end ignored, no open session");
            Ok(ClockOutcome::NoOpenSession)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attendance::memory::MemoryAttendanceStore;
    use time::macros::datetime;

    #[tokio::test]
    async fn start_then_end_yields_one_closed_session() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("alice");

        let started = start(&store, user, datetime!(2024-05-15 00:00 UTC)).await.unwrap();
        assert!(matches!(started, ClockOutcome::Started(_)));
        let closed = end(&store, user, datetime!(2024-05-15 00:30 UTC)).await.unwrap();

        let ClockOutcome::Closed(session) = closed else {
            panic!("expected a closed session, got {closed:?}");
        };
        assert_eq!(session.start_at, datetime!(2024-05-15 00:00 UTC));
        assert_eq!(session.end_at, Some(datetime!(2024-05-15 00:30 UTC)));
        assert_eq!(store.sessions_of(user).len(), 1);
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("alice");

        start(&store, user, datetime!(2024-05-15 00:00 UTC)).await.unwrap();
        let again = start(&store, user, datetime!(2024-05-15 01:00 UTC)).await.unwrap();

        assert_eq!(again, ClockOutcome::AlreadyOpen);
        let sessions = store.sessions_of(user);
        assert_eq!(sessions.len(), 1);
        // the first start time is kept
        assert_eq!(sessions[0].start_at, datetime!(2024-05-15 00:00 UTC));
    }

    #[tokio::test]
    async fn end_without_open_session_writes_nothing() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("bob");

        let outcome = end(&store, user, datetime!(2024-05-15 09:00 UTC)).await.unwrap();
        assert_eq!(outcome, ClockOutcome::NoOpenSession);
        assert!(store.sessions_of(user).is_empty());

        start(&store, user, datetime!(2024-05-15 09:00 UTC)).await.unwrap();
        end(&store, user, datetime!(2024-05-15 10:00 UTC)).await.unwrap();
        let again = end(&store, user, datetime!(2024-05-15 11:00 UTC)).await.unwrap();
        assert_eq!(again, ClockOutcome::NoOpenSession);
        assert_eq!(
            store.sessions_of(user)[0].end_at,
            Some(datetime!(2024-05-15 10:00 UTC))
        );
    }

    #[tokio::test]
    async fn end_never_precedes_start() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("carol");

        start(&store, user, datetime!(2024-05-15 09:00 UTC)).await.unwrap();
        let outcome = end(&store, user, datetime!(2024-05-15 08:59 UTC)).await.unwrap();
        let ClockOutcome::Closed(session) = outcome else {
            panic!("expected a closed session");
        };
        assert!(session.end_at.unwrap() >= session.start_at);
    }

    #[tokio::test]
    async fn end_closes_the_latest_open_session() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("dave");
        // legacy data with two open rows
        store.insert(user, datetime!(2024-05-14 09:00 UTC), None);
        store.insert(user, datetime!(2024-05-15 09:00 UTC), None);

        let outcome = end(&store, user, datetime!(2024-05-15 10:00 UTC)).await.unwrap();
        let ClockOutcome::Closed(session) = outcome else {
            panic!("expected a closed session");
        };
        assert_eq!(session.start_at, datetime!(2024-05-15 09:00 UTC));
    }

    #[tokio::test]
    async fn actions_only_touch_the_callers_sessions() {
        let store = MemoryAttendanceStore::new();
        let alice = store.add_user("alice");
        let bob = store.add_user("bob");

        start(&store, alice, datetime!(2024-05-15 09:00 UTC)).await.unwrap();
        assert_eq!(
            end(&store, bob, datetime!(2024-05-15 10:00 UTC)).await.unwrap(),
            ClockOutcome::NoOpenSession
        );
        assert!(store.sessions_of(alice)[0].is_open());
    }

    #[tokio::test]
    async fn concurrent_starts_open_at_most_one_session() {
        let store = Arc::new(MemoryAttendanceStore::new());
        let user = store.add_user("eve");

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let now = datetime!(2024-05-15 09:00 UTC) + time::Duration::seconds(i);
                start(&*store, user, now).await.unwrap()
            }));
        }
        let mut started = 0;
        for h in handles {
            if matches!(h.await.unwrap(), ClockOutcome::Started(_)) {
                started += 1;
            }
        }

        assert_eq!(started, 1);
        let open = store.sessions_of(user).iter().filter(|s| s.is_open()).count();
        assert_eq!(open, 1);
    }
}
