use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::{local_day::span, repo_types::SessionWithUser, store::AttendanceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Day,
    Week,
    Month,
}

impl Window {
    /// Unknown or missing values fall back to `Day`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("week") => Window::Week,
            Some("month") => Window::Month,
            _ => Window::Day,
        }
    }

    /// First local date of the window ending at `as_of` (inclusive).
    pub fn first_day(self, as_of: Date) -> Option<Date> {
        match self {
            Window::Day => Some(as_of),
            Window::Week => as_of
                .checked_sub(Duration::days(as_of.weekday().number_days_from_monday() as i64)),
            Window::Month => as_of.replace_day(1).ok(),
        }
    }

    /// Instants bounding the window, or `None` when it runs off the supported calendar.
    pub fn bounds(self, as_of: Date, offset: UtcOffset) -> Option<(OffsetDateTime, OffsetDateTime)> {
        span(self.first_day(as_of)?, as_of, offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub user_id: Uuid,
    pub display_name: String,
    pub hours: f64,
}

/// Sums `(end or now) - start` per user and orders by hours descending,
/// ties by user id ascending. Users without sessions never appear.
pub fn rank(sessions: &[SessionWithUser], now: OffsetDateTime) -> Vec<RankEntry> {
    let mut totals: HashMap<Uuid, (String, Duration)> = HashMap::new();
    for s in sessions {
        let elapsed = (s.end_at.unwrap_or(now) - s.start_at).max(Duration::ZERO);
        let entry = totals
            .entry(s.user_id)
            .or_insert_with(|| (s.display_name.clone(), Duration::ZERO));
        entry.1 += elapsed;
    }

    let mut ordered: Vec<(Uuid, String, Duration)> = totals
        .into_iter()
        .map(|(id, (name, total))| (id, name, total))
        .collect();
    ordered.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    ordered
        .into_iter()
        .map(|(user_id, display_name, total)| RankEntry {
            user_id,
            display_name,
            hours: total.as_seconds_f64() / 3600.0,
        })
        .collect()
}

/// Leaderboard for the window ending on local date `as_of`.
pub async fn ranking(
    store: &dyn AttendanceStore,
    window: Window,
    as_of: Date,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> anyhow::Result<Vec<RankEntry>> {
    let (from, until) = window
        .bounds(as_of, offset)
        .with_context(|| format!("no {window:?} window ends on {as_of}"))?;
    let sessions = store.sessions_started_between(from, until).await?;
    Ok(rank(&sessions, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::memory::MemoryAttendanceStore;
    use time::macros::{date, datetime, offset};

    #[test]
    fn window_first_days() {
        // 2024-05-15 is a Wednesday
        let wed = date!(2024 - 05 - 15);
        assert_eq!(Window::Day.first_day(wed), Some(wed));
        assert_eq!(Window::Week.first_day(wed), Some(date!(2024 - 05 - 13)));
        assert_eq!(Window::Month.first_day(wed), Some(date!(2024 - 05 - 01)));
        // a Monday is its own week start; a Sunday belongs to the week before
        assert_eq!(Window::Week.first_day(date!(2024 - 05 - 13)), Some(date!(2024 - 05 - 13)));
        assert_eq!(Window::Week.first_day(date!(2024 - 05 - 19)), Some(date!(2024 - 05 - 13)));
    }

    #[test]
    fn windows_at_the_calendar_edges_have_no_bounds() {
        let early = Date::from_calendar_date(-9999, time::Month::January, 15).unwrap();
        assert!(Window::Day.bounds(early, offset!(+9)).is_some());
        assert_eq!(Window::Month.bounds(early, offset!(+9)), None);
        // -9999-01-01 is a Monday, so the week of the 3rd starts on the first representable day
        let third = Date::from_calendar_date(-9999, time::Month::January, 3).unwrap();
        assert_eq!(Window::Week.bounds(third, offset!(+9)), None);
        for window in [Window::Day, Window::Week, Window::Month] {
            assert_eq!(window.bounds(Date::MAX, offset!(+9)), None);
        }
    }

    #[tokio::test]
    async fn ranking_past_the_calendar_end_is_an_error() {
        let store = MemoryAttendanceStore::new();
        let res = ranking(
            &store,
            Window::Day,
            Date::MAX,
            datetime!(2024-05-15 12:00 UTC),
            offset!(+9),
        )
        .await;
        assert!(res.is_err());
    }

    #[test]
    fn malformed_window_falls_back_to_day() {
        assert_eq!(Window::parse_or_default(Some("WEEK")), Window::Week);
        assert_eq!(Window::parse_or_default(Some("month")), Window::Month);
        assert_eq!(Window::parse_or_default(Some("fortnight")), Window::Day);
        assert_eq!(Window::parse_or_default(None), Window::Day);
    }

    #[tokio::test]
    async fn empty_day_ranks_nobody() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("alice");
        store.insert(
            user,
            datetime!(2024-05-14 00:00 UTC),
            Some(datetime!(2024-05-14 01:00 UTC)),
        );

        let rows = ranking(
            &store,
            Window::Day,
            date!(2024 - 05 - 15),
            datetime!(2024-05-15 12:00 UTC),
            offset!(UTC),
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn orders_by_hours_then_user_id() {
        let store = MemoryAttendanceStore::new();
        let a = store.add_user("a");
        let b = store.add_user("b");
        let c = store.add_user("c");
        let day = datetime!(2024-05-15 00:00 UTC);
        store.insert(a, day, Some(day + Duration::hours(2)));
        store.insert(b, day, Some(day + Duration::hours(3)));
        store.insert(c, day, Some(day + Duration::hours(2)));

        let rows = ranking(
            &store,
            Window::Day,
            date!(2024 - 05 - 15),
            datetime!(2024-05-15 23:00 UTC),
            offset!(UTC),
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].user_id, b);
        assert_eq!(rows[0].hours, 3.0);
        let (lo, hi) = if a < c { (a, c) } else { (c, a) };
        assert_eq!(rows[1].user_id, lo);
        assert_eq!(rows[2].user_id, hi);
        assert_eq!(rows[2].hours, 2.0);
    }

    #[tokio::test]
    async fn open_session_accumulates_against_now() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("runner");
        store.insert(user, datetime!(2024-05-15 09:00 UTC), None);

        let mut last = 0.0;
        for minutes in [0, 30, 90, 240] {
            let now = datetime!(2024-05-15 09:00 UTC) + Duration::minutes(minutes);
            let rows = ranking(&store, Window::Day, date!(2024 - 05 - 15), now, offset!(UTC))
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert!(rows[0].hours >= last);
            assert_eq!(rows[0].hours, minutes as f64 / 60.0);
            last = rows[0].hours;
        }
    }

    #[tokio::test]
    async fn week_and_month_sum_sessions_through_as_of() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("alice");
        // Sunday before the week, Monday, Wednesday (as_of), Thursday (after as_of)
        for (start, hours) in [
            (datetime!(2024-05-12 09:00 UTC), 1),
            (datetime!(2024-05-13 09:00 UTC), 2),
            (datetime!(2024-05-15 09:00 UTC), 3),
            (datetime!(2024-05-16 09:00 UTC), 4),
        ] {
            store.insert(user, start, Some(start + Duration::hours(hours)));
        }
        let now = datetime!(2024-05-20 00:00 UTC);
        let as_of = date!(2024 - 05 - 15);

        let week = ranking(&store, Window::Week, as_of, now, offset!(UTC)).await.unwrap();
        assert_eq!(week[0].hours, 5.0);
        let month = ranking(&store, Window::Month, as_of, now, offset!(UTC)).await.unwrap();
        assert_eq!(month[0].hours, 6.0);
    }

    #[tokio::test]
    async fn day_window_uses_the_configured_offset() {
        let store = MemoryAttendanceStore::new();
        let user = store.add_user("tokyo");
        // 2024-05-15 08:00 in +09:00, but still the 14th in UTC
        let start = datetime!(2024-05-14 23:00 UTC);
        store.insert(user, start, Some(start + Duration::hours(1)));
        let now = datetime!(2024-05-15 12:00 UTC);

        let tokyo = ranking(&store, Window::Day, date!(2024 - 05 - 15), now, offset!(+9))
            .await
            .unwrap();
        assert_eq!(tokyo.len(), 1);
        let utc = ranking(&store, Window::Day, date!(2024 - 05 - 15), now, offset!(UTC))
            .await
            .unwrap();
        assert!(utc.is_empty());
    }
}
