use anyhow::Context;
use serde::Serialize;
use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::{
    local_day::{day_end, format_date, hhmm, local_date, minute_of_day, span, MINUTES_PER_DAY},
    repo_types::SessionWithUser,
    store::AttendanceStore,
};

const TICK_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub label: String,
    pub position_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub start: String,
    /// `"now"` while the session is running.
    pub end: String,
    pub top_percent: f64,
    pub height_percent: f64,
    pub is_running: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableUser {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTimetable {
    pub day: String,
    pub ticks: Vec<Tick>,
    pub users: Vec<TimetableUser>,
    pub blocks: Vec<Block>,
}

fn percent_of_day(minutes: u32) -> f64 {
    minutes as f64 / MINUTES_PER_DAY as f64 * 100.0
}

/// Labels every 30 minutes from 00:00 through 24:00.
pub fn ticks() -> Vec<Tick> {
    (0..=MINUTES_PER_DAY)
        .step_by(TICK_MINUTES as usize)
        .map(|m| Tick {
            label: format!("{:02}:{:02}", m / 60, m % 60),
            position_percent: percent_of_day(m),
        })
        .collect()
}

/// Lays out the sessions that start on local date `day`. Running sessions end at `now`.
pub fn project_day(
    day: Date,
    sessions: &[SessionWithUser],
    now: OffsetDateTime,
    offset: UtcOffset,
) -> DayTimetable {
    let mut blocks = Vec::new();
    let mut users: Vec<TimetableUser> = Vec::new();
    let midnight = day_end(day, offset);

    for s in sessions.iter().filter(|s| local_date(s.start_at, offset) == day) {
        let is_running = s.end_at.is_none();
        let end_at = s.end_at.unwrap_or(now);

        let start_min = minute_of_day(s.start_at, offset);
        let end_min = match midnight {
            Some(m) if end_at >= m => MINUTES_PER_DAY,
            _ if end_at < s.start_at => start_min,
            _ => minute_of_day(end_at, offset),
        };

        blocks.push(Block {
            session_id: s.id,
            user_id: s.user_id,
            display_name: s.display_name.clone(),
            start: hhmm(s.start_at, offset),
            end: if is_running {
                "now".to_string()
            } else {
                hhmm(end_at, offset)
            },
            top_percent: percent_of_day(start_min),
            height_percent: percent_of_day(end_min.saturating_sub(start_min)),
            is_running,
        });

        if !users.iter().any(|u| u.id == s.user_id) {
            users.push(TimetableUser {
                id: s.user_id,
                display_name: s.display_name.clone(),
            });
        }
    }
    users.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));

    DayTimetable {
        day: format_date(day),
        ticks: ticks(),
        users,
        blocks,
    }
}

pub async fn timetable(
    store: &dyn AttendanceStore,
    day: Date,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> anyhow::Result<DayTimetable> {
    let (from, until) =
        span(day, day, offset).with_context(|| format!("no timetable for {day}"))?;
    let sessions = store.sessions_started_between(from, until).await?;
    Ok(project_day(day, &sessions, now, offset))
}
