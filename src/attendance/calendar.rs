use anyhow::Context;
use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::{
    local_day::{format_date, hhmm, local_date, span},
    repo_types::SessionWithUser,
    store::AttendanceStore,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub start: String,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
    pub date: String,
    pub in_month: bool,
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u8,
    /// Rows of seven cells, Sunday first.
    pub weeks: Vec<Vec<CalendarCell>>,
}

/// First and last displayed dates: Sunday on/before day 1 through Saturday on/after month end.
pub fn grid_bounds(year: i32, month: Month) -> anyhow::Result<(Date, Date)> {
    let first = Date::from_calendar_date(year, month, 1)
        .with_context(|| format!("invalid calendar month {year}-{}", u8::from(month)))?;
    let last = Date::from_calendar_date(year, month, month.length(year))
        .with_context(|| format!("invalid calendar month {year}-{}", u8::from(month)))?;
    let lead = first.weekday().number_days_from_sunday() as i64;
    let trail = 6 - last.weekday().number_days_from_sunday() as i64;
    let shown_first = first
        .checked_sub(Duration::days(lead))
        .with_context(|| format!("grid for {year}-{} starts out of range", u8::from(month)))?;
    let shown_last = last
        .checked_add(Duration::days(trail))
        .with_context(|| format!("grid for {year}-{} ends out of range", u8::from(month)))?;
    Ok((shown_first, shown_last))
}

/// Absolute instants covering every displayed cell of the month grid.
pub fn month_span(
    year: i32,
    month: Month,
    offset: UtcOffset,
) -> anyhow::Result<(OffsetDateTime, OffsetDateTime)> {
    let (first, last) = grid_bounds(year, month)?;
    span(first, last, offset)
        .with_context(|| format!("grid for {year}-{} is too close to the calendar edge", u8::from(month)))
}

pub fn project_month(
    year: i32,
    month: Month,
    sessions: &[SessionWithUser],
    offset: UtcOffset,
) -> anyhow::Result<MonthCalendar> {
    let (first, last) = grid_bounds(year, month)?;

    let mut cells = Vec::new();
    let mut next = Some(first);
    while let Some(date) = next.filter(|d| *d <= last) {
        let entries = sessions
            .iter()
            .filter(|s| local_date(s.start_at, offset) == date)
            .map(|s| CalendarEntry {
                session_id: s.id,
                user_id: s.user_id,
                display_name: s.display_name.clone(),
                start: hhmm(s.start_at, offset),
                end: s.end_at.map(|e| hhmm(e, offset)),
            })
            .collect();
        cells.push(CalendarCell {
            date: format_date(date),
            in_month: date.month() == month,
            entries,
        });
        next = date.next_day();
    }

    Ok(MonthCalendar {
        year,
        month: month.into(),
        weeks: cells.chunks(7).map(|w| w.to_vec()).collect(),
    })
}

pub async fn calendar(
    store: &dyn AttendanceStore,
    year: i32,
    month: Month,
    offset: UtcOffset,
) -> anyhow::Result<MonthCalendar> {
    let (from, until) = month_span(year, month, offset)?;
    let sessions = store.sessions_started_between(from, until).await?;
    project_month(year, month, &sessions, offset)
}
