//! Helpers that turn stored instants into local calendar days and minutes.
//!
//! Every function takes the configured offset explicitly so start-of-day,
//! end-of-day and "now" are always judged in the same zone.

use time::{macros::format_description, Date, Duration, OffsetDateTime, UtcOffset};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

const EDGE_SLACK: Duration = Duration::days(2);

pub fn local_date(instant: OffsetDateTime, offset: UtcOffset) -> Date {
    instant.to_offset(offset).date()
}

/// Local midnight of `date`, as an absolute instant.
pub fn day_start(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

/// Local midnight of the day after `date`. `None` on the last representable date.
pub fn day_end(date: Date, offset: UtcOffset) -> Option<OffsetDateTime> {
    date.next_day().map(|next| day_start(next, offset))
}

/// Absolute range from local midnight of `first` up to local midnight after `last`.
///
/// Offsets reach past a full day, so both edges need two spare days inside the
/// supported calendar before they can be shifted to UTC. `None` otherwise.
pub fn span(first: Date, last: Date, offset: UtcOffset) -> Option<(OffsetDateTime, OffsetDateTime)> {
    let until = last.next_day()?;
    if first.checked_sub(EDGE_SLACK).is_none() || until.checked_add(EDGE_SLACK).is_none() {
        return None;
    }
    Some((day_start(first, offset), day_start(until, offset)))
}

pub fn minute_of_day(instant: OffsetDateTime, offset: UtcOffset) -> u32 {
    let local = instant.to_offset(offset);
    local.hour() as u32 * 60 + local.minute() as u32
}

pub fn hhmm(instant: OffsetDateTime, offset: UtcOffset) -> String {
    let local = instant.to_offset(offset);
    format!("{:02}:{:02}", local.hour(), local.minute())
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
