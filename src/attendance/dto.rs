use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::ranking::{RankEntry, Window};

/// Query parameters are kept as raw strings so bad input falls back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct TimetableQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub window: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub window: Window,
    pub from: String,
    pub to: String,
    pub entries: Vec<RankEntry>,
}

#[derive(Debug, Serialize)]
pub struct Rankings {
    pub day: Vec<RankEntry>,
    pub week: Vec<RankEntry>,
    pub month: Vec<RankEntry>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub today: String,
    pub clocked_in: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub open_since: Option<OffsetDateTime>,
    pub rankings: Rankings,
}
