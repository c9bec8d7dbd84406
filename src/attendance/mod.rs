pub mod calendar;
pub mod clock;
mod dto;
pub mod handlers;
pub mod local_day;
#[cfg(test)]
pub mod memory;
pub mod ranking;
pub mod repo_types;
pub mod store;
pub mod timetable;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::clock_routes())
        .merge(handlers::view_routes())
}
