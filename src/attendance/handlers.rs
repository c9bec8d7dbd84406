use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use time::{Date, Month, OffsetDateTime, UtcOffset};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

use super::{
    calendar::{self, month_span, MonthCalendar},
    clock,
    dto::{CalendarQuery, HomeResponse, RankingQuery, RankingResponse, Rankings, TimetableQuery},
    local_day::{format_date, local_date, parse_date},
    ranking::{self, Window},
    timetable::{self, DayTimetable},
};

const AFTER_CLOCK_ACTION: &str = "/timetable";

// --- public routers ---

pub fn clock_routes() -> Router<AppState> {
    Router::new()
        .route("/attendance/start", post(start))
        .route("/attendance/end", post(end))
        // older clients post here
        .route("/work/start", post(start))
        .route("/work/end", post(end))
}

pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/timetable", get(timetable_view))
        .route("/calendar", get(calendar_view))
        .route("/ranking", get(ranking_view))
}

// --- query fallbacks ---

/// A missing or malformed `date` means today, and so does a date whose
/// `window` would run off the supported calendar.
fn resolve_date(raw: Option<&str>, today: Date, window: Window, offset: UtcOffset) -> Date {
    let Some(s) = raw.filter(|s| !s.trim().is_empty()) else {
        return today;
    };
    match parse_date(s) {
        Some(date) if window.bounds(date, offset).is_some() => date,
        Some(date) => {
            warn!(%date, ?window, "date at the calendar edge, using today");
            today
        }
        None => {
            warn!(date = %s, "unparseable date, using today");
            today
        }
    }
}

/// A missing, malformed or unrepresentable year/month means the month containing `today`.
fn resolve_month(q: &CalendarQuery, today: Date, offset: UtcOffset) -> (i32, Month) {
    let year = q.year.as_deref().and_then(|y| y.trim().parse::<i32>().ok());
    let month = q
        .month
        .as_deref()
        .and_then(|m| m.trim().parse::<u8>().ok())
        .and_then(|m| Month::try_from(m).ok());
    match (year, month) {
        (Some(y), Some(m)) if month_span(y, m, offset).is_ok() => (y, m),
        _ => (today.year(), today.month()),
    }
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn start(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Redirect, AppError> {
    clock::start(&*state.store, user_id, OffsetDateTime::now_utc()).await?;
    Ok(Redirect::to(AFTER_CLOCK_ACTION))
}

#[instrument(skip(state))]
pub async fn end(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Redirect, AppError> {
    clock::end(&*state.store, user_id, OffsetDateTime::now_utc()).await?;
    Ok(Redirect::to(AFTER_CLOCK_ACTION))
}

#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HomeResponse>, AppError> {
    let store = &*state.store;
    let display_name = store
        .display_name(user_id)
        .await?
        .ok_or(AppError::AuthenticationRequired)?;

    let now = OffsetDateTime::now_utc();
    let offset = state.config.utc_offset;
    let today = local_date(now, offset);

    let open = store.find_open_session(user_id).await?;
    let rankings = Rankings {
        day: ranking::ranking(store, Window::Day, today, now, offset).await?,
        week: ranking::ranking(store, Window::Week, today, now, offset).await?,
        month: ranking::ranking(store, Window::Month, today, now, offset).await?,
    };

    Ok(Json(HomeResponse {
        user_id,
        display_name,
        today: format_date(today),
        clocked_in: open.is_some(),
        open_since: open.map(|s| s.start_at),
        rankings,
    }))
}

#[instrument(skip(state))]
pub async fn timetable_view(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<TimetableQuery>,
) -> Result<Json<DayTimetable>, AppError> {
    let now = OffsetDateTime::now_utc();
    let offset = state.config.utc_offset;
    let day = resolve_date(q.date.as_deref(), local_date(now, offset), Window::Day, offset);
    let view = timetable::timetable(&*state.store, day, now, offset).await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn calendar_view(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<MonthCalendar>, AppError> {
    let offset = state.config.utc_offset;
    let (year, month) = resolve_month(&q, local_date(OffsetDateTime::now_utc(), offset), offset);
    let view = calendar::calendar(&*state.store, year, month, offset).await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn ranking_view(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, AppError> {
    let now = OffsetDateTime::now_utc();
    let offset = state.config.utc_offset;
    let window = Window::parse_or_default(q.window.as_deref());
    let as_of = resolve_date(q.date.as_deref(), local_date(now, offset), window, offset);

    let entries = ranking::ranking(&*state.store, window, as_of, now, offset).await?;
    Ok(Json(RankingResponse {
        window,
        from: format_date(window.first_day(as_of).unwrap_or(as_of)),
        to: format_date(as_of),
        entries,
    }))
}
