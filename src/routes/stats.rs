use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use chrono::Duration;

use crate::{
    dto::stats_dto::ActivityQuery, error::Result, models::stats::DailyActivity, utils::time,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Catalog and activity counters", body = AdminStats),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer" = []))
)]
pub async fn admin_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let since = time::start_of_day(time::now());
    let stats = state.stats.admin_stats(since).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/admin/activity",
    params(
        ("days" = Option<u32>, Query, description = "Look-back window in days, default 7, at most 90")
    ),
    responses(
        (status = 200, description = "Completed quizzes per day and difficulty", body = Vec<DailyActivity>),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer" = []))
)]
pub async fn quiz_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse> {
    let since = time::now() - Duration::days(i64::from(query.window_days()));
    let counts = state.stats.quiz_activity(since).await?;
    Ok(Json(DailyActivity::from_counts(counts)))
}
