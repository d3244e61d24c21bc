// src/handlers/activity.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::activity::ActivityLogView,
};

#[utoipa::path(
    get,
    path = "/api/activity-logs",
    tag = "Activity",
    params(ListQuery),
    responses(
        (status = 200, description = "Recorded write requests", body = Paginated<ActivityLogView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_activity_logs(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let logs = app_state.activity_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(logs)))
}
