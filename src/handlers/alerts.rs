// src/handlers/alerts.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Paginated},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, Writer},
    },
    models::alert::{AlertListQuery, AlertView},
};

#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "Alerts",
    params(AlertListQuery),
    responses(
        (status = 200, description = "Alerts, active ones unless a status is given", body = Paginated<AlertView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_alerts(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<AlertListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let alerts = app_state.alert_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(alerts)))
}

#[utoipa::path(
    get,
    path = "/api/alerts/{id}",
    tag = "Alerts",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert", body = AlertView),
        (status = 404, description = "Alert not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_alert(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let alert = app_state.alert_service.get(&scope, id).await?;
    Ok((StatusCode::OK, Json(alert)))
}

#[utoipa::path(
    delete,
    path = "/api/alerts/{id}",
    tag = "Alerts",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert dismissed", body = AlertView),
        (status = 404, description = "Alert not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn dismiss_alert(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let alert = app_state.alert_service.dismiss(&scope, id).await?;
    Ok((StatusCode::OK, Json(alert)))
}
