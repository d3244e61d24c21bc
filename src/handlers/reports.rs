// src/handlers/reports.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, Writer},
    },
    models::{
        report::{CreateReportPayload, Report, ReportView, UpdateReportPayload},
        user::MessageResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(ListQuery),
    responses(
        (status = 200, description = "Reports with their author", body = Paginated<ReportView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reports(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let reports = app_state.report_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(reports)))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = ReportView),
        (status = 404, description = "Report not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let report = app_state.report_service.get(&scope, id).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = CreateReportPayload,
    responses(
        (status = 201, description = "Report created", body = Report),
        (status = 400, description = "Invalid report title")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_report(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report = app_state.report_service.create(&caller, &payload).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    tag = "Reports",
    request_body = UpdateReportPayload,
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report updated", body = Report),
        (status = 404, description = "Report not found or not yours")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_report(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report = app_state.report_service.update(&caller, id, &payload).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report deleted", body = MessageResponse),
        (status = 404, description = "Report not found or not yours")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_report(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.report_service.delete(&caller, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Report deleted successfully"))))
}
