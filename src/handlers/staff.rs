// src/handlers/staff.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::ListQuery},
    config::AppState,
    handlers::upload::{read_file, read_text, upload_error},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole, Writer},
    },
    models::{
        staff::{CreateStaffPayload, StaffDetail, StaffListResponse, StaffMessageResponse, StaffRecordsForm, UpdateStaffPayload},
        user::MessageResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Staff",
    params(ListQuery),
    responses(
        (status = 200, description = "Staff page plus compliance summary", body = StaffListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_staff(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let response = app_state.staff_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff detail", body = StaffDetail),
        (status = 404, description = "Staff not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_staff(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let detail = app_state.staff_service.detail(&scope, id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/staff",
    tag = "Staff",
    request_body = CreateStaffPayload,
    responses(
        (status = 201, description = "Staff created", body = StaffMessageResponse),
        (status = 409, description = "Staff with this email already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_staff(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let staff = app_state.staff_service.create(&caller, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(StaffMessageResponse { message: "Staff created successfully".into(), staff }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}",
    tag = "Staff",
    request_body = UpdateStaffPayload,
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff updated", body = StaffMessageResponse),
        (status = 404, description = "Staff not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStaffPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let staff = app_state.staff_service.update(&scope, id, &payload).await?;
    Ok((
        StatusCode::OK,
        Json(StaffMessageResponse { message: "Staff updated successfully".into(), staff }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Staff deleted", body = MessageResponse),
        (status = 404, description = "Staff not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_staff(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    app_state.staff_service.delete(&scope, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Staff deleted successfully"))))
}

#[utoipa::path(
    post,
    path = "/api/staff/{id}/update-records",
    tag = "Staff",
    request_body(content = StaffRecordsForm, content_type = "multipart/form-data"),
    params(("id" = Uuid, Path, description = "Staff id")),
    responses(
        (status = 200, description = "Records updated", body = StaffMessageResponse),
        (status = 400, description = "Rejected upload or malformed employment history")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_staff_records(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut certificates = Vec::new();
    let mut employment_history = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("certificates") => certificates.push(read_file(field).await?),
            Some("employmentHistory") => employment_history = Some(read_text(field).await?),
            _ => {}
        }
    }

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let staff = app_state
        .staff_service
        .update_records(&scope, id, &certificates, employment_history.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        Json(StaffMessageResponse { message: "Staff records updated successfully".into(), staff }),
    ))
}
