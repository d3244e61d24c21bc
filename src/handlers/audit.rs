// src/handlers/audit.rs

use axum::{
    extract::{Multipart, Path, Query, State},
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
    handlers::upload::{read_file, upload_error},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole, Writer},
    },
    models::{
        audit::{
            AuditChecklist, AuditChecklistView, AuditMessageResponse, CreateAuditChecklistPayload,
            EvidenceUploadForm, UpdateAuditChecklistPayload,
        },
        user::MessageResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/audit-checklist",
    tag = "Audit Checklist",
    params(ListQuery),
    responses(
        (status = 200, description = "Checklist items", body = Paginated<AuditChecklistView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_checklist(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let items = app_state.audit_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(items)))
}

#[utoipa::path(
    get,
    path = "/api/audit-checklist/{id}",
    tag = "Audit Checklist",
    params(("id" = Uuid, Path, description = "Checklist item id")),
    responses(
        (status = 200, description = "Checklist item", body = AuditChecklistView),
        (status = 404, description = "Checklist item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_checklist_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let item = app_state.audit_service.get(&scope, id).await?;
    Ok((StatusCode::OK, Json(item)))
}

#[utoipa::path(
    post,
    path = "/api/audit-checklist",
    tag = "Audit Checklist",
    request_body = CreateAuditChecklistPayload,
    responses(
        (status = 201, description = "Checklist item created", body = AuditChecklist),
        (status = 400, description = "Invalid data")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_checklist_item(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateAuditChecklistPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let item = app_state.audit_service.create(&scope, &payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/api/audit-checklist/{id}",
    tag = "Audit Checklist",
    request_body = UpdateAuditChecklistPayload,
    params(("id" = Uuid, Path, description = "Checklist item id")),
    responses(
        (status = 200, description = "Checklist item updated", body = AuditMessageResponse),
        (status = 403, description = "Staff cannot reassign items"),
        (status = 404, description = "Checklist item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_checklist_item(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAuditChecklistPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let data = app_state.audit_service.update(&scope, id, &payload).await?;
    Ok((
        StatusCode::OK,
        Json(AuditMessageResponse { message: "Audit checklist item updated successfully.".into(), data }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/audit-checklist/{id}",
    tag = "Audit Checklist",
    params(("id" = Uuid, Path, description = "Checklist item id")),
    responses(
        (status = 200, description = "Checklist item deleted", body = MessageResponse),
        (status = 404, description = "Checklist item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_checklist_item(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    app_state.audit_service.delete(&scope, id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Audit checklist item deleted successfully.")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/audit-checklist/{id}/evidence",
    tag = "Audit Checklist",
    request_body(content = EvidenceUploadForm, content_type = "multipart/form-data"),
    params(("id" = Uuid, Path, description = "Checklist item id")),
    responses(
        (status = 200, description = "Evidence replaced", body = AuditMessageResponse),
        (status = 400, description = "Rejected upload")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_evidence(
    State(app_state): State<AppState>,
    _: RequireRole<Writer>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some("evidence") {
            files.push(read_file(field).await?);
        }
    }

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let data = app_state.audit_service.upload_evidence(&scope, id, &files).await?;
    Ok((
        StatusCode::OK,
        Json(AuditMessageResponse { message: "Evidence uploaded successfully.".into(), data }),
    ))
}
