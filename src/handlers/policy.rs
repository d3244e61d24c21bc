// src/handlers/policy.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{ListQuery, Paginated},
    },
    config::AppState,
    handlers::upload::{read_file, read_text, upload_error},
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        policy::{PolicyFields, PolicyMessageResponse, PolicyUploadForm, PolicyView},
        user::MessageResponse,
    },
    services::document_service::UploadedFile,
};

// ---
// Multipart form parsing
// ---

fn parse_review_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|d| d.date_naive()))
        .map_err(|_| AppError::BadRequest("Invalid reviewDate: expected YYYY-MM-DD".into()))
}

/// Accepts a single id or a JSON array of ids.
fn parse_staff_ids(raw: &str) -> Result<Vec<Uuid>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        return serde_json::from_str(raw)
            .map_err(|_| AppError::BadRequest("Invalid assignedStaff: expected a JSON array of ids".into()));
    }
    Uuid::parse_str(raw)
        .map(|id| vec![id])
        .map_err(|_| AppError::BadRequest(format!("Invalid staff id: {raw}")))
}

fn apply_text_field(fields: &mut PolicyFields, name: &str, value: String) -> Result<(), AppError> {
    let non_empty = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());

    match name {
        "title" => fields.title = non_empty(value),
        "category" => fields.category = non_empty(value),
        "version" => fields.version = non_empty(value),
        "reviewDate" | "lastUpdated" => {
            if !value.trim().is_empty() {
                fields.review_date = Some(parse_review_date(&value)?);
            }
        }
        "priority" | "status" => fields.priority = non_empty(value),
        "assignedStaff" | "assignedStaff[]" => fields
            .assigned_staff
            .get_or_insert_with(Vec::new)
            .extend(parse_staff_ids(&value)?),
        _ => {}
    }
    Ok(())
}

async fn read_policy_form(mut multipart: Multipart) -> Result<(PolicyFields, Option<UploadedFile>), AppError> {
    let mut fields = PolicyFields::default();
    let mut document = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == "document" {
            document = Some(read_file(field).await?);
        } else {
            let value = read_text(field).await?;
            apply_text_field(&mut fields, &name, value)?;
        }
    }
    Ok((fields, document))
}

// ---
// Handlers
// ---

#[utoipa::path(
    get,
    path = "/api/policy",
    tag = "Policies",
    params(ListQuery),
    responses(
        (status = 200, description = "Policies with assigned staff expanded", body = Paginated<PolicyView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_policies(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let policies = app_state.policy_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(policies)))
}

#[utoipa::path(
    get,
    path = "/api/policy/{id}",
    tag = "Policies",
    params(("id" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Policy", body = PolicyView),
        (status = 404, description = "Policy not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_policy(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let policy = app_state.policy_service.get(&scope, id).await?;
    Ok((StatusCode::OK, Json(policy)))
}

#[utoipa::path(
    post,
    path = "/api/policy",
    tag = "Policies",
    request_body(content = PolicyUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Policy created", body = PolicyMessageResponse),
        (status = 400, description = "Missing fields or rejected document")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_policy(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (fields, document) = read_policy_form(multipart).await?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let policy = app_state
        .policy_service
        .create(&scope, &fields, document.as_ref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PolicyMessageResponse { message: "Policy created".into(), policy }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/policy/{id}",
    tag = "Policies",
    request_body(content = PolicyUploadForm, content_type = "multipart/form-data"),
    params(("id" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Policy updated", body = PolicyMessageResponse),
        (status = 404, description = "Policy not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_policy(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (fields, document) = read_policy_form(multipart).await?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let policy = app_state
        .policy_service
        .update(&scope, id, &fields, document.as_ref())
        .await?;

    Ok((
        StatusCode::OK,
        Json(PolicyMessageResponse { message: "Policy updated".into(), policy }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/policy/{id}",
    tag = "Policies",
    params(("id" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Policy and its document deleted", body = MessageResponse),
        (status = 404, description = "Policy not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_policy(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    app_state.policy_service.delete(&scope, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Policy deleted successfully"))))
}

#[utoipa::path(
    post,
    path = "/api/policy/{policyId}/acknowledge",
    tag = "Policies",
    params(("policyId" = Uuid, Path, description = "Policy id")),
    responses(
        (status = 200, description = "Acknowledgement recorded", body = PolicyMessageResponse),
        (status = 400, description = "Policy already acknowledged"),
        (status = 403, description = "Only staff members can acknowledge policies"),
        (status = 404, description = "Policy not found or not assigned to the caller")
    ),
    security(("api_jwt" = []))
)]
pub async fn acknowledge_policy(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(policy_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let policy = app_state.policy_service.acknowledge(&caller, policy_id).await?;
    Ok((
        StatusCode::OK,
        Json(PolicyMessageResponse { message: "Policy acknowledged".into(), policy }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternate_field_names_fill_the_same_slot() {
        let mut fields = PolicyFields::default();
        apply_text_field(&mut fields, "lastUpdated", "2030-01-15".into()).unwrap();
        apply_text_field(&mut fields, "status", "high".into()).unwrap();
        apply_text_field(&mut fields, "title", "  Fire Safety ".into()).unwrap();

        assert_eq!(fields.review_date, NaiveDate::from_ymd_opt(2030, 1, 15));
        assert_eq!(fields.priority.as_deref(), Some("high"));
        assert_eq!(fields.title.as_deref(), Some("Fire Safety"));
    }

    #[test]
    fn assigned_staff_accepts_repeats_and_json_arrays() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut fields = PolicyFields::default();

        apply_text_field(&mut fields, "assignedStaff", a.to_string()).unwrap();
        apply_text_field(&mut fields, "assignedStaff[]", format!("[\"{b}\", \"{c}\"]")).unwrap();

        assert_eq!(fields.assigned_staff, Some(vec![a, b, c]));
    }

    #[test]
    fn absent_assignment_differs_from_an_empty_one() {
        let mut fields = PolicyFields::default();
        assert_eq!(fields.assigned_staff, None);

        apply_text_field(&mut fields, "assignedStaff", "[]".into()).unwrap();
        assert_eq!(fields.assigned_staff, Some(Vec::new()));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut fields = PolicyFields::default();
        assert!(apply_text_field(&mut fields, "reviewDate", "next week".into()).is_err());
        assert!(apply_text_field(&mut fields, "assignedStaff", "not-a-uuid".into()).is_err());
    }

    #[test]
    fn review_date_accepts_timestamps() {
        assert_eq!(
            parse_review_date("2030-02-01T10:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2030, 2, 1).unwrap()
        );
    }
}
