// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Paginated},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        auth::User,
        user::{InviteUserPayload, MessageResponse, UpdateUserPayload, UserListQuery, UserMessageResponse},
    },
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users of the caller's home", body = Paginated<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let users = app_state.user_service.list(&scope, &query).await?;
    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    post,
    path = "/api/users/invite",
    tag = "Users",
    request_body = InviteUserPayload,
    responses(
        (status = 201, description = "User invited", body = UserMessageResponse),
        (status = 403, description = "Admins only"),
        (status = 409, description = "Email already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn invite_user(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<InviteUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.user_service.invite(&caller, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse { message: "User invited successfully".into(), user }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User updated", body = UserMessageResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let scope = app_state.scope_resolver.resolve(&caller).await?;
    let user = app_state.user_service.update(&scope, id, &payload).await?;
    Ok((
        StatusCode::OK,
        Json(UserMessageResponse { message: "User updated successfully".into(), user }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted, with its staff record", body = MessageResponse),
        (status = 404, description = "User not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    _: RequireRole<AdminOnly>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scope = app_state.scope_resolver.resolve(&caller).await?;
    app_state.user_service.delete(&scope, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("User deleted"))))
}
