// src/handlers/profile.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{
        ChangePasswordPayload, MessageResponse, ProfileResponse, UpdateProfilePayload, UserMessageResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/profile/{id}",
    tag = "Profile",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "User not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = app_state.user_service.profile(&caller, id).await?;
    Ok((StatusCode::OK, Json(profile)))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}",
    tag = "Profile",
    request_body = UpdateProfilePayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile updated", body = UserMessageResponse),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.user_service.update_profile(&caller, id, &payload).await?;
    Ok((
        StatusCode::OK,
        Json(UserMessageResponse { message: "Profile updated".into(), user }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/profile/change-password/{id}",
    tag = "Profile",
    request_body = ChangePasswordPayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Wrong current password or mismatched confirmation")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state.user_service.change_password(&caller, id, &payload).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Password updated successfully"))))
}
