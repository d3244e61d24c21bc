// src/middleware/activity.rs

use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{config::AppState, models::auth::CallerContext, services::activity_service::is_logged_method};

/// Records successful state-changing requests of authenticated callers.
/// Runs inside `auth_guard`; the write happens off the request path.
pub async fn activity_logger(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let caller = request
        .extensions()
        .get::<CallerContext>()
        .map(|c| c.id)
        .filter(|_| is_logged_method(&method));
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    // Looked up first: the request itself may delete the user.
    let actor = match caller {
        Some(user_id) => match app_state.activity_service.display_name(user_id).await {
            Ok(Some(name)) => Some((user_id, name)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Could not load user for activity log");
                None
            }
        },
        None => None,
    };

    let response = next.run(request).await;

    let Some((user_id, user_name)) = actor else {
        return response;
    };
    if response.status().as_u16() >= 400 {
        return response;
    }

    tokio::spawn(async move {
        if let Err(e) = app_state
            .activity_service
            .record(user_id, &user_name, &method, &path)
            .await
        {
            tracing::warn!(user_id = %user_id, path = %path, error = %e, "Failed to record activity");
        }
    });

    response
}
