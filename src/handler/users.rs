use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};

use super::{auth::expired_cookie, auth::with_cookie, parse_id};
use crate::{
    dtos::{userdtos::{Response, UpdateUserDto}, AppJson},
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

pub fn users_handler() -> Router {
    let protected = Router::new()
        .route("/update/:id", put(update_user))
        .route("/delete/:id", delete(delete_user))
        .route("/listings/:id", get(get_user_listings))
        .route_layer(middleware::from_fn(auth));

    Router::new().route("/:id", get(get_user)).merge(protected)
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_id(&id, ErrorMessage::UserNotFound)?;
    let user = app_state.credential_service.get_public_profile(user_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": user,
    })))
}

pub async fn update_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_id(&id, ErrorMessage::UserNotFound)?;
    let user = app_state
        .credential_service
        .update_profile(&caller.identity, user_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": user,
    })))
}

pub async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_id(&id, ErrorMessage::UserNotFound)?;
    app_state
        .credential_service
        .delete_account(&caller.identity, user_id)
        .await?;

    let response = Json(Response {
        success: true,
        message: "User has been deleted".to_string(),
    });
    with_cookie(response, expired_cookie(&app_state.env))
}

pub async fn get_user_listings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    super::listings::owner_listings(&app_state, &caller, &id).await
}
