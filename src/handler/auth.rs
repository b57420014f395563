use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::{
    config::Config,
    dtos::{
        userdtos::{LoginUserDto, RegisterUserDto, Response},
        AppJson,
    },
    error::HttpError,
    middleware::AUTH_COOKIE,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", get(signout))
}

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .max_age(time::Duration::minutes(config.jwt_maxage))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn expired_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn with_cookie(
    response: impl IntoResponse,
    cookie: Cookie<'static>,
) -> Result<axum::response::Response, HttpError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut response = response.into_response();
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

pub async fn signup(
    Extension(app_state): Extension<Arc<AppState>>,
    AppJson(body): AppJson<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.credential_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "User created successfully",
            "user": user,
        })),
    ))
}

pub async fn signin(
    Extension(app_state): Extension<Arc<AppState>>,
    AppJson(body): AppJson<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let signed_in = app_state.credential_service.authenticate(body).await?;

    let response = Json(serde_json::json!({
        "success": true,
        "user": signed_in.user,
    }));

    with_cookie(response, session_cookie(signed_in.token, &app_state.env))
}

pub async fn signout(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let response = Json(Response {
        success: true,
        message: "User has been logged out".to_string(),
    });

    with_cookie(response, expired_cookie(&app_state.env))
}
