use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::usermodel::Identity,
    utils::token,
    AppState,
};

pub const AUTH_COOKIE: &str = "access_token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub identity: Identity,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

fn request_token(cookie_jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    cookie_jar
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(headers))
}

fn verify(token: String, secret: &[u8]) -> Option<Identity> {
    let subject = token::decode_token(token, secret).ok()?;
    Uuid::parse_str(&subject).ok().map(Identity::new)
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = request_token(&cookie_jar, req.headers()).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "request without token");
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    let identity = verify(token, app_state.env.jwt_secret.as_bytes()).ok_or_else(|| {
        tracing::debug!(path = %req.uri().path(), "rejected token");
        HttpError::forbidden(ErrorMessage::InvalidToken.to_string())
    })?;

    req.extensions_mut().insert(JWTAuthMiddeware { identity });

    Ok(next.run(req).await)
}

/// Like [`auth`], but lets anonymous requests through.
pub async fn optional_auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> impl IntoResponse {
    let identity = request_token(&cookie_jar, req.headers())
        .and_then(|token| verify(token, app_state.env.jwt_secret.as_bytes()));

    if let Some(identity) = identity {
        req.extensions_mut().insert(JWTAuthMiddeware { identity });
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        let jar = CookieJar::new();
        assert_eq!(request_token(&jar, &headers).as_deref(), Some("from-header"));

        let jar = jar.add(Cookie::new(AUTH_COOKIE, "from-cookie"));
        assert_eq!(request_token(&jar, &headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn verify_requires_valid_signature_and_uuid_subject() {
        let user_id = Uuid::new_v4();
        let token = token::create_token(&user_id.to_string(), b"secret", 60).unwrap();
        assert_eq!(verify(token.clone(), b"secret"), Some(Identity::new(user_id)));
        assert_eq!(verify(token, b"other"), None);

        let not_a_uuid = token::create_token("someone", b"secret", 60).unwrap();
        assert_eq!(verify(not_a_uuid, b"secret"), None);
    }
}
