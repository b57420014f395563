use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};

use super::parse_id;
use crate::{
    dtos::{
        bookingdtos::{BookingListQueryDto, CreateBookingDto, UpdateBookingStatusDto},
        AppJson,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

pub fn bookings_handler() -> Router {
    Router::new()
        .route("/create", post(create_booking))
        .route("/get", get(list_bookings))
        .route("/get/:id", get(get_booking))
        .route("/update/:id", put(update_booking_status))
        .route("/cancel/:id", post(cancel_booking))
        .route_layer(middleware::from_fn(auth))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    AppJson(body): AppJson<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .booking_service
        .create(&caller.identity, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Booking request sent",
            "booking": booking,
        })),
    ))
}

pub async fn list_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Query(query): Query<BookingListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let bookings = app_state
        .booking_service
        .list_for_user(&caller.identity, query.role.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "bookings": bookings,
    })))
}

pub async fn get_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = parse_id(&id, ErrorMessage::BookingNotFound)?;
    let booking = app_state
        .booking_service
        .get(&caller.identity, booking_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "booking": booking,
    })))
}

pub async fn update_booking_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateBookingStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = parse_id(&id, ErrorMessage::BookingNotFound)?;
    let booking = app_state
        .booking_service
        .update_status(&caller.identity, booking_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Booking {}", booking.status.to_str()),
        "booking": booking,
    })))
}

pub async fn cancel_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = parse_id(&id, ErrorMessage::BookingNotFound)?;
    let booking = app_state
        .booking_service
        .cancel(&caller.identity, booking_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Booking cancelled",
        "booking": booking,
    })))
}
