use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::parse_id;
use crate::{
    dtos::{
        listingdtos::{
            CreateListingDto, ListingSearchQueryDto, RecommendQueryDto, UpdateListingDto,
        },
        AppJson,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, optional_auth, JWTAuthMiddeware},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

pub fn listings_handler() -> Router {
    let protected = Router::new()
        .route("/create", post(create_listing))
        .route("/update/:id", post(update_listing))
        .route("/delete/:id", delete(delete_listing))
        .route("/user/:user_id", get(get_owner_listings))
        .route_layer(middleware::from_fn(auth));

    let marketplace = Router::new()
        .route("/get", get(search_listings))
        .route("/recommend", get(recommend_for_query))
        .route("/recommend/:id", get(recommend_similar))
        .route_layer(middleware::from_fn(optional_auth));

    Router::new()
        .route("/get/:id", get(get_listing))
        .merge(protected)
        .merge(marketplace)
}

pub async fn create_listing(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    AppJson(body): AppJson<CreateListingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let listing = app_state
        .listing_service
        .create(&caller.identity, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "listing": listing,
        })),
    ))
}

pub async fn update_listing(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateListingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let listing_id = parse_id(&id, ErrorMessage::ListingNotFound)?;
    let listing = app_state
        .listing_service
        .update(&caller.identity, listing_id, body)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "listing": listing,
    })))
}

pub async fn delete_listing(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let listing_id = parse_id(&id, ErrorMessage::ListingNotFound)?;
    app_state
        .listing_service
        .delete(&caller.identity, listing_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Listing has been deleted",
    })))
}

pub async fn get_listing(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let listing_id = parse_id(&id, ErrorMessage::ListingNotFound)?;
    let listing = app_state.listing_service.get(listing_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "listing": listing,
    })))
}

/// Marketplace search. Answers with a bare array of listings.
pub async fn search_listings(
    Extension(app_state): Extension<Arc<AppState>>,
    caller: Option<Extension<JWTAuthMiddeware>>,
    Query(query): Query<ListingSearchQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let caller = caller.map(|Extension(caller)| caller.identity);
    let listings = app_state
        .listing_service
        .search(caller.as_ref(), &query)
        .await?;

    Ok(Json(listings))
}

pub(super) async fn owner_listings(
    app_state: &AppState,
    caller: &JWTAuthMiddeware,
    owner_id: &str,
) -> Result<Json<serde_json::Value>, HttpError> {
    let owner_id = parse_id(owner_id, ErrorMessage::UserNotFound)?;
    let listings = app_state
        .listing_service
        .list_by_owner(&caller.identity, owner_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "listings": listings,
    })))
}

pub async fn get_owner_listings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    owner_listings(&app_state, &caller, &user_id).await
}

pub async fn recommend_similar(
    Extension(app_state): Extension<Arc<AppState>>,
    caller: Option<Extension<JWTAuthMiddeware>>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let listing_id = parse_id(&id, ErrorMessage::ListingNotFound)?;
    let caller = caller.map(|Extension(caller)| caller.identity);
    let recommendations = app_state
        .listing_service
        .recommend_similar(caller.as_ref(), listing_id, query.limit.as_deref())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "recommendations": recommendations,
    })))
}

pub async fn recommend_for_query(
    Extension(app_state): Extension<Arc<AppState>>,
    caller: Option<Extension<JWTAuthMiddeware>>,
    Query(query): Query<RecommendQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let caller = caller.map(|Extension(caller)| caller.identity);
    let recommendations = app_state
        .listing_service
        .recommend_for_query(caller.as_ref(), &query)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "recommendations": recommendations,
    })))
}
