use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{
    error::{ServiceError, ServiceResult},
    recommendation::{self, ListingQuery, Recommendation, RecommendationTarget},
};
use crate::{
    db::{ListingExt, Store},
    dtos::{
        listingdtos::{
            CreateListingDto, ListingSearchQueryDto, NightStayInput, RecommendQueryDto,
            UpdateListingDto,
        },
        first_validation_message, Numeric,
    },
    error::ErrorMessage,
    models::{
        listingmodel::{
            Listing, ListingKind, ListingSearch, ListingType, NewListing, NightStayDetails,
            SortKey, SortOrder, TypeFilter,
        },
        usermodel::Identity,
    },
};

pub const DEFAULT_PAGE_SIZE: i64 = 9;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_RECOMMENDATIONS: usize = 4;
pub const MAX_RECOMMENDATIONS: usize = 20;
/// Most recent listings considered when scoring recommendations.
pub const RECOMMENDATION_POOL: i64 = 200;

fn missing(field: &str) -> ServiceError {
    ServiceError::bad_request(format!("Missing required field: {}", field))
}

fn invalid(errors: ValidationErrors) -> ServiceError {
    ServiceError::bad_request(first_validation_message(&errors))
}

fn text(value: &Option<String>, field: &str) -> ServiceResult<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_string())
        .ok_or_else(|| missing(field))
}

fn number(value: &Option<Numeric>, field: &str) -> ServiceResult<f64> {
    value
        .as_ref()
        .and_then(Numeric::as_f64)
        .ok_or_else(|| missing(field))
}

fn count(value: &Option<Numeric>, field: &str) -> ServiceResult<i32> {
    value
        .as_ref()
        .and_then(Numeric::as_i32)
        .ok_or_else(|| missing(field))
}

fn clean_image_urls(urls: &[String]) -> Vec<String> {
    urls.iter().map(|url| url.trim().to_string()).collect()
}

/// Only called when the listing is on offer; otherwise the field is ignored.
fn parse_discount(value: &Numeric) -> ServiceResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| ServiceError::bad_request("Discount price must be a number"))
}

/// `offer == false` forces the discount to 0; otherwise it must sit in
/// `[0, regular_price)`.
fn resolve_discount(
    offer: bool,
    regular_price: f64,
    discount: Option<f64>,
) -> ServiceResult<f64> {
    if !offer {
        return Ok(0.0);
    }
    let discount = discount.ok_or_else(|| missing("discountPrice"))?;
    if discount < 0.0 {
        return Err(ServiceError::bad_request("Discount price cannot be negative"));
    }
    if discount >= regular_price {
        return Err(ServiceError::bad_request(
            "Discount price must be lower than regular price",
        ));
    }
    Ok(discount)
}

/// Reads the listing type, folding the legacy `rent` + `listingSubType` /
/// `bbqEnabled` forms into `NightStay`.
fn resolve_listing_type(dto: &CreateListingDto) -> ServiceResult<Option<ListingType>> {
    let sub_type_night_stay = dto
        .listing_sub_type
        .as_deref()
        .and_then(ListingType::parse)
        == Some(ListingType::NightStay);

    let Some(raw) = dto.listing_type.as_deref() else {
        return Ok(sub_type_night_stay.then_some(ListingType::NightStay));
    };
    let listing_type = ListingType::parse(raw).ok_or_else(|| {
        ServiceError::bad_request("Type must be sale, rent or night-stay")
    })?;

    let folds_into_night_stay = sub_type_night_stay || dto.bbq_enabled == Some(true);
    if listing_type == ListingType::Rent && folds_into_night_stay {
        return Ok(Some(ListingType::NightStay));
    }
    Ok(Some(listing_type))
}

fn build_kind(
    listing_type: ListingType,
    current: Option<&ListingKind>,
    input: &NightStayInput,
) -> ListingKind {
    match listing_type {
        ListingType::Sale => ListingKind::Sale,
        ListingType::Rent => ListingKind::Rent,
        ListingType::NightStay => {
            let mut details = current
                .and_then(ListingKind::night_stay)
                .cloned()
                .unwrap_or_else(NightStayDetails::default);
            input.apply_to(&mut details);
            ListingKind::NightStay(details)
        }
    }
}

fn parse_flag(value: Option<&str>) -> Option<bool> {
    // only "true" narrows the search; anything else matches both values
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") => Some(true),
        _ => None,
    }
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") => Some(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn search_from_query(
    query: &ListingSearchQueryDto,
    exclude_owner: Option<Uuid>,
) -> ServiceResult<ListingSearch> {
    let type_filter =
        TypeFilter::parse(query.listing_type.as_deref()).map_err(ServiceError::BadRequest)?;
    let limit = query
        .limit
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let start_index = query
        .start_index
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0);

    Ok(ListingSearch {
        search_term: non_empty(query.search_term.as_deref()),
        offer: parse_flag(query.offer.as_deref()),
        furnished: parse_flag(query.furnished.as_deref()),
        parking: parse_flag(query.parking.as_deref()),
        type_filter,
        sort: SortKey::parse(query.sort.as_deref()),
        order: SortOrder::parse(query.order.as_deref()),
        limit,
        start_index,
        exclude_owner,
    })
}

pub fn query_from_recommend(query: &RecommendQueryDto) -> ServiceResult<ListingQuery> {
    let listing_type = match non_empty(query.listing_type.as_deref()) {
        None => None,
        Some(v) if v.eq_ignore_ascii_case("all") => None,
        Some(v) => Some(ListingType::parse(&v).ok_or_else(|| {
            ServiceError::bad_request("Type must be sale, rent or night-stay")
        })?),
    };
    let number = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|v| Numeric::Text(v.to_string()).as_f64())
    };

    Ok(ListingQuery {
        text: non_empty(query.search_term.as_deref()),
        max_price: number(&query.max_price).filter(|p| *p > 0.0),
        listing_type,
        bedrooms: number(&query.bedrooms).map(|n| n.max(0.0) as i32),
        bathrooms: number(&query.bathrooms).map(|n| n.max(0.0) as i32),
        furnished: parse_bool(query.furnished.as_deref()),
        parking: parse_bool(query.parking.as_deref()),
        offer: parse_bool(query.offer.as_deref()),
    })
}

fn recommendation_limit(limit: Option<&str>) -> usize {
    limit
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_RECOMMENDATIONS)
        .clamp(1, MAX_RECOMMENDATIONS)
}

#[derive(Debug, Clone)]
pub struct ListingService {
    db_client: Arc<dyn Store>,
}

impl ListingService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        ListingService { db_client }
    }

    pub async fn create(
        &self,
        identity: &Identity,
        body: CreateListingDto,
    ) -> ServiceResult<Listing> {
        if let Some(field) = body.missing_field() {
            return Err(missing(field));
        }
        body.validate().map_err(invalid)?;

        let name = text(&body.name, "name")?;
        let description = text(&body.description, "description")?;
        let address = text(&body.address, "address")?;
        let regular_price = number(&body.regular_price, "regularPrice")?;
        let bathrooms = count(&body.bathrooms, "bathrooms")?;
        let bedrooms = count(&body.bedrooms, "bedrooms")?;
        let furnished = body.furnished.ok_or_else(|| missing("furnished"))?;
        let parking = body.parking.ok_or_else(|| missing("parking"))?;
        let listing_type = resolve_listing_type(&body)?.ok_or_else(|| missing("type"))?;
        let offer = body.offer.ok_or_else(|| missing("offer"))?;
        let image_urls = clean_image_urls(body.image_urls.as_deref().unwrap_or_default());

        let discount = match (&body.discount_price, offer) {
            (Some(value), true) => Some(parse_discount(value)?),
            _ => None,
        };
        let discount_price = resolve_discount(offer, regular_price, discount)?;
        let kind = build_kind(listing_type, None, &body.night_stay);

        let listing = self
            .db_client
            .create_listing(NewListing {
                name,
                description,
                address,
                regular_price,
                discount_price,
                bathrooms,
                bedrooms,
                furnished,
                parking,
                offer,
                image_urls,
                user_ref: identity.user_id,
                kind,
            })
            .await?;

        tracing::info!(listing_id = %listing.id, owner = %listing.user_ref, "listing created");
        Ok(listing)
    }

    async fn owned_listing(
        &self,
        identity: &Identity,
        listing_id: Uuid,
        denied: &str,
    ) -> ServiceResult<Listing> {
        let listing = self
            .db_client
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::ListingNotFound.to_string()))?;

        if !identity.is(listing.user_ref) {
            return Err(ServiceError::Forbidden(denied.to_string()));
        }
        Ok(listing)
    }

    pub async fn update(
        &self,
        identity: &Identity,
        listing_id: Uuid,
        body: UpdateListingDto,
    ) -> ServiceResult<Listing> {
        let mut listing = self
            .owned_listing(identity, listing_id, "You can only update your own listings")
            .await?;

        body.validate().map_err(invalid)?;

        if let Some(name) = body.name.as_deref() {
            listing.name = name.trim().to_string();
        }
        if let Some(description) = body.description.as_deref() {
            listing.description = description.trim().to_string();
        }
        if let Some(address) = body.address.as_deref() {
            listing.address = address.trim().to_string();
        }
        if let Some(price) = body.regular_price.as_ref().and_then(Numeric::as_f64) {
            listing.regular_price = price;
        }
        if let Some(bathrooms) = body.bathrooms.as_ref().and_then(Numeric::as_i32) {
            listing.bathrooms = bathrooms;
        }
        if let Some(bedrooms) = body.bedrooms.as_ref().and_then(Numeric::as_i32) {
            listing.bedrooms = bedrooms;
        }
        if let Some(furnished) = body.furnished {
            listing.furnished = furnished;
        }
        if let Some(parking) = body.parking {
            listing.parking = parking;
        }
        if let Some(image_urls) = &body.image_urls {
            listing.image_urls = clean_image_urls(image_urls);
        }

        let listing_type =
            resolve_listing_type(&body)?.unwrap_or_else(|| listing.kind.listing_type());
        listing.kind = build_kind(listing_type, Some(&listing.kind), &body.night_stay);

        listing.offer = body.offer.unwrap_or(listing.offer);
        let discount = match (&body.discount_price, listing.offer) {
            (_, false) => None,
            (Some(value), true) => Some(parse_discount(value)?),
            (None, true) => Some(listing.discount_price),
        };
        listing.discount_price = resolve_discount(listing.offer, listing.regular_price, discount)?;

        let listing = self
            .db_client
            .update_listing(&listing)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::ListingNotFound.to_string()))?;

        tracing::info!(listing_id = %listing.id, "listing updated");
        Ok(listing)
    }

    pub async fn delete(&self, identity: &Identity, listing_id: Uuid) -> ServiceResult<()> {
        self.owned_listing(identity, listing_id, "You can only delete your own listings")
            .await?;

        if !self.db_client.delete_listing(listing_id).await? {
            return Err(ServiceError::NotFound(ErrorMessage::ListingNotFound.to_string()));
        }

        tracing::info!(%listing_id, "listing deleted");
        Ok(())
    }

    pub async fn get(&self, listing_id: Uuid) -> ServiceResult<Listing> {
        self.db_client
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::ListingNotFound.to_string()))
    }

    /// Marketplace search. A signed-in caller never sees their own listings here.
    pub async fn search(
        &self,
        caller: Option<&Identity>,
        query: &ListingSearchQueryDto,
    ) -> ServiceResult<Vec<Listing>> {
        let search = search_from_query(query, caller.map(|identity| identity.user_id))?;
        Ok(self.db_client.search_listings(&search).await?)
    }

    pub async fn list_by_owner(
        &self,
        identity: &Identity,
        owner_id: Uuid,
    ) -> ServiceResult<Vec<Listing>> {
        if !identity.is(owner_id) {
            return Err(ServiceError::Forbidden(
                "You can only view your own listings".to_string(),
            ));
        }
        Ok(self.db_client.get_listings_by_owner(owner_id).await?)
    }

    async fn recommendation_pool(
        &self,
        caller: Option<&Identity>,
    ) -> ServiceResult<Vec<Listing>> {
        let search = ListingSearch {
            limit: RECOMMENDATION_POOL,
            exclude_owner: caller.map(|identity| identity.user_id),
            ..Default::default()
        };
        Ok(self.db_client.search_listings(&search).await?)
    }

    pub async fn recommend_similar(
        &self,
        caller: Option<&Identity>,
        listing_id: Uuid,
        limit: Option<&str>,
    ) -> ServiceResult<Vec<Recommendation>> {
        let target = self.get(listing_id).await?;
        let candidates = self.recommendation_pool(caller).await?;

        Ok(recommendation::recommend(
            &RecommendationTarget::Similar(&target),
            candidates,
            recommendation_limit(limit),
            Utc::now(),
        ))
    }

    pub async fn recommend_for_query(
        &self,
        caller: Option<&Identity>,
        query: &RecommendQueryDto,
    ) -> ServiceResult<Vec<Recommendation>> {
        let listing_query = query_from_recommend(query)?;
        let candidates = self.recommendation_pool(caller).await?;

        Ok(recommendation::recommend(
            &RecommendationTarget::Query(listing_query),
            candidates,
            recommendation_limit(query.limit.as_deref()),
            Utc::now(),
        ))
    }
}
