use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::listingmodel::{
    Listing, ListingKind, ListingSearch, ListingType, NewListing, NightStayDetails,
};

const LISTING_COLUMNS: &str = "id, name, description, address, regular_price, discount_price, \
    bathrooms, bedrooms, furnished, parking, offer, image_urls, user_ref, \
    listing_type, night_stay, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    name: String,
    description: String,
    address: String,
    regular_price: f64,
    discount_price: f64,
    bathrooms: i32,
    bedrooms: i32,
    furnished: bool,
    parking: bool,
    offer: bool,
    image_urls: Vec<String>,
    user_ref: Uuid,
    listing_type: ListingType,
    night_stay: Option<Json<NightStayDetails>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        let kind = match row.listing_type {
            ListingType::Sale => ListingKind::Sale,
            ListingType::Rent => ListingKind::Rent,
            ListingType::NightStay => {
                ListingKind::NightStay(row.night_stay.map(|json| json.0).unwrap_or_default())
            }
        };

        Listing {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            regular_price: row.regular_price,
            discount_price: row.discount_price,
            bathrooms: row.bathrooms,
            bedrooms: row.bedrooms,
            furnished: row.furnished,
            parking: row.parking,
            offer: row.offer,
            image_urls: row.image_urls,
            user_ref: row.user_ref,
            kind,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn night_stay_column(kind: &ListingKind) -> Option<Json<NightStayDetails>> {
    kind.night_stay().cloned().map(Json)
}

/// Escapes LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
pub trait ListingExt {
    async fn create_listing(&self, new_listing: NewListing) -> Result<Listing, StoreError>;

    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError>;

    async fn get_listings_by_ids(&self, listing_ids: &[Uuid]) -> Result<Vec<Listing>, StoreError>;

    async fn get_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError>;

    /// Rewrites every mutable column of `listing`. `user_ref` is never touched.
    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError>;

    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, StoreError>;

    async fn search_listings(&self, search: &ListingSearch) -> Result<Vec<Listing>, StoreError>;
}

#[async_trait]
impl ListingExt for DBClient {
    async fn create_listing(&self, new_listing: NewListing) -> Result<Listing, StoreError> {
        let listing_type = new_listing.kind.listing_type();
        let night_stay = night_stay_column(&new_listing.kind);

        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            INSERT INTO listings (
                name, description, address, regular_price, discount_price,
                bathrooms, bedrooms, furnished, parking, offer, image_urls,
                user_ref, listing_type, night_stay
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
            )
            RETURNING {}
            "#,
            LISTING_COLUMNS
        ))
        .bind(new_listing.name)
        .bind(new_listing.description)
        .bind(new_listing.address)
        .bind(new_listing.regular_price)
        .bind(new_listing.discount_price)
        .bind(new_listing.bathrooms)
        .bind(new_listing.bedrooms)
        .bind(new_listing.furnished)
        .bind(new_listing.parking)
        .bind(new_listing.offer)
        .bind(new_listing.image_urls)
        .bind(new_listing.user_ref)
        .bind(listing_type)
        .bind(night_stay)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE id = $1",
            LISTING_COLUMNS
        ))
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Listing::from))
    }

    async fn get_listings_by_ids(&self, listing_ids: &[Uuid]) -> Result<Vec<Listing>, StoreError> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE id = ANY($1)",
            LISTING_COLUMNS
        ))
        .bind(listing_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn get_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE user_ref = $1 ORDER BY created_at DESC",
            LISTING_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            UPDATE listings
            SET name = $2, description = $3, address = $4,
                regular_price = $5, discount_price = $6,
                bathrooms = $7, bedrooms = $8,
                furnished = $9, parking = $10, offer = $11,
                image_urls = $12, listing_type = $13, night_stay = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LISTING_COLUMNS
        ))
        .bind(listing.id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(&listing.address)
        .bind(listing.regular_price)
        .bind(listing.discount_price)
        .bind(listing.bathrooms)
        .bind(listing.bedrooms)
        .bind(listing.furnished)
        .bind(listing.parking)
        .bind(listing.offer)
        .bind(&listing.image_urls)
        .bind(listing.kind.listing_type())
        .bind(night_stay_column(&listing.kind))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Listing::from))
    }

    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(listing_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_listings(&self, search: &ListingSearch) -> Result<Vec<Listing>, StoreError> {
        let types: Vec<String> = search
            .type_filter
            .listing_types()
            .iter()
            .map(|t| t.db_name().to_string())
            .collect();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM listings WHERE listing_type::text = ANY(",
            LISTING_COLUMNS
        ));
        builder.push_bind(types).push(")");

        if let Some(term) = search.search_term.as_deref().filter(|t| !t.is_empty()) {
            builder
                .push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(term)));
        }
        if let Some(offer) = search.offer {
            builder.push(" AND offer = ").push_bind(offer);
        }
        if let Some(furnished) = search.furnished {
            builder.push(" AND furnished = ").push_bind(furnished);
        }
        if let Some(parking) = search.parking {
            builder.push(" AND parking = ").push_bind(parking);
        }
        if let Some(owner) = search.exclude_owner {
            builder.push(" AND user_ref <> ").push_bind(owner);
        }

        // Column and direction come from closed enums, never from the request.
        builder.push(format!(
            " ORDER BY {} {}, id ASC",
            search.sort.column(),
            search.order.sql()
        ));
        builder
            .push(" LIMIT ")
            .push_bind(search.limit)
            .push(" OFFSET ")
            .push_bind(search.start_index);

        let rows = builder
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }
}
