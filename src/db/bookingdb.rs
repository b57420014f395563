use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{DBClient, StoreError};
use crate::models::bookingmodel::{
    Booking, BookingAddOns, BookingRole, BookingStatus, NewBooking,
};

const BOOKING_COLUMNS: &str = "id, listing_id, buyer_id, seller_id, booking_date, time_slot, \
    message, status, seller_note, guests, add_ons, total_price, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    listing_id: Uuid,
    buyer_id: Uuid,
    seller_id: Uuid,
    booking_date: NaiveDate,
    time_slot: Option<String>,
    message: String,
    status: BookingStatus,
    seller_note: Option<String>,
    guests: i32,
    add_ons: Json<BookingAddOns>,
    total_price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            listing_id: row.listing_id,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            date: row.booking_date,
            time_slot: row.time_slot,
            message: row.message,
            status: row.status,
            seller_note: row.seller_note,
            guests: row.guests,
            add_ons: row.add_ons.0,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
pub trait BookingExt {
    /// Inserts a pending booking. Fails with a unique violation on
    /// `bookings_active_slot_idx` when the slot already holds an active booking.
    async fn create_booking(&self, new_booking: NewBooking) -> Result<Booking, StoreError>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn get_bookings_for_user(
        &self,
        user_id: Uuid,
        role: BookingRole,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Moves the booking to `next` only if its current status is one of
    /// `expected`. Returns `None` when no row matched.
    async fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: &[BookingStatus],
        next: BookingStatus,
        seller_note: Option<String>,
    ) -> Result<Option<Booking>, StoreError>;
}

#[async_trait]
impl BookingExt for DBClient {
    async fn create_booking(&self, new_booking: NewBooking) -> Result<Booking, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (
                listing_id, buyer_id, seller_id, booking_date, time_slot,
                message, status, guests, add_ons, total_price
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(new_booking.listing_id)
        .bind(new_booking.buyer_id)
        .bind(new_booking.seller_id)
        .bind(new_booking.date)
        .bind(new_booking.time_slot)
        .bind(new_booking.message)
        .bind(BookingStatus::Pending)
        .bind(new_booking.guests)
        .bind(Json(new_booking.add_ons))
        .bind(new_booking.total_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn get_bookings_for_user(
        &self,
        user_id: Uuid,
        role: BookingRole,
    ) -> Result<Vec<Booking>, StoreError> {
        let column = match role {
            BookingRole::Buyer => "buyer_id",
            BookingRole::Seller => "seller_id",
        };

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE {} = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS, column
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: &[BookingStatus],
        next: BookingStatus,
        seller_note: Option<String>,
    ) -> Result<Option<Booking>, StoreError> {
        let expected: Vec<String> = expected.iter().map(|s| s.to_str().to_string()).collect();

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $2,
                seller_note = COALESCE($3, seller_note),
                updated_at = NOW()
            WHERE id = $1 AND status::text = ANY($4)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(next)
        .bind(seller_note)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }
}
