use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{Local, NaiveDate};
use uuid::Uuid;
use validator::Validate;

use super::error::{ServiceError, ServiceResult};
use crate::{
    db::{BookingExt, ListingExt, Store, UserExt, BOOKINGS_ACTIVE_SLOT_IDX},
    dtos::{
        bookingdtos::{CreateBookingDto, UpdateBookingStatusDto},
        first_validation_message,
    },
    error::ErrorMessage,
    models::{
        bookingmodel::{
            Booking, BookingAddOns, BookingRole, BookingStatus, BookingView, ListingSnapshot,
            NewBooking, PartyProfile,
        },
        listingmodel::{Listing, NightStayDetails},
        usermodel::Identity,
    },
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(ErrorMessage::BookingNotFound.to_string())
}

/// Validates the night-stay extras against what the listing offers.
fn night_stay_add_ons(
    details: &NightStayDetails,
    body: &CreateBookingDto,
    guests: i32,
) -> ServiceResult<BookingAddOns> {
    if guests > details.max_guests {
        return Err(ServiceError::bad_request(format!(
            "This property allows at most {} guests",
            details.max_guests
        )));
    }

    let bbq_enabled = body.bbq_enabled.unwrap_or(false);
    let bbq_kg = if bbq_enabled {
        if !details.bbq_available() {
            return Err(ServiceError::bad_request("BBQ is not available at this property"));
        }
        let quantities = body.bbq_quantities();
        for (meat, kg) in &quantities {
            let offered = details.bbq_rate(*meat).map_or(false, |rate| rate.available);
            if *kg > 0.0 && !offered {
                return Err(ServiceError::bad_request(format!(
                    "{:?} is not available for BBQ at this property",
                    meat
                )));
            }
        }
        quantities
    } else {
        BTreeMap::new()
    };

    let campfire_enabled = body.campfire_enabled.unwrap_or(false);
    if campfire_enabled && !details.campfire.enabled {
        return Err(ServiceError::bad_request("Campfire is not available at this property"));
    }
    let sound_system_enabled = body.sound_system_enabled.unwrap_or(false);
    if sound_system_enabled && !details.sound_system.enabled {
        return Err(ServiceError::bad_request(
            "Sound system is not available at this property",
        ));
    }

    Ok(BookingAddOns {
        bbq_enabled,
        bbq_kg,
        campfire_enabled,
        sound_system_enabled,
    })
}

/// Attaches listing snapshots and party profiles to bookings. Missing
/// references become placeholders; the join never fails on them.
pub struct BookingJoin;

impl BookingJoin {
    pub async fn resolve(
        store: &dyn Store,
        bookings: Vec<Booking>,
    ) -> ServiceResult<Vec<BookingView>> {
        let mut listing_ids: Vec<Uuid> = bookings.iter().map(|b| b.listing_id).collect();
        listing_ids.sort_unstable();
        listing_ids.dedup();

        let mut user_ids: Vec<Uuid> = bookings
            .iter()
            .flat_map(|b| [b.buyer_id, b.seller_id])
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let listings: HashMap<Uuid, Listing> = store
            .get_listings_by_ids(&listing_ids)
            .await?
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect();
        let users: HashMap<Uuid, PartyProfile> = store
            .get_users_by_ids(&user_ids)
            .await?
            .iter()
            .map(|user| (user.id, PartyProfile::of(user)))
            .collect();

        let profile = |id: Uuid| {
            users
                .get(&id)
                .cloned()
                .unwrap_or_else(|| PartyProfile::deleted(id))
        };

        Ok(bookings
            .into_iter()
            .map(|booking| BookingView {
                property: listings
                    .get(&booking.listing_id)
                    .map(ListingSnapshot::of)
                    .unwrap_or_else(ListingSnapshot::deleted),
                buyer: profile(booking.buyer_id),
                seller: profile(booking.seller_id),
                booking,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct BookingService {
    db_client: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        BookingService { db_client }
    }

    pub async fn create(
        &self,
        identity: &Identity,
        body: CreateBookingDto,
    ) -> ServiceResult<Booking> {
        if !body.has_required_fields() {
            return Err(ServiceError::bad_request(
                "Property, date and total price are required",
            ));
        }
        body.validate()
            .map_err(|e| ServiceError::bad_request(first_validation_message(&e)))?;

        let listing_id = body
            .listing_id()
            .ok_or_else(|| ServiceError::bad_request("Invalid property id"))?;
        let date = body
            .booking_date()
            .ok_or_else(|| ServiceError::bad_request("Date must be YYYY-MM-DD"))?;
        let total_price = body.total_price().ok_or_else(|| {
            ServiceError::bad_request("Total price must be a non-negative number")
        })?;
        let guests = body.guest_count().ok_or_else(|| {
            ServiceError::bad_request("Guests must be a whole number of at least 1")
        })?;

        let listing = self
            .db_client
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::ListingNotFound.to_string()))?;

        if identity.is(listing.user_ref) {
            return Err(ServiceError::bad_request("You cannot book your own property"));
        }

        if date < today() {
            return Err(ServiceError::bad_request("Booking date cannot be in the past"));
        }

        let (time_slot, add_ons) = match listing.kind.night_stay() {
            Some(details) => (None, night_stay_add_ons(details, &body, guests)?),
            None => {
                let slot = body
                    .time_slot
                    .as_deref()
                    .map(str::trim)
                    .filter(|slot| !slot.is_empty())
                    .ok_or_else(|| ServiceError::bad_request("Time slot is required"))?;
                (Some(slot.to_string()), BookingAddOns::default())
            }
        };

        let booking = self
            .db_client
            .create_booking(NewBooking {
                listing_id,
                buyer_id: identity.user_id,
                seller_id: listing.user_ref,
                date,
                time_slot,
                message: body.message.unwrap_or_default(),
                guests,
                add_ons,
                total_price,
            })
            .await
            .map_err(|err| {
                if err.violates(BOOKINGS_ACTIVE_SLOT_IDX) {
                    ServiceError::bad_request(ErrorMessage::SlotAlreadyBooked.to_string())
                } else {
                    ServiceError::Store(err)
                }
            })?;

        tracing::info!(
            booking_id = %booking.id,
            %listing_id,
            buyer = %booking.buyer_id,
            "booking created"
        );
        Ok(booking)
    }

    async fn transition(
        &self,
        identity: &Identity,
        booking_id: Uuid,
        next: BookingStatus,
        seller_note: Option<String>,
    ) -> ServiceResult<Booking> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(not_found)?;

        let (denied, stale) = match next {
            BookingStatus::Cancelled => (
                "Only the buyer can cancel this booking",
                "Only pending or approved bookings can be cancelled",
            ),
            _ => (
                "Only the seller can update this booking",
                "Only pending bookings can be approved or rejected",
            ),
        };

        if next.actor().is_none() || booking.party(identity.user_id) != next.actor() {
            return Err(ServiceError::Forbidden(denied.to_string()));
        }
        if !booking.status.can_transition_to(next) {
            return Err(ServiceError::bad_request(stale));
        }

        // a concurrent transition may have moved the booking since it was read
        let booking = self
            .db_client
            .transition_booking(booking_id, next.allowed_sources(), next, seller_note)
            .await?
            .ok_or_else(|| ServiceError::bad_request(stale))?;

        tracing::info!(
            booking_id = %booking.id,
            status = booking.status.to_str(),
            "booking transitioned"
        );
        Ok(booking)
    }

    pub async fn update_status(
        &self,
        identity: &Identity,
        booking_id: Uuid,
        body: UpdateBookingStatusDto,
    ) -> ServiceResult<Booking> {
        let next = match body.status.trim().to_ascii_lowercase().as_str() {
            "approved" => BookingStatus::Approved,
            "rejected" => BookingStatus::Rejected,
            _ => {
                return Err(ServiceError::bad_request(
                    "Status must be approved or rejected",
                ))
            }
        };
        let seller_note = body.seller_note.filter(|note| !note.trim().is_empty());

        self.transition(identity, booking_id, next, seller_note).await
    }

    pub async fn cancel(&self, identity: &Identity, booking_id: Uuid) -> ServiceResult<Booking> {
        self.transition(identity, booking_id, BookingStatus::Cancelled, None)
            .await
    }

    pub async fn get(&self, identity: &Identity, booking_id: Uuid) -> ServiceResult<BookingView> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(not_found)?;

        if booking.party(identity.user_id).is_none() {
            return Err(ServiceError::forbidden());
        }

        BookingJoin::resolve(self.db_client.as_ref(), vec![booking])
            .await?
            .pop()
            .ok_or_else(not_found)
    }

    pub async fn list_for_user(
        &self,
        identity: &Identity,
        role: Option<&str>,
    ) -> ServiceResult<Vec<BookingView>> {
        let role = BookingRole::parse(role)
            .ok_or_else(|| ServiceError::bad_request("Type must be buyer or seller"))?;

        let bookings = self
            .db_client
            .get_bookings_for_user(identity.user_id, role)
            .await?;
        BookingJoin::resolve(self.db_client.as_ref(), bookings).await
    }
}
