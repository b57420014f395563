//! In-process store with the same constraints as the Postgres schema.
//! Used by the test suite and by local runs without `DATABASE_URL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BookingExt, ListingExt, StoreError, UserExt, BOOKINGS_ACTIVE_SLOT_IDX, USERS_EMAIL_KEY,
    USERS_USERNAME_KEY,
};
use crate::models::{
    bookingmodel::{Booking, BookingRole, BookingStatus, NewBooking},
    listingmodel::{Listing, ListingSearch, NewListing},
    usermodel::{NewUser, User, UserChanges, DEFAULT_AVATAR},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    listings: HashMap<Uuid, Listing>,
    bookings: HashMap<Uuid, Booking>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

impl Tables {
    fn check_user_unique(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), StoreError> {
        for user in self.users.values() {
            if Some(user.id) == user_id {
                continue;
            }
            if username == Some(user.username.as_str()) {
                return Err(unique_violation(USERS_USERNAME_KEY));
            }
            if email == Some(user.email.as_str()) {
                return Err(unique_violation(USERS_EMAIL_KEY));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;

        let user = if let Some(user_id) = user_id {
            tables.users.get(&user_id)
        } else if let Some(username) = username {
            tables.users.values().find(|u| u.username == username)
        } else if let Some(email) = email {
            tables.users.values().find(|u| u.email == email)
        } else {
            None
        };

        Ok(user.cloned())
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_user_unique(None, Some(&new_user.username), Some(&new_user.email))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            avatar: new_user
                .avatar
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Ok(None);
        }
        tables.check_user_unique(
            Some(user_id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        )?;

        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password) = changes.password {
            user.password = password;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.remove(&user_id).is_some())
    }
}

#[async_trait]
impl ListingExt for MemoryStore {
    async fn create_listing(&self, new_listing: NewListing) -> Result<Listing, StoreError> {
        let mut tables = self.tables.write().await;

        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            name: new_listing.name,
            description: new_listing.description,
            address: new_listing.address,
            regular_price: new_listing.regular_price,
            discount_price: new_listing.discount_price,
            bathrooms: new_listing.bathrooms,
            bedrooms: new_listing.bedrooms,
            furnished: new_listing.furnished,
            parking: new_listing.parking,
            offer: new_listing.offer,
            image_urls: new_listing.image_urls,
            user_ref: new_listing.user_ref,
            kind: new_listing.kind,
            created_at: now,
            updated_at: now,
        };
        tables.listings.insert(listing.id, listing.clone());

        Ok(listing)
    }

    async fn get_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.listings.get(&listing_id).cloned())
    }

    async fn get_listings_by_ids(&self, listing_ids: &[Uuid]) -> Result<Vec<Listing>, StoreError> {
        let tables = self.tables.read().await;
        Ok(listing_ids
            .iter()
            .filter_map(|id| tables.listings.get(id).cloned())
            .collect())
    }

    async fn get_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let tables = self.tables.read().await;
        let mut listings: Vec<Listing> = tables
            .listings
            .values()
            .filter(|l| l.user_ref == owner_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.listings.get_mut(&listing.id) else {
            return Ok(None);
        };

        let user_ref = stored.user_ref;
        let created_at = stored.created_at;
        *stored = Listing {
            user_ref,
            created_at,
            updated_at: Utc::now(),
            ..listing.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.listings.remove(&listing_id).is_some())
    }

    async fn search_listings(&self, search: &ListingSearch) -> Result<Vec<Listing>, StoreError> {
        let tables = self.tables.read().await;
        let mut matched: Vec<&Listing> = tables
            .listings
            .values()
            .filter(|l| search.matches(l))
            .collect();
        matched.sort_by(|a, b| search.compare(a, b).then_with(|| a.id.cmp(&b.id)));

        Ok(matched
            .into_iter()
            .skip(search.start_index.max(0) as usize)
            .take(search.limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingExt for MemoryStore {
    async fn create_booking(&self, new_booking: NewBooking) -> Result<Booking, StoreError> {
        // Check and insert under one write lock, like the partial unique index.
        let mut tables = self.tables.write().await;

        let taken = tables.bookings.values().any(|b| {
            b.listing_id == new_booking.listing_id
                && b.date == new_booking.date
                && b.time_slot.as_deref().unwrap_or("")
                    == new_booking.time_slot.as_deref().unwrap_or("")
                && b.status.is_active()
        });
        if taken {
            return Err(unique_violation(BOOKINGS_ACTIVE_SLOT_IDX));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            listing_id: new_booking.listing_id,
            buyer_id: new_booking.buyer_id,
            seller_id: new_booking.seller_id,
            date: new_booking.date,
            time_slot: new_booking.time_slot,
            message: new_booking.message,
            status: BookingStatus::Pending,
            seller_note: None,
            guests: new_booking.guests,
            add_ons: new_booking.add_ons,
            total_price: new_booking.total_price,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.get(&booking_id).cloned())
    }

    async fn get_bookings_for_user(
        &self,
        user_id: Uuid,
        role: BookingRole,
    ) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| match role {
                BookingRole::Buyer => b.buyer_id == user_id,
                BookingRole::Seller => b.seller_id == user_id,
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn transition_booking(
        &self,
        booking_id: Uuid,
        expected: &[BookingStatus],
        next: BookingStatus,
        seller_note: Option<String>,
    ) -> Result<Option<Booking>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&booking_id) else {
            return Ok(None);
        };
        if !expected.contains(&booking.status) {
            return Ok(None);
        }

        booking.status = next;
        if seller_note.is_some() {
            booking.seller_note = seller_note;
        }
        booking.updated_at = Utc::now();

        Ok(Some(booking.clone()))
    }
}
