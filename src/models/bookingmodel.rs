use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    listingmodel::{Listing, Meat},
    usermodel::{User, DEFAULT_AVATAR},
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Which side of a booking a user is on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingRole {
    #[default]
    Buyer,
    Seller,
}

impl BookingRole {
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") => Some(BookingRole::Buyer),
            Some(v) if v.eq_ignore_ascii_case("buyer") => Some(BookingRole::Buyer),
            Some(v) if v.eq_ignore_ascii_case("seller") => Some(BookingRole::Seller),
            _ => None,
        }
    }
}

impl BookingStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and approved bookings hold their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }

    /// States from which `self` can be entered.
    pub fn allowed_sources(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Approved | BookingStatus::Rejected => &[BookingStatus::Pending],
            BookingStatus::Cancelled => &[BookingStatus::Pending, BookingStatus::Approved],
            BookingStatus::Pending => &[],
        }
    }

    /// The only party allowed to move a booking into `self`.
    pub fn actor(&self) -> Option<BookingRole> {
        match self {
            BookingStatus::Approved | BookingStatus::Rejected => Some(BookingRole::Seller),
            BookingStatus::Cancelled => Some(BookingRole::Buyer),
            BookingStatus::Pending => None,
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        next.allowed_sources().contains(self)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingAddOns {
    pub bbq_enabled: bool,
    pub bbq_kg: BTreeMap<Meat, f64>,
    pub campfire_enabled: bool,
    pub sound_system_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "propertyId")]
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: Option<String>,
    pub message: String,
    pub status: BookingStatus,
    pub seller_note: Option<String>,
    pub guests: i32,
    #[serde(flatten)]
    pub add_ons: BookingAddOns,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn party(&self, user_id: Uuid) -> Option<BookingRole> {
        if self.buyer_id == user_id {
            Some(BookingRole::Buyer)
        } else if self.seller_id == user_id {
            Some(BookingRole::Seller)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: Option<String>,
    pub message: String,
    pub guests: i32,
    pub add_ons: BookingAddOns,
    pub total_price: f64,
}

/// Listing fields shown next to a booking.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingSnapshot {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
    pub name: String,
    pub address: String,
    pub image_urls: Vec<String>,
    pub deleted: bool,
}

impl ListingSnapshot {
    pub fn of(listing: &Listing) -> Self {
        ListingSnapshot {
            id: Some(listing.id),
            name: listing.name.clone(),
            address: listing.address.clone(),
            image_urls: listing.image_urls.clone(),
            deleted: false,
        }
    }

    pub fn deleted() -> Self {
        ListingSnapshot {
            id: None,
            name: "Property Deleted".to_string(),
            address: "N/A".to_string(),
            image_urls: Vec::new(),
            deleted: true,
        }
    }
}

/// Public profile of a booking participant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PartyProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

impl PartyProfile {
    pub fn of(user: &User) -> Self {
        PartyProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }

    pub fn deleted(id: Uuid) -> Self {
        PartyProfile {
            id,
            username: "Deleted User".to_string(),
            email: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: ListingSnapshot,
    pub buyer: PartyProfile,
    pub seller: PartyProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_decides_only_pending_bookings() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Approved));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Approved));
        assert_eq!(BookingStatus::Approved.actor(), Some(BookingRole::Seller));
    }

    #[test]
    fn buyer_cancels_pending_or_approved() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Approved.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::Cancelled.actor(), Some(BookingRole::Buyer));
    }

    #[test]
    fn nothing_re_enters_pending() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            assert!(!status.can_transition_to(BookingStatus::Pending));
        }
    }

    #[test]
    fn parses_role_with_buyer_default() {
        assert_eq!(BookingRole::parse(None), Some(BookingRole::Buyer));
        assert_eq!(BookingRole::parse(Some("Seller")), Some(BookingRole::Seller));
        assert_eq!(BookingRole::parse(Some("agent")), None);
    }
}
