use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{validation_error, Numeric};
use crate::models::listingmodel::Meat;

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; only the calendar date is kept.
pub fn parse_booking_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

fn parse_guests(value: &Numeric) -> Option<i32> {
    value.as_i32().filter(|guests| *guests >= 1)
}

fn parse_total_price(value: &Numeric) -> Option<f64> {
    value.as_f64().filter(|price| *price >= 0.0)
}

fn validate_property_id(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| validation_error("property_id", "Invalid property id"))
}

fn validate_date(value: &str) -> Result<(), ValidationError> {
    parse_booking_date(value)
        .map(|_| ())
        .ok_or_else(|| validation_error("date", "Date must be YYYY-MM-DD"))
}

fn validate_total_price(value: &Numeric) -> Result<(), ValidationError> {
    parse_total_price(value).map(|_| ()).ok_or_else(|| {
        validation_error("total_price", "Total price must be a non-negative number")
    })
}

fn validate_guests(value: &Numeric) -> Result<(), ValidationError> {
    parse_guests(value).map(|_| ()).ok_or_else(|| {
        validation_error("guests", "Guests must be a whole number of at least 1")
    })
}

fn validate_bbq_kg(quantities: &BTreeMap<Meat, Numeric>) -> Result<(), ValidationError> {
    let valid = quantities
        .values()
        .all(|kg| kg.as_f64().map_or(false, |kg| kg >= 0.0));
    if !valid {
        return Err(validation_error(
            "bbq_kg",
            "BBQ quantities must be non-negative numbers",
        ));
    }
    Ok(())
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingDto {
    #[serde(alias = "listingId")]
    #[validate(custom = "validate_property_id")]
    pub property_id: Option<String>,
    #[validate(custom = "validate_date")]
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub message: Option<String>,
    #[validate(custom = "validate_guests")]
    pub guests: Option<Numeric>,
    pub bbq_enabled: Option<bool>,
    #[validate(custom = "validate_bbq_kg")]
    pub bbq_kg: Option<BTreeMap<Meat, Numeric>>,
    pub campfire_enabled: Option<bool>,
    pub sound_system_enabled: Option<bool>,
    #[validate(custom = "validate_total_price")]
    pub total_price: Option<Numeric>,
}

impl CreateBookingDto {
    pub fn has_required_fields(&self) -> bool {
        self.property_id.is_some() && self.date.is_some() && self.total_price.is_some()
    }

    pub fn listing_id(&self) -> Option<Uuid> {
        Uuid::parse_str(self.property_id.as_deref()?.trim()).ok()
    }

    pub fn booking_date(&self) -> Option<NaiveDate> {
        parse_booking_date(self.date.as_deref()?)
    }

    pub fn total_price(&self) -> Option<f64> {
        parse_total_price(self.total_price.as_ref()?)
    }

    /// Defaults to a single guest when absent.
    pub fn guest_count(&self) -> Option<i32> {
        match &self.guests {
            Some(guests) => parse_guests(guests),
            None => Some(1),
        }
    }

    /// Requested BBQ quantities, dropping anything that does not parse.
    pub fn bbq_quantities(&self) -> BTreeMap<Meat, f64> {
        self.bbq_kg
            .iter()
            .flatten()
            .filter_map(|(meat, kg)| kg.as_f64().map(|kg| (*meat, kg)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusDto {
    #[serde(default)]
    pub status: String,
    pub seller_note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingListQueryDto {
    #[serde(rename = "type")]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::dtos::first_validation_message;

    fn booking(body: serde_json::Value) -> CreateBookingDto {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_forms() {
        let expected = NaiveDate::from_ymd_opt(2030, 5, 17);
        assert_eq!(parse_booking_date("2030-05-17"), expected);
        assert_eq!(parse_booking_date("2030-05-17T10:00:00Z"), expected);
        assert_eq!(parse_booking_date("17/05/2030"), None);
    }

    #[test]
    fn validates_formats_of_present_fields() {
        let dto = booking(json!({
            "listingId": "6f2c1f4e-2f1b-4d7c-9a53-1f0f7f4b2a10",
            "date": "2030-05-17",
            "totalPrice": "1500",
            "bbqKg": { "chicken": "2" }
        }));
        assert!(dto.validate().is_ok());
        assert!(dto.has_required_fields());
        assert_eq!(dto.guest_count(), Some(1));
        assert_eq!(dto.total_price(), Some(1500.0));
        assert_eq!(dto.bbq_quantities().get(&Meat::Chicken), Some(&2.0));

        let dto = booking(json!({ "propertyId": "not-a-uuid", "totalPrice": 10 }));
        let errors = dto.validate().unwrap_err();
        assert_eq!(first_validation_message(&errors), "Invalid property id");

        let dto = booking(json!({ "guests": 0 }));
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            first_validation_message(&errors),
            "Guests must be a whole number of at least 1"
        );

        let dto = booking(json!({ "bbqKg": { "beef": -1 } }));
        assert!(dto.validate().is_err());
    }
}
