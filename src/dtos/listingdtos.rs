use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{validation_error, Numeric};
use crate::models::listingmodel::{AddOnPrice, BbqRate, ListingType, NightStayDetails};

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("blank", "Text fields cannot be blank"));
    }
    Ok(())
}

fn validate_regular_price(value: &Numeric) -> Result<(), ValidationError> {
    match value.as_f64() {
        None => Err(validation_error("regular_price", "Regular price must be a number")),
        Some(price) if price <= 0.0 => Err(validation_error(
            "regular_price",
            "Regular price must be greater than 0",
        )),
        Some(_) => Ok(()),
    }
}

fn validate_room_count(value: &Numeric) -> Result<(), ValidationError> {
    match value.as_i32() {
        Some(count) if count >= 0 => Ok(()),
        _ => Err(validation_error(
            "room_count",
            "Bedrooms and bathrooms must be whole numbers of 0 or more",
        )),
    }
}

fn validate_listing_type(value: &str) -> Result<(), ValidationError> {
    ListingType::parse(value)
        .map(|_| ())
        .ok_or_else(|| validation_error("listing_type", "Type must be sale, rent or night-stay"))
}

fn validate_image_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().any(|url| url.trim().is_empty()) {
        return Err(validation_error("image_urls", "Image URLs cannot be blank"));
    }
    Ok(())
}

fn validate_bbq_rates(rates: &[BbqRate]) -> Result<(), ValidationError> {
    if rates
        .iter()
        .any(|rate| !rate.price_per_kg.is_finite() || rate.price_per_kg < 0.0)
    {
        return Err(validation_error(
            "bbq_rates",
            "BBQ rates must be non-negative numbers",
        ));
    }
    for (i, rate) in rates.iter().enumerate() {
        if rates[..i].iter().any(|earlier| earlier.meat == rate.meat) {
            return Err(validation_error(
                "bbq_rates",
                "Each BBQ meat can only be listed once",
            ));
        }
    }
    Ok(())
}

fn validate_add_on_price(add_on: &AddOnPrice) -> Result<(), ValidationError> {
    if !add_on.price.is_finite() || add_on.price < 0.0 {
        return Err(validation_error(
            "add_on_price",
            "Add-on prices must be non-negative numbers",
        ));
    }
    Ok(())
}

fn validate_max_guests(value: &Numeric) -> Result<(), ValidationError> {
    match value.as_i32() {
        Some(guests) if guests >= 1 => Ok(()),
        _ => Err(validation_error(
            "max_guests",
            "Max guests must be a whole number of at least 1",
        )),
    }
}

/// Night-stay configuration as it arrives on create or update. Every field is
/// optional; present fields overwrite the current details.
#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightStayInput {
    #[validate(custom = "validate_bbq_rates")]
    pub bbq_rates: Option<Vec<BbqRate>>,
    #[validate(custom = "validate_add_on_price")]
    pub campfire: Option<AddOnPrice>,
    #[validate(custom = "validate_add_on_price")]
    pub sound_system: Option<AddOnPrice>,
    #[validate(custom = "validate_max_guests")]
    pub max_guests: Option<Numeric>,
    pub categories: Option<Vec<String>>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub house_rules: Option<String>,
}

impl NightStayInput {
    /// Expects a validated input.
    pub fn apply_to(&self, details: &mut NightStayDetails) {
        if let Some(rates) = &self.bbq_rates {
            details.bbq_rates = rates.clone();
        }
        if let Some(campfire) = &self.campfire {
            details.campfire = campfire.clone();
        }
        if let Some(sound_system) = &self.sound_system {
            details.sound_system = sound_system.clone();
        }
        if let Some(max_guests) = self.max_guests.as_ref().and_then(Numeric::as_i32) {
            details.max_guests = max_guests;
        }
        if let Some(categories) = &self.categories {
            details.categories = categories.clone();
        }
        if let Some(check_in_time) = &self.check_in_time {
            details.check_in_time = check_in_time.clone();
        }
        if let Some(check_out_time) = &self.check_out_time {
            details.check_out_time = check_out_time.clone();
        }
        if let Some(house_rules) = &self.house_rules {
            details.house_rules = house_rules.clone();
        }
    }
}

/// Field rules apply to whatever is present. `discountPrice` is left to the
/// service because it only matters when `offer` is on.
#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingDto {
    #[validate(custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub description: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub address: Option<String>,
    #[validate(custom = "validate_regular_price")]
    pub regular_price: Option<Numeric>,
    pub discount_price: Option<Numeric>,
    #[validate(custom = "validate_room_count")]
    pub bathrooms: Option<Numeric>,
    #[validate(custom = "validate_room_count")]
    pub bedrooms: Option<Numeric>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub offer: Option<bool>,
    #[serde(rename = "type")]
    #[validate(custom = "validate_listing_type")]
    pub listing_type: Option<String>,
    pub listing_sub_type: Option<String>,
    pub bbq_enabled: Option<bool>,
    #[validate(
        length(min = 1, max = 6, message = "A listing needs between 1 and 6 images"),
        custom = "validate_image_urls"
    )]
    pub image_urls: Option<Vec<String>>,
    #[serde(flatten)]
    #[validate]
    pub night_stay: NightStayInput,
}

impl CreateListingDto {
    /// First field a new listing needs but this body lacks. Blank text counts
    /// as missing.
    pub fn missing_field(&self) -> Option<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());

        if blank(&self.name) {
            Some("name")
        } else if blank(&self.description) {
            Some("description")
        } else if blank(&self.address) {
            Some("address")
        } else if self.regular_price.is_none() {
            Some("regularPrice")
        } else if self.bathrooms.is_none() {
            Some("bathrooms")
        } else if self.bedrooms.is_none() {
            Some("bedrooms")
        } else if self.furnished.is_none() {
            Some("furnished")
        } else if self.parking.is_none() {
            Some("parking")
        } else if self.listing_type.is_none() && self.listing_sub_type.is_none() {
            Some("type")
        } else if self.offer.is_none() {
            Some("offer")
        } else if self.image_urls.is_none() {
            Some("imageUrls")
        } else {
            None
        }
    }
}

/// Same shape as [`CreateListingDto`]; absent fields keep their stored value.
pub type UpdateListingDto = CreateListingDto;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchQueryDto {
    pub search_term: Option<String>,
    pub offer: Option<String>,
    pub furnished: Option<String>,
    pub parking: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub start_index: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQueryDto {
    pub search_term: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub max_price: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub furnished: Option<String>,
    pub parking: Option<String>,
    pub offer: Option<String>,
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dtos::first_validation_message, models::listingmodel::Meat};

    #[test]
    fn create_dto_reads_flat_night_stay_fields() {
        let dto: CreateListingDto = serde_json::from_value(serde_json::json!({
            "name": "Farm Stay",
            "regularPrice": "1500",
            "type": "night-stay",
            "maxGuests": 8,
            "campfire": { "enabled": true, "price": 300 },
            "bbqRates": [{ "meat": "chicken", "available": true, "pricePerKg": 450 }],
            "userRef": "someone-else"
        }))
        .unwrap();

        assert!(dto.validate().is_ok());
        assert_eq!(dto.regular_price.as_ref().and_then(Numeric::as_f64), Some(1500.0));
        let mut details = NightStayDetails::default();
        dto.night_stay.apply_to(&mut details);
        assert_eq!(details.max_guests, 8);
        assert!(details.campfire.enabled);
        assert_eq!(details.bbq_rate(Meat::Chicken).map(|r| r.price_per_kg), Some(450.0));
    }

    fn valid_dto() -> CreateListingDto {
        CreateListingDto {
            name: Some("Marina Flat".to_string()),
            description: Some("Two bedroom flat".to_string()),
            address: Some("12 Marina Road".to_string()),
            regular_price: Some(Numeric::Number(1000.0)),
            bathrooms: Some(Numeric::Number(1.0)),
            bedrooms: Some(Numeric::Text("2".to_string())),
            furnished: Some(false),
            parking: Some(true),
            offer: Some(false),
            listing_type: Some("rent".to_string()),
            image_urls: Some(vec!["https://img/1.jpg".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_negative_add_on_prices_and_zero_guests() {
        let input = NightStayInput {
            sound_system: Some(AddOnPrice { enabled: true, price: -1.0 }),
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let dto = CreateListingDto {
            night_stay: NightStayInput {
                max_guests: Some(Numeric::Number(0.0)),
                ..Default::default()
            },
            ..valid_dto()
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            first_validation_message(&errors),
            "Max guests must be a whole number of at least 1"
        );
    }

    #[test]
    fn image_count_and_room_counts_are_checked() {
        assert!(valid_dto().validate().is_ok());
        assert_eq!(valid_dto().missing_field(), None);

        let dto = CreateListingDto {
            image_urls: Some((0..7).map(|i| format!("https://img/{}.jpg", i)).collect()),
            ..valid_dto()
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(
            first_validation_message(&errors),
            "A listing needs between 1 and 6 images"
        );

        let dto = CreateListingDto {
            image_urls: Some(vec![]),
            ..valid_dto()
        };
        assert!(dto.validate().is_err());

        let dto = CreateListingDto {
            bathrooms: Some(Numeric::Text("2.5".to_string())),
            ..valid_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn discount_is_not_checked_here() {
        let dto = CreateListingDto {
            discount_price: Some(Numeric::Text("n/a".to_string())),
            ..valid_dto()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let dto = CreateListingDto {
            address: Some("   ".to_string()),
            ..valid_dto()
        };
        assert_eq!(dto.missing_field(), Some("address"));
        assert!(dto.validate().is_err());
    }
}
