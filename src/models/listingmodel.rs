use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "listing_type", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum ListingType {
    Sale,
    Rent,
    NightStay,
}

impl ListingType {
    pub fn db_name(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
            ListingType::NightStay => "night_stay",
        }
    }

    /// Case-insensitive; accepts the spellings the web client has used over time.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sale" => Some(ListingType::Sale),
            "rent" => Some(ListingType::Rent),
            "night-stay" | "night_stay" | "nightstay" => Some(ListingType::NightStay),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Meat {
    Chicken,
    Mutton,
    Beef,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BbqRate {
    pub meat: Meat,
    pub available: bool,
    pub price_per_kg: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AddOnPrice {
    pub enabled: bool,
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NightStayDetails {
    pub bbq_rates: Vec<BbqRate>,
    pub campfire: AddOnPrice,
    pub sound_system: AddOnPrice,
    pub max_guests: i32,
    pub categories: Vec<String>,
    pub check_in_time: String,
    pub check_out_time: String,
    pub house_rules: String,
}

impl Default for NightStayDetails {
    fn default() -> Self {
        NightStayDetails {
            bbq_rates: Vec::new(),
            campfire: AddOnPrice::default(),
            sound_system: AddOnPrice::default(),
            max_guests: 1,
            categories: Vec::new(),
            check_in_time: "14:00".to_string(),
            check_out_time: "12:00".to_string(),
            house_rules: String::new(),
        }
    }
}

impl NightStayDetails {
    pub fn bbq_rate(&self, meat: Meat) -> Option<&BbqRate> {
        self.bbq_rates.iter().find(|rate| rate.meat == meat)
    }

    pub fn bbq_available(&self) -> bool {
        self.bbq_rates.iter().any(|rate| rate.available)
    }
}

/// What is being offered. Night-stay carries its add-on configuration; the
/// other variants carry nothing beyond the common listing fields.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ListingKind {
    Sale,
    Rent,
    NightStay(NightStayDetails),
}

impl ListingKind {
    pub fn listing_type(&self) -> ListingType {
        match self {
            ListingKind::Sale => ListingType::Sale,
            ListingKind::Rent => ListingType::Rent,
            ListingKind::NightStay(_) => ListingType::NightStay,
        }
    }

    pub fn night_stay(&self) -> Option<&NightStayDetails> {
        match self {
            ListingKind::NightStay(details) => Some(details),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub regular_price: f64,
    pub discount_price: f64,
    pub bathrooms: i32,
    pub bedrooms: i32,
    pub furnished: bool,
    pub parking: bool,
    pub offer: bool,
    pub image_urls: Vec<String>,
    pub user_ref: Uuid,
    #[serde(flatten)]
    pub kind: ListingKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Price a buyer actually pays.
    pub fn effective_price(&self) -> f64 {
        if self.offer {
            self.discount_price
        } else {
            self.regular_price
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub name: String,
    pub description: String,
    pub address: String,
    pub regular_price: f64,
    pub discount_price: f64,
    pub bathrooms: i32,
    pub bedrooms: i32,
    pub furnished: bool,
    pub parking: bool,
    pub offer: bool,
    pub image_urls: Vec<String>,
    pub user_ref: Uuid,
    pub kind: ListingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Sale,
    /// Plain rentals and night-stays.
    Rent,
    NightStay,
}

impl TypeFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, String> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(TypeFilter::All);
        };
        if value.eq_ignore_ascii_case("all") {
            return Ok(TypeFilter::All);
        }
        match ListingType::parse(value) {
            Some(ListingType::Sale) => Ok(TypeFilter::Sale),
            Some(ListingType::Rent) => Ok(TypeFilter::Rent),
            Some(ListingType::NightStay) => Ok(TypeFilter::NightStay),
            None => Err(format!("Invalid listing type filter: {}", value)),
        }
    }

    pub fn listing_types(&self) -> Vec<ListingType> {
        match self {
            TypeFilter::All => vec![ListingType::Sale, ListingType::Rent, ListingType::NightStay],
            TypeFilter::Sale => vec![ListingType::Sale],
            TypeFilter::Rent => vec![ListingType::Rent, ListingType::NightStay],
            TypeFilter::NightStay => vec![ListingType::NightStay],
        }
    }

    pub fn matches(&self, kind: &ListingKind) -> bool {
        self.listing_types().contains(&kind.listing_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    RegularPrice,
    DiscountPrice,
    Name,
}

impl SortKey {
    /// Unknown keys fall back to creation time.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("updatedAt") | Some("updated_at") => SortKey::UpdatedAt,
            Some("regularPrice") | Some("regular_price") => SortKey::RegularPrice,
            Some("discountPrice") | Some("discount_price") => SortKey::DiscountPrice,
            Some("name") => SortKey::Name,
            _ => SortKey::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::RegularPrice => "regular_price",
            SortKey::DiscountPrice => "discount_price",
            SortKey::Name => "name",
        }
    }

    fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::RegularPrice => a.regular_price.total_cmp(&b.regular_price),
            SortKey::DiscountPrice => a.discount_price.total_cmp(&b.discount_price),
            SortKey::Name => a.name.cmp(&b.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Marketplace search. Boolean filters are `Some(true)` to restrict, `None`
/// to match both values.
#[derive(Debug, Clone, Default)]
pub struct ListingSearch {
    pub search_term: Option<String>,
    pub offer: Option<bool>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub type_filter: TypeFilter,
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: i64,
    pub start_index: i64,
    pub exclude_owner: Option<Uuid>,
}

impl ListingSearch {
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(term) = &self.search_term {
            if !listing.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        let flag = |filter: Option<bool>, value: bool| filter.map_or(true, |f| f == value);
        flag(self.offer, listing.offer)
            && flag(self.furnished, listing.furnished)
            && flag(self.parking, listing.parking)
            && self.type_filter.matches(&listing.kind)
            && self.exclude_owner.map_or(true, |owner| listing.user_ref != owner)
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let ordering = self.sort.compare(a, b);
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(kind: ListingKind) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            name: "Lakeside Cabin".to_string(),
            description: "Quiet".to_string(),
            address: "1 Lake Road".to_string(),
            regular_price: 100.0,
            discount_price: 0.0,
            bathrooms: 1,
            bedrooms: 2,
            furnished: true,
            parking: false,
            offer: false,
            image_urls: vec!["https://img/1.jpg".to_string()],
            user_ref: Uuid::new_v4(),
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parses_listing_type_case_insensitively() {
        assert_eq!(ListingType::parse("SALE"), Some(ListingType::Sale));
        assert_eq!(ListingType::parse(" Rent "), Some(ListingType::Rent));
        assert_eq!(ListingType::parse("Night-Stay"), Some(ListingType::NightStay));
        assert_eq!(ListingType::parse("lease"), None);
    }

    #[test]
    fn rent_filter_includes_night_stays() {
        let stay = listing(ListingKind::NightStay(NightStayDetails::default()));
        assert!(TypeFilter::Rent.matches(&stay.kind));
        assert!(TypeFilter::NightStay.matches(&stay.kind));
        assert!(!TypeFilter::Sale.matches(&stay.kind));
        assert!(TypeFilter::All.matches(&listing(ListingKind::Sale).kind));
        assert_eq!(TypeFilter::parse(Some("all")), Ok(TypeFilter::All));
        assert_eq!(TypeFilter::parse(None), Ok(TypeFilter::All));
        assert!(TypeFilter::parse(Some("castle")).is_err());
    }

    #[test]
    fn search_excludes_owner_and_matches_name_substring() {
        let item = listing(ListingKind::Rent);
        let mut search = ListingSearch {
            search_term: Some("CABIN".to_string()),
            ..Default::default()
        };
        assert!(search.matches(&item));

        search.exclude_owner = Some(item.user_ref);
        assert!(!search.matches(&item));

        search.exclude_owner = None;
        search.parking = Some(true);
        assert!(!search.matches(&item));
    }

    #[test]
    fn night_stay_serializes_flat_with_type_tag() {
        let item = listing(ListingKind::NightStay(NightStayDetails {
            max_guests: 6,
            ..Default::default()
        }));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "night-stay");
        assert_eq!(json["maxGuests"], 6);
        assert_eq!(json["regularPrice"], 100.0);

        let sale = serde_json::to_value(listing(ListingKind::Sale)).unwrap();
        assert_eq!(sale["type"], "sale");
        assert!(sale.get("maxGuests").is_none());
    }

    #[test]
    fn effective_price_uses_discount_only_on_offer() {
        let mut item = listing(ListingKind::Sale);
        assert_eq!(item.effective_price(), 100.0);
        item.offer = true;
        item.discount_price = 80.0;
        assert_eq!(item.effective_price(), 80.0);
    }
}
