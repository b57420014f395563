use std::{cmp::Ordering, collections::HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::listingmodel::{Listing, ListingType};

/// Listing similarity score.
///
/// score = Σ weight_i * criterion_i / 100, each criterion in 0..=100.
/// Criteria without input score `NEUTRAL_SCORE` instead of being penalised.
pub const PRICE_WEIGHT: f64 = 25.0;
pub const LOCATION_WEIGHT: f64 = 20.0;
pub const AMENITIES_WEIGHT: f64 = 20.0;
pub const TYPE_WEIGHT: f64 = 15.0;
pub const SIZE_WEIGHT: f64 = 10.0;
pub const RECENCY_WEIGHT: f64 = 10.0;

pub const NEUTRAL_SCORE: f64 = 50.0;
pub const RECENCY_WINDOW_DAYS: f64 = 180.0;

/// Free-text recommendation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub text: Option<String>,
    pub max_price: Option<f64>,
    pub listing_type: Option<ListingType>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub offer: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum RecommendationTarget<'a> {
    Similar(&'a Listing),
    Query(ListingQuery),
}

impl RecommendationTarget<'_> {
    fn is(&self, candidate: &Listing) -> bool {
        matches!(self, RecommendationTarget::Similar(target) if target.id == candidate.id)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub listing: Listing,
    pub score: f64,
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn ratio_score(ratio: f64) -> f64 {
    100.0 * ratio.clamp(0.0, 1.0)
}

fn price_score(target: &RecommendationTarget, candidate: &Listing) -> f64 {
    let price = candidate.effective_price();
    match target {
        RecommendationTarget::Similar(listing) => {
            let reference = listing.effective_price();
            if reference <= 0.0 {
                return NEUTRAL_SCORE;
            }
            ratio_score(1.0 - (price - reference).abs() / reference)
        }
        RecommendationTarget::Query(query) => match query.max_price {
            Some(max) if max > 0.0 => {
                if price <= max {
                    100.0
                } else {
                    ratio_score(1.0 - (price - max) / max)
                }
            }
            _ => NEUTRAL_SCORE,
        },
    }
}

fn location_score(target: &RecommendationTarget, candidate: &Listing) -> f64 {
    match target {
        RecommendationTarget::Similar(listing) => {
            let wanted = words(&listing.address);
            if wanted.is_empty() {
                return NEUTRAL_SCORE;
            }
            ratio_score(jaccard(&wanted, &words(&candidate.address)))
        }
        RecommendationTarget::Query(query) => {
            let wanted = query.text.as_deref().map(words).unwrap_or_default();
            if wanted.is_empty() {
                return NEUTRAL_SCORE;
            }
            let mut haystack = words(&candidate.name);
            haystack.extend(words(&candidate.address));
            haystack.extend(words(&candidate.description));
            let hits = wanted.iter().filter(|w| haystack.contains(*w)).count();
            ratio_score(hits as f64 / wanted.len() as f64)
        }
    }
}

fn amenities_score(target: &RecommendationTarget, candidate: &Listing) -> f64 {
    let wanted = match target {
        RecommendationTarget::Similar(listing) => [
            Some(listing.furnished),
            Some(listing.parking),
            Some(listing.offer),
        ],
        RecommendationTarget::Query(query) => [query.furnished, query.parking, query.offer],
    };
    let have = [candidate.furnished, candidate.parking, candidate.offer];

    let compared: Vec<bool> = wanted
        .into_iter()
        .zip(have)
        .filter_map(|(w, h)| w.map(|w| w == h))
        .collect();
    if compared.is_empty() {
        return NEUTRAL_SCORE;
    }
    ratio_score(compared.iter().filter(|m| **m).count() as f64 / compared.len() as f64)
}

fn type_score(target: &RecommendationTarget, candidate: &Listing) -> f64 {
    let wanted = match target {
        RecommendationTarget::Similar(listing) => listing.kind.listing_type(),
        RecommendationTarget::Query(query) => match query.listing_type {
            Some(listing_type) => listing_type,
            None => return NEUTRAL_SCORE,
        },
    };
    let have = candidate.kind.listing_type();
    if wanted == have {
        100.0
    } else if wanted != ListingType::Sale && have != ListingType::Sale {
        // rent and night-stay are both rentals
        50.0
    } else {
        0.0
    }
}

fn sufficiency(wanted: Option<i32>, have: i32) -> f64 {
    match wanted {
        None => NEUTRAL_SCORE,
        Some(wanted) if wanted <= 0 || have >= wanted => 100.0,
        Some(wanted) => ratio_score(have.max(0) as f64 / wanted as f64),
    }
}

fn size_score(target: &RecommendationTarget, candidate: &Listing) -> f64 {
    let (bedrooms, bathrooms) = match target {
        RecommendationTarget::Similar(listing) => (Some(listing.bedrooms), Some(listing.bathrooms)),
        RecommendationTarget::Query(query) => (query.bedrooms, query.bathrooms),
    };
    (sufficiency(bedrooms, candidate.bedrooms) + sufficiency(bathrooms, candidate.bathrooms)) / 2.0
}

fn recency_score(candidate: &Listing, now: DateTime<Utc>) -> f64 {
    let age_days = (now - candidate.created_at).num_seconds().max(0) as f64 / 86_400.0;
    ratio_score(1.0 - age_days / RECENCY_WINDOW_DAYS)
}

pub fn score(target: &RecommendationTarget, candidate: &Listing, now: DateTime<Utc>) -> f64 {
    let total = PRICE_WEIGHT * price_score(target, candidate)
        + LOCATION_WEIGHT * location_score(target, candidate)
        + AMENITIES_WEIGHT * amenities_score(target, candidate)
        + TYPE_WEIGHT * type_score(target, candidate)
        + SIZE_WEIGHT * size_score(target, candidate)
        + RECENCY_WEIGHT * recency_score(candidate, now);
    ((total / 100.0) * 100.0).round() / 100.0
}

fn by_score_desc(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.listing.created_at.cmp(&a.listing.created_at))
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}

/// Scores every candidate against `target` and keeps the best `limit`,
/// highest first. The target itself is never recommended.
pub fn recommend(
    target: &RecommendationTarget,
    candidates: Vec<Listing>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .filter(|candidate| !target.is(candidate))
        .map(|listing| Recommendation {
            score: score(target, &listing, now),
            listing,
        })
        .collect();

    if scored.len() > limit {
        scored.select_nth_unstable_by(limit - 1, by_score_desc);
        scored.truncate(limit);
    }
    scored.sort_unstable_by(by_score_desc);
    scored
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::models::listingmodel::{ListingKind, NightStayDetails};

    fn listing(name: &str, address: &str, price: f64, kind: ListingKind) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            address: address.to_string(),
            regular_price: price,
            discount_price: 0.0,
            bathrooms: 1,
            bedrooms: 2,
            furnished: true,
            parking: true,
            offer: false,
            image_urls: vec!["https://img/1.jpg".to_string()],
            user_ref: Uuid::new_v4(),
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn identical_fresh_listing_scores_full_marks() {
        let target = listing("Flat", "12 Marina Road Lagos", 1000.0, ListingKind::Rent);
        let mut twin = target.clone();
        twin.id = Uuid::new_v4();
        let now = twin.created_at;

        assert_eq!(score(&RecommendationTarget::Similar(&target), &twin, now), 100.0);
    }

    #[test]
    fn empty_query_is_neutral_except_recency() {
        let candidate = listing("Flat", "Lagos", 1000.0, ListingKind::Sale);
        let now = candidate.created_at;
        let query = RecommendationTarget::Query(ListingQuery::default());

        // 90% of the weight is neutral (50), recency is fresh (100)
        assert_eq!(score(&query, &candidate, now), 55.0);
    }

    #[test]
    fn recency_decays_to_zero_after_window() {
        let mut candidate = listing("Flat", "Lagos", 1000.0, ListingKind::Sale);
        let now = candidate.created_at;
        assert_eq!(recency_score(&candidate, now), 100.0);

        candidate.created_at = now - Duration::days(90);
        assert!((recency_score(&candidate, now) - 50.0).abs() < 1e-9);

        candidate.created_at = now - Duration::days(365);
        assert_eq!(recency_score(&candidate, now), 0.0);
    }

    #[test]
    fn night_stay_is_half_a_match_for_rent() {
        let target = listing("Flat", "Lagos", 1000.0, ListingKind::Rent);
        let stay = listing(
            "Cabin",
            "Lagos",
            1000.0,
            ListingKind::NightStay(NightStayDetails::default()),
        );
        let sale = listing("House", "Lagos", 1000.0, ListingKind::Sale);
        let similar = RecommendationTarget::Similar(&target);

        assert_eq!(type_score(&similar, &stay), 50.0);
        assert_eq!(type_score(&similar, &sale), 0.0);
    }

    #[test]
    fn recommend_keeps_top_k_in_order_and_skips_target() {
        let target = listing("Flat", "12 Marina Road Lagos", 1000.0, ListingKind::Rent);
        let close = listing("Flat", "14 Marina Road Lagos", 1050.0, ListingKind::Rent);
        let medium = listing("Flat", "Marina Abuja", 1500.0, ListingKind::Rent);
        let far = listing("Mansion", "Kano", 90000.0, ListingKind::Sale);
        let now = target.created_at;

        let picks = recommend(
            &RecommendationTarget::Similar(&target),
            vec![far.clone(), target.clone(), medium.clone(), close.clone()],
            2,
            now,
        );

        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].listing.id, close.id);
        assert_eq!(picks[1].listing.id, medium.id);
        assert!(picks[0].score >= picks[1].score);
    }

    #[test]
    fn query_text_matches_name_address_and_description() {
        let mut candidate = listing("Cozy cabin", "Lake Road", 500.0, ListingKind::Rent);
        candidate.description = "Quiet spot with campfire".to_string();
        let query = RecommendationTarget::Query(ListingQuery {
            text: Some("cabin campfire".to_string()),
            max_price: Some(600.0),
            ..Default::default()
        });

        assert_eq!(location_score(&query, &candidate), 100.0);
        assert_eq!(price_score(&query, &candidate), 100.0);
        assert!(recommend(&query, vec![candidate], 0, Utc::now()).is_empty());
    }
}
