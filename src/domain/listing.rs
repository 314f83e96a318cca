use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::provider::Provider;
use crate::domain::types::{ImageId, ListingId, ListingStatus, ProviderId, ReviewId};

/// A single purchasable service offered by a provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub provider_id: ProviderId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub duration_minutes: i32,
    pub is_available: bool,
    pub status: ListingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Listing {
    /// Discounted price, reported only when it does not exceed the base price.
    pub fn effective_discount(&self) -> Option<f64> {
        self.discounted_price
            .filter(|discounted| *discounted >= 0.0 && *discounted <= self.price)
    }

    /// Whole-number discount percentage, `0` when there is no valid discount.
    pub fn discount_percent(&self) -> u32 {
        match self.effective_discount() {
            Some(discounted) if self.price > 0.0 => {
                (((self.price - discounted) / self.price) * 100.0).round() as u32
            }
            _ => 0,
        }
    }
}

/// A listing joined with the provider that owns it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ListingWithProvider {
    pub listing: Listing,
    pub provider: Provider,
}

/// The two listing attributes the statistics aggregator needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ListingImage {
    pub id: ImageId,
    pub listing_id: ListingId,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub listing_id: ListingId,
    pub author_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}
