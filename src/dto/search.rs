//! Response shapes of the search endpoints.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::listing::{Listing, ListingImage, ListingWithProvider, Review};
use crate::domain::provider::Provider;
use crate::domain::search::{IncludeOptions, SearchQuery, SortBy, SortOrder, SuggestionKind};
use crate::engine::geo::round2;
use crate::engine::statistics::SearchStatistics;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
}

impl From<&Provider> for ProviderSummary {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.get(),
            name: provider.name.clone(),
            category: provider.category.clone(),
            street: provider.street.clone(),
            city: provider.city.clone(),
            region: provider.region.clone(),
            latitude: provider.coordinates.map(|c| c.latitude()),
            longitude: provider.coordinates.map(|c| c.longitude()),
            is_verified: provider.is_verified,
            rating: provider.rating,
            review_count: provider.review_count,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    pub original_price: f64,
    pub discounted_price: f64,
    pub savings: f64,
    pub percent: u32,
}

impl DiscountSummary {
    /// `None` unless the listing carries a discount not above its price.
    pub fn of(listing: &Listing) -> Option<Self> {
        let discounted = listing.effective_discount()?;
        Some(Self {
            original_price: listing.price,
            discounted_price: discounted,
            savings: round2(listing.price - discounted),
            percent: listing.discount_percent(),
        })
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePreview {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub is_primary: bool,
}

impl From<ListingImage> for ImagePreview {
    fn from(image: ListingImage) -> Self {
        Self {
            url: image.url,
            alt_text: image.alt_text,
            is_primary: image.is_primary,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPreview {
    pub author_name: String,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Review> for ReviewPreview {
    fn from(review: Review) -> Self {
        Self {
            author_name: review.author_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// A listing projected for the response.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub duration_minutes: i32,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImagePreview>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewPreview>>,
}

impl SearchResultItem {
    /// Projects `candidate`; image and review previews are attached later.
    pub fn new(
        candidate: &ListingWithProvider,
        distance_km: Option<f64>,
        include: IncludeOptions,
    ) -> Self {
        let listing = &candidate.listing;
        Self {
            id: listing.id.get(),
            name: listing.name.clone(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            price: listing.price,
            discounted_price: listing.discounted_price,
            duration_minutes: listing.duration_minutes,
            is_available: listing.is_available,
            created_at: listing.created_at,
            provider: include
                .provider
                .then(|| ProviderSummary::from(&candidate.provider)),
            distance_km,
            discount: DiscountSummary::of(listing),
            images: None,
            reviews: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

/// The filters that were applied, echoed back to the caller.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    pub available_only: bool,
    pub verified_only: bool,
    pub has_discounts: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl From<&SearchQuery> for AppliedFilters {
    fn from(query: &SearchQuery) -> Self {
        Self {
            location: query.origin.map(|origin| GeoFilter {
                lat: origin.latitude(),
                lng: origin.longitude(),
                radius_km: query.radius_km,
            }),
            city: query.city.clone(),
            region: query.region.clone(),
            categories: query.categories.clone(),
            min_price: query.min_price,
            max_price: query.max_price,
            min_rating: query.min_rating,
            available_only: query.available_only,
            verified_only: query.verified_only,
            has_discounts: query.has_discounts,
            sort_by: query.sort_by,
            sort_order: query.sort_order,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Size of the whole filtered set, not of this page.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub query: Option<String>,
    pub filters: AppliedFilters,
    pub execution_time_ms: u64,
    pub suggestions: Vec<String>,
    pub statistics: SearchStatistics,
}

/// One autocomplete entry.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::domain::types::{Coordinates, ListingId, ListingStatus, ProviderId};

    fn candidate(discounted_price: Option<f64>) -> ListingWithProvider {
        let created_at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date");
        ListingWithProvider {
            listing: Listing {
                id: ListingId::new(7).expect("valid id"),
                provider_id: ProviderId::new(3).expect("valid id"),
                name: "Lavado Premium".into(),
                description: "Exterior e interior".into(),
                category: "premium".into(),
                price: 15000.0,
                discounted_price,
                duration_minutes: 60,
                is_available: true,
                status: ListingStatus::Active,
                created_at,
                updated_at: created_at,
            },
            provider: Provider {
                id: ProviderId::new(3).expect("valid id"),
                name: "Brillo Total".into(),
                category: "carwash".into(),
                street: "Av. Providencia 1234".into(),
                city: "Santiago".into(),
                region: "Metropolitana".into(),
                coordinates: Some(Coordinates::new(-33.43, -70.61).expect("valid")),
                is_verified: true,
                rating: 4.7,
                review_count: 120,
            },
        }
    }

    #[test]
    fn discount_summary_requires_valid_discount() {
        let item = SearchResultItem::new(&candidate(Some(12000.0)), None, IncludeOptions::default());
        assert_eq!(
            item.discount,
            Some(DiscountSummary {
                original_price: 15000.0,
                discounted_price: 12000.0,
                savings: 3000.0,
                percent: 20,
            })
        );

        let item = SearchResultItem::new(&candidate(Some(18000.0)), None, IncludeOptions::default());
        assert_eq!(item.discount, None);
    }

    #[test]
    fn provider_summary_follows_include_flag() {
        let include = IncludeOptions {
            provider: false,
            ..IncludeOptions::default()
        };
        let item = SearchResultItem::new(&candidate(None), Some(1.25), include);
        let value = serde_json::to_value(&item).expect("serializes");

        assert!(value.get("provider").is_none());
        assert_eq!(value["distanceKm"], json!(1.25));
        assert_eq!(value["durationMinutes"], json!(60));
    }

    #[test]
    fn suggestion_serializes_kind_as_type() {
        let suggestion = Suggestion {
            text: "premium".into(),
            kind: SuggestionKind::Category,
            id: None,
            metadata: json!({ "count": 4 }),
        };
        assert_eq!(
            serde_json::to_value(&suggestion).expect("serializes"),
            json!({ "text": "premium", "type": "category", "metadata": { "count": 4 } })
        );
    }
}
