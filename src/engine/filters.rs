//! Translation of a validated query into the store predicate set.

use crate::domain::search::SearchQuery;
use crate::repository::ListingFilter;

/// Builds the predicate set for `query`. Pure: the same query always yields
/// the same filter. Geographic radius is not part of it since the store
/// cannot evaluate distances.
pub fn build_filter(query: &SearchQuery) -> ListingFilter {
    ListingFilter {
        text: query.term.clone(),
        categories: query.categories.clone(),
        min_price: query.min_price,
        max_price: query.max_price,
        min_rating: query.min_rating,
        has_discount: query.has_discounts,
        city: query.city.clone(),
        region: query.region.clone(),
        available_only: query.available_only,
        verified_only: query.verified_only,
    }
}
