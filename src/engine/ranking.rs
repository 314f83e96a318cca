//! Distance annotation, radius filtering and in-memory ordering.
//!
//! The store ranks and pages whatever it can. Once candidates are loaded
//! into memory (geo queries, diversification) the same criteria are
//! applied here.

use std::cmp::Ordering;

use crate::domain::listing::ListingWithProvider;
use crate::domain::search::{SortBy, SortOrder};
use crate::domain::types::Coordinates;
use crate::engine::geo::distance_km;

/// A candidate together with its distance from the query origin.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCandidate {
    pub candidate: ListingWithProvider,
    pub distance_km: Option<f64>,
}

impl RankedCandidate {
    pub fn region(&self) -> &str {
        &self.candidate.provider.region
    }

    pub fn city(&self) -> &str {
        &self.candidate.provider.city
    }

    /// Diversification key: `(region, city)`.
    pub fn location(&self) -> (&str, &str) {
        (self.region(), self.city())
    }
}

/// Computes the distance from `origin` for every candidate whose provider
/// has coordinates.
pub fn attach_distances(
    candidates: Vec<ListingWithProvider>,
    origin: Option<Coordinates>,
) -> Vec<RankedCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            let distance_km = origin
                .zip(candidate.provider.coordinates)
                .map(|(origin, location)| distance_km(origin, location));
            RankedCandidate {
                candidate,
                distance_km,
            }
        })
        .collect()
}

/// Keeps candidates whose distance is known and does not exceed `radius_km`.
pub fn within_radius(candidates: Vec<RankedCandidate>, radius_km: f64) -> Vec<RankedCandidate> {
    candidates
        .into_iter()
        .filter(|ranked| ranked.distance_km.is_some_and(|d| d <= radius_km))
        .collect()
}

fn compare(a: &RankedCandidate, b: &RankedCandidate, sort_by: SortBy) -> Ordering {
    let (left, right) = (&a.candidate, &b.candidate);
    match sort_by {
        SortBy::Relevance => Ordering::Equal,
        SortBy::Price => left.listing.price.total_cmp(&right.listing.price),
        SortBy::Rating => left
            .provider
            .rating
            .total_cmp(&right.provider.rating)
            .then(left.provider.review_count.cmp(&right.provider.review_count)),
        SortBy::Name => left
            .listing
            .name
            .to_lowercase()
            .cmp(&right.listing.name.to_lowercase()),
        SortBy::Date => left.listing.created_at.cmp(&right.listing.created_at),
        SortBy::Distance => match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Stable in-place sort; ties keep their prior relative order.
pub fn sort_candidates(candidates: &mut [RankedCandidate], sort_by: SortBy, order: SortOrder) {
    if sort_by == SortBy::Relevance {
        return;
    }
    match order {
        SortOrder::Asc => candidates.sort_by(|a, b| compare(a, b, sort_by)),
        SortOrder::Desc => candidates.sort_by(|a, b| compare(b, a, sort_by)),
    }
}
