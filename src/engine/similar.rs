//! Randomized ordering of similar listings.
//!
//! Candidates are shuffled and then insertion-sorted with a comparator that
//! draws a fresh criterion on every comparison: price, distance from the
//! reference provider, or "keep". The result varies between calls by
//! design; pass a seeded generator to pin it down.

use std::cmp::Ordering;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::listing::ListingWithProvider;
use crate::domain::types::Coordinates;
use crate::engine::geo::distance_km;

/// Upper bound on candidates fetched for a similarity lookup.
pub const MAX_SIMILAR_FETCH: usize = 50;

/// Candidates fetched for `limit` results: three times the limit, capped.
pub fn fetch_cap(limit: usize) -> usize {
    limit.saturating_mul(3).min(MAX_SIMILAR_FETCH)
}

fn random_comparison<R: Rng + ?Sized>(
    a: &ListingWithProvider,
    b: &ListingWithProvider,
    anchor: Option<Coordinates>,
    rng: &mut R,
) -> Ordering {
    match rng.random_range(0..3) {
        0 => a.listing.price.total_cmp(&b.listing.price),
        1 => {
            let distance = |candidate: &ListingWithProvider| {
                anchor
                    .zip(candidate.provider.coordinates)
                    .map(|(from, to)| distance_km(from, to))
            };
            match (distance(a), distance(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        }
        _ => Ordering::Equal,
    }
}

/// Shuffles `candidates` and then reorders them by randomly chosen criteria.
///
/// An insertion sort is used since the comparator is not a total order; the
/// output is always a permutation of the input.
pub fn vary_order<R: Rng + ?Sized>(
    mut candidates: Vec<ListingWithProvider>,
    reference: &ListingWithProvider,
    rng: &mut R,
) -> Vec<ListingWithProvider> {
    candidates.shuffle(rng);

    let anchor = reference.provider.coordinates;
    for i in 1..candidates.len() {
        let mut j = i;
        while j > 0
            && random_comparison(&candidates[j - 1], &candidates[j], anchor, rng)
                == Ordering::Greater
        {
            candidates.swap(j - 1, j);
            j -= 1;
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::listing::Listing;
    use crate::domain::provider::Provider;
    use crate::domain::types::{ListingId, ListingStatus, ProviderId};

    fn candidate(id: i32, price: f64, latitude: f64) -> ListingWithProvider {
        let created_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid date");
        ListingWithProvider {
            listing: Listing {
                id: ListingId::new(id).expect("valid id"),
                provider_id: ProviderId::new(id).expect("valid id"),
                name: format!("Encerado {id}"),
                description: String::new(),
                category: "wax".into(),
                price,
                discounted_price: None,
                duration_minutes: 45,
                is_available: true,
                status: ListingStatus::Active,
                created_at,
                updated_at: created_at,
            },
            provider: Provider {
                id: ProviderId::new(id).expect("valid id"),
                name: format!("Provider {id}"),
                category: "carwash".into(),
                street: String::new(),
                city: "Santiago".into(),
                region: "Metropolitana".into(),
                coordinates: Some(Coordinates::new(latitude, -70.6693).expect("valid")),
                is_verified: false,
                rating: 4.0,
                review_count: 3,
            },
        }
    }

    fn pool() -> Vec<ListingWithProvider> {
        (2..12)
            .map(|id| candidate(id, 10000.0 + f64::from(id) * 500.0, -33.0 - f64::from(id) / 10.0))
            .collect()
    }

    fn ids(candidates: &[ListingWithProvider]) -> Vec<i32> {
        candidates.iter().map(|c| c.listing.id.get()).collect()
    }

    #[test]
    fn fetch_cap_is_bounded() {
        assert_eq!(fetch_cap(6), 18);
        assert_eq!(fetch_cap(20), MAX_SIMILAR_FETCH);
        assert_eq!(fetch_cap(0), 0);
    }

    #[test]
    fn ordering_is_a_permutation() {
        let reference = candidate(1, 12000.0, -33.4489);
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut output = ids(&vary_order(pool(), &reference, &mut rng));
            output.sort_unstable();
            assert_eq!(output, (2..12).collect::<Vec<_>>());
        }
    }

    #[test]
    fn seeded_generator_is_reproducible() {
        let reference = candidate(1, 12000.0, -33.4489);
        let first = vary_order(pool(), &reference, &mut StdRng::seed_from_u64(99));
        let second = vary_order(pool(), &reference, &mut StdRng::seed_from_u64(99));
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn handles_trivial_inputs() {
        let reference = candidate(1, 12000.0, -33.4489);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(vary_order(Vec::new(), &reference, &mut rng).is_empty());
        let single = vary_order(vec![candidate(5, 1.0, -33.0)], &reference, &mut rng);
        assert_eq!(ids(&single), vec![5]);
    }
}
