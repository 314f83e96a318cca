//! Geographic diversification of relevance-ordered results.
//!
//! Candidates are bucketed by region and then by city. Regions are visited
//! round-robin in a per-call shuffled order and, inside each region, cities
//! are visited round-robin as well, emitting one candidate per step from the
//! head of the chosen city queue. All rotation state lives in this call.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;

struct CityQueue<T> {
    city: String,
    items: VecDeque<T>,
}

struct RegionBucket<T> {
    cities: Vec<CityQueue<T>>,
    /// Next city to visit inside this region.
    cursor: usize,
}

/// Reorders `items` so that consecutive entries rotate across regions and
/// cities. The output is always a permutation of the input; within a city
/// the original order is preserved.
pub fn diversify<T, K, R>(items: Vec<T>, key: K, rng: &mut R) -> Vec<T>
where
    K: Fn(&T) -> (&str, &str),
    R: Rng + ?Sized,
{
    let total = items.len();
    let mut regions: Vec<RegionBucket<T>> = Vec::new();
    let mut region_index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let (region, city) = {
            let (region, city) = key(&item);
            (region.to_string(), city.to_string())
        };

        let slot = *region_index.entry(region).or_insert_with(|| {
            regions.push(RegionBucket {
                cities: Vec::new(),
                cursor: 0,
            });
            regions.len() - 1
        });

        let bucket = &mut regions[slot];
        match bucket.cities.iter_mut().find(|queue| queue.city == city) {
            Some(queue) => queue.items.push_back(item),
            None => bucket.cities.push(CityQueue {
                city,
                items: VecDeque::from([item]),
            }),
        }
    }

    regions.shuffle(rng);

    let mut diversified = Vec::with_capacity(total);
    let max_iterations = total.saturating_mul(2);
    let mut iterations = 0;
    let mut current = 0;

    while !regions.is_empty() && iterations < max_iterations {
        iterations += 1;
        current %= regions.len();

        let bucket = &mut regions[current];
        let city_slot = bucket.cursor % bucket.cities.len();
        let queue = &mut bucket.cities[city_slot];

        if let Some(item) = queue.items.pop_front() {
            diversified.push(item);
        }

        if queue.items.is_empty() {
            bucket.cities.remove(city_slot);
            bucket.cursor = city_slot;
        } else {
            bucket.cursor = city_slot + 1;
        }

        if bucket.cities.is_empty() {
            regions.remove(current);
        } else {
            current += 1;
        }
    }

    // Reached only if the cap fired; keep the output a permutation.
    for bucket in regions {
        for queue in bucket.cities {
            diversified.extend(queue.items);
        }
    }

    diversified
}
