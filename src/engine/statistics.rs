//! Aggregates over a filtered candidate set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::listing::PricePoint;
use crate::engine::geo::round2;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    pub average_price: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatistics {
    pub price_range: PriceRange,
    /// Sorted by descending count, then category name.
    pub categories: Vec<CategoryCount>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    pub region: String,
    pub city: String,
    pub provider_count: usize,
}

/// Min/max/average price (all `0` for an empty set), rounded to cents.
pub fn price_range(points: &[PricePoint]) -> PriceRange {
    if points.is_empty() {
        return PriceRange::default();
    }

    let (min, max, sum) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), point| (min.min(point.price), max.max(point.price), sum + point.price),
    );
    let average = sum / points.len() as f64;

    // Rounding is monotonic, so min <= average <= max survives it.
    PriceRange {
        min: round2(min),
        max: round2(max),
        average: round2(average.clamp(min, max)),
    }
}

pub fn compute_statistics(points: &[PricePoint]) -> SearchStatistics {
    let mut per_category: HashMap<&str, (usize, f64)> = HashMap::new();
    for point in points {
        let entry = per_category.entry(point.category.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += point.price;
    }

    let mut categories: Vec<CategoryCount> = per_category
        .into_iter()
        .map(|(category, (count, total))| CategoryCount {
            category: category.to_string(),
            count,
            average_price: round2(total / count as f64),
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

    SearchStatistics {
        price_range: price_range(points),
        categories,
    }
}

/// Counts providers per `(region, city)`, most populated first.
pub fn count_locations(locations: Vec<(String, String)>) -> Vec<LocationCount> {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for location in locations {
        *counts.entry(location).or_insert(0) += 1;
    }

    let mut result: Vec<LocationCount> = counts
        .into_iter()
        .map(|((region, city), provider_count)| LocationCount {
            region,
            city,
            provider_count,
        })
        .collect();
    result.sort_by(|a, b| {
        b.provider_count
            .cmp(&a.provider_count)
            .then_with(|| a.region.cmp(&b.region))
            .then_with(|| a.city.cmp(&b.city))
    });
    result
}
