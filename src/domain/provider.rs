use serde::{Deserialize, Serialize};

use crate::domain::types::{Coordinates, ProviderId};

/// A business that owns listings and has a physical location.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub category: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub coordinates: Option<Coordinates>,
    pub is_verified: bool,
    /// Aggregate rating in `[0, 5]`.
    pub rating: f64,
    pub review_count: i32,
}
