//! The strongly-typed search request.
//!
//! A [`SearchQuery`] only ever exists in its validated form; loosely typed
//! input is coerced into it by [`crate::forms::search`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::types::{Coordinates, TypeConstraintError};

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;
pub const MAX_SUGGESTION_LIMIT: usize = 20;
/// Shorter terms never reach the store.
pub const MIN_SUGGESTION_TERM_CHARS: usize = 3;

/// Criterion used to order search results.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Default ranking, eligible for geographic diversification.
    #[default]
    Relevance,
    Price,
    Rating,
    Name,
    Date,
    Distance,
}

impl SortBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Price => "price",
            SortBy::Rating => "rating",
            SortBy::Name => "name",
            SortBy::Date => "date",
            SortBy::Distance => "distance",
        }
    }
}

impl Display for SortBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "price" => Ok(SortBy::Price),
            "rating" => Ok(SortBy::Rating),
            "name" => Ok(SortBy::Name),
            "date" | "createdat" | "created_at" | "newest" => Ok(SortBy::Date),
            "distance" => Ok(SortBy::Distance),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown sort field `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown sort order `{other}`"
            ))),
        }
    }
}

/// Which nested collections to attach to every result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncludeOptions {
    pub provider: bool,
    pub images: bool,
    pub reviews: bool,
}

impl Default for IncludeOptions {
    fn default() -> Self {
        Self {
            provider: true,
            images: false,
            reviews: false,
        }
    }
}

/// Validated search request. Never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free-text term, already trimmed.
    #[validate(length(min = 1, max = 200))]
    pub term: Option<String>,
    /// Query origin; present only when both coordinates parsed.
    pub origin: Option<Coordinates>,
    #[validate(range(min = 1.0, max = 100.0))]
    pub radius_km: f64,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub region: Option<String>,
    /// Category/type tags; empty means any.
    pub categories: Vec<String>,
    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,
    #[validate(range(min = 1.0, max = 5.0))]
    pub min_rating: Option<f64>,
    pub available_only: bool,
    pub verified_only: bool,
    pub has_discounts: bool,
    #[validate(range(min = 1))]
    pub page: usize,
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub include: IncludeOptions,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            term: None,
            origin: None,
            radius_km: DEFAULT_RADIUS_KM,
            city: None,
            region: None,
            categories: Vec::new(),
            min_price: None,
            max_price: None,
            min_rating: None,
            available_only: true,
            verified_only: false,
            has_discounts: false,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortBy::Relevance,
            sort_order: SortOrder::Asc,
            include: IncludeOptions::default(),
        }
    }
}

impl SearchQuery {
    /// The caller already pinned the search to a city or region.
    pub fn has_location_constraint(&self) -> bool {
        self.city.is_some() || self.region.is_some()
    }

    /// Relevance ordering without a city/region constraint gets diversified.
    pub fn wants_diversification(&self) -> bool {
        self.sort_by == SortBy::Relevance && !self.has_location_constraint()
    }
}

/// Kind of an autocomplete entry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// A listing name.
    Service,
    /// A provider name.
    Business,
    Category,
}

impl SuggestionKind {
    pub const ALL: [SuggestionKind; 3] = [
        SuggestionKind::Service,
        SuggestionKind::Business,
        SuggestionKind::Category,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Service => "service",
            SuggestionKind::Business => "business",
            SuggestionKind::Category => "category",
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" | "listing" => Ok(SuggestionKind::Service),
            "business" | "provider" => Ok(SuggestionKind::Business),
            "category" | "type" => Ok(SuggestionKind::Category),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown suggestion type `{other}`"
            ))),
        }
    }
}

/// Validated autocomplete request.
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct SuggestionRequest {
    /// Trimmed term; may be shorter than [`MIN_SUGGESTION_TERM_CHARS`].
    #[validate(length(max = 200))]
    pub term: String,
    #[validate(range(min = 1, max = 20))]
    pub limit: usize,
    /// Restricts suggestions to one kind; `None` means every kind.
    pub kind: Option<SuggestionKind>,
    pub origin: Option<Coordinates>,
    #[validate(range(min = 1.0, max = 100.0))]
    pub radius_km: f64,
}

impl SuggestionRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            limit: DEFAULT_SUGGESTION_LIMIT,
            kind: None,
            origin: None,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }

    pub fn is_searchable(&self) -> bool {
        self.term.chars().count() >= MIN_SUGGESTION_TERM_CHARS
    }

    pub fn kinds(&self) -> Vec<SuggestionKind> {
        match self.kind {
            Some(kind) => vec![kind],
            None => SuggestionKind::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_accepts_date_aliases() {
        assert_eq!("createdAt".parse::<SortBy>(), Ok(SortBy::Date));
        assert_eq!("newest".parse::<SortBy>(), Ok(SortBy::Date));
        assert_eq!(" Distance ".parse::<SortBy>(), Ok(SortBy::Distance));
        assert!("popularity".parse::<SortBy>().is_err());
    }

    #[test]
    fn default_query_is_valid() {
        let query = SearchQuery {
            term: Some("lavado".to_string()),
            ..SearchQuery::default()
        };
        assert!(query.validate().is_ok());
        assert!(query.wants_diversification());
    }

    #[test]
    fn location_constraint_disables_diversification() {
        let query = SearchQuery {
            city: Some("Santiago".to_string()),
            ..SearchQuery::default()
        };
        assert!(!query.wants_diversification());

        let query = SearchQuery {
            sort_by: SortBy::Price,
            ..SearchQuery::default()
        };
        assert!(!query.wants_diversification());
    }

    #[test]
    fn suggestion_terms_need_three_characters() {
        assert!(!SuggestionRequest::new("la").is_searchable());
        assert!(SuggestionRequest::new("lav").is_searchable());
        assert!(SuggestionRequest::new("ñoñ").is_searchable());
    }

    #[test]
    fn suggestion_kind_parses_aliases() {
        assert_eq!("provider".parse::<SuggestionKind>(), Ok(SuggestionKind::Business));
        assert_eq!("SERVICE".parse::<SuggestionKind>(), Ok(SuggestionKind::Service));
        assert!("city".parse::<SuggestionKind>().is_err());
    }
}
