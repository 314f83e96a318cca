//! Query Normalizer: coerces query strings and JSON bodies into validated
//! [`SearchQuery`] and [`SuggestionRequest`] values.

use std::str::FromStr;

use serde::Deserialize;
use validator::Validate;

use crate::domain::search::{
    DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_RADIUS_KM, DEFAULT_SUGGESTION_LIMIT, IncludeOptions,
    SearchQuery, SortBy, SortOrder, SuggestionKind, SuggestionRequest,
};
use crate::domain::types::Coordinates;
use crate::forms::{FormError, collect_fields};

/// A scalar as it arrives: query strings only carry text, JSON bodies may
/// carry real numbers and booleans.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Loose {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for Loose {
    fn from(value: &str) -> Self {
        Loose::Text(value.to_string())
    }
}

impl From<f64> for Loose {
    fn from(value: f64) -> Self {
        Loose::Number(value)
    }
}

impl From<bool> for Loose {
    fn from(value: bool) -> Self {
        Loose::Bool(value)
    }
}

/// Category tags: a JSON array, or a comma separated string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TagList {
    List(Vec<String>),
    Csv(String),
}

impl TagList {
    fn tags(&self) -> Vec<String> {
        match self {
            TagList::List(items) => items.clone(),
            TagList::Csv(value) => value.split(',').map(str::to_string).collect(),
        }
    }
}

/// Raw search parameters shared by `GET /search`, `POST /search` and
/// `GET /search/nearby`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchForm {
    #[serde(alias = "query", alias = "term")]
    pub q: Option<Loose>,
    #[serde(alias = "latitude")]
    pub lat: Option<Loose>,
    #[serde(alias = "longitude")]
    pub lng: Option<Loose>,
    pub radius: Option<Loose>,
    pub city: Option<Loose>,
    pub region: Option<Loose>,
    #[serde(rename = "type", alias = "category")]
    pub kind: Option<Loose>,
    #[serde(alias = "categories")]
    pub types: Option<TagList>,
    pub min_price: Option<Loose>,
    pub max_price: Option<Loose>,
    pub min_rating: Option<Loose>,
    pub available_only: Option<Loose>,
    pub verified_only: Option<Loose>,
    pub has_discounts: Option<Loose>,
    pub page: Option<Loose>,
    pub limit: Option<Loose>,
    pub sort_by: Option<Loose>,
    pub sort_order: Option<Loose>,
    pub include_provider: Option<Loose>,
    pub include_images: Option<Loose>,
    pub include_reviews: Option<Loose>,
}

/// Raw autocomplete parameters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuggestionForm {
    #[serde(alias = "query", alias = "term")]
    pub q: Option<Loose>,
    pub limit: Option<Loose>,
    #[serde(rename = "type")]
    pub kind: Option<Loose>,
    #[serde(alias = "latitude")]
    pub lat: Option<Loose>,
    #[serde(alias = "longitude")]
    pub lng: Option<Loose>,
    pub radius: Option<Loose>,
}

/// A bare `?limit=` parameter.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitForm {
    pub limit: Option<Loose>,
}

/// How lat/lng are treated.
#[derive(Clone, Copy, PartialEq)]
enum OriginPolicy {
    /// Unparseable or partial coordinates mean "no geo filter".
    Lenient,
    /// Both coordinates must be present and valid.
    Required,
}

/// Collects the wire names of fields that failed coercion.
#[derive(Default)]
struct Coercer {
    invalid: Vec<String>,
}

impl Coercer {
    fn reject(&mut self, field: &str) {
        self.invalid.push(field.to_string());
    }

    fn text(&self, value: Option<&Loose>) -> Option<String> {
        let text = match value? {
            Loose::Text(text) => text.trim().to_string(),
            Loose::Number(number) => number.to_string(),
            Loose::Bool(flag) => flag.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    /// Blank text counts as absent; anything else must be a finite number.
    fn number(&mut self, field: &str, value: Option<&Loose>) -> Option<f64> {
        let parsed = match value? {
            Loose::Number(number) => Some(*number),
            Loose::Text(text) if text.trim().is_empty() => return None,
            Loose::Text(text) => text.trim().parse::<f64>().ok(),
            Loose::Bool(_) => None,
        };
        match parsed.filter(|number| number.is_finite()) {
            Some(number) => Some(number),
            None => {
                self.reject(field);
                None
            }
        }
    }

    fn count(&mut self, field: &str, value: Option<&Loose>) -> Option<usize> {
        let number = self.number(field, value)?;
        if number < 0.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
            self.reject(field);
            return None;
        }
        Some(number as usize)
    }

    fn flag(&mut self, field: &str, value: Option<&Loose>) -> Option<bool> {
        let parsed = match value? {
            Loose::Bool(flag) => Some(*flag),
            Loose::Number(number) if *number == 1.0 => Some(true),
            Loose::Number(number) if *number == 0.0 => Some(false),
            Loose::Number(_) => None,
            Loose::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "" => return None,
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
        };
        if parsed.is_none() {
            self.reject(field);
        }
        parsed
    }

    fn parsed<T: FromStr>(&mut self, field: &str, value: Option<&Loose>) -> Option<T> {
        let text = self.text(value)?;
        match text.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.reject(field);
                None
            }
        }
    }

    fn origin(
        &mut self,
        lat: Option<&Loose>,
        lng: Option<&Loose>,
        policy: OriginPolicy,
    ) -> Option<Coordinates> {
        let (latitude, longitude) = match policy {
            OriginPolicy::Lenient => {
                let mut probe = Coercer::default();
                (probe.number("lat", lat), probe.number("lng", lng))
            }
            OriginPolicy::Required => {
                let latitude = self.number("lat", lat);
                let longitude = self.number("lng", lng);
                if latitude.is_none() {
                    self.reject("lat");
                }
                if longitude.is_none() {
                    self.reject("lng");
                }
                (latitude, longitude)
            }
        };

        let (latitude, longitude) = latitude.zip(longitude)?;
        if !(-90.0..=90.0).contains(&latitude) {
            self.reject("lat");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            self.reject("lng");
        }
        Coordinates::new(latitude, longitude).ok()
    }
}

/// Trims and de-duplicates tags, keeping their first-seen order.
fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|seen| seen == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trims text fields, drops empty or repeated tags and validates ranges.
///
/// Applying it to its own output returns the same query.
pub fn normalize_query(query: SearchQuery) -> Result<SearchQuery, FormError> {
    let query = SearchQuery {
        term: trimmed(query.term),
        city: trimmed(query.city),
        region: trimmed(query.region),
        categories: normalize_tags(query.categories),
        ..query
    };
    collect_fields(Vec::new(), query.validate())?;
    Ok(query)
}

impl SearchForm {
    fn coerce(self, policy: OriginPolicy) -> Result<SearchQuery, FormError> {
        let mut c = Coercer::default();

        let term = c.text(self.q.as_ref());
        let origin = c.origin(self.lat.as_ref(), self.lng.as_ref(), policy);
        let radius_km = c.number("radius", self.radius.as_ref());
        let city = c.text(self.city.as_ref());
        let region = c.text(self.region.as_ref());

        let mut categories: Vec<String> = c.text(self.kind.as_ref()).into_iter().collect();
        if let Some(types) = &self.types {
            categories.extend(types.tags());
        }

        let min_price = c.number("minPrice", self.min_price.as_ref());
        let max_price = c.number("maxPrice", self.max_price.as_ref());
        let min_rating = c.number("minRating", self.min_rating.as_ref());
        let available_only = c.flag("availableOnly", self.available_only.as_ref());
        let verified_only = c.flag("verifiedOnly", self.verified_only.as_ref());
        let has_discounts = c.flag("hasDiscounts", self.has_discounts.as_ref());
        let page = c.count("page", self.page.as_ref());
        let limit = c.count("limit", self.limit.as_ref());
        let sort_by = c.parsed::<SortBy>("sortBy", self.sort_by.as_ref());
        let sort_order = c.parsed::<SortOrder>("sortOrder", self.sort_order.as_ref());

        let defaults = IncludeOptions::default();
        let include = IncludeOptions {
            provider: c
                .flag("includeProvider", self.include_provider.as_ref())
                .unwrap_or(defaults.provider),
            images: c
                .flag("includeImages", self.include_images.as_ref())
                .unwrap_or(defaults.images),
            reviews: c
                .flag("includeReviews", self.include_reviews.as_ref())
                .unwrap_or(defaults.reviews),
        };

        let default_sort = match policy {
            OriginPolicy::Lenient => SortBy::Relevance,
            OriginPolicy::Required => SortBy::Distance,
        };

        let query = SearchQuery {
            term,
            origin,
            radius_km: radius_km.unwrap_or(DEFAULT_RADIUS_KM),
            city,
            region,
            categories: normalize_tags(categories),
            min_price,
            max_price,
            min_rating,
            available_only: available_only.unwrap_or(true),
            verified_only: verified_only.unwrap_or(false),
            has_discounts: has_discounts.unwrap_or(false),
            page: page.unwrap_or(DEFAULT_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
            sort_by: sort_by.unwrap_or(default_sort),
            sort_order: sort_order.unwrap_or_default(),
            include,
        };

        collect_fields(c.invalid, query.validate())?;
        Ok(query)
    }

    /// General search: the term is required, coordinates are optional and
    /// silently ignored when they do not parse.
    pub fn into_query(self) -> Result<SearchQuery, FormError> {
        let missing_term = Coercer::default().text(self.q.as_ref()).is_none();
        match self.coerce(OriginPolicy::Lenient) {
            Ok(_) if missing_term => Err(FormError::InvalidFields(vec!["q".into()])),
            Err(FormError::InvalidFields(mut fields)) if missing_term => {
                fields.push("q".into());
                fields.sort();
                fields.dedup();
                Err(FormError::InvalidFields(fields))
            }
            other => other,
        }
    }

    /// Nearby search: coordinates are required, the term is optional and
    /// results default to distance order.
    pub fn into_nearby_query(self) -> Result<SearchQuery, FormError> {
        self.coerce(OriginPolicy::Required)
    }
}

impl SuggestionForm {
    pub fn into_request(self) -> Result<SuggestionRequest, FormError> {
        let mut c = Coercer::default();

        let term = c.text(self.q.as_ref()).unwrap_or_default();
        let limit = c.count("limit", self.limit.as_ref());
        let kind = c.parsed::<SuggestionKind>("type", self.kind.as_ref());
        let origin = c.origin(self.lat.as_ref(), self.lng.as_ref(), OriginPolicy::Lenient);
        let radius_km = c.number("radius", self.radius.as_ref());

        let request = SuggestionRequest {
            term,
            limit: limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT),
            kind,
            origin,
            radius_km: radius_km.unwrap_or(DEFAULT_RADIUS_KM),
        };

        collect_fields(c.invalid, request.validate())?;
        Ok(request)
    }
}

impl LimitForm {
    /// Resolves the limit, defaulting to `default` and bounded by `1..=max`.
    pub fn resolve(&self, default: usize, max: usize) -> Result<usize, FormError> {
        let mut c = Coercer::default();
        let limit = c.count("limit", self.limit.as_ref()).unwrap_or(default);
        if !(1..=max).contains(&limit) {
            c.reject("limit");
        }
        collect_fields(c.invalid, Ok(()))?;
        Ok(limit)
    }
}
