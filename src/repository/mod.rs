//! Candidate retrieval: the storage boundary of the search engine.
//!
//! The engine only ever reads. Query values in this module describe *what*
//! to fetch; the diesel implementation in [`listing`] and [`facets`] decides
//! how.

use diesel::QueryResult;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::listing::{Listing, ListingImage, ListingWithProvider, PricePoint, Review};
use crate::domain::search::{SortBy, SortOrder};
use crate::domain::types::ListingId;
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod facets;
pub mod listing;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

/// Predicate set evaluated by the candidate store.
///
/// Soft-deleted and inactive listings are always excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring over listing name, description, category
    /// and provider name.
    pub text: Option<String>,
    /// Category equality (single entry) or membership.
    pub categories: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub has_discount: bool,
    /// Case-insensitive substring over the provider city.
    pub city: Option<String>,
    /// Case-insensitive substring over the provider region.
    pub region: Option<String>,
    pub available_only: bool,
    pub verified_only: bool,
}

impl ListingFilter {
    /// Every active listing, regardless of availability.
    pub fn active() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn with_discount(mut self) -> Self {
        self.has_discount = true;
        self
    }
}

/// Ordering applied by the store before slicing a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingOrder {
    /// Insertion order (ascending id).
    #[default]
    Insertion,
    Price(SortOrder),
    Rating(SortOrder),
    Name(SortOrder),
    Date(SortOrder),
    /// Provider rating, then review count, both descending.
    Popularity,
}

impl ListingOrder {
    /// Store-side ordering for a requested sort. Relevance and distance
    /// cannot be ranked by the store and fall back to insertion order.
    pub fn from_sort(sort_by: SortBy, sort_order: SortOrder) -> Self {
        match sort_by {
            SortBy::Relevance | SortBy::Distance => ListingOrder::Insertion,
            SortBy::Price => ListingOrder::Price(sort_order),
            SortBy::Rating => ListingOrder::Rating(sort_order),
            SortBy::Name => ListingOrder::Name(sort_order),
            SortBy::Date => ListingOrder::Date(sort_order),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    pub order: ListingOrder,
    pub pagination: Option<Pagination>,
}

impl ListingQuery {
    pub fn new(filter: ListingFilter) -> Self {
        Self {
            filter,
            order: ListingOrder::Insertion,
            pagination: None,
        }
    }

    pub fn order(mut self, order: ListingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait ListingReader {
    fn get_listing_by_id(&self, id: ListingId) -> RepositoryResult<Option<ListingWithProvider>>;
    fn find_listings(&self, query: &ListingQuery) -> RepositoryResult<Vec<ListingWithProvider>>;
    fn count_listings(&self, filter: &ListingFilter) -> RepositoryResult<usize>;
    fn list_price_points(&self, filter: &ListingFilter) -> RepositoryResult<Vec<PricePoint>>;
    /// Same category, different provider, price within ±50% of `reference`.
    fn list_similar_candidates(
        &self,
        reference: &Listing,
        limit: usize,
    ) -> RepositoryResult<Vec<ListingWithProvider>>;
}

pub trait MediaReader {
    /// Images of the given listings, primary and lowest sort order first.
    fn list_images(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<ListingImage>>;
    /// Reviews of the given listings, newest first.
    fn list_recent_reviews(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<Review>>;
}

pub trait FacetReader {
    /// Distinct categories of active listings containing `term`.
    fn list_matching_categories(&self, term: &str, limit: usize)
    -> RepositoryResult<Vec<String>>;
    /// Listings matching `filter` whose own name or provider name contains
    /// `term`, best rated providers first.
    fn list_name_matches(
        &self,
        term: &str,
        filter: &ListingFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<ListingWithProvider>>;
    /// `(region, city)` of every provider owning at least one active listing.
    fn list_provider_locations(&self) -> RepositoryResult<Vec<(String, String)>>;
}

/// Diesel-backed implementation of every reader trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

diesel::define_sql_function! {
    /// Unicode lowercase. SQLite's `lower()` and `LIKE` only fold ASCII.
    fn fold_case(value: Text) -> Text;
}

/// Registers the SQL functions used by the search predicates. Must run on
/// every connection before it serves a query.
pub fn register_sql_functions(conn: &mut SqliteConnection) -> QueryResult<()> {
    fold_case_utils::register_impl(conn, |value: String| value.to_lowercase())
}

/// Lowercases the value, escapes `LIKE` wildcards and wraps it for
/// substring matching against a [`fold_case`] column.
pub(crate) fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
