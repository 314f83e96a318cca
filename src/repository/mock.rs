//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::listing::{Listing, ListingImage, ListingWithProvider, PricePoint, Review};
use crate::domain::types::ListingId;
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    FacetReader, ListingFilter, ListingQuery, ListingReader, MediaReader,
};

mock! {
    pub Repository {}

    impl ListingReader for Repository {
        fn get_listing_by_id(&self, id: ListingId) -> RepositoryResult<Option<ListingWithProvider>>;
        fn find_listings(&self, query: &ListingQuery) -> RepositoryResult<Vec<ListingWithProvider>>;
        fn count_listings(&self, filter: &ListingFilter) -> RepositoryResult<usize>;
        fn list_price_points(&self, filter: &ListingFilter) -> RepositoryResult<Vec<PricePoint>>;
        fn list_similar_candidates(
            &self,
            reference: &Listing,
            limit: usize,
        ) -> RepositoryResult<Vec<ListingWithProvider>>;
    }

    impl MediaReader for Repository {
        fn list_images(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<ListingImage>>;
        fn list_recent_reviews(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<Review>>;
    }

    impl FacetReader for Repository {
        fn list_matching_categories(
            &self,
            term: &str,
            limit: usize,
        ) -> RepositoryResult<Vec<String>>;
        fn list_name_matches(
            &self,
            term: &str,
            filter: &ListingFilter,
            limit: usize,
        ) -> RepositoryResult<Vec<ListingWithProvider>>;
        fn list_provider_locations(&self) -> RepositoryResult<Vec<(String, String)>>;
    }
}
