//! Diesel implementation of facet and autocomplete lookups.

use diesel::prelude::*;

use crate::domain::listing::ListingWithProvider;
use crate::domain::types::ListingStatus;
use crate::models::listing::Listing as DbListing;
use crate::models::provider::Provider as DbProvider;
use crate::repository::errors::RepositoryResult;
use crate::repository::listing::{filtered, into_domain};
use crate::repository::{DieselRepository, FacetReader, ListingFilter, fold_case, like_pattern};
use crate::schema::{listings, providers};

impl FacetReader for DieselRepository {
    fn list_matching_categories(
        &self,
        term: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<String>> {
        let mut conn = self.conn()?;

        let categories = listings::table
            .filter(listings::status.eq(ListingStatus::Active.as_str()))
            .filter(
                fold_case(listings::category)
                    .like(like_pattern(term))
                    .escape('\\'),
            )
            .select(listings::category)
            .distinct()
            .order(listings::category.asc())
            .limit(limit as i64)
            .load::<String>(&mut conn)?;

        Ok(categories)
    }

    fn list_name_matches(
        &self,
        term: &str,
        filter: &ListingFilter,
        limit: usize,
    ) -> RepositoryResult<Vec<ListingWithProvider>> {
        let mut conn = self.conn()?;
        let pattern = like_pattern(term);

        let rows = filtered(filter)
            .filter(
                fold_case(listings::name)
                    .like(pattern.clone())
                    .escape('\\')
                    .or(fold_case(providers::name).like(pattern).escape('\\')),
            )
            .order((
                providers::rating.desc(),
                providers::review_count.desc(),
                listings::id.asc(),
            ))
            .limit(limit as i64)
            .select((DbListing::as_select(), DbProvider::as_select()))
            .load::<(DbListing, DbProvider)>(&mut conn)?;

        into_domain(rows)
    }

    fn list_provider_locations(&self) -> RepositoryResult<Vec<(String, String)>> {
        let mut conn = self.conn()?;

        let active_providers = listings::table
            .filter(listings::status.eq(ListingStatus::Active.as_str()))
            .select(listings::provider_id);

        let locations = providers::table
            .filter(providers::id.eq_any(active_providers))
            .select((providers::region, providers::city))
            .order(providers::id.asc())
            .load::<(String, String)>(&mut conn)?;

        Ok(locations)
    }
}
