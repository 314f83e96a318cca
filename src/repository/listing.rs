//! Diesel implementation of listing retrieval.

use diesel::dsl::{InnerJoin, IntoBoxed};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::listing::{
    Listing, ListingImage, ListingWithProvider, PricePoint, Review,
};
use crate::domain::provider::Provider;
use crate::domain::search::SortOrder;
use crate::domain::types::{ListingId, ListingStatus};
use crate::models::listing::Listing as DbListing;
use crate::models::media::{ListingImage as DbListingImage, Review as DbReview};
use crate::models::provider::Provider as DbProvider;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, ListingFilter, ListingOrder, ListingQuery, ListingReader, MediaReader,
    fold_case, like_pattern,
};
use crate::schema::{listing_images, listings, providers, reviews};

type BoxedCandidates = IntoBoxed<'static, InnerJoin<listings::table, providers::table>, Sqlite>;

/// Builds the boxed listing ⋈ provider query with every predicate applied.
pub(crate) fn filtered(filter: &ListingFilter) -> BoxedCandidates {
    let mut query = listings::table.inner_join(providers::table).into_boxed();

    query = query.filter(listings::status.eq(ListingStatus::Active.as_str()));

    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        query = query.filter(
            fold_case(listings::name)
                .like(pattern.clone())
                .escape('\\')
                .or(fold_case(listings::description)
                    .like(pattern.clone())
                    .escape('\\'))
                .or(fold_case(listings::category)
                    .like(pattern.clone())
                    .escape('\\'))
                .or(fold_case(providers::name).like(pattern).escape('\\')),
        );
    }

    match filter.categories.as_slice() {
        [] => {}
        [category] => query = query.filter(listings::category.eq(category.clone())),
        categories => query = query.filter(listings::category.eq_any(categories.to_vec())),
    }

    if let Some(min_price) = filter.min_price {
        query = query.filter(listings::price.ge(min_price));
    }
    if let Some(max_price) = filter.max_price {
        query = query.filter(listings::price.le(max_price));
    }
    if let Some(min_rating) = filter.min_rating {
        query = query.filter(providers::rating.ge(min_rating));
    }
    if filter.has_discount {
        query = query
            .filter(listings::discounted_price.is_not_null())
            .filter(listings::discounted_price.le(listings::price.nullable()));
    }
    if let Some(city) = &filter.city {
        query = query.filter(
            fold_case(providers::city)
                .like(like_pattern(city))
                .escape('\\'),
        );
    }
    if let Some(region) = &filter.region {
        query = query.filter(
            fold_case(providers::region)
                .like(like_pattern(region))
                .escape('\\'),
        );
    }
    if filter.available_only {
        query = query.filter(listings::is_available.eq(true));
    }
    if filter.verified_only {
        query = query.filter(providers::is_verified.eq(true));
    }

    query
}

fn ordered(query: BoxedCandidates, order: ListingOrder) -> BoxedCandidates {
    match order {
        ListingOrder::Insertion => query.order(listings::id.asc()),
        ListingOrder::Price(SortOrder::Asc) => {
            query.order((listings::price.asc(), listings::id.asc()))
        }
        ListingOrder::Price(SortOrder::Desc) => {
            query.order((listings::price.desc(), listings::id.asc()))
        }
        ListingOrder::Rating(SortOrder::Asc) => query.order((
            providers::rating.asc(),
            providers::review_count.asc(),
            listings::id.asc(),
        )),
        ListingOrder::Rating(SortOrder::Desc) => query.order((
            providers::rating.desc(),
            providers::review_count.desc(),
            listings::id.asc(),
        )),
        ListingOrder::Name(SortOrder::Asc) => {
            query.order((fold_case(listings::name).asc(), listings::id.asc()))
        }
        ListingOrder::Name(SortOrder::Desc) => {
            query.order((fold_case(listings::name).desc(), listings::id.asc()))
        }
        ListingOrder::Date(SortOrder::Asc) => {
            query.order((listings::created_at.asc(), listings::id.asc()))
        }
        ListingOrder::Date(SortOrder::Desc) => {
            query.order((listings::created_at.desc(), listings::id.desc()))
        }
        ListingOrder::Popularity => query.order((
            providers::rating.desc(),
            providers::review_count.desc(),
            listings::id.asc(),
        )),
    }
}

pub(crate) fn into_domain(
    rows: Vec<(DbListing, DbProvider)>,
) -> RepositoryResult<Vec<ListingWithProvider>> {
    rows.into_iter()
        .map(|(listing, provider)| -> RepositoryResult<ListingWithProvider> {
            Ok(ListingWithProvider {
                listing: Listing::try_from(listing)?,
                provider: Provider::try_from(provider)?,
            })
        })
        .collect()
}

impl ListingReader for DieselRepository {
    fn get_listing_by_id(&self, id: ListingId) -> RepositoryResult<Option<ListingWithProvider>> {
        let mut conn = self.conn()?;

        let row = listings::table
            .inner_join(providers::table)
            .filter(listings::id.eq(id.get()))
            .select((DbListing::as_select(), DbProvider::as_select()))
            .first::<(DbListing, DbProvider)>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(into_domain(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn find_listings(&self, query: &ListingQuery) -> RepositoryResult<Vec<ListingWithProvider>> {
        let mut conn = self.conn()?;

        let mut items = ordered(filtered(&query.filter), query.order);

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let rows = items
            .select((DbListing::as_select(), DbProvider::as_select()))
            .load::<(DbListing, DbProvider)>(&mut conn)?;

        into_domain(rows)
    }

    fn count_listings(&self, filter: &ListingFilter) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;

        let total = filtered(filter).count().get_result::<i64>(&mut conn)?;

        usize::try_from(total)
            .map_err(|_| RepositoryError::Unexpected(format!("negative row count {total}")))
    }

    fn list_price_points(&self, filter: &ListingFilter) -> RepositoryResult<Vec<PricePoint>> {
        let mut conn = self.conn()?;

        let points = filtered(filter)
            .select((listings::price, listings::category))
            .load::<(f64, String)>(&mut conn)?
            .into_iter()
            .map(|(price, category)| PricePoint { price, category })
            .collect();

        Ok(points)
    }

    fn list_similar_candidates(
        &self,
        reference: &Listing,
        limit: usize,
    ) -> RepositoryResult<Vec<ListingWithProvider>> {
        let mut conn = self.conn()?;

        let rows = listings::table
            .inner_join(providers::table)
            .filter(listings::status.eq(ListingStatus::Active.as_str()))
            .filter(listings::is_available.eq(true))
            .filter(listings::category.eq(&reference.category))
            .filter(listings::provider_id.ne(reference.provider_id.get()))
            .filter(listings::id.ne(reference.id.get()))
            .filter(listings::price.between(reference.price * 0.5, reference.price * 1.5))
            .order(listings::id.asc())
            .limit(limit as i64)
            .select((DbListing::as_select(), DbProvider::as_select()))
            .load::<(DbListing, DbProvider)>(&mut conn)?;

        into_domain(rows)
    }
}

impl MediaReader for DieselRepository {
    fn list_images(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<ListingImage>> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn()?;

        let ids: Vec<i32> = listing_ids.iter().map(|id| id.get()).collect();
        listing_images::table
            .filter(listing_images::listing_id.eq_any(ids))
            .order((
                listing_images::listing_id.asc(),
                listing_images::is_primary.desc(),
                listing_images::sort_order.asc(),
                listing_images::id.asc(),
            ))
            .load::<DbListingImage>(&mut conn)?
            .into_iter()
            .map(|image| ListingImage::try_from(image).map_err(RepositoryError::from))
            .collect()
    }

    fn list_recent_reviews(&self, listing_ids: &[ListingId]) -> RepositoryResult<Vec<Review>> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn()?;

        let ids: Vec<i32> = listing_ids.iter().map(|id| id.get()).collect();
        reviews::table
            .filter(reviews::listing_id.eq_any(ids))
            .order((reviews::created_at.desc(), reviews::id.desc()))
            .load::<DbReview>(&mut conn)?
            .into_iter()
            .map(|review| Review::try_from(review).map_err(RepositoryError::from))
            .collect()
    }
}
