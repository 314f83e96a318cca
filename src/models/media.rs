//! Diesel models for listing images and reviews.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::listing::{ListingImage as DomainListingImage, Review as DomainReview};
use crate::domain::types::{ImageId, ListingId, ReviewId, TypeConstraintError};
use crate::models::listing::Listing;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Listing, foreign_key = listing_id))]
#[diesel(table_name = crate::schema::listing_images)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ListingImage {
    pub id: i32,
    pub listing_id: i32,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::listing_images)]
pub struct NewListingImage<'a> {
    pub listing_id: i32,
    pub url: &'a str,
    pub alt_text: Option<&'a str>,
    pub is_primary: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Listing, foreign_key = listing_id))]
#[diesel(table_name = crate::schema::reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Review {
    pub id: i32,
    pub listing_id: i32,
    pub author_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::reviews)]
pub struct NewReview<'a> {
    pub listing_id: i32,
    pub author_name: &'a str,
    pub rating: i32,
    pub comment: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ListingImage> for DomainListingImage {
    type Error = TypeConstraintError;

    fn try_from(image: ListingImage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ImageId::try_from(image.id)?,
            listing_id: ListingId::try_from(image.listing_id)?,
            url: image.url,
            alt_text: image.alt_text,
            is_primary: image.is_primary,
            sort_order: image.sort_order,
        })
    }
}

impl TryFrom<Review> for DomainReview {
    type Error = TypeConstraintError;

    fn try_from(review: Review) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReviewId::try_from(review.id)?,
            listing_id: ListingId::try_from(review.listing_id)?,
            author_name: review.author_name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        })
    }
}
