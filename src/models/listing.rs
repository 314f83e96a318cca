//! Diesel models representing service listings.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::listing::Listing as DomainListing;
use crate::domain::types::{ListingId, ListingStatus, ProviderId, TypeConstraintError};
use crate::models::provider::Provider;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Provider, foreign_key = provider_id))]
#[diesel(table_name = crate::schema::listings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::listing::Listing`].
pub struct Listing {
    pub id: i32,
    pub provider_id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub duration_minutes: i32,
    pub is_available: bool,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::listings)]
/// Insertable form of [`Listing`].
pub struct NewListing<'a> {
    pub provider_id: i32,
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub duration_minutes: i32,
    pub is_available: bool,
    pub status: &'a str,
}

impl TryFrom<Listing> for DomainListing {
    type Error = TypeConstraintError;

    fn try_from(listing: Listing) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ListingId::try_from(listing.id)?,
            provider_id: ProviderId::try_from(listing.provider_id)?,
            name: listing.name,
            description: listing.description,
            category: listing.category,
            price: listing.price,
            discounted_price: listing.discounted_price,
            duration_minutes: listing.duration_minutes,
            is_available: listing.is_available,
            status: ListingStatus::try_from(listing.status.as_str())?,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        })
    }
}
