//! Diesel models representing provider businesses.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::provider::Provider as DomainProvider;
use crate::domain::types::{Coordinates, ProviderId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::providers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::provider::Provider`].
pub struct Provider {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::providers)]
/// Insertable form of [`Provider`].
pub struct NewProvider<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub street: &'a str,
    pub city: &'a str,
    pub region: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
}

impl TryFrom<Provider> for DomainProvider {
    type Error = TypeConstraintError;

    fn try_from(provider: Provider) -> Result<Self, Self::Error> {
        // Stored coordinates outside the valid range are treated as unknown
        // so a single bad row never breaks a whole search.
        let coordinates = Coordinates::from_optional(provider.latitude, provider.longitude);

        Ok(Self {
            id: ProviderId::try_from(provider.id)?,
            name: provider.name,
            category: provider.category,
            street: provider.street,
            city: provider.city,
            region: provider.region,
            coordinates,
            is_verified: provider.is_verified,
            rating: provider.rating.clamp(0.0, 5.0),
            review_count: provider.review_count,
        })
    }
}
