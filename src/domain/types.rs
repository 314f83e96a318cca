//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (positive identifiers, coordinates
//! inside the valid latitude/longitude ranges) so that once a value reaches
//! the search engine it can be treated as trusted.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Latitude outside of `[-90, 90]` or not a finite number.
    #[error("latitude must be within [-90, 90], got {0}")]
    InvalidLatitude(f64),
    /// Longitude outside of `[-180, 180]` or not a finite number.
    #[error("longitude must be within [-180, 180], got {0}")]
    InvalidLongitude(f64),
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(ListingId, "Unique identifier for a service listing.");
id_newtype!(ProviderId, "Unique identifier for a provider business.");
id_newtype!(ImageId, "Unique identifier for a listing image.");
id_newtype!(ReviewId, "Unique identifier for a listing review.");

/// A validated point on the globe, in decimal degrees.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TypeConstraintError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TypeConstraintError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TypeConstraintError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// Builds coordinates from a nullable column pair, ignoring incomplete
    /// or out-of-range values.
    pub fn from_optional(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::new(lat, lng).ok(),
            _ => None,
        }
    }
}

/// Lifecycle of a listing. Only active listings are ever searchable.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Active,
    Inactive,
    Deleted,
}

impl ListingStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Deleted => "deleted",
        }
    }
}

impl Display for ListingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ListingStatus {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            "deleted" => Ok(ListingStatus::Deleted),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown listing status `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(ListingId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(ProviderId::new(-3), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(ListingId::new(7).map(ListingId::get), Ok(7));
    }

    #[test]
    fn coordinates_reject_out_of_range_values() {
        assert!(Coordinates::new(-33.4489, -70.6693).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(TypeConstraintError::InvalidLatitude(91.0))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(TypeConstraintError::InvalidLongitude(-180.5))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn coordinates_from_partial_pair_are_absent() {
        assert!(Coordinates::from_optional(Some(1.0), None).is_none());
        assert!(Coordinates::from_optional(Some(100.0), Some(1.0)).is_none());
        assert!(Coordinates::from_optional(Some(1.0), Some(2.0)).is_some());
    }

    #[test]
    fn listing_status_round_trips_through_text() {
        for status in [
            ListingStatus::Active,
            ListingStatus::Inactive,
            ListingStatus::Deleted,
        ] {
            assert_eq!(ListingStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(ListingStatus::try_from("archived").is_err());
    }
}
