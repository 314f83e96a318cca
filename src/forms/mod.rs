//! Loosely typed inbound payloads and their coercion into domain queries.

use thiserror::Error;
use validator::ValidationErrors;

pub mod search;

#[derive(Debug, Error, PartialEq)]
/// Errors that can occur when processing form data.
pub enum FormError {
    /// Every offending field, by its wire name.
    #[error("invalid fields: {}", .0.join(", "))]
    InvalidFields(Vec<String>),
}

impl FormError {
    pub fn fields(&self) -> &[String] {
        match self {
            FormError::InvalidFields(fields) => fields,
        }
    }
}

/// Maps a struct field reported by `validator` to the name used on the wire.
fn wire_name(field: &str) -> &str {
    match field {
        "term" => "q",
        "radius_km" => "radius",
        "min_price" => "minPrice",
        "max_price" => "maxPrice",
        "min_rating" => "minRating",
        "sort_by" => "sortBy",
        "sort_order" => "sortOrder",
        other => other,
    }
}

/// Merges coercion failures with validation failures into one sorted,
/// de-duplicated field list.
pub(crate) fn collect_fields(
    mut invalid: Vec<String>,
    validation: Result<(), ValidationErrors>,
) -> Result<(), FormError> {
    if let Err(errors) = validation {
        invalid.extend(
            errors
                .field_errors()
                .into_keys()
                .map(|field| wire_name(&field).to_string()),
        );
    }

    if invalid.is_empty() {
        return Ok(());
    }
    invalid.sort();
    invalid.dedup();
    Err(FormError::InvalidFields(invalid))
}
