//! Data transfer objects returned by the HTTP surface.

pub mod search;
