//! Domain entities and value objects consumed by the search engine.

pub mod listing;
pub mod provider;
pub mod search;
pub mod types;
