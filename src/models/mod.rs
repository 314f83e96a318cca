//! Diesel models and configuration structures.

pub mod config;
pub mod listing;
pub mod media;
pub mod provider;
