//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Clone, Debug, Deserialize)]
/// Tunables for the search engine.
pub struct SearchSettings {
    /// Upper bound on candidates loaded for in-memory ranking
    /// (diversification and geo filtering).
    #[serde(default = "default_candidate_window")]
    pub candidate_window: usize,
    /// Deadline for a single request, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum number of related-term suggestions in a search response.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Images and reviews attached per result when requested.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

fn default_candidate_window() -> usize {
    2000
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_preview_limit() -> usize {
    3
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            candidate_window: default_candidate_window(),
            timeout_ms: default_timeout_ms(),
            suggestion_limit: default_suggestion_limit(),
            preview_limit: default_preview_limit(),
        }
    }
}
