//!
//! Statement settings.
//!
//! Parsed from TOML either on its own or as the `[statement]` table of a
//! larger database configuration:
//!
//! ```toml
//! [statement]
//! max_retry_count = 5
//! ```
//!

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RETRY_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatementConfig {
    /// Extra step attempts made after a busy/locked result.
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
}

fn default_max_retry_count() -> u32 {
    DEFAULT_MAX_RETRY_COUNT
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
        }
    }
}

impl StatementConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
