//! Tunables for the confidentiality layer.

use serde::{Deserialize, Serialize};
use veil_core::schema::{DEFAULT_CACHE_TTL_SECS, DEFAULT_PRIVILEGED_ROLE};

/// Configuration for [`crate::ConfidentialityHooks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Role that bypasses every confidentiality check.
    pub privileged_role: String,
    /// Lifetime of a memoized permission decision; 0 disables memoization.
    pub cache_ttl_secs: u64,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            privileged_role: DEFAULT_PRIVILEGED_ROLE.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}
