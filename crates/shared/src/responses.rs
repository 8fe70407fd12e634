//! Response bodies that are not domain entities
//!
//! Successful responses deserialize straight into domain types
//! (`Quest`, `QuestProgress`, `RewardCeremony`, ...).

use serde::{Deserialize, Serialize};

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
}

impl ApiErrorResponse {
    /// Best-effort parse; falls back to the raw body text.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            detail: body.trim().to_string(),
        })
    }
}
