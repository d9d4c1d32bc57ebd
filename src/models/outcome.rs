use serde::Serialize;
use serde_json::Value;

use super::request::RowMeta;
use super::response::EligibilityResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The reply carried a `data` object.
    Success,
    /// A 2xx reply without `data`.
    Invalid,
    /// Transport failure or non-2xx reply.
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Invalid => "invalid",
            OutcomeStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of submitting one CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityOutcome {
    pub row_id: usize,
    pub purpose_id: String,
    pub meta: RowMeta,
    pub status: OutcomeStatus,
    /// Raw reply body, or a synthesized `{ "message": ... }` object.
    pub response: Value,
}

impl EligibilityOutcome {
    pub fn decoded(&self) -> EligibilityResponse {
        EligibilityResponse::decode(&self.response)
    }
}
