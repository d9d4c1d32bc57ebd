//! Projections over a bulk run's outcomes: a per-code distribution and
//! one display row per outcome. Both use the same classification so the
//! chart and the table always agree.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{EligibilityOutcome, EligibilityResponse, OutcomeStatus};

/// Bucket for the error statuses the service uses for bad or ineligible
/// customer data.
pub const DATA_ERROR_CODE: &str = "DATA_ERROR";
/// Bucket for replies with no usable code.
pub const UNKNOWN_CODE: &str = "UNKNOWN";

const DATA_ERROR_STATUSES: [&str; 2] = ["200", "400"];
const GENERIC_DESCRIPTION: &str = "No eligibility information returned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub response_code: String,
    pub description: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub row_id: usize,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub purpose_id: String,
    pub status: OutcomeStatus,
    pub code: String,
    pub description: String,
}

/// Derived code and description for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub code: String,
    pub description: String,
}

fn known_description(code: &str) -> Option<&'static str> {
    match code {
        DATA_ERROR_CODE => Some("Invalid or incomplete customer data"),
        "401" => Some("Authorization rejected by eligibility service"),
        "404" => Some("Customer record not found"),
        "500" => Some("Eligibility service error"),
        _ => None,
    }
}

pub fn classify(outcome: &EligibilityOutcome) -> Classification {
    match outcome.decoded() {
        EligibilityResponse::Success { code, description } => {
            let code = code.unwrap_or_else(|| UNKNOWN_CODE.to_string());
            let description = description
                .or_else(|| known_description(&code).map(String::from))
                .unwrap_or_else(|| GENERIC_DESCRIPTION.to_string());
            Classification { code, description }
        }
        EligibilityResponse::ErrorEnvelope {
            status,
            detail,
            title,
        } => {
            let code = match status.as_deref() {
                Some(s) if DATA_ERROR_STATUSES.contains(&s) => DATA_ERROR_CODE.to_string(),
                Some(s) => s.to_string(),
                None => UNKNOWN_CODE.to_string(),
            };
            let description = known_description(&code)
                .map(String::from)
                .or(detail)
                .or(title)
                .unwrap_or_else(|| GENERIC_DESCRIPTION.to_string());
            Classification { code, description }
        }
        EligibilityResponse::Unrecognized => {
            let description = outcome
                .response
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_DESCRIPTION)
                .to_string();
            Classification {
                code: UNKNOWN_CODE.to_string(),
                description,
            }
        }
    }
}

/// Outcome counts per derived code, in first-seen order.
pub fn to_distribution(outcomes: &[EligibilityOutcome]) -> Vec<DistributionEntry> {
    let mut entries: Vec<DistributionEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for outcome in outcomes {
        let c = classify(outcome);
        match index.get(&c.code) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(c.code.clone(), entries.len());
                entries.push(DistributionEntry {
                    response_code: c.code,
                    description: c.description,
                    count: 1,
                });
            }
        }
    }

    entries
}

pub fn to_table_rows(outcomes: &[EligibilityOutcome]) -> Vec<TableRow> {
    outcomes
        .iter()
        .map(|o| {
            let c = classify(o);
            TableRow {
                row_id: o.row_id,
                first_name: o.meta.first_name.clone(),
                last_name: o.meta.last_name.clone(),
                phone: o.meta.phone.clone(),
                email: o.meta.email.clone(),
                purpose_id: o.purpose_id.clone(),
                status: o.status,
                code: c.code,
                description: c.description,
            }
        })
        .collect()
}
