use std::collections::HashMap;

use crate::models::{EligibilityRequest, RowMeta};

/// One CSV record keyed by header name.
pub type RawRecord = HashMap<String, String>;

/// First present, non-empty value among `keys`.
fn first_present<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .map(String::as_str)
        .find(|v| !v.is_empty())
}

fn field_or(record: &RawRecord, keys: &[&str], default: &str) -> String {
    first_present(record, keys).unwrap_or(default).to_string()
}

/// Map a raw CSV record to the request body. Amounts are not validated.
pub fn map_row(record: &RawRecord) -> EligibilityRequest {
    // A column holding only whitespace falls through to the next candidate.
    let purpose_id = ["p_purpose_id", "purposeId"]
        .iter()
        .filter_map(|k| record.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or("")
        .to_string();

    EligibilityRequest {
        purpose_id,
        gross_income_per_check: field_or(record, &["p_gross_pay_per_check_one"], "0.00"),
        gross_monthly_income: field_or(record, &["p_gross_monthly_income_one"], "0.00"),
        pay_frequency_type_code: field_or(record, &["p_pay_freq_t"], "BI"),
        is_military: false,
        cso_fee_amount: "0".to_string(),
        cso_id: "1".to_string(),
        loan_amount: field_or(record, &["p_requestedLoanAmount"], "1000"),
        loan_type_code: field_or(record, &["p_product_type"], "ILP"),
    }
}

pub fn map_meta(record: &RawRecord) -> RowMeta {
    RowMeta {
        first_name: field_or(record, &["p_Fname"], ""),
        last_name: field_or(record, &["p_LastName"], ""),
        phone: field_or(record, &["p_PhoneNumber"], ""),
        email: field_or(record, &["p_emailID"], ""),
    }
}
