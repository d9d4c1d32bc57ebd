use serde::{Deserialize, Serialize};

/// Body of one eligibility request, in the exact shape the remote API expects.
///
/// Amounts stay strings: they are forwarded verbatim and validated remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub purpose_id: String,
    pub gross_income_per_check: String,
    pub gross_monthly_income: String,
    pub pay_frequency_type_code: String,
    pub is_military: bool,
    pub cso_fee_amount: String,
    pub cso_id: String,
    pub loan_amount: String,
    pub loan_type_code: String,
}

/// Who the request is about. Carried alongside, never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

/// One ingested CSV record. `id` is 1-based in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub id: usize,
    pub payload: EligibilityRequest,
    pub meta: RowMeta,
}
