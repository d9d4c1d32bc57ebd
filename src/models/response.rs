//! Typed view over the eligibility service's loosely shaped replies.
//!
//! The service answers with either `{ "data": { "Status": "CE", ... } }`
//! or `{ "errors": [{ "status", "detail", "title" }] }`, and uses both
//! envelopes for ineligible customers and for bad input. Anything else
//! decodes to [`EligibilityResponse::Unrecognized`].

use serde::Deserialize;
use serde_json::Value;

/// Status marker on a completed eligibility evaluation.
pub const COMPLETE_STATUS: &str = "CE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityResponse {
    /// A completed evaluation carrying the service's own response code.
    Success {
        code: Option<String>,
        description: Option<String>,
    },
    /// First entry of an `errors` array.
    ErrorEnvelope {
        status: Option<String>,
        detail: Option<String>,
        title: Option<String>,
    },
    Unrecognized,
}

#[derive(Deserialize)]
struct DataBody {
    data: DataFields,
}

#[derive(Deserialize)]
struct DataFields {
    #[serde(rename = "Status", alias = "status", default)]
    status: Option<Value>,
    #[serde(alias = "responseCode", default)]
    responsecode: Option<Value>,
    #[serde(alias = "responseDescription", default)]
    responsedescription: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
}

impl EligibilityResponse {
    pub fn decode(value: &Value) -> Self {
        if let Ok(body) = DataBody::deserialize(value) {
            let status = scalar_text(body.data.status.as_ref());
            if status.as_deref() == Some(COMPLETE_STATUS) {
                return EligibilityResponse::Success {
                    code: scalar_text(body.data.responsecode.as_ref()),
                    description: scalar_text(body.data.responsedescription.as_ref()),
                };
            }
            return EligibilityResponse::Unrecognized;
        }

        if let Ok(body) = ErrorBody::deserialize(value) {
            let first = body.errors.into_iter().next();
            return match first {
                Some(item) => EligibilityResponse::ErrorEnvelope {
                    status: scalar_text(item.status.as_ref()),
                    detail: scalar_text(item.detail.as_ref()),
                    title: scalar_text(item.title.as_ref()),
                },
                None => EligibilityResponse::ErrorEnvelope {
                    status: None,
                    detail: None,
                    title: None,
                },
            };
        }

        EligibilityResponse::Unrecognized
    }
}

/// Strings pass through, numbers and booleans are rendered, blanks and
/// everything else are absent.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
