//! HTTP client for the eligibility endpoint.
//!
//! Every call resolves to a [`CheckReply`]; nothing escapes as an error,
//! so the bulk runner can decide per row whether to continue.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::auth::TokenSource;
use crate::errors::AppError;
use crate::models::{EligibilityRequest, OutcomeStatus};

/// Classified result of one eligibility call.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckReply {
    /// 2xx reply. `Success` when the body has `data`, else `Invalid`.
    Classified { status: OutcomeStatus, response: Value },
    /// HTTP 401: the bearer token is no longer accepted.
    AuthExpired,
    /// Any other non-2xx status, with the body text as received.
    RequestFailed { status: u16, body: String },
    /// The request never completed, or its 2xx reply was not JSON.
    Transport { message: String },
}

/// Seam between the bulk runner and the remote service.
#[async_trait]
pub trait EligibilityApi: Send + Sync {
    async fn check_one(&self, token: &str, request: &EligibilityRequest) -> CheckReply;
}

pub struct EligibilityClient {
    http: Client,
    endpoint: String,
}

impl EligibilityClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// POST an arbitrary JSON body with the bearer token and classify the reply.
    pub async fn send_json(&self, token: &str, body: &Value) -> CheckReply {
        let resp = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "eligibility request did not complete");
                return CheckReply::Transport {
                    message: e.to_string(),
                };
            }
        };

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("eligibility endpoint rejected the token");
            return CheckReply::AuthExpired;
        }

        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, status = %status, "failed to read eligibility response");
                return CheckReply::Transport {
                    message: e.to_string(),
                };
            }
        };

        if !status.is_success() {
            tracing::debug!(status = %status, body = %text, "eligibility request failed");
            return CheckReply::RequestFailed {
                status: status.as_u16(),
                body: text,
            };
        }

        classify_body(&text)
    }

    /// Single check of a hand-edited payload.
    pub async fn check_payload(&self, token: &str, payload: &str) -> Result<Value, AppError> {
        let body = parse_payload(payload)?;
        into_result(self.send_json(token, &body).await)
    }

    /// Single check that brings its own token: the cached one, else one
    /// fresh authentication. A 401 invalidates the token before returning.
    pub async fn check_single(
        &self,
        tokens: &dyn TokenSource,
        payload: &str,
    ) -> Result<Value, AppError> {
        let body = parse_payload(payload)?;

        let token = match tokens.cached().await {
            Some(t) => t,
            None => tokens.authenticate().await?,
        };

        let result = into_result(self.send_json(&token, &body).await);
        if matches!(result, Err(AppError::AuthExpired)) {
            tokens.invalidate().await;
        }
        result
    }
}

fn parse_payload(payload: &str) -> Result<Value, AppError> {
    serde_json::from_str(payload).map_err(|e| AppError::PayloadParse(e.to_string()))
}

fn into_result(reply: CheckReply) -> Result<Value, AppError> {
    match reply {
        CheckReply::Classified { response, .. } => Ok(response),
        CheckReply::AuthExpired => Err(AppError::AuthExpired),
        CheckReply::RequestFailed { status, body } => Err(AppError::RequestFailed { status, body }),
        CheckReply::Transport { message } => Err(AppError::Transport(message)),
    }
}

#[async_trait]
impl EligibilityApi for EligibilityClient {
    async fn check_one(&self, token: &str, request: &EligibilityRequest) -> CheckReply {
        let body = match serde_json::to_value(request) {
            Ok(v) => v,
            Err(e) => {
                return CheckReply::Transport {
                    message: format!("failed to encode request: {}", e),
                }
            }
        };
        self.send_json(token, &body).await
    }
}

/// Classify a 2xx body. A body that is not JSON counts as a failed call.
fn classify_body(text: &str) -> CheckReply {
    match serde_json::from_str::<Value>(text) {
        Ok(response) => {
            let has_data = matches!(response.get("data"), Some(v) if !v.is_null());
            CheckReply::Classified {
                status: if has_data {
                    OutcomeStatus::Success
                } else {
                    OutcomeStatus::Invalid
                },
                response,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "2xx eligibility response was not JSON");
            CheckReply::Transport {
                message: format!("malformed eligibility response: {}", e),
            }
        }
    }
}
