//! Sequential bulk submission.
//!
//! Rows go out one at a time, in input order; the next request is only
//! sent once the previous reply has been classified. A 401 ends the run
//! on the spot. Every other failure is recorded against its row and the
//! run moves on.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::TokenSource;
use crate::client::{CheckReply, EligibilityApi};
use crate::config::PartialResults;
use crate::models::{CsvRow, EligibilityOutcome, OutcomeStatus};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStop {
    /// Every row was attempted.
    Completed,
    /// No token could be obtained; nothing was sent.
    MissingToken,
    /// The service rejected the token while processing `row_id`.
    AuthExpired { row_id: usize },
}

#[derive(Debug, Clone)]
pub struct BulkRun {
    pub run_id: Uuid,
    pub outcomes: Vec<EligibilityOutcome>,
    pub stop: RunStop,
    /// Rows for which a request was issued, including the one that hit 401.
    pub attempted: usize,
}

impl BulkRun {
    pub fn is_complete(&self) -> bool {
        self.stop == RunStop::Completed
    }
}

pub struct BulkRunner<'a> {
    api: &'a dyn EligibilityApi,
    partial_results: PartialResults,
}

impl<'a> BulkRunner<'a> {
    pub fn new(api: &'a dyn EligibilityApi, partial_results: PartialResults) -> Self {
        Self {
            api,
            partial_results,
        }
    }

    pub async fn run_all(&self, rows: &[CsvRow], tokens: &dyn TokenSource) -> BulkRun {
        let run_id = Uuid::new_v4();

        let token = match tokens.cached().await {
            Some(t) => Some(t),
            None => match tokens.authenticate().await {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::error!(%run_id, error = %e, "authentication before bulk run failed");
                    None
                }
            },
        };
        let Some(token) = token else {
            tracing::warn!(%run_id, "bulk run aborted: no token");
            return BulkRun {
                run_id,
                outcomes: Vec::new(),
                stop: RunStop::MissingToken,
                attempted: 0,
            };
        };

        tracing::info!(%run_id, rows = rows.len(), "bulk run started");

        let mut outcomes = Vec::with_capacity(rows.len());
        let mut attempted = 0;

        for row in rows {
            attempted += 1;
            let reply = self.api.check_one(&token, &row.payload).await;

            let (status, response) = match reply {
                CheckReply::Classified { status, response } => (status, response),
                CheckReply::AuthExpired => {
                    tokens.invalidate().await;
                    tracing::warn!(
                        %run_id,
                        row_id = row.id,
                        collected = outcomes.len(),
                        "token expired mid-run, stopping"
                    );
                    if self.partial_results == PartialResults::Discard {
                        outcomes.clear();
                    }
                    return BulkRun {
                        run_id,
                        outcomes,
                        stop: RunStop::AuthExpired { row_id: row.id },
                        attempted,
                    };
                }
                CheckReply::RequestFailed { status, body } => {
                    tracing::warn!(%run_id, row_id = row.id, status, "row request failed");
                    (OutcomeStatus::Error, failed_response(status, &body))
                }
                CheckReply::Transport { message } => {
                    tracing::warn!(%run_id, row_id = row.id, error = %message, "row request did not complete");
                    (
                        OutcomeStatus::Error,
                        json!({ "message": "Network or server error" }),
                    )
                }
            };

            tracing::debug!(%run_id, row_id = row.id, status = %status, "row processed");
            outcomes.push(EligibilityOutcome {
                row_id: row.id,
                purpose_id: row.payload.purpose_id.clone(),
                meta: row.meta.clone(),
                status,
                response,
            });
        }

        tracing::info!(%run_id, outcomes = outcomes.len(), "bulk run finished");
        BulkRun {
            run_id,
            outcomes,
            stop: RunStop::Completed,
            attempted,
        }
    }
}

/// The error body itself when it is JSON (so error envelopes stay
/// classifiable), otherwise a synthesized description.
fn failed_response(status: u16, body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(v) if v.is_object() => v,
        _ => json!({
            "message": "Eligibility request failed",
            "status": status,
            "body": body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::ingest::{map_meta, map_row, RawRecord};
    use crate::models::EligibilityRequest;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ── Fakes ───────────────────────────────────────────────────

    /// Replies per purpose id; records every purpose id it was asked about.
    struct ScriptedApi {
        replies: HashMap<String, CheckReply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(replies: Vec<(&str, CheckReply)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EligibilityApi for ScriptedApi {
        async fn check_one(&self, _token: &str, request: &EligibilityRequest) -> CheckReply {
            self.calls.lock().unwrap().push(request.purpose_id.clone());
            self.replies
                .get(&request.purpose_id)
                .cloned()
                .unwrap_or_else(success)
        }
    }

    struct FakeTokens {
        cached: Option<String>,
        fresh: Option<String>,
        auth_calls: AtomicUsize,
        invalidated: AtomicUsize,
    }

    impl FakeTokens {
        fn with_cached(token: &str) -> Self {
            Self {
                cached: Some(token.into()),
                fresh: None,
                auth_calls: AtomicUsize::new(0),
                invalidated: AtomicUsize::new(0),
            }
        }

        fn with_fresh(token: Option<&str>) -> Self {
            Self {
                cached: None,
                fresh: token.map(String::from),
                auth_calls: AtomicUsize::new(0),
                invalidated: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenSource for FakeTokens {
        async fn cached(&self) -> Option<String> {
            self.cached.clone()
        }

        async fn authenticate(&self) -> Result<String, AppError> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            self.fresh
                .clone()
                .ok_or_else(|| AppError::TokenFetchFailed("denied".into()))
        }

        async fn invalidate(&self) {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn success() -> CheckReply {
        CheckReply::Classified {
            status: OutcomeStatus::Success,
            response: json!({"data": {"Status": "CE", "responsecode": 1}}),
        }
    }

    fn rows(n: usize) -> Vec<CsvRow> {
        (1..=n)
            .map(|i| {
                let raw = RawRecord::from([
                    ("p_purpose_id".to_string(), format!("P{}", i)),
                    ("p_Fname".to_string(), format!("Name{}", i)),
                ]);
                CsvRow {
                    id: i,
                    payload: map_row(&raw),
                    meta: map_meta(&raw),
                }
            })
            .collect()
    }

    // ── Tests ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_all_success_in_input_order() {
        let api = ScriptedApi::new(vec![]);
        let tokens = FakeTokens::with_cached("jwt");
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(4), &tokens)
            .await;

        assert!(run.is_complete());
        assert_eq!(run.attempted, 4);
        let ids: Vec<usize> = run.outcomes.iter().map(|o| o.row_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(run.outcomes.iter().all(|o| o.status == OutcomeStatus::Success));
        assert_eq!(run.outcomes[2].purpose_id, "P3");
        assert_eq!(run.outcomes[2].meta.first_name, "Name3");
        assert_eq!(api.calls(), vec!["P1", "P2", "P3", "P4"]);
        assert_eq!(tokens.auth_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_recorded_and_run_continues() {
        let api = ScriptedApi::new(vec![(
            "P3",
            CheckReply::Transport {
                message: "connection reset".into(),
            },
        )]);
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(5), &FakeTokens::with_cached("jwt"))
            .await;

        assert!(run.is_complete());
        let statuses: Vec<OutcomeStatus> = run.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                OutcomeStatus::Success,
                OutcomeStatus::Success,
                OutcomeStatus::Error,
                OutcomeStatus::Success,
                OutcomeStatus::Success,
            ]
        );
        assert_eq!(run.outcomes[2].response["message"], "Network or server error");
    }

    #[tokio::test]
    async fn test_401_stops_run_and_skips_remaining_rows() {
        let api = ScriptedApi::new(vec![("P2", CheckReply::AuthExpired)]);
        let tokens = FakeTokens::with_cached("jwt");
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(5), &tokens)
            .await;

        assert_eq!(run.stop, RunStop::AuthExpired { row_id: 2 });
        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].row_id, 1);
        assert_eq!(run.attempted, 2);
        assert_eq!(api.calls(), vec!["P1", "P2"], "rows 3-5 must never be attempted");
        assert_eq!(tokens.invalidated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_401_with_discard_returns_no_outcomes() {
        let api = ScriptedApi::new(vec![("P3", CheckReply::AuthExpired)]);
        let run = BulkRunner::new(&api, PartialResults::Discard)
            .run_all(&rows(5), &FakeTokens::with_cached("jwt"))
            .await;

        assert_eq!(run.stop, RunStop::AuthExpired { row_id: 3 });
        assert!(run.outcomes.is_empty());
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_token_aborts_before_any_request() {
        let api = ScriptedApi::new(vec![]);
        let tokens = FakeTokens::with_fresh(None);
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(3), &tokens)
            .await;

        assert_eq!(run.stop, RunStop::MissingToken);
        assert!(run.outcomes.is_empty());
        assert!(api.calls().is_empty());
        assert_eq!(tokens.auth_calls.load(Ordering::SeqCst), 1, "authenticate exactly once");
    }

    #[tokio::test]
    async fn test_authenticates_once_when_cache_empty() {
        let api = ScriptedApi::new(vec![]);
        let tokens = FakeTokens::with_fresh(Some("new-jwt"));
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(2), &tokens)
            .await;

        assert!(run.is_complete());
        assert_eq!(run.outcomes.len(), 2);
        assert_eq!(tokens.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_failed_keeps_json_error_body() {
        let api = ScriptedApi::new(vec![
            (
                "P1",
                CheckReply::RequestFailed {
                    status: 400,
                    body: r#"{"errors":[{"status":"400","detail":"bad ssn"}]}"#.into(),
                },
            ),
            (
                "P2",
                CheckReply::RequestFailed {
                    status: 502,
                    body: "<html>bad gateway</html>".into(),
                },
            ),
        ]);
        let run = BulkRunner::new(&api, PartialResults::Keep)
            .run_all(&rows(2), &FakeTokens::with_cached("jwt"))
            .await;

        assert_eq!(run.outcomes[0].status, OutcomeStatus::Error);
        assert_eq!(run.outcomes[0].response["errors"][0]["detail"], "bad ssn");
        assert_eq!(run.outcomes[1].status, OutcomeStatus::Error);
        assert_eq!(run.outcomes[1].response["status"], 502);
        assert_eq!(run.outcomes[1].response["body"], "<html>bad gateway</html>");
    }

    #[tokio::test]
    async fn test_rerun_issues_requests_again() {
        let api = ScriptedApi::new(vec![]);
        let tokens = FakeTokens::with_cached("jwt");
        let runner = BulkRunner::new(&api, PartialResults::Keep);
        let first = runner.run_all(&rows(2), &tokens).await;
        let second = runner.run_all(&rows(2), &tokens).await;

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(api.calls().len(), 4);
    }
}
