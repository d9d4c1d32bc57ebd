//! Bulk loan-eligibility checker.
//!
//! CSV records are mapped to eligibility requests, submitted one at a
//! time with a cached bearer token, and projected into tables, a
//! response-code distribution and a CSV export. The `elig` binary wires
//! these together; integration tests in `tests/` drive them directly.

pub mod auth;
pub mod bulk;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod report;
pub mod store;
pub mod view;
