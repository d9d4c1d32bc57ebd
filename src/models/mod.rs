pub mod outcome;
pub mod request;
pub mod response;

pub use outcome::{EligibilityOutcome, OutcomeStatus};
pub use request::{CsvRow, EligibilityRequest, RowMeta};
pub use response::{EligibilityResponse, COMPLETE_STATUS};
