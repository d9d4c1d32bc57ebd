use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("token fetch failed: {0}")]
    TokenFetchFailed(String),

    #[error("token missing or expired")]
    MissingToken,

    #[error("token expired")]
    AuthExpired,

    #[error("eligibility request failed: {status} {body}")]
    RequestFailed { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid CSV file: {0}")]
    CsvParse(String),

    #[error("row {row} not found ({total} rows)")]
    RowNotFound { row: usize, total: usize },

    #[error("invalid payload JSON: {0}")]
    PayloadParse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The single line shown to the operator for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::TokenFetchFailed(_) => "Token fetch failed".to_string(),
            AppError::MissingToken => {
                "Token missing or expired. Please run `elig token` again.".to_string()
            }
            AppError::AuthExpired => {
                "Token expired. Please run `elig token` again.".to_string()
            }
            AppError::RequestFailed { status, body } => {
                format!("Eligibility check failed: {} {}", status, body)
            }
            AppError::Transport(_) => {
                "Eligibility check failed (network or parse error)".to_string()
            }
            AppError::CsvParse(_) => "Invalid CSV file.".to_string(),
            AppError::RowNotFound { row, total } => {
                format!("Row {} not found (the CSV has {} rows).", row, total)
            }
            AppError::PayloadParse(e) => format!("Payload is not valid JSON: {}", e),
            AppError::Config(e) => format!("Configuration error: {}", e),
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                format!("File error: {}", e)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal error".to_string()
            }
        }
    }
}
