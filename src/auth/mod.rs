pub mod cache;
pub mod client;

use async_trait::async_trait;

use crate::errors::AppError;

pub use cache::{Clock, ManualClock, SystemClock, TokenCache};
pub use client::{TokenClient, TokenOrigin};

/// Where a bulk run gets its bearer token from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A still-valid token, if one is cached.
    async fn cached(&self) -> Option<String>;

    /// Authenticate once and return the new token.
    async fn authenticate(&self) -> Result<String, AppError>;

    /// Forget the current token after the remote side rejected it.
    async fn invalidate(&self);
}
