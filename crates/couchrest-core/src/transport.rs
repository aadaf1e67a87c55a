//! The `DocumentTransport` trait: the seam between request translation and
//! the HTTP client that actually talks to the store.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::request::{OutboundRequest, RawResponse};

/// Sends one built request and returns the store's raw response.
///
/// Any HTTP status is a successful send; only failures to obtain a response
/// at all are errors, reported as [`AdapterError::Transport`].
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn DocumentTransport>`.
#[async_trait]
pub trait DocumentTransport: Send + Sync + 'static {
    async fn send(&self, req: OutboundRequest) -> Result<RawResponse, AdapterError>;

    /// Release held connections. The default holds none.
    async fn close(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}
