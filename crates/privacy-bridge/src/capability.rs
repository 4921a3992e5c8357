//! The capability contract.
//!
//! The bridge never talks to a concrete provider.  Whatever the host injects
//! (an in-process implementation, a [`WsRelay`][crate::relay::WsRelay], a test
//! fake) only has to accept one [`Message`] and answer it asynchronously.

use std::sync::Arc;

use async_trait::async_trait;
use privacy_types::{CapabilityError, Message};

/// Every privacy capability provider must implement this trait.
///
/// # Contract
///
/// * `request` – receives a request exactly as the caller built it and returns
///   the provider's reply document, or the provider's own failure.  The
///   bridge neither inspects nor rewrites either side.
#[async_trait]
pub trait PrivacyApi: Send + Sync {
    async fn request(&self, message: Message) -> Result<serde_json::Value, CapabilityError>;
}

/// Shared reference to a live capability.
pub type CapabilityHandle = Arc<dyn PrivacyApi>;
