//! Where the bridge looks for the capability.
//!
//! A [`CapabilityLocator`] answers one question per call: does the host
//! environment exist, and if so, has the capability been injected yet?
//!
//! | Answer | Meaning |
//! |---|---|
//! | `Err(EnvironmentUnavailable)` | no host at all, waiting is pointless |
//! | `Ok(None)` | host exists, capability not injected yet |
//! | `Ok(Some(handle))` | capability ready |

use std::sync::{Arc, OnceLock};

use privacy_types::BridgeError;

use crate::capability::CapabilityHandle;

pub trait CapabilityLocator: Send + Sync {
    fn locate(&self) -> Result<Option<CapabilityHandle>, BridgeError>;
}

impl<F> CapabilityLocator for F
where
    F: Fn() -> Option<CapabilityHandle> + Send + Sync,
{
    fn locate(&self) -> Result<Option<CapabilityHandle>, BridgeError> {
        Ok(self())
    }
}

/// The host's injection point for the capability.
///
/// Starts empty; the host calls [`HostSlot::install`] once the provider is
/// ready.  A slot can be filled exactly once, so a capability that has been
/// observed never disappears.  Clones share the same slot.
#[derive(Clone, Default)]
pub struct HostSlot {
    cell: Arc<OnceLock<CapabilityHandle>>,
}

impl HostSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject the capability.
    ///
    /// Returns the rejected handle if the slot was already filled.
    pub fn install(&self, api: CapabilityHandle) -> Result<(), CapabilityHandle> {
        self.cell.set(api)
    }

    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl CapabilityLocator for HostSlot {
    fn locate(&self) -> Result<Option<CapabilityHandle>, BridgeError> {
        Ok(self.cell.get().cloned())
    }
}

/// Locator for a context with no host environment (e.g. a headless worker).
///
/// Every lookup fails with [`BridgeError::EnvironmentUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl CapabilityLocator for Detached {
    fn locate(&self) -> Result<Option<CapabilityHandle>, BridgeError> {
        Err(BridgeError::EnvironmentUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PrivacyApi;
    use async_trait::async_trait;
    use privacy_types::{CapabilityError, Message};

    struct Null;

    #[async_trait]
    impl PrivacyApi for Null {
        async fn request(&self, _message: Message) -> Result<serde_json::Value, CapabilityError> {
            Ok(serde_json::Value::Null)
        }
    }

    #[test]
    fn empty_slot_locates_nothing() {
        let slot = HostSlot::new();
        assert!(!slot.is_installed());
        assert!(slot.locate().unwrap().is_none());
    }

    #[test]
    fn installed_capability_is_visible_through_clones() {
        let slot = HostSlot::new();
        let view = slot.clone();
        assert!(slot.install(Arc::new(Null)).is_ok());
        assert!(view.is_installed());
        assert!(view.locate().unwrap().is_some());
    }

    #[test]
    fn second_install_is_rejected() {
        let slot = HostSlot::new();
        let first: CapabilityHandle = Arc::new(Null);
        slot.install(Arc::clone(&first)).ok();
        assert!(slot.install(Arc::new(Null)).is_err());

        let located = slot.locate().unwrap().unwrap();
        assert!(Arc::ptr_eq(&located, &first));
    }

    #[test]
    fn detached_reports_missing_environment() {
        assert!(matches!(
            Detached.locate(),
            Err(BridgeError::EnvironmentUnavailable)
        ));
    }

    #[test]
    fn closures_are_locators() {
        let locator = || -> Option<CapabilityHandle> { Some(Arc::new(Null)) };
        assert!(locator.locate().unwrap().is_some());
    }
}
