//! [`RequestBridge`] – typed front door to the privacy capability.
//!
//! Every call goes through the same two steps:
//!
//! 1. **Resolve** the capability through the configured
//!    [`CapabilityLocator`].  If it is already there the call proceeds without
//!    suspending; otherwise it waits with [`poll_until`] for at most the
//!    configured bound.
//! 2. **Forward** the [`Message`] untouched and hand back whatever the
//!    capability answers.
//!
//! The bridge keeps no state of its own besides the locator and the polling
//! policy.  Concurrent calls are independent: each one resolves and forwards
//! on its own, with no request table and no ordering between them.
//!
//! Failures are never recovered locally.  A missing host is
//! [`BridgeError::EnvironmentUnavailable`], an exhausted wait is
//! [`BridgeError::CapabilityTimeout`], and anything the capability reports is
//! passed through as [`BridgeError::Capability`] unchanged.
//!
//! The locator is consulted on every call.  A capability that vanishes after
//! having been observed is outside the host contract; with a [`HostSlot`]
//! this cannot happen.
//!
//! [`HostSlot`]: crate::locator::HostSlot

use std::sync::Arc;

use num_bigint::BigInt;
use privacy_types::{
    BridgeError, CircuitInfo, ConfirmedOperations, GeneratedOperation, HashReply, Message,
    OperationMetadata, ProofQuery, Seed, SeedReply, TransactionBody, WitnessInput,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::capability::CapabilityHandle;
use crate::locator::CapabilityLocator;
use crate::poll::{try_poll_until, PollError, PollPolicy};

/// Client facade over an injected privacy capability.  Clone it cheaply – all
/// clones share the same locator.
#[derive(Clone)]
pub struct RequestBridge {
    locator: Arc<dyn CapabilityLocator>,
    policy: PollPolicy,
}

impl RequestBridge {
    /// Create a bridge that finds its capability through `locator` and waits
    /// for it according to `policy`.
    pub fn new(locator: impl CapabilityLocator + 'static, policy: PollPolicy) -> Self {
        Self {
            locator: Arc::new(locator),
            policy,
        }
    }

    /// Obtain a live capability handle, waiting for it if necessary.
    ///
    /// # Errors
    ///
    /// * [`BridgeError::EnvironmentUnavailable`] immediately, before any wait,
    ///   when the locator reports there is no host.
    /// * [`BridgeError::CapabilityTimeout`] when the capability has not
    ///   appeared within the policy's bound.
    /// * Any error the locator reports while waiting, as soon as it reports it.
    pub async fn resolve_capability(&self) -> Result<CapabilityHandle, BridgeError> {
        if let Some(api) = self.locator.locate()? {
            return Ok(api);
        }

        debug!(
            interval_ms = self.policy.interval.as_millis() as u64,
            timeout_ms = self.policy.timeout.as_millis() as u64,
            "privacy capability not injected yet; waiting"
        );

        let locator = &self.locator;
        try_poll_until(self.policy, || locator.locate())
            .await
            .map_err(|err| match err {
                PollError::Failed(err) => {
                    debug!(error = %err, "locator failed while waiting");
                    err
                }
                PollError::Timeout(timeout) => {
                    debug!(
                        waited = ?timeout.waited,
                        attempts = timeout.attempts,
                        "gave up waiting"
                    );
                    BridgeError::CapabilityTimeout {
                        waited: timeout.waited,
                    }
                }
            })
    }

    /// Forward `message` to the capability and return its raw reply.
    #[instrument(skip_all, fields(kind = %message.kind(), request_id = %Uuid::new_v4()))]
    pub async fn dispatch(&self, message: Message) -> Result<Value, BridgeError> {
        let api = self.resolve_capability().await?;
        trace!("forwarding request");
        let reply = api.request(message).await?;
        trace!("reply received");
        Ok(reply)
    }

    /// [`dispatch`](Self::dispatch) and read the reply as `T`.
    ///
    /// # Errors
    ///
    /// Everything [`dispatch`](Self::dispatch) returns, plus
    /// [`BridgeError::UnexpectedResponse`] when the reply does not have the
    /// shape of `T`.  That error still carries the untouched reply.
    pub async fn request<T: DeserializeOwned>(&self, message: Message) -> Result<T, BridgeError> {
        let kind = message.kind();
        let reply = self.dispatch(message).await?;
        match T::deserialize(&reply) {
            Ok(typed) => Ok(typed),
            Err(e) => Err(BridgeError::UnexpectedResponse {
                kind,
                reason: e.to_string(),
                reply,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Seed
    // -----------------------------------------------------------------------

    /// Install `seed` as the capability's secret.
    pub async fn set_seed(&self, seed: impl Into<Seed>) -> Result<Value, BridgeError> {
        self.dispatch(Message::SetSeed { seed: seed.into() }).await
    }

    /// Fetch the currently installed seed, if any.
    pub async fn get_seed(&self) -> Result<SeedReply, BridgeError> {
        self.request(Message::GetSeed).await
    }

    // -----------------------------------------------------------------------
    // Hashing
    // -----------------------------------------------------------------------

    /// Poseidon hash over `inputs`.
    pub async fn poseidon_hash(
        &self,
        inputs: impl IntoIterator<Item = BigInt>,
    ) -> Result<HashReply, BridgeError> {
        self.request(Message::Poseidon {
            inputs: inputs.into_iter().collect(),
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Operation lifecycle
    // -----------------------------------------------------------------------

    /// Start a tracked operation; the capability answers with its id and hash.
    pub async fn generate_operation(
        &self,
        metadata: OperationMetadata,
    ) -> Result<GeneratedOperation, BridgeError> {
        self.request(Message::GenerateOperation { metadata }).await
    }

    pub async fn confirm_operation(&self, id: u64) -> Result<Value, BridgeError> {
        self.dispatch(Message::ConfirmOperation { id }).await
    }

    pub async fn abort_operation(&self, id: u64) -> Result<Value, BridgeError> {
        self.dispatch(Message::AbortOperation { id }).await
    }

    pub async fn nullify_operation(&self, id: u64) -> Result<Value, BridgeError> {
        self.dispatch(Message::NullifyOperation { id }).await
    }

    pub async fn get_confirmed_operations(&self) -> Result<ConfirmedOperations, BridgeError> {
        self.request(Message::GetConfirmedOperations).await
    }

    // -----------------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------------

    pub async fn execute_transaction(&self, body: TransactionBody) -> Result<Value, BridgeError> {
        self.dispatch(Message::ExecuteTransaction { body }).await
    }

    /// Fee estimate for `body` (`GET_TRANSACTION_FEE_DATA`).
    pub async fn get_fee_data(&self, body: TransactionBody) -> Result<Value, BridgeError> {
        self.dispatch(Message::GetTransactionFeeData { body }).await
    }

    pub async fn get_proof_data(&self, body: ProofQuery) -> Result<Value, BridgeError> {
        self.dispatch(Message::GetProofData { body }).await
    }

    pub async fn get_token_name(
        &self,
        token_address: impl Into<String>,
    ) -> Result<Value, BridgeError> {
        self.dispatch(Message::GetTokenName {
            token_address: token_address.into(),
        })
        .await
    }

    pub async fn get_token_decimals(
        &self,
        token_address: impl Into<String>,
    ) -> Result<Value, BridgeError> {
        self.dispatch(Message::GetTokenDecimals {
            token_address: token_address.into(),
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Proving
    // -----------------------------------------------------------------------

    /// Produce a zero-knowledge proof for `circuit` from `witness_input`.
    pub async fn generate_proof(
        &self,
        circuit: CircuitInfo,
        witness_input: WitnessInput,
    ) -> Result<Value, BridgeError> {
        self.dispatch(Message::GenerateProof {
            circuit,
            witness_input,
        })
        .await
    }
}
