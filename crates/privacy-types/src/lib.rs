use std::fmt;
use std::time::Duration;

use num_bigint::BigInt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret seed handed to the privacy capability.
///
/// The inner string is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Seed(String);

impl Seed {
    pub fn new(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    /// Borrow the raw seed material.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

impl From<&str> for Seed {
    fn from(seed: &str) -> Self {
        Self::new(seed)
    }
}

impl From<String> for Seed {
    fn from(seed: String) -> Self {
        Self(seed)
    }
}

/// Caller-defined description of a tracked operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct OperationMetadata(pub serde_json::Value);

/// Transaction document, used both for execution and for fee estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TransactionBody(pub serde_json::Value);

/// Query describing which proof inputs the capability should assemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProofQuery(pub serde_json::Value);

/// Private and public circuit inputs for proof generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct WitnessInput(pub serde_json::Value);

/// Location of a compiled circuit and its verification key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInfo {
    pub name: String,
    pub json_url: String,
    pub vk_url: String,
}

/// The closed set of requests understood by the privacy capability.
///
/// Serialises as a flat JSON object: a `type` tag plus the payload fields of
/// the variant, e.g. `{"type":"CONFIRM_OPERATION","id":7}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    SetSeed {
        seed: Seed,
    },
    GetSeed,
    Poseidon {
        #[serde(with = "decimal_bigints")]
        #[schemars(with = "Vec<String>")]
        inputs: Vec<BigInt>,
    },
    GenerateOperation {
        metadata: OperationMetadata,
    },
    ConfirmOperation {
        id: u64,
    },
    AbortOperation {
        id: u64,
    },
    NullifyOperation {
        id: u64,
    },
    GetConfirmedOperations,
    ExecuteTransaction {
        body: TransactionBody,
    },
    GetTransactionFeeData {
        body: TransactionBody,
    },
    GetProofData {
        body: ProofQuery,
    },
    GetTokenName {
        #[serde(rename = "tokenAddress")]
        token_address: String,
    },
    GetTokenDecimals {
        #[serde(rename = "tokenAddress")]
        token_address: String,
    },
    GenerateProof {
        circuit: CircuitInfo,
        #[serde(rename = "witnessInput")]
        witness_input: WitnessInput,
    },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::SetSeed { .. } => MessageKind::SetSeed,
            Message::GetSeed => MessageKind::GetSeed,
            Message::Poseidon { .. } => MessageKind::Poseidon,
            Message::GenerateOperation { .. } => MessageKind::GenerateOperation,
            Message::ConfirmOperation { .. } => MessageKind::ConfirmOperation,
            Message::AbortOperation { .. } => MessageKind::AbortOperation,
            Message::NullifyOperation { .. } => MessageKind::NullifyOperation,
            Message::GetConfirmedOperations => MessageKind::GetConfirmedOperations,
            Message::ExecuteTransaction { .. } => MessageKind::ExecuteTransaction,
            Message::GetTransactionFeeData { .. } => MessageKind::GetTransactionFeeData,
            Message::GetProofData { .. } => MessageKind::GetProofData,
            Message::GetTokenName { .. } => MessageKind::GetTokenName,
            Message::GetTokenDecimals { .. } => MessageKind::GetTokenDecimals,
            Message::GenerateProof { .. } => MessageKind::GenerateProof,
        }
    }
}

/// Tag of a [`Message`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    SetSeed,
    GetSeed,
    Poseidon,
    GenerateOperation,
    ConfirmOperation,
    AbortOperation,
    NullifyOperation,
    GetConfirmedOperations,
    ExecuteTransaction,
    GetTransactionFeeData,
    GetProofData,
    GetTokenName,
    GetTokenDecimals,
    GenerateProof,
}

impl MessageKind {
    /// The wire tag carried in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::SetSeed => "SET_SEED",
            MessageKind::GetSeed => "GET_SEED",
            MessageKind::Poseidon => "POSEIDON",
            MessageKind::GenerateOperation => "GENERATE_OPERATION",
            MessageKind::ConfirmOperation => "CONFIRM_OPERATION",
            MessageKind::AbortOperation => "ABORT_OPERATION",
            MessageKind::NullifyOperation => "NULLIFY_OPERATION",
            MessageKind::GetConfirmedOperations => "GET_CONFIRMED_OPERATIONS",
            MessageKind::ExecuteTransaction => "EXECUTE_TRANSACTION",
            MessageKind::GetTransactionFeeData => "GET_TRANSACTION_FEE_DATA",
            MessageKind::GetProofData => "GET_PROOF_DATA",
            MessageKind::GetTokenName => "GET_TOKEN_NAME",
            MessageKind::GetTokenDecimals => "GET_TOKEN_DECIMALS",
            MessageKind::GenerateProof => "GENERATE_PROOF",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON Schema of the request wire format.
pub fn message_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Message)
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed results
// ─────────────────────────────────────────────────────────────────────────────

// Each record keeps the fields it does not name in `extra`, so re-serialising
// a reply yields exactly what the provider sent.

/// Result of `GET_SEED`. `seed` is `None` when no seed has been installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedReply {
    pub seed: Option<Seed>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `POSEIDON`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashReply {
    pub hash: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `GENERATE_OPERATION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedOperation {
    pub hash: String,
    pub id: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `GET_CONFIRMED_OPERATIONS`. Entries are provider-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedOperations {
    pub operations: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A failure raised by the privacy capability itself.
///
/// Carried verbatim from the provider; its `Display` is the provider's own
/// message.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct CapabilityError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

/// Errors surfaced by the request bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// There is no host environment in which a capability could ever appear.
    #[error("Privacy API host environment unavailable")]
    EnvironmentUnavailable,

    #[error("Privacy API not available after {waited:?}")]
    CapabilityTimeout { waited: Duration },

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// The reply could not be read as the result type of the request.
    /// `reply` is the provider's answer exactly as received.
    #[error("Unexpected {kind} reply: {reason}")]
    UnexpectedResponse {
        kind: MessageKind,
        reason: String,
        reply: Value,
    },
}

mod decimal_bigints {
    use num_bigint::BigInt;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigInt>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| raw.parse::<BigInt>().map_err(D::Error::custom))
            .collect()
    }
}
