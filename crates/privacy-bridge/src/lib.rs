//! `privacy-bridge` – typed client for an injected privacy capability.
//!
//! The capability (seed storage, Poseidon hashing, operation tracking, proof
//! generation, ledger queries) lives outside this process's control and may
//! only appear some time after start-up.  This crate waits for it with bounded
//! polling and relays typed requests to it unchanged.
//!
//! # Modules
//!
//! - [`capability`] – [`PrivacyApi`], the single-method contract every
//!   capability implements.
//! - [`locator`] – [`CapabilityLocator`] plus the [`HostSlot`] injection point
//!   and the [`Detached`] locator for contexts without a host.
//! - [`poll`] – [`poll_until`] / [`try_poll_until`], a fixed-interval,
//!   deadline-bounded readiness wait.
//! - [`bridge`] – [`RequestBridge`], one method per request kind.
//! - [`config`] – [`BridgeConfig`], polling interval and bound.
//! - [`relay`] – [`WsRelay`], a capability reached over a WebSocket.

pub mod bridge;
pub mod capability;
pub mod config;
pub mod locator;
pub mod poll;
pub mod relay;

pub use bridge::RequestBridge;
pub use capability::{CapabilityHandle, PrivacyApi};
pub use config::BridgeConfig;
pub use locator::{CapabilityLocator, Detached, HostSlot};
pub use poll::{poll_until, try_poll_until, PollError, PollPolicy, PollTimeout};
pub use relay::{RelayReply, WsRelay};
