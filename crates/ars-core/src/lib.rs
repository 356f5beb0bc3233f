//! # ARS Core
//!
//! Foundation types for the ARS reserve-backed token protocol:
//! deterministic addressing, identities, integer-only math, protocol
//! configuration, and the governed global parameter state.
//!
//! Everything in this crate is deterministic by construction. No wall
//! clocks, no randomness, no floating point: the host ledger re-executes
//! every state transition on every validating party, and identical inputs
//! must produce identical outputs everywhere.

pub mod address;
pub mod config;
pub mod error;
pub mod math;
pub mod state;
pub mod types;

// Re-exports
pub use address::{derive_address, Component, DerivedAddress};
pub use config::{
    AgentTier, GovernanceParams, OracleParams, ProtocolConfig, SupplyParams, TierSchedule,
    VaultParams,
};
pub use error::AddressError;
pub use state::{GlobalState, ProtocolParam};
pub use types::{Address, Amount, Identity};

/// ARU token constants
pub mod constants {
    /// Token symbol
    pub const SYMBOL: &str = "ARU";

    /// Token name
    pub const NAME: &str = "Autonomous Reserve Unit";

    /// Decimal places
    pub const DECIMALS: u8 = 6;

    /// One ARU in smallest units
    pub const ONE_ARU: u64 = 1_000_000;

    /// One micro-USD unit; USD valuations carry the same precision as ARU
    pub const USD_DECIMALS: u8 = 6;

    /// Basis-point denominator (10000 = 100%)
    pub const BPS_DENOMINATOR: u64 = 10_000;
}
