//! # Agent Registry
//!
//! Tracks staked protocol participants. Registration escrows the stake,
//! derives the agent's state address, and classifies the agent into a tier
//! from the configured [`TierSchedule`]. The oracle consults the registry
//! for submission eligibility; governance consults it for voting stake.
//!
//! Stake that backs an in-flight commitment - an open oracle submission or
//! an active vote - cannot be withdrawn until the commitment resolves.

mod agent;
mod registry;

pub use agent::Agent;
pub use registry::{AgentRegistry, RegistryError};

pub use ars_core::config::{AgentTier, TierSchedule};
