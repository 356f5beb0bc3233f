//! # Governance Engine
//!
//! Proposal lifecycle and quadratic-stake voting.
//!
//! A proposal carries one closed policy variant (mint, burn, parameter
//! update, rebalance trigger). Votes are one-shot per (voter, proposal):
//! the committed stake counts raw toward quorum and its integer square
//! root toward the decision, damping large single holders. A proposal
//! passes when quadratic-yes exceeds quadratic-no and raw yes-stake meets
//! the configured fraction of total registered stake.
//!
//! Execution is two-phase: [`GovernanceEngine::begin_execute`] hands the
//! policy to the caller for dispatch and
//! [`GovernanceEngine::mark_executed`] closes the proposal afterwards, so
//! a failed dispatch leaves the proposal passed and retriable while the
//! executed flag guarantees at-most-once application.

mod engine;
mod proposal;

pub use engine::{GovernanceEngine, GovernanceError};
pub use proposal::{PolicyType, Proposal, ProposalStatus, VoteRecord};
