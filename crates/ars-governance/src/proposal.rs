//! Proposal state objects.

use ars_core::state::ProtocolParam;
use ars_core::types::{Address, Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The policy a proposal enacts on execution. Closed set: execution
/// pattern-matches on the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    /// Mint new supply to a recipient, subject to the epoch cap.
    Mint { recipient: Identity, amount: Amount },

    /// Burn supply from a source account, subject to the epoch cap.
    Burn { source: Identity, amount: Amount },

    /// Update one governed protocol parameter.
    ParameterUpdate { param: ProtocolParam, value: u64 },

    /// Record a reserve rebalance trigger; asset movement happens
    /// off-chain.
    RebalanceTrigger,
}

/// Proposal lifecycle status. Passed/Rejected/Executed are terminal except
/// for the single Passed -> Executed transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Executed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Active)
    }
}

/// One recorded vote. Votes are one-shot; this record is what blocks a
/// second vote by the same identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub approve: bool,

    /// Raw stake committed behind the vote.
    pub stake: Amount,

    /// floor(sqrt(stake)), the quadratic voting power.
    pub power: u64,

    pub voted_at: i64,
}

/// A governance proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonic id from the global counter. Never reused.
    pub id: u64,

    /// Derived address (`proposal` namespace, keyed by the counter).
    pub address: Address,

    pub proposer: Identity,

    pub policy: PolicyType,

    pub created_at: i64,

    /// Voting closes at this host time.
    pub deadline: i64,

    /// Raw stake tallies.
    pub yes_stake: u128,
    pub no_stake: u128,

    /// Quadratic power tallies.
    pub yes_power: u128,
    pub no_power: u128,

    /// Per-voter records, ordered by identity for determinism.
    pub votes: BTreeMap<Identity, VoteRecord>,

    pub status: ProposalStatus,
}

impl Proposal {
    /// Whether voting is open at `now`.
    pub fn is_open(&self, now: i64) -> bool {
        self.status == ProposalStatus::Active && now < self.deadline
    }
}
