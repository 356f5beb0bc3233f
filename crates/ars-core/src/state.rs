//! Governed global protocol state.
//!
//! One instance exists per deployment, created at initialization and
//! mutated only through executed parameter-update proposals. Components
//! keep their own copy of the parameters they own; the umbrella propagates
//! every applied update so nothing reads a stale value.

use crate::address::{self, derive_address, Component, DerivedAddress};
use crate::error::AddressError;
use crate::types::Identity;
use serde::{Deserialize, Serialize};

/// A governable protocol parameter. Closed set: governance execution
/// pattern-matches on this, never on open-ended dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolParam {
    EpochDuration,
    MintCapBps,
    BurnCapBps,
    MinVhrBps,
    RebalanceTriggerBps,
    GovernanceQuorumBps,
}

/// Global protocol state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalState {
    /// Protocol authority: the only identity allowed to call the
    /// privileged mint/burn and vault entry points directly.
    pub authority: Identity,

    /// Epoch length in seconds.
    pub epoch_duration_secs: u64,

    /// Per-epoch mint cap in bps of supply at epoch start.
    pub mint_cap_bps: u32,

    /// Per-epoch burn cap in bps of supply at epoch start.
    pub burn_cap_bps: u32,

    /// Minimum vault health ratio in bps.
    pub min_vhr_bps: u32,

    /// VHR above which the vault signals excess collateral.
    pub rebalance_trigger_bps: u32,

    /// Yes-stake quorum for governance, bps of total registered stake.
    pub governance_quorum_bps: u32,

    /// Monotonically increasing proposal counter. Never reused.
    pub proposal_count: u64,
}

impl GlobalState {
    /// Initialize global state. Called exactly once per deployment.
    pub fn new(
        authority: Identity,
        epoch_duration_secs: u64,
        mint_cap_bps: u32,
        burn_cap_bps: u32,
        min_vhr_bps: u32,
        rebalance_trigger_bps: u32,
        governance_quorum_bps: u32,
    ) -> Self {
        Self {
            authority,
            epoch_duration_secs,
            mint_cap_bps,
            burn_cap_bps,
            min_vhr_bps,
            rebalance_trigger_bps,
            governance_quorum_bps,
            proposal_count: 0,
        }
    }

    /// The singleton address of the global state object.
    pub fn address() -> Result<DerivedAddress, AddressError> {
        derive_address(Component::Core, address::namespace::GLOBAL_STATE, &[])
    }

    /// Allocate the next proposal counter value.
    pub fn next_proposal_id(&mut self) -> u64 {
        self.proposal_count += 1;
        self.proposal_count
    }

    /// Apply a governance-approved parameter update.
    pub fn apply_param(&mut self, param: ProtocolParam, value: u64) {
        match param {
            ProtocolParam::EpochDuration => self.epoch_duration_secs = value,
            ProtocolParam::MintCapBps => self.mint_cap_bps = value as u32,
            ProtocolParam::BurnCapBps => self.burn_cap_bps = value as u32,
            ProtocolParam::MinVhrBps => self.min_vhr_bps = value as u32,
            ProtocolParam::RebalanceTriggerBps => self.rebalance_trigger_bps = value as u32,
            ProtocolParam::GovernanceQuorumBps => self.governance_quorum_bps = value as u32,
        }
    }
}
