//! Agent record.

use ars_core::config::{AgentTier, TierSchedule};
use ars_core::types::{Address, Amount, Identity};
use serde::{Deserialize, Serialize};

/// A staked protocol participant.
///
/// The tier is never stored: it is recomputed from the current stake on
/// every read, so stake and tier cannot drift apart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    /// Owning identity.
    pub identity: Identity,

    /// Derived state address (`agent` namespace, keyed by identity).
    pub address: Address,

    /// Total escrowed stake.
    pub stake: Amount,

    /// Stake committed to active votes. Not withdrawable.
    pub committed_stake: Amount,

    /// Oracle submissions currently pending consensus.
    pub open_submissions: u32,

    /// Registration timestamp (unix seconds, host-supplied).
    pub registered_at: i64,
}

impl Agent {
    /// Stake not backing any vote commitment.
    pub fn uncommitted_stake(&self) -> Amount {
        self.stake.saturating_sub(self.committed_stake)
    }

    /// Whether any oracle submission or vote commitment is in flight.
    pub fn has_open_commitment(&self) -> bool {
        self.committed_stake > 0 || self.open_submissions > 0
    }

    /// Current tier under the given schedule, or `None` below the lowest
    /// threshold.
    pub fn tier(&self, schedule: &TierSchedule) -> Option<AgentTier> {
        schedule.tier_for(self.stake)
    }
}
