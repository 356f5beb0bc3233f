//! Protocol configuration.
//!
//! Deployment-tunable parameters live here as plain serde structs with
//! production defaults. Nothing in the state machine hard-codes a tier
//! threshold, quorum size, or cap: the three-agent / quorum-3 deployment is
//! one configuration among many.
//!
//! ## Default agent tiers
//!
//! | Tier | Minimum Stake |
//! |----------|---------------|
//! | Bronze | 1,000 ARU |
//! | Silver | 5,000 ARU |
//! | Gold | 25,000 ARU |
//! | Platinum | 100,000 ARU |

use crate::constants::ONE_ARU;
use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// Agent tier, strictly ordered by stake requirement.
///
/// Higher tiers unlock oracle submission when the deployment raises the
/// minimum submission tier. Voting power never depends on tier; it is
/// always quadratic in committed stake.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AgentTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl AgentTier {
    /// Tier name for display and snapshots.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

/// Stake thresholds for each tier. The largest threshold not exceeding an
/// agent's stake determines its tier; stake below `bronze_min` has no tier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierSchedule {
    pub bronze_min: Amount,
    pub silver_min: Amount,
    pub gold_min: Amount,
    pub platinum_min: Amount,
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            bronze_min: 1_000 * ONE_ARU,
            silver_min: 5_000 * ONE_ARU,
            gold_min: 25_000 * ONE_ARU,
            platinum_min: 100_000 * ONE_ARU,
        }
    }
}

impl TierSchedule {
    /// Lowest stake accepted at registration.
    pub fn minimum_stake(&self) -> Amount {
        self.bronze_min
    }

    /// Tier for a stake amount, or `None` below the lowest threshold.
    pub fn tier_for(&self, stake: Amount) -> Option<AgentTier> {
        if stake >= self.platinum_min {
            Some(AgentTier::Platinum)
        } else if stake >= self.gold_min {
            Some(AgentTier::Gold)
        } else if stake >= self.silver_min {
            Some(AgentTier::Silver)
        } else if stake >= self.bronze_min {
            Some(AgentTier::Bronze)
        } else {
            None
        }
    }
}

/// Oracle consensus parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleParams {
    /// Pending submissions required to trigger consensus. Minimum 3; odd
    /// sizes keep the median a single submitted value.
    pub quorum: usize,

    /// Maximum tolerated distance, in seconds, between a submission's
    /// timestamp and the host-observed time.
    pub max_skew_secs: u64,

    /// Lowest tier allowed to submit index updates.
    pub min_submission_tier: AgentTier,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            quorum: 3,
            max_skew_secs: 300,
            min_submission_tier: AgentTier::Bronze,
        }
    }
}

/// Governance parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Fraction of total registered stake, in bps, that must vote yes
    /// (raw stake) for a proposal to pass.
    pub quorum_bps: u32,

    /// Shortest accepted voting period in seconds. Zero disables the
    /// check; any period a proposer names is accepted.
    pub min_voting_period_secs: u64,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            quorum_bps: 1_000, // 10% of registered stake
            min_voting_period_secs: 0,
        }
    }
}

/// Reserve vault parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultParams {
    /// Withdrawals may not push VHR below this (bps; 15000 = 150%).
    pub min_vhr_bps: u32,

    /// VHR above this signals excess collateral eligible for release.
    pub rebalance_trigger_bps: u32,

    /// Asset tags with configured sub-accounts.
    pub assets: Vec<String>,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            min_vhr_bps: 15_000,
            rebalance_trigger_bps: 16_000,
            assets: vec![
                "sol".to_string(),
                "usdc".to_string(),
                "msol".to_string(),
                "jitosol".to_string(),
            ],
        }
    }
}

/// Supply controller parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupplyParams {
    /// Epoch length in seconds.
    pub epoch_duration_secs: u64,

    /// Per-epoch mint cap, bps of total supply at epoch start.
    pub mint_cap_bps: u32,

    /// Per-epoch burn cap, bps of total supply at epoch start.
    pub burn_cap_bps: u32,

    /// Closed-epoch records retained in history.
    pub history_depth: usize,
}

impl Default for SupplyParams {
    fn default() -> Self {
        Self {
            epoch_duration_secs: 86_400,
            mint_cap_bps: 200, // 2%
            burn_cap_bps: 200,
            history_depth: 64,
        }
    }
}

/// Full protocol configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub tiers: TierSchedule,
    pub oracle: OracleParams,
    pub governance: GovernanceParams,
    pub vault: VaultParams,
    pub supply: SupplyParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_for_stake() {
        let schedule = TierSchedule::default();

        assert_eq!(schedule.tier_for(999 * ONE_ARU), None);
        assert_eq!(schedule.tier_for(1_000 * ONE_ARU), Some(AgentTier::Bronze));
        assert_eq!(schedule.tier_for(4_999 * ONE_ARU), Some(AgentTier::Bronze));
        assert_eq!(schedule.tier_for(5_000 * ONE_ARU), Some(AgentTier::Silver));
        assert_eq!(schedule.tier_for(25_000 * ONE_ARU), Some(AgentTier::Gold));
        assert_eq!(
            schedule.tier_for(250_000 * ONE_ARU),
            Some(AgentTier::Platinum)
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(AgentTier::Bronze < AgentTier::Silver);
        assert!(AgentTier::Silver < AgentTier::Gold);
        assert!(AgentTier::Gold < AgentTier::Platinum);
    }

    #[test]
    fn test_default_params() {
        let config = ProtocolConfig::default();

        assert_eq!(config.oracle.quorum, 3);
        assert_eq!(config.supply.epoch_duration_secs, 86_400);
        assert_eq!(config.supply.mint_cap_bps, 200);
        assert_eq!(config.vault.min_vhr_bps, 15_000);
        assert_eq!(config.vault.assets.len(), 4);
    }
}
