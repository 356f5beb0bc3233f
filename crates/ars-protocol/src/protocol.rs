//! The protocol umbrella: entry points, authorization, dispatch.
//!
//! [`Protocol`] owns every component and is the only place where they
//! interact. Entry points follow one shape: authorize the caller, delegate
//! to the owning component, propagate cross-component effects, emit a
//! snapshot. Components never call each other directly.
//!
//! Authorization is positional, not capability-based: agents act on their
//! own state, the vault authority moves collateral, the protocol authority
//! mints and burns directly, and anyone may finalize or execute a proposal
//! once its preconditions hold.

use crate::error::ProtocolError;
use crate::snapshot::{ProtocolSnapshot, SnapshotSink, TracingSink};
use ars_core::config::ProtocolConfig;
use ars_core::state::{GlobalState, ProtocolParam};
use ars_core::types::{Amount, Identity};
use ars_governance::{GovernanceEngine, PolicyType, ProposalStatus};
use ars_oracle::{ConsensusOutcome, IliOracle};
use ars_registry::AgentRegistry;
use ars_reserve::{RebalanceSignal, ReserveVault};
use ars_token::SupplyController;

/// The assembled protocol.
pub struct Protocol {
    global: GlobalState,
    registry: AgentRegistry,
    oracle: IliOracle,
    governance: GovernanceEngine,
    vault: ReserveVault,
    supply: SupplyController,
    sink: Box<dyn SnapshotSink>,
}

impl Protocol {
    /// Assemble a deployment from configuration. `authority` controls the
    /// privileged entry points and the vault; `treasury` receives the
    /// initial supply.
    pub fn new(
        config: &ProtocolConfig,
        authority: Identity,
        treasury: Identity,
        initial_supply: Amount,
        genesis_ts: i64,
    ) -> Result<Self, ProtocolError> {
        Self::with_sink(
            config,
            authority,
            treasury,
            initial_supply,
            genesis_ts,
            Box::new(TracingSink),
        )
    }

    /// Assemble with an explicit snapshot sink.
    pub fn with_sink(
        config: &ProtocolConfig,
        authority: Identity,
        treasury: Identity,
        initial_supply: Amount,
        genesis_ts: i64,
        sink: Box<dyn SnapshotSink>,
    ) -> Result<Self, ProtocolError> {
        let global = GlobalState::new(
            authority,
            config.supply.epoch_duration_secs,
            config.supply.mint_cap_bps,
            config.supply.burn_cap_bps,
            config.vault.min_vhr_bps,
            config.vault.rebalance_trigger_bps,
            config.governance.quorum_bps,
        );

        let supply = SupplyController::new(
            initial_supply,
            treasury,
            config.supply.epoch_duration_secs,
            config.supply.mint_cap_bps,
            config.supply.burn_cap_bps,
            config.supply.history_depth,
            genesis_ts,
        )?;

        let mut vault = ReserveVault::new(authority, &config.vault)?;
        // Liability tracks supply at par: one micro-ARU redeems one
        // micro-USD.
        vault.set_liability(initial_supply as u128);

        Ok(Self {
            global,
            registry: AgentRegistry::new(config.tiers.clone()),
            oracle: IliOracle::new(config.oracle.clone())?,
            governance: GovernanceEngine::new(config.governance.clone()),
            vault,
            supply,
            sink,
        })
    }

    // --- agent entry points ---

    /// Register the caller as an agent, escrowing `stake`.
    pub fn register_agent(
        &mut self,
        caller: Identity,
        stake: Amount,
        now: i64,
    ) -> Result<(), ProtocolError> {
        self.registry.register(caller, stake, now)?;
        self.emit(now);
        Ok(())
    }

    /// Adjust the caller's own stake. Positive stakes more, negative
    /// unstakes.
    pub fn adjust_stake(
        &mut self,
        caller: Identity,
        delta: i128,
        now: i64,
    ) -> Result<(), ProtocolError> {
        self.registry.adjust_stake(&caller, delta)?;
        self.emit(now);
        Ok(())
    }

    /// Submit an index observation. Returns the consensus outcome if this
    /// submission completed the quorum.
    pub fn submit_index_update(
        &mut self,
        caller: Identity,
        value: u64,
        timestamp: i64,
        now: i64,
    ) -> Result<Option<ConsensusOutcome>, ProtocolError> {
        let outcome = self
            .oracle
            .submit(&mut self.registry, caller, value, timestamp, now)?;
        self.emit(now);
        Ok(outcome)
    }

    // --- governance entry points ---

    /// Create a proposal on behalf of the caller. Returns the proposal id.
    pub fn create_proposal(
        &mut self,
        caller: Identity,
        policy: PolicyType,
        voting_period_secs: u64,
        now: i64,
    ) -> Result<u64, ProtocolError> {
        let id = self
            .governance
            .create_proposal(
                &mut self.global,
                &self.registry,
                caller,
                policy,
                voting_period_secs,
                now,
            )?
            .id;
        self.emit(now);
        Ok(id)
    }

    /// Vote on a proposal, committing `stake` until it resolves. Returns
    /// the proposal status after the vote, which may already be terminal
    /// when the outcome became decisive.
    pub fn vote_on_proposal(
        &mut self,
        caller: Identity,
        proposal_id: u64,
        approve: bool,
        stake: Amount,
        now: i64,
    ) -> Result<ProposalStatus, ProtocolError> {
        let status = self
            .governance
            .vote(
                &mut self.registry,
                &self.global,
                caller,
                proposal_id,
                approve,
                stake,
                now,
            )?
            .status;
        self.emit(now);
        Ok(status)
    }

    /// Finalize a proposal after its deadline. Open to any caller.
    pub fn finalize_proposal(
        &mut self,
        proposal_id: u64,
        now: i64,
    ) -> Result<ProposalStatus, ProtocolError> {
        let status = self
            .governance
            .finalize(&mut self.registry, &self.global, proposal_id, now)?
            .status;
        self.emit(now);
        Ok(status)
    }

    /// Execute a passed proposal. Open to any caller; the executed flag
    /// makes dispatch at-most-once, and a failed dispatch leaves the
    /// proposal passed and retriable.
    pub fn execute_proposal(&mut self, proposal_id: u64, now: i64) -> Result<(), ProtocolError> {
        let policy = self.governance.begin_execute(proposal_id)?;
        self.dispatch(policy, now)?;
        self.governance.mark_executed(proposal_id)?;
        self.emit(now);
        Ok(())
    }

    /// Apply one approved policy.
    fn dispatch(&mut self, policy: PolicyType, now: i64) -> Result<(), ProtocolError> {
        match policy {
            PolicyType::Mint { recipient, amount } => {
                self.supply.mint(recipient, amount, now)?;
                self.sync_liability();
            }
            PolicyType::Burn { source, amount } => {
                self.supply.burn(source, amount, now)?;
                self.sync_liability();
            }
            PolicyType::ParameterUpdate { param, value } => {
                self.global.apply_param(param, value);
                self.propagate_param(param, value);
            }
            PolicyType::RebalanceTrigger => {
                self.vault.mark_rebalanced(now);
            }
        }
        Ok(())
    }

    /// Push an applied parameter into the component that reads it, so no
    /// component ever holds a stale copy.
    fn propagate_param(&mut self, param: ProtocolParam, value: u64) {
        match param {
            ProtocolParam::EpochDuration => self.supply.set_epoch_duration_secs(value),
            ProtocolParam::MintCapBps => self.supply.set_mint_cap_bps(value as u32),
            ProtocolParam::BurnCapBps => self.supply.set_burn_cap_bps(value as u32),
            ProtocolParam::MinVhrBps => self.vault.set_min_vhr_bps(value as u32),
            ProtocolParam::RebalanceTriggerBps => self.vault.set_rebalance_trigger_bps(value as u32),
            // Governance reads the quorum from global state directly.
            ProtocolParam::GovernanceQuorumBps => {}
        }
    }

    // --- reserve entry points ---

    /// Deposit collateral. Vault authority only. Returns the resulting
    /// VHR in bps.
    pub fn deposit_collateral(
        &mut self,
        caller: Identity,
        asset: &str,
        amount: Amount,
        unit_price_usd: u64,
        now: i64,
    ) -> Result<u64, ProtocolError> {
        self.require_vault_authority(caller)?;
        let vhr = self.vault.deposit(asset, amount, unit_price_usd)?;
        self.emit(now);
        Ok(vhr)
    }

    /// Withdraw collateral. Vault authority only; rejected whole if the
    /// projected VHR breaches the minimum.
    pub fn withdraw_collateral(
        &mut self,
        caller: Identity,
        asset: &str,
        amount: Amount,
        now: i64,
    ) -> Result<u64, ProtocolError> {
        self.require_vault_authority(caller)?;
        let vhr = self.vault.withdraw(asset, amount)?;
        self.emit(now);
        Ok(vhr)
    }

    /// Where the current VHR sits relative to the configured thresholds.
    pub fn check_rebalance(&self) -> RebalanceSignal {
        self.vault.check_rebalance()
    }

    // --- supply entry points ---

    /// Mint directly, bypassing governance. Protocol authority only; the
    /// epoch cap still applies.
    pub fn mint_supply(
        &mut self,
        caller: Identity,
        destination: Identity,
        amount: Amount,
        now: i64,
    ) -> Result<Amount, ProtocolError> {
        self.require_authority(caller)?;
        let total = self.supply.mint(destination, amount, now)?;
        self.sync_liability();
        self.emit(now);
        Ok(total)
    }

    /// Burn directly, bypassing governance. Protocol authority only; the
    /// epoch cap still applies.
    pub fn burn_supply(
        &mut self,
        caller: Identity,
        source: Identity,
        amount: Amount,
        now: i64,
    ) -> Result<Amount, ProtocolError> {
        self.require_authority(caller)?;
        let total = self.supply.burn(source, amount, now)?;
        self.sync_liability();
        self.emit(now);
        Ok(total)
    }

    // --- internals ---

    fn require_authority(&self, caller: Identity) -> Result<(), ProtocolError> {
        if caller != self.global.authority {
            return Err(ProtocolError::Unauthorized { caller });
        }
        Ok(())
    }

    fn require_vault_authority(&self, caller: Identity) -> Result<(), ProtocolError> {
        if caller != self.vault.authority {
            return Err(ProtocolError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Republish the vault liability from total supply, at par.
    fn sync_liability(&mut self) {
        self.vault.set_liability(self.supply.total_supply() as u128);
    }

    fn emit(&mut self, now: i64) {
        let snapshot = self.snapshot(now);
        self.sink.publish(&snapshot);
    }

    /// Assemble a point-in-time summary of the whole protocol.
    pub fn snapshot(&self, now: i64) -> ProtocolSnapshot {
        ProtocolSnapshot {
            emitted_at: now,
            global: self.global.clone(),
            agent_count: self.registry.len(),
            total_staked: self.registry.total_staked(),
            current_ili: self.oracle.current_ili(),
            last_consensus_ts: self.oracle.last_consensus_timestamp(),
            pending_submissions: self.oracle.pending_count(),
            proposal_count: self.global.proposal_count,
            vhr_bps: self.vault.vhr_bps(),
            total_asset_value_usd: self.vault.total_asset_value_usd(),
            liability_usd: self.vault.liability_usd(),
            total_supply: self.supply.total_supply(),
            epoch_index: self.supply.epoch_index(),
            epoch_minted: self.supply.epoch_minted(),
            epoch_burned: self.supply.epoch_burned(),
        }
    }

    // --- read accessors ---

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn oracle(&self) -> &IliOracle {
        &self.oracle
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    pub fn vault(&self) -> &ReserveVault {
        &self.vault
    }

    pub fn supply(&self) -> &SupplyController {
        &self.supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NullSink;
    use ars_core::constants::ONE_ARU;

    fn identity(byte: u8) -> Identity {
        Identity::from_public_key(&[byte; 32])
    }

    fn protocol() -> Protocol {
        Protocol::with_sink(
            &ProtocolConfig::default(),
            identity(200),
            identity(201),
            1_000_000 * ONE_ARU,
            0,
            Box::new(NullSink),
        )
        .unwrap()
    }

    #[test]
    fn test_liability_tracks_supply_at_par() {
        let mut p = protocol();
        assert_eq!(p.vault().liability_usd(), (1_000_000 * ONE_ARU) as u128);

        p.mint_supply(identity(200), identity(1), 1_000 * ONE_ARU, 10)
            .unwrap();
        assert_eq!(p.vault().liability_usd(), (1_001_000 * ONE_ARU) as u128);

        p.burn_supply(identity(200), identity(1), 400 * ONE_ARU, 20)
            .unwrap();
        assert_eq!(p.vault().liability_usd(), (1_000_600 * ONE_ARU) as u128);
    }

    #[test]
    fn test_direct_mint_requires_authority() {
        let mut p = protocol();
        let err = p
            .mint_supply(identity(5), identity(5), ONE_ARU, 10)
            .unwrap_err();
        assert_eq!(err, ProtocolError::Unauthorized { caller: identity(5) });
        assert_eq!(p.supply().total_supply(), 1_000_000 * ONE_ARU);
    }

    #[test]
    fn test_vault_entry_points_require_vault_authority() {
        let mut p = protocol();
        let err = p
            .deposit_collateral(identity(5), "usdc", 100, 1_000_000, 10)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unauthorized { .. }));

        let err = p
            .withdraw_collateral(identity(5), "usdc", 100, 10)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unauthorized { .. }));
    }

    #[test]
    fn test_failed_dispatch_leaves_proposal_retriable() {
        let mut p = protocol();
        for i in 1..=3u8 {
            p.register_agent(identity(i), 5_000 * ONE_ARU, 0).unwrap();
        }

        // A mint far above the epoch cap: the proposal passes but its
        // dispatch fails.
        let id = p
            .create_proposal(
                identity(1),
                PolicyType::Mint {
                    recipient: identity(1),
                    amount: 500_000 * ONE_ARU,
                },
                86_400,
                0,
            )
            .unwrap();
        p.vote_on_proposal(identity(2), id, true, 2_000 * ONE_ARU, 10)
            .unwrap();
        p.finalize_proposal(id, 86_400).unwrap();

        let err = p.execute_proposal(id, 86_401).unwrap_err();
        assert!(matches!(err, ProtocolError::Supply(_)));
        // Still passed, not executed: a corrected epoch could retry.
        assert_eq!(
            p.governance().get(id).unwrap().status,
            ProposalStatus::Passed
        );
    }
}
