//! Governance operations.

use crate::proposal::{PolicyType, Proposal, ProposalStatus, VoteRecord};
use ars_core::address::{derive_address, namespace, Component};
use ars_core::config::GovernanceParams;
use ars_core::error::AddressError;
use ars_core::math::isqrt;
use ars_core::state::GlobalState;
use ars_core::types::{Amount, Identity};
use ars_registry::{AgentRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Governance errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("proposer not registered: {0}")]
    NotRegistered(Identity),

    #[error("proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("proposal {0} is closed to voting")]
    ProposalClosed(u64),

    #[error("identity already voted on this proposal: {0}")]
    AlreadyVoted(Identity),

    #[error("insufficient uncommitted stake: need {required}, have {available}")]
    InsufficientStake { required: Amount, available: Amount },

    #[error("voting period shorter than the configured minimum of {minimum_secs}s")]
    VotingPeriodTooShort { minimum_secs: u64 },

    #[error("proposal {0} already finalized")]
    AlreadyFinalized(u64),

    #[error("voting still open until {deadline} (now {now})")]
    VotingStillOpen { deadline: i64, now: i64 },

    #[error("proposal {0} has not passed")]
    NotPassed(u64),

    #[error("proposal {0} already executed")]
    AlreadyExecuted(u64),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Governance state: proposal arena keyed by the monotonic id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceEngine {
    params: GovernanceParams,
    proposals: BTreeMap<u64, Proposal>,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams) -> Self {
        Self {
            params,
            proposals: BTreeMap::new(),
        }
    }

    /// Create a proposal. The id comes from the global counter; the
    /// proposal address is derived from that id and never reused.
    ///
    /// Any voting period is accepted unless the deployment configures a
    /// floor (`min_voting_period_secs`, zero by default).
    pub fn create_proposal(
        &mut self,
        global: &mut GlobalState,
        registry: &AgentRegistry,
        proposer: Identity,
        policy: PolicyType,
        voting_period_secs: u64,
        now: i64,
    ) -> Result<&Proposal, GovernanceError> {
        if !registry.is_registered(&proposer) {
            return Err(GovernanceError::NotRegistered(proposer));
        }
        if voting_period_secs < self.params.min_voting_period_secs {
            return Err(GovernanceError::VotingPeriodTooShort {
                minimum_secs: self.params.min_voting_period_secs,
            });
        }

        let id = global.next_proposal_id();
        let derived = derive_address(
            Component::Governance,
            namespace::PROPOSAL,
            &[&id.to_le_bytes()],
        )?;

        // Saturate: an over-long period pins the deadline at the i64
        // horizon instead of wrapping into the past.
        let period = i64::try_from(voting_period_secs).unwrap_or(i64::MAX);
        let proposal = Proposal {
            id,
            address: derived.address,
            proposer,
            policy,
            created_at: now,
            deadline: now.saturating_add(period),
            yes_stake: 0,
            no_stake: 0,
            yes_power: 0,
            no_power: 0,
            votes: BTreeMap::new(),
            status: ProposalStatus::Active,
        };

        tracing::info!(
            proposal = id,
            proposer = %proposer,
            deadline = proposal.deadline,
            "proposal created"
        );
        Ok(self.proposals.entry(id).or_insert(proposal))
    }

    /// Cast a one-shot vote, committing `stake` until the proposal
    /// resolves. Quadratic power is floor(sqrt(stake)).
    ///
    /// If the vote makes the outcome irreversible for the currently
    /// registered electorate, the proposal resolves immediately; terminal
    /// states are one-way, so a later registrant cannot reopen it.
    pub fn vote(
        &mut self,
        registry: &mut AgentRegistry,
        global: &GlobalState,
        voter: Identity,
        proposal_id: u64,
        approve: bool,
        stake: Amount,
        now: i64,
    ) -> Result<&Proposal, GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        if !proposal.is_open(now) {
            return Err(GovernanceError::ProposalClosed(proposal_id));
        }
        if proposal.votes.contains_key(&voter) {
            return Err(GovernanceError::AlreadyVoted(voter));
        }

        registry.commit_stake(&voter, stake).map_err(|err| match err {
            RegistryError::NotRegistered(id) => GovernanceError::NotRegistered(id),
            RegistryError::InsufficientStake {
                required,
                available,
            } => GovernanceError::InsufficientStake {
                required,
                available,
            },
            // commit_stake only returns the two variants above.
            _ => GovernanceError::InsufficientStake {
                required: stake,
                available: 0,
            },
        })?;

        let power = isqrt(stake as u128);
        if approve {
            proposal.yes_stake += stake as u128;
            proposal.yes_power += power as u128;
        } else {
            proposal.no_stake += stake as u128;
            proposal.no_power += power as u128;
        }
        proposal.votes.insert(
            voter,
            VoteRecord {
                approve,
                stake,
                power,
                voted_at: now,
            },
        );

        tracing::debug!(
            proposal = proposal_id,
            voter = %voter,
            approve,
            stake,
            power,
            "vote recorded"
        );

        if let Some(outcome) = decisive_outcome(proposal, registry, global) {
            resolve(proposal, registry, outcome);
        }

        Ok(&self.proposals[&proposal_id])
    }

    /// Finalize a proposal after its deadline.
    pub fn finalize(
        &mut self,
        registry: &mut AgentRegistry,
        global: &GlobalState,
        proposal_id: u64,
        now: i64,
    ) -> Result<&Proposal, GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        if proposal.status.is_terminal() {
            return Err(GovernanceError::AlreadyFinalized(proposal_id));
        }
        if now < proposal.deadline {
            return Err(GovernanceError::VotingStillOpen {
                deadline: proposal.deadline,
                now,
            });
        }

        let outcome = if passes(proposal, registry, global) {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Rejected
        };
        resolve(proposal, registry, outcome);

        Ok(proposal)
    }

    /// First half of execution: validate and hand back the policy for
    /// dispatch. Does not mark the proposal executed.
    pub fn begin_execute(&self, proposal_id: u64) -> Result<PolicyType, GovernanceError> {
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        match proposal.status {
            ProposalStatus::Passed => Ok(proposal.policy.clone()),
            ProposalStatus::Executed => Err(GovernanceError::AlreadyExecuted(proposal_id)),
            _ => Err(GovernanceError::NotPassed(proposal_id)),
        }
    }

    /// Second half of execution: close the proposal after a successful
    /// dispatch. The executed flag is what makes dispatch at-most-once.
    pub fn mark_executed(&mut self, proposal_id: u64) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;

        match proposal.status {
            ProposalStatus::Passed => {
                proposal.status = ProposalStatus::Executed;
                tracing::info!(proposal = proposal_id, "proposal executed");
                Ok(())
            }
            ProposalStatus::Executed => Err(GovernanceError::AlreadyExecuted(proposal_id)),
            _ => Err(GovernanceError::NotPassed(proposal_id)),
        }
    }

    pub fn get(&self, proposal_id: u64) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Deterministic iteration over proposals by id.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }
}

/// Raw yes-stake quorum: `quorum_bps` of total registered stake.
fn quorum_stake(registry: &AgentRegistry, global: &GlobalState) -> u128 {
    registry.total_staked() * global.governance_quorum_bps as u128 / 10_000
}

fn passes(proposal: &Proposal, registry: &AgentRegistry, global: &GlobalState) -> bool {
    proposal.yes_power > proposal.no_power
        && proposal.yes_stake >= quorum_stake(registry, global)
}

/// The quadratic power still obtainable by registered agents that have not
/// voted: each can add at most floor(sqrt(its uncommitted stake)).
fn remaining_power(proposal: &Proposal, registry: &AgentRegistry) -> u128 {
    registry
        .iter()
        .filter(|(identity, _)| !proposal.votes.contains_key(identity))
        .map(|(_, agent)| isqrt(agent.uncommitted_stake() as u128) as u128)
        .sum()
}

/// Terminal outcome if no sequence of further votes can change it.
fn decisive_outcome(
    proposal: &Proposal,
    registry: &AgentRegistry,
    global: &GlobalState,
) -> Option<ProposalStatus> {
    let potential = remaining_power(proposal, registry);

    // Yes lead unassailable and quorum already met.
    if proposal.yes_power > proposal.no_power + potential
        && proposal.yes_stake >= quorum_stake(registry, global)
    {
        return Some(ProposalStatus::Passed);
    }
    // Yes can never overtake no.
    if proposal.yes_power + potential <= proposal.no_power {
        return Some(ProposalStatus::Rejected);
    }
    None
}

/// Move a proposal to a terminal status and release every voter's
/// committed stake.
fn resolve(proposal: &mut Proposal, registry: &mut AgentRegistry, outcome: ProposalStatus) {
    for (voter, record) in &proposal.votes {
        registry.release_stake(voter, record.stake);
    }
    proposal.status = outcome;
    tracing::info!(
        proposal = proposal.id,
        status = ?outcome,
        yes_power = proposal.yes_power as u64,
        no_power = proposal.no_power as u64,
        "proposal resolved"
    );
}
