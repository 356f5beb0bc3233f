//! Registry operations: registration, stake adjustment, commitment escrow.

use crate::agent::Agent;
use ars_core::address::{derive_address, namespace, Component};
use ars_core::config::{AgentTier, TierSchedule};
use ars_core::error::AddressError;
use ars_core::types::{Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("agent already registered: {0}")]
    AlreadyRegistered(Identity),

    #[error("agent not registered: {0}")]
    NotRegistered(Identity),

    #[error("insufficient stake: need {required}, have {available}")]
    InsufficientStake { required: Amount, available: Amount },

    #[error("stake would fall below minimum {minimum} while commitments are open")]
    StakeBelowMinimum { minimum: Amount },

    #[error("stake amount overflows")]
    AmountOverflow,

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Registry of staked agents.
///
/// `BTreeMap` keyed by identity: iteration order reaches observable results
/// (governance's remaining-power bound), so it must be deterministic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRegistry {
    schedule: TierSchedule,
    agents: BTreeMap<Identity, Agent>,
    total_staked: u128,
}

impl AgentRegistry {
    pub fn new(schedule: TierSchedule) -> Self {
        Self {
            schedule,
            agents: BTreeMap::new(),
            total_staked: 0,
        }
    }

    /// Register a new agent, escrowing `stake`.
    pub fn register(
        &mut self,
        identity: Identity,
        stake: Amount,
        now: i64,
    ) -> Result<&Agent, RegistryError> {
        if self.agents.contains_key(&identity) {
            return Err(RegistryError::AlreadyRegistered(identity));
        }
        if stake < self.schedule.minimum_stake() {
            return Err(RegistryError::InsufficientStake {
                required: self.schedule.minimum_stake(),
                available: stake,
            });
        }

        let derived = derive_address(Component::Registry, namespace::AGENT, &[identity.as_bytes()])?;
        let agent = Agent {
            identity,
            address: derived.address,
            stake,
            committed_stake: 0,
            open_submissions: 0,
            registered_at: now,
        };

        self.total_staked += stake as u128;
        tracing::info!(
            agent = %identity,
            stake,
            tier = ?agent.tier(&self.schedule),
            "agent registered"
        );
        self.agents.insert(identity, agent);
        Ok(&self.agents[&identity])
    }

    /// Adjust an agent's stake by `delta` (positive stakes more, negative
    /// unstakes). The tier follows the new stake automatically.
    ///
    /// A decrease can never touch committed stake, and cannot take the
    /// total below the lowest tier threshold while any oracle submission or
    /// vote commitment is open.
    pub fn adjust_stake(&mut self, identity: &Identity, delta: i128) -> Result<&Agent, RegistryError> {
        let agent = self
            .agents
            .get_mut(identity)
            .ok_or(RegistryError::NotRegistered(*identity))?;

        let new_stake: Amount = if delta >= 0 {
            let increase = Amount::try_from(delta).map_err(|_| RegistryError::AmountOverflow)?;
            agent
                .stake
                .checked_add(increase)
                .ok_or(RegistryError::AmountOverflow)?
        } else {
            let decrease =
                Amount::try_from(delta.unsigned_abs()).map_err(|_| RegistryError::AmountOverflow)?;
            if decrease > agent.uncommitted_stake() {
                return Err(RegistryError::InsufficientStake {
                    required: decrease,
                    available: agent.uncommitted_stake(),
                });
            }
            let remaining = agent.stake - decrease;
            if remaining < self.schedule.minimum_stake() && agent.has_open_commitment() {
                return Err(RegistryError::StakeBelowMinimum {
                    minimum: self.schedule.minimum_stake(),
                });
            }
            remaining
        };

        if delta >= 0 {
            self.total_staked += (new_stake - agent.stake) as u128;
        } else {
            self.total_staked -= (agent.stake - new_stake) as u128;
        }
        agent.stake = new_stake;
        tracing::debug!(agent = %identity, stake = new_stake, "stake adjusted");
        Ok(agent)
    }

    /// Commit stake to a vote. Fails if it exceeds the uncommitted balance.
    pub fn commit_stake(&mut self, identity: &Identity, amount: Amount) -> Result<(), RegistryError> {
        let agent = self
            .agents
            .get_mut(identity)
            .ok_or(RegistryError::NotRegistered(*identity))?;

        if amount > agent.uncommitted_stake() {
            return Err(RegistryError::InsufficientStake {
                required: amount,
                available: agent.uncommitted_stake(),
            });
        }
        agent.committed_stake += amount;
        Ok(())
    }

    /// Release previously committed stake (vote resolved).
    pub fn release_stake(&mut self, identity: &Identity, amount: Amount) {
        if let Some(agent) = self.agents.get_mut(identity) {
            agent.committed_stake = agent.committed_stake.saturating_sub(amount);
        }
    }

    /// Mark an oracle submission as pending for this agent.
    pub fn begin_submission(&mut self, identity: &Identity) -> Result<(), RegistryError> {
        let agent = self
            .agents
            .get_mut(identity)
            .ok_or(RegistryError::NotRegistered(*identity))?;
        agent.open_submissions += 1;
        Ok(())
    }

    /// Resolve a pending oracle submission for this agent.
    pub fn end_submission(&mut self, identity: &Identity) {
        if let Some(agent) = self.agents.get_mut(identity) {
            agent.open_submissions = agent.open_submissions.saturating_sub(1);
        }
    }

    pub fn get(&self, identity: &Identity) -> Option<&Agent> {
        self.agents.get(identity)
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.agents.contains_key(identity)
    }

    /// Current tier of an agent, if registered and at or above the lowest
    /// threshold.
    pub fn tier_of(&self, identity: &Identity) -> Option<AgentTier> {
        self.agents.get(identity).and_then(|a| a.tier(&self.schedule))
    }

    /// Sum of all escrowed stake.
    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Deterministic iteration over all agents, ordered by identity.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &Agent)> {
        self.agents.iter()
    }

    pub fn schedule(&self) -> &TierSchedule {
        &self.schedule
    }
}
