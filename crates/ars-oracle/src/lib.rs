//! # ILI Oracle Consensus Engine
//!
//! Aggregates per-epoch index submissions from registered agents into one
//! canonical ILI value. Each agent may hold at most one pending submission;
//! when the pending set reaches the configured quorum (minimum 3) the
//! engine takes the arithmetic median of all pending values, publishes it,
//! and clears the set atomically - no state between "quorum reached" and
//! "set cleared" is ever observable.
//!
//! The median bounds Byzantine influence: a single incorrect submitter can
//! shift the result by at most one position in sorted order. Outlier
//! rejection beyond the median itself is out of scope.
//!
//! Submission failures never disturb existing pending state, and the
//! engine never retries anything; callers resubmit explicitly.

use ars_core::address::{derive_address, namespace, Component};
use ars_core::config::{AgentTier, OracleParams};
use ars_core::error::AddressError;
use ars_core::math::median;
use ars_core::types::{Address, Identity};
use ars_registry::AgentRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oracle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("agent not registered: {0}")]
    NotRegistered(Identity),

    #[error("agent tier below submission minimum ({required:?})")]
    TierTooLow {
        required: AgentTier,
        actual: Option<AgentTier>,
    },

    #[error("agent already has a pending submission this epoch: {0}")]
    DuplicateSubmission(Identity),

    #[error("stale timestamp: submitted {submitted}, host time {now}, max skew {max_skew_secs}s")]
    StaleTimestamp {
        submitted: i64,
        now: i64,
        max_skew_secs: u64,
    },

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// One pending index submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IliSubmission {
    pub value: u64,
    pub submitted_at: i64,
}

/// The result of a consensus round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    /// The new canonical ILI value.
    pub ili: u64,

    /// Host time at which consensus fired.
    pub timestamp: i64,

    /// Agents whose submissions entered the median, in arrival order.
    pub participants: Vec<Identity>,
}

/// Oracle state.
///
/// The pending set is an insertion-ordered map keyed by agent identity with
/// capacity equal to the quorum, so "first N distinct agents" semantics do
/// not depend on the container implementation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IliOracle {
    params: OracleParams,
    address: Address,
    current_ili: u64,
    last_consensus_ts: i64,
    pending: IndexMap<Identity, IliSubmission>,
}

impl IliOracle {
    pub fn new(params: OracleParams) -> Result<Self, OracleError> {
        let derived = derive_address(Component::Oracle, namespace::ILI_ORACLE, &[])?;
        let quorum = params.quorum;
        Ok(Self {
            params,
            address: derived.address,
            current_ili: 0,
            last_consensus_ts: 0,
            pending: IndexMap::with_capacity(quorum),
        })
    }

    /// Record a submission; fire consensus if it completes the quorum.
    ///
    /// `timestamp` is the submitter's claimed observation time, `now` the
    /// host-agreed current time. The quorum check runs strictly after the
    /// submission is recorded, so no submission can be lost to ordering.
    pub fn submit(
        &mut self,
        registry: &mut AgentRegistry,
        identity: Identity,
        value: u64,
        timestamp: i64,
        now: i64,
    ) -> Result<Option<ConsensusOutcome>, OracleError> {
        if !registry.is_registered(&identity) {
            return Err(OracleError::NotRegistered(identity));
        }

        // None < Some(_): an agent without a tier always fails the gate.
        let tier = registry.tier_of(&identity);
        if tier < Some(self.params.min_submission_tier) {
            return Err(OracleError::TierTooLow {
                required: self.params.min_submission_tier,
                actual: tier,
            });
        }

        if self.pending.contains_key(&identity) {
            return Err(OracleError::DuplicateSubmission(identity));
        }

        let skew = timestamp.abs_diff(now);
        if skew > self.params.max_skew_secs {
            return Err(OracleError::StaleTimestamp {
                submitted: timestamp,
                now,
                max_skew_secs: self.params.max_skew_secs,
            });
        }

        registry.begin_submission(&identity).map_err(|_| OracleError::NotRegistered(identity))?;
        self.pending.insert(
            identity,
            IliSubmission {
                value,
                submitted_at: timestamp,
            },
        );
        tracing::debug!(
            agent = %identity,
            value,
            pending = self.pending.len(),
            quorum = self.params.quorum,
            "index submission recorded"
        );

        if self.pending.len() < self.params.quorum {
            return Ok(None);
        }

        Ok(Some(self.reach_consensus(registry, now)))
    }

    /// Compute the median, publish it, and drain the pending set. One
    /// atomic step from the caller's point of view.
    fn reach_consensus(&mut self, registry: &mut AgentRegistry, now: i64) -> ConsensusOutcome {
        let values: Vec<u64> = self.pending.values().map(|s| s.value).collect();
        // Non-empty by construction: quorum >= 3.
        let ili = median(&values).unwrap_or(self.current_ili);

        let participants: Vec<Identity> = self.pending.drain(..).map(|(id, _)| id).collect();
        for participant in &participants {
            registry.end_submission(participant);
        }

        self.current_ili = ili;
        self.last_consensus_ts = now;

        tracing::info!(
            ili,
            participants = participants.len(),
            "oracle consensus reached"
        );

        ConsensusOutcome {
            ili,
            timestamp: now,
            participants,
        }
    }

    /// Current canonical ILI value.
    pub fn current_ili(&self) -> u64 {
        self.current_ili
    }

    /// Host time of the last consensus round.
    pub fn last_consensus_timestamp(&self) -> i64 {
        self.last_consensus_ts
    }

    /// Number of submissions awaiting quorum.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether this agent holds a pending submission.
    pub fn has_pending(&self, identity: &Identity) -> bool {
        self.pending.contains_key(identity)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn params(&self) -> &OracleParams {
        &self.params
    }
}
