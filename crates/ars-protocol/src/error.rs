//! Unified error surface for the protocol entry points.
//!
//! Component errors bubble up unchanged through `#[from]` wrappers so
//! callers can match on the precise variant; [`ProtocolError::category`]
//! offers a coarse classification for hosts that only need to know how to
//! react.

use ars_core::error::AddressError;
use ars_core::types::Identity;
use ars_governance::GovernanceError;
use ars_oracle::OracleError;
use ars_registry::RegistryError;
use ars_reserve::VaultError;
use ars_token::SupplyError;
use thiserror::Error;

/// Coarse error classification for host-side handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller is not allowed to perform this operation.
    Authorization,

    /// The referenced entity does not exist.
    NotFound,

    /// The operation conflicts with current state (duplicate, closed,
    /// already executed).
    StateConflict,

    /// A configured cap, threshold, or balance blocked the operation.
    LimitExceeded,

    /// The input itself is invalid (stale timestamp, unknown asset,
    /// overflow).
    MalformedInput,

    /// Derivation space exhausted. Not recoverable by retrying.
    Fatal,
}

/// Top-level protocol error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("caller {caller} is not authorized for this operation")]
    Unauthorized { caller: Identity },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Supply(#[from] SupplyError),

    #[error(transparent)]
    Address(#[from] AddressError),
}

impl ProtocolError {
    /// Classify the error for host-side handling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authorization,

            Self::Registry(err) => match err {
                RegistryError::AlreadyRegistered(_) => ErrorCategory::StateConflict,
                RegistryError::NotRegistered(_) => ErrorCategory::NotFound,
                RegistryError::InsufficientStake { .. }
                | RegistryError::StakeBelowMinimum { .. } => ErrorCategory::LimitExceeded,
                RegistryError::AmountOverflow => ErrorCategory::MalformedInput,
                RegistryError::Address(_) => ErrorCategory::Fatal,
            },

            Self::Oracle(err) => match err {
                OracleError::NotRegistered(_) => ErrorCategory::NotFound,
                OracleError::TierTooLow { .. } => ErrorCategory::Authorization,
                OracleError::DuplicateSubmission(_) => ErrorCategory::StateConflict,
                OracleError::StaleTimestamp { .. } => ErrorCategory::MalformedInput,
                OracleError::Address(_) => ErrorCategory::Fatal,
            },

            Self::Governance(err) => match err {
                GovernanceError::NotRegistered(_) | GovernanceError::ProposalNotFound(_) => {
                    ErrorCategory::NotFound
                }
                GovernanceError::ProposalClosed(_)
                | GovernanceError::AlreadyVoted(_)
                | GovernanceError::AlreadyFinalized(_)
                | GovernanceError::VotingStillOpen { .. }
                | GovernanceError::NotPassed(_)
                | GovernanceError::AlreadyExecuted(_) => ErrorCategory::StateConflict,
                GovernanceError::InsufficientStake { .. } => ErrorCategory::LimitExceeded,
                GovernanceError::VotingPeriodTooShort { .. } => ErrorCategory::MalformedInput,
                GovernanceError::Address(_) => ErrorCategory::Fatal,
            },

            Self::Vault(err) => match err {
                VaultError::UnknownAsset(_) => ErrorCategory::NotFound,
                VaultError::InsufficientBalance { .. }
                | VaultError::WouldBreachMinimumVhr { .. } => ErrorCategory::LimitExceeded,
                VaultError::AmountOverflow(_) => ErrorCategory::MalformedInput,
                VaultError::Address(_) => ErrorCategory::Fatal,
            },

            Self::Supply(err) => match err {
                SupplyError::CapExceeded { .. } | SupplyError::InsufficientBalance { .. } => {
                    ErrorCategory::LimitExceeded
                }
                SupplyError::AmountOverflow => ErrorCategory::MalformedInput,
                SupplyError::Address(_) => ErrorCategory::Fatal,
            },

            Self::Address(_) => ErrorCategory::Fatal,
        }
    }

    /// Whether the deployment is unusable after this error. Everything
    /// except address-space exhaustion is recoverable by a corrected call.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }
}
