//! Error types for core derivations.

use thiserror::Error;

/// Errors from deterministic address derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// No valid address exists after exhausting every bump value. This is
    /// the only fatal condition in the protocol; callers cannot retry it
    /// with different inputs and expect a different outcome.
    #[error("address space exhausted for namespace '{namespace}' after {attempts} attempts")]
    AddressSpaceExhausted { namespace: String, attempts: u32 },
}
