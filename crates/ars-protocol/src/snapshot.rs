//! Protocol state snapshots.
//!
//! After every successful mutating entry point the umbrella assembles a
//! [`ProtocolSnapshot`] and hands it to the configured [`SnapshotSink`].
//! The snapshot is a summary, not a full state dump: enough for a host to
//! drive dashboards and alerting without re-deriving component internals.

use ars_core::state::GlobalState;
use ars_core::types::Amount;
use serde::{Deserialize, Serialize};

/// Point-in-time summary of the whole protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolSnapshot {
    /// Host time at which the snapshot was assembled.
    pub emitted_at: i64,

    pub global: GlobalState,

    /// Registry.
    pub agent_count: usize,
    pub total_staked: u128,

    /// Oracle.
    pub current_ili: u64,
    pub last_consensus_ts: i64,
    pub pending_submissions: usize,

    /// Governance.
    pub proposal_count: u64,

    /// Reserve.
    pub vhr_bps: u64,
    pub total_asset_value_usd: u128,
    pub liability_usd: u128,

    /// Supply.
    pub total_supply: Amount,
    pub epoch_index: u64,
    pub epoch_minted: Amount,
    pub epoch_burned: Amount,
}

/// Receives snapshots after successful mutations.
pub trait SnapshotSink {
    fn publish(&mut self, snapshot: &ProtocolSnapshot);
}

/// Default sink: one structured log line per snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl SnapshotSink for TracingSink {
    fn publish(&mut self, snapshot: &ProtocolSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => tracing::info!(target: "ars::snapshot", %json, "protocol snapshot"),
            Err(err) => tracing::warn!(target: "ars::snapshot", error = %err, "snapshot serialization failed"),
        }
    }
}

/// Sink that drops every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn publish(&mut self, _snapshot: &ProtocolSnapshot) {}
}
