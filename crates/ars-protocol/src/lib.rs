//! # ARS Protocol
//!
//! The assembled economic core: agent registry, ILI oracle, quadratic
//! governance, reserve vault, and epoch-capped supply behind one set of
//! authorized entry points.
//!
//! Everything is deterministic and host-driven: no clocks, no threads, no
//! I/O. Callers supply every timestamp; two deployments fed the same call
//! sequence hold byte-identical state.
//!
//! ```
//! use ars_core::config::ProtocolConfig;
//! use ars_core::constants::ONE_ARU;
//! use ars_core::types::Identity;
//! use ars_protocol::Protocol;
//!
//! let authority = Identity::from_public_key(b"authority");
//! let treasury = Identity::from_public_key(b"treasury");
//! let mut protocol = Protocol::new(
//!     &ProtocolConfig::default(),
//!     authority,
//!     treasury,
//!     1_000_000 * ONE_ARU,
//!     0,
//! )
//! .unwrap();
//!
//! let agent = Identity::from_public_key(b"agent-1");
//! protocol.register_agent(agent, 5_000 * ONE_ARU, 10).unwrap();
//! ```

mod error;
mod protocol;
mod snapshot;

pub use error::{ErrorCategory, ProtocolError};
pub use protocol::Protocol;
pub use snapshot::{NullSink, ProtocolSnapshot, SnapshotSink, TracingSink};

pub use ars_core::config::ProtocolConfig;
pub use ars_governance::{PolicyType, ProposalStatus};
pub use ars_oracle::ConsensusOutcome;
pub use ars_reserve::RebalanceSignal;
