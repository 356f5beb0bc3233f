//! # Supply Controller
//!
//! Mints and burns ARU under epoch-bounded caps. Each epoch's mint and
//! burn allowances are a configured number of basis points of the total
//! supply snapshotted at epoch start, so no sequence of calls inside one
//! epoch can move supply faster than the cap.
//!
//! The cap check is identical for a privileged direct call and a
//! governance-triggered execution; who may call is the entry point's
//! concern, not this component's.
//!
//! Epoch counters reset exactly once per boundary crossing: the first
//! mint or burn after the boundary archives the closed epoch into the
//! history ring and starts the new one, even when several epochs elapsed
//! in between.

use ars_core::address::{derive_address, namespace, Component};
use ars_core::error::AddressError;
use ars_core::math::apply_bps;
use ars_core::types::{Address, Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Supply controller errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    #[error("epoch {kind} cap exceeded: requested {requested}, remaining {remaining}")]
    CapExceeded {
        kind: CapKind,
        requested: Amount,
        remaining: Amount,
    },

    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Amount,
        available: Amount,
    },

    #[error("total supply overflows")]
    AmountOverflow,

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Which epoch cap an operation ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapKind {
    Mint,
    Burn,
}

impl std::fmt::Display for CapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapKind::Mint => write!(f, "mint"),
            CapKind::Burn => write!(f, "burn"),
        }
    }
}

/// Archived counters for one closed epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch_index: u64,

    /// Derived address (`epoch` namespace, keyed by index).
    pub address: Address,

    pub started_at: i64,
    pub supply_at_start: Amount,
    pub minted: Amount,
    pub burned: Amount,
}

/// Supply state for the ARU token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupplyController {
    address: Address,

    total_supply: Amount,
    epoch_minted: Amount,
    epoch_burned: Amount,

    epoch_index: u64,
    epoch_start: i64,
    epoch_duration_secs: u64,

    mint_cap_bps: u32,
    burn_cap_bps: u32,

    /// Supply snapshot the caps are measured against.
    supply_at_epoch_start: Amount,

    balances: BTreeMap<Identity, Amount>,

    history: VecDeque<EpochRecord>,
    history_depth: usize,
}

impl SupplyController {
    pub fn new(
        initial_supply: Amount,
        treasury: Identity,
        epoch_duration_secs: u64,
        mint_cap_bps: u32,
        burn_cap_bps: u32,
        history_depth: usize,
        genesis_ts: i64,
    ) -> Result<Self, SupplyError> {
        let derived = derive_address(Component::Token, namespace::SUPPLY_STATE, &[])?;

        let mut balances = BTreeMap::new();
        if initial_supply > 0 {
            balances.insert(treasury, initial_supply);
        }

        Ok(Self {
            address: derived.address,
            total_supply: initial_supply,
            epoch_minted: 0,
            epoch_burned: 0,
            epoch_index: 0,
            epoch_start: genesis_ts,
            epoch_duration_secs,
            mint_cap_bps,
            burn_cap_bps,
            supply_at_epoch_start: initial_supply,
            balances,
            history: VecDeque::new(),
            history_depth,
        })
    }

    /// Mint to `destination`, subject to the epoch cap.
    pub fn mint(
        &mut self,
        destination: Identity,
        amount: Amount,
        now: i64,
    ) -> Result<Amount, SupplyError> {
        self.roll_epoch(now)?;

        let cap = apply_bps(self.supply_at_epoch_start, self.mint_cap_bps);
        let remaining = cap.saturating_sub(self.epoch_minted);
        if amount > remaining {
            return Err(SupplyError::CapExceeded {
                kind: CapKind::Mint,
                requested: amount,
                remaining,
            });
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(SupplyError::AmountOverflow)?;

        self.total_supply = new_supply;
        self.epoch_minted += amount;
        *self.balances.entry(destination).or_insert(0) += amount;

        tracing::info!(
            destination = %destination,
            amount,
            total_supply = self.total_supply,
            epoch_minted = self.epoch_minted,
            "supply minted"
        );
        Ok(self.total_supply)
    }

    /// Burn from `source`, subject to the epoch cap.
    pub fn burn(
        &mut self,
        source: Identity,
        amount: Amount,
        now: i64,
    ) -> Result<Amount, SupplyError> {
        self.roll_epoch(now)?;

        let cap = apply_bps(self.supply_at_epoch_start, self.burn_cap_bps);
        let remaining = cap.saturating_sub(self.epoch_burned);
        if amount > remaining {
            return Err(SupplyError::CapExceeded {
                kind: CapKind::Burn,
                requested: amount,
                remaining,
            });
        }

        let available = self.balances.get(&source).copied().unwrap_or(0);
        if amount > available {
            return Err(SupplyError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        self.total_supply -= amount;
        self.epoch_burned += amount;
        if available == amount {
            self.balances.remove(&source);
        } else {
            self.balances.insert(source, available - amount);
        }

        tracing::info!(
            source = %source,
            amount,
            total_supply = self.total_supply,
            epoch_burned = self.epoch_burned,
            "supply burned"
        );
        Ok(self.total_supply)
    }

    /// Reset epoch counters if `now` has crossed the epoch boundary. Runs
    /// at most one reset per call no matter how many epochs elapsed.
    fn roll_epoch(&mut self, now: i64) -> Result<(), SupplyError> {
        let duration = self.epoch_duration_secs as i64;
        if duration <= 0 || now < self.epoch_start + duration {
            return Ok(());
        }

        let derived = derive_address(
            Component::Token,
            namespace::EPOCH,
            &[&self.epoch_index.to_le_bytes()],
        )?;
        let closed = EpochRecord {
            epoch_index: self.epoch_index,
            address: derived.address,
            started_at: self.epoch_start,
            supply_at_start: self.supply_at_epoch_start,
            minted: self.epoch_minted,
            burned: self.epoch_burned,
        };
        if self.history.len() == self.history_depth {
            self.history.pop_front();
        }
        self.history.push_back(closed);

        // Skip to the epoch containing `now` in one step.
        let elapsed_epochs = (now - self.epoch_start) / duration;
        self.epoch_index += elapsed_epochs as u64;
        self.epoch_start += elapsed_epochs * duration;
        self.epoch_minted = 0;
        self.epoch_burned = 0;
        self.supply_at_epoch_start = self.total_supply;

        tracing::debug!(
            epoch = self.epoch_index,
            epoch_start = self.epoch_start,
            supply = self.supply_at_epoch_start,
            "epoch rolled"
        );
        Ok(())
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn epoch_minted(&self) -> Amount {
        self.epoch_minted
    }

    pub fn epoch_burned(&self) -> Amount {
        self.epoch_burned
    }

    pub fn epoch_index(&self) -> u64 {
        self.epoch_index
    }

    pub fn epoch_start(&self) -> i64 {
        self.epoch_start
    }

    pub fn balance_of(&self, identity: &Identity) -> Amount {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    pub fn history(&self) -> impl Iterator<Item = &EpochRecord> {
        self.history.iter()
    }

    pub fn mint_cap_bps(&self) -> u32 {
        self.mint_cap_bps
    }

    pub fn burn_cap_bps(&self) -> u32 {
        self.burn_cap_bps
    }

    pub fn set_mint_cap_bps(&mut self, bps: u32) {
        self.mint_cap_bps = bps;
    }

    pub fn set_burn_cap_bps(&mut self, bps: u32) {
        self.burn_cap_bps = bps;
    }

    pub fn set_epoch_duration_secs(&mut self, secs: u64) {
        self.epoch_duration_secs = secs;
    }

    pub fn epoch_duration_secs(&self) -> u64 {
        self.epoch_duration_secs
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ars_core::constants::ONE_ARU;

    fn identity(byte: u8) -> Identity {
        Identity::from_public_key(&[byte; 32])
    }

    fn controller() -> SupplyController {
        // 1,000,000 ARU supply, 24h epochs, 2% caps.
        SupplyController::new(
            1_000_000 * ONE_ARU,
            identity(1),
            86_400,
            200,
            200,
            8,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_mint_within_cap() {
        let mut c = controller();

        // 2% of 1,000,000 ARU = 20,000 ARU.
        c.mint(identity(2), 20_000 * ONE_ARU, 100).unwrap();
        assert_eq!(c.total_supply(), 1_020_000 * ONE_ARU);
        assert_eq!(c.epoch_minted(), 20_000 * ONE_ARU);
        assert_eq!(c.balance_of(&identity(2)), 20_000 * ONE_ARU);
    }

    #[test]
    fn test_mint_cap_exceeded() {
        let mut c = controller();

        c.mint(identity(2), 15_000 * ONE_ARU, 100).unwrap();
        let err = c.mint(identity(2), 5_001 * ONE_ARU, 200).unwrap_err();
        assert_eq!(
            err,
            SupplyError::CapExceeded {
                kind: CapKind::Mint,
                requested: 5_001 * ONE_ARU,
                remaining: 5_000 * ONE_ARU,
            }
        );
        // Failure leaves the counters untouched.
        assert_eq!(c.epoch_minted(), 15_000 * ONE_ARU);
    }

    #[test]
    fn test_burn_checks_balance_and_cap() {
        let mut c = controller();

        c.burn(identity(1), 20_000 * ONE_ARU, 100).unwrap();
        assert_eq!(c.total_supply(), 980_000 * ONE_ARU);
        assert_eq!(c.epoch_burned(), 20_000 * ONE_ARU);

        let err = c.burn(identity(1), ONE_ARU, 200).unwrap_err();
        assert!(matches!(
            err,
            SupplyError::CapExceeded {
                kind: CapKind::Burn,
                ..
            }
        ));

        let mut c = controller();
        let err = c.burn(identity(9), ONE_ARU, 100).unwrap_err();
        assert!(matches!(err, SupplyError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_epoch_rolls_once_and_resets_counters() {
        let mut c = controller();

        c.mint(identity(2), 20_000 * ONE_ARU, 100).unwrap();
        // Cap consumed for this epoch.
        assert!(c.mint(identity(2), ONE_ARU, 200).is_err());

        // First call after the boundary resets counters against the new
        // supply snapshot: 2% of 1,020,000 ARU = 20,400 ARU.
        c.mint(identity(2), 20_400 * ONE_ARU, 86_400).unwrap();
        assert_eq!(c.epoch_index(), 1);
        assert_eq!(c.epoch_minted(), 20_400 * ONE_ARU);

        let records: Vec<_> = c.history().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].epoch_index, 0);
        assert_eq!(records[0].minted, 20_000 * ONE_ARU);
        assert_eq!(records[0].supply_at_start, 1_000_000 * ONE_ARU);
    }

    #[test]
    fn test_multiple_elapsed_epochs_roll_in_one_step() {
        let mut c = controller();

        c.mint(identity(2), 100 * ONE_ARU, 100).unwrap();
        // Three epochs later: one reset, epoch index skips to 3.
        c.mint(identity(2), 100 * ONE_ARU, 3 * 86_400 + 5).unwrap();

        assert_eq!(c.epoch_index(), 3);
        assert_eq!(c.epoch_start(), 3 * 86_400);
        assert_eq!(c.epoch_minted(), 100 * ONE_ARU);
        // Exactly one archived record despite three crossed boundaries.
        assert_eq!(c.history().count(), 1);
    }

    #[test]
    fn test_history_ring_is_bounded() {
        let mut c = controller();
        for epoch in 1..=20i64 {
            c.mint(identity(2), ONE_ARU, epoch * 86_400).unwrap();
        }
        assert_eq!(c.history().count(), 8);
    }
}
