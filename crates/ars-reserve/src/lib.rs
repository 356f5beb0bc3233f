//! # Reserve Vault Manager
//!
//! Tracks multi-asset collateral against the published liability and gates
//! every withdrawal on the vault health ratio (VHR): total asset value
//! over liability, expressed in basis points (15000 = 150%) so every
//! implementation computes the identical integer.
//!
//! The VHR is recomputed from current balances and prices on every read;
//! it is never cached across a mutation. `check_rebalance` only reports -
//! the asset movement it implies is executed off-chain.

use ars_core::address::{derive_address, namespace, Component};
use ars_core::config::VaultParams;
use ars_core::error::AddressError;
use ars_core::math::ratio_bps;
use ars_core::types::{Address, Amount, Identity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Vault errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("unknown asset tag: {0}")]
    UnknownAsset(String),

    #[error("insufficient balance in sub-account '{asset}': need {required}, have {available}")]
    InsufficientBalance {
        asset: String,
        required: Amount,
        available: Amount,
    },

    #[error("withdrawal would breach minimum VHR: projected {projected_bps} bps, minimum {min_bps} bps")]
    WouldBreachMinimumVhr { projected_bps: u64, min_bps: u32 },

    #[error("balance overflows in sub-account '{0}'")]
    AmountOverflow(String),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Rebalance signal reported by [`ReserveVault::check_rebalance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceSignal {
    /// VHR above the trigger threshold: excess collateral may be released
    /// to yield strategies.
    ReleaseExcess,

    /// VHR at or below the minimum: a top-up is required.
    TopUp,

    /// VHR inside the healthy band.
    Balanced,
}

/// One per-asset custodial sub-account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetAccount {
    /// Derived address (`asset` namespace, keyed by tag).
    pub address: Address,

    /// Custodial balance in the asset's smallest units.
    pub balance: Amount,

    /// Last observed price in micro-USD per whole unit.
    pub unit_price_usd: u64,
}

impl AssetAccount {
    /// Current USD value of the sub-account, micro-USD.
    fn value_usd(&self) -> u128 {
        self.balance as u128 * self.unit_price_usd as u128
            / ars_core::constants::ONE_ARU as u128
    }
}

/// The reserve vault.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReserveVault {
    /// Vault authority: the only identity allowed to move collateral
    /// directly.
    pub authority: Identity,

    address: Address,
    assets: BTreeMap<String, AssetAccount>,

    /// Published liability in micro-USD.
    liability_usd: u128,

    min_vhr_bps: u32,
    rebalance_trigger_bps: u32,
    last_rebalance_ts: i64,
}

impl ReserveVault {
    pub fn new(authority: Identity, params: &VaultParams) -> Result<Self, VaultError> {
        let derived = derive_address(Component::Reserve, namespace::RESERVE_VAULT, &[])?;

        let mut assets = BTreeMap::new();
        for tag in &params.assets {
            let account = derive_address(Component::Reserve, namespace::ASSET, &[tag.as_bytes()])?;
            assets.insert(
                tag.clone(),
                AssetAccount {
                    address: account.address,
                    balance: 0,
                    unit_price_usd: 0,
                },
            );
        }

        Ok(Self {
            authority,
            address: derived.address,
            assets,
            liability_usd: 0,
            min_vhr_bps: params.min_vhr_bps,
            rebalance_trigger_bps: params.rebalance_trigger_bps,
            last_rebalance_ts: 0,
        })
    }

    /// Credit a sub-account and refresh its observed price.
    pub fn deposit(
        &mut self,
        asset: &str,
        amount: Amount,
        unit_price_usd: u64,
    ) -> Result<u64, VaultError> {
        let account = self
            .assets
            .get_mut(asset)
            .ok_or_else(|| VaultError::UnknownAsset(asset.to_string()))?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| VaultError::AmountOverflow(asset.to_string()))?;
        account.unit_price_usd = unit_price_usd;

        let vhr = self.vhr_bps();
        tracing::info!(asset, amount, unit_price_usd, vhr_bps = vhr, "collateral deposited");
        Ok(vhr)
    }

    /// Debit a sub-account. Rejected outright - never partially executed -
    /// if the projected VHR falls below the minimum.
    pub fn withdraw(&mut self, asset: &str, amount: Amount) -> Result<u64, VaultError> {
        let account = self
            .assets
            .get(asset)
            .ok_or_else(|| VaultError::UnknownAsset(asset.to_string()))?;

        if amount > account.balance {
            return Err(VaultError::InsufficientBalance {
                asset: asset.to_string(),
                required: amount,
                available: account.balance,
            });
        }

        let withdrawn_usd =
            amount as u128 * account.unit_price_usd as u128 / ars_core::constants::ONE_ARU as u128;
        let projected =
            ratio_bps(self.total_asset_value_usd().saturating_sub(withdrawn_usd), self.liability_usd);
        if projected < self.min_vhr_bps as u64 {
            return Err(VaultError::WouldBreachMinimumVhr {
                projected_bps: projected,
                min_bps: self.min_vhr_bps,
            });
        }

        // Checks passed; apply the debit.
        if let Some(account) = self.assets.get_mut(asset) {
            account.balance -= amount;
        }

        let vhr = self.vhr_bps();
        tracing::info!(asset, amount, vhr_bps = vhr, "collateral withdrawn");
        Ok(vhr)
    }

    /// Pure read: where the current VHR sits relative to the configured
    /// thresholds.
    pub fn check_rebalance(&self) -> RebalanceSignal {
        let vhr = self.vhr_bps();
        if vhr > self.rebalance_trigger_bps as u64 {
            RebalanceSignal::ReleaseExcess
        } else if vhr <= self.min_vhr_bps as u64 {
            RebalanceSignal::TopUp
        } else {
            RebalanceSignal::Balanced
        }
    }

    /// Record a governance-triggered rebalance.
    pub fn mark_rebalanced(&mut self, now: i64) {
        self.last_rebalance_ts = now;
        tracing::info!(at = now, "rebalance recorded");
    }

    /// Publish the liability the reserve must stay solvent against.
    pub fn set_liability(&mut self, liability_usd: u128) {
        self.liability_usd = liability_usd;
    }

    /// Total USD value of all sub-accounts, micro-USD.
    pub fn total_asset_value_usd(&self) -> u128 {
        self.assets.values().map(AssetAccount::value_usd).sum()
    }

    /// Vault health ratio in basis points, recomputed on every call. A
    /// zero liability reports `u64::MAX` (unconditionally solvent).
    pub fn vhr_bps(&self) -> u64 {
        ratio_bps(self.total_asset_value_usd(), self.liability_usd)
    }

    pub fn asset(&self, tag: &str) -> Option<&AssetAccount> {
        self.assets.get(tag)
    }

    pub fn liability_usd(&self) -> u128 {
        self.liability_usd
    }

    pub fn min_vhr_bps(&self) -> u32 {
        self.min_vhr_bps
    }

    pub fn set_min_vhr_bps(&mut self, bps: u32) {
        self.min_vhr_bps = bps;
    }

    pub fn rebalance_trigger_bps(&self) -> u32 {
        self.rebalance_trigger_bps
    }

    pub fn set_rebalance_trigger_bps(&mut self, bps: u32) {
        self.rebalance_trigger_bps = bps;
    }

    pub fn last_rebalance_timestamp(&self) -> i64 {
        self.last_rebalance_ts
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ars_core::constants::ONE_ARU;

    const ONE_USD: u64 = 1_000_000;

    fn vault() -> ReserveVault {
        ReserveVault::new(
            Identity::from_public_key(&[7u8; 32]),
            &VaultParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_deposit_updates_vhr() {
        let mut v = vault();
        v.set_liability(1_000 * ONE_USD as u128);

        // 1,500 usdc at $1 -> 150% VHR.
        let vhr = v.deposit("usdc", 1_500 * ONE_ARU, ONE_USD).unwrap();
        assert_eq!(vhr, 15_000);
    }

    #[test]
    fn test_deposit_unknown_asset_rejected() {
        let mut v = vault();
        let err = v.deposit("doge", 100, ONE_USD).unwrap_err();
        assert_eq!(err, VaultError::UnknownAsset("doge".to_string()));
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let mut v = vault();
        v.deposit("usdc", 100 * ONE_ARU, ONE_USD).unwrap();

        let err = v.withdraw("usdc", 101 * ONE_ARU).unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
        // Rejected withdrawals leave the balance untouched.
        assert_eq!(v.asset("usdc").unwrap().balance, 100 * ONE_ARU);
    }

    #[test]
    fn test_withdraw_breaching_minimum_vhr_rejected() {
        let mut v = vault();
        v.set_liability(1_000 * ONE_USD as u128);
        v.deposit("usdc", 1_600 * ONE_ARU, ONE_USD).unwrap();

        // Withdrawing 200 would land at 140%, below the 150% minimum.
        let err = v.withdraw("usdc", 200 * ONE_ARU).unwrap_err();
        assert_eq!(
            err,
            VaultError::WouldBreachMinimumVhr {
                projected_bps: 14_000,
                min_bps: 15_000,
            }
        );
        assert_eq!(v.asset("usdc").unwrap().balance, 1_600 * ONE_ARU);

        // Withdrawing down to exactly the minimum is allowed.
        let vhr = v.withdraw("usdc", 100 * ONE_ARU).unwrap();
        assert_eq!(vhr, 15_000);
    }

    #[test]
    fn test_vhr_spans_multiple_assets() {
        let mut v = vault();
        v.set_liability(2_000 * ONE_USD as u128);
        v.deposit("usdc", 1_000 * ONE_ARU, ONE_USD).unwrap();
        v.deposit("sol", 10 * ONE_ARU, 200 * ONE_USD).unwrap();

        // 1,000 + 2,000 = 3,000 USD against 2,000 -> 150%.
        assert_eq!(v.vhr_bps(), 15_000);
    }

    #[test]
    fn test_vhr_reflects_price_refresh() {
        let mut v = vault();
        v.set_liability(1_000 * ONE_USD as u128);
        v.deposit("sol", 10 * ONE_ARU, 100 * ONE_USD).unwrap();
        assert_eq!(v.vhr_bps(), 10_000);

        // Same balance, new observation: VHR is recomputed, never stale.
        v.deposit("sol", 0, 200 * ONE_USD).unwrap();
        assert_eq!(v.vhr_bps(), 20_000);
    }

    #[test]
    fn test_zero_liability_is_solvent() {
        let v = vault();
        assert_eq!(v.vhr_bps(), u64::MAX);
        assert_eq!(v.check_rebalance(), RebalanceSignal::ReleaseExcess);
    }

    #[test]
    fn test_rebalance_signals() {
        let mut v = vault();
        v.set_liability(1_000 * ONE_USD as u128);

        v.deposit("usdc", 1_550 * ONE_ARU, ONE_USD).unwrap();
        assert_eq!(v.check_rebalance(), RebalanceSignal::Balanced);

        v.deposit("usdc", 100 * ONE_ARU, ONE_USD).unwrap();
        assert_eq!(v.check_rebalance(), RebalanceSignal::ReleaseExcess);

        // Liability growth pushes the vault to the minimum.
        v.set_liability(1_100 * ONE_USD as u128);
        assert_eq!(v.check_rebalance(), RebalanceSignal::TopUp);
    }

    #[test]
    fn test_mark_rebalanced() {
        let mut v = vault();
        v.mark_rebalanced(777);
        assert_eq!(v.last_rebalance_timestamp(), 777);
    }
}
