use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::error::{Result, VaultError};

/// Per-account savings records shared by both vault kinds.
///
/// Entries come into existence at first credit (default zero) and are never
/// removed; a zero balance is the resting state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Records(BTreeMap<Address, U256>);

impl Records {
    fn get(&self, account: Address) -> U256 {
        self.0.get(&account).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: Address, amount: U256) -> Result<()> {
        let credited = self
            .get(account)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.0.insert(account, credited);
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<()> {
        let available = self.get(account);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                account,
                available,
                required: amount,
            });
        }
        self.0.insert(account, available - amount);
        Ok(())
    }

    fn total(&self) -> U256 {
        self.0
            .values()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(*v))
    }
}

/// Savings vault custodying issuer tokens.
///
/// Bound to exactly one issuer address at construction, fixed for the vault's
/// lifetime; the deploying caller is recorded as owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenVaultState {
    token: Address,
    owner: Address,
    records: Records,
}

impl TokenVaultState {
    pub fn new(token: Address, owner: Address) -> Self {
        Self {
            token,
            owner,
            records: Records::default(),
        }
    }

    /// Address of the issuer this vault is bound to.
    pub fn token(&self) -> Address {
        self.token
    }

    /// The account that deployed the vault.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Recorded savings of `account`. Readable by anyone.
    pub fn record(&self, account: Address) -> U256 {
        self.records.get(account)
    }

    pub fn credit(&mut self, account: Address, amount: U256) -> Result<()> {
        self.records.credit(account, amount)
    }

    pub fn debit(&mut self, account: Address, amount: U256) -> Result<()> {
        self.records.debit(account, amount)
    }

    /// Sum of all records; never exceeds the vault's custodied token balance.
    pub fn total_saved(&self) -> U256 {
        self.records.total()
    }
}

/// Savings vault custodying the chain's native coin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeVaultState {
    owner: Address,
    records: Records,
}

impl NativeVaultState {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            records: Records::default(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn record(&self, account: Address) -> U256 {
        self.records.get(account)
    }

    pub fn credit(&mut self, account: Address, amount: U256) -> Result<()> {
        self.records.credit(account, amount)
    }

    pub fn debit(&mut self, account: Address, amount: U256) -> Result<()> {
        self.records.debit(account, amount)
    }

    pub fn total_saved(&self) -> U256 {
        self.records.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn record_defaults_to_zero() {
        let vault = TokenVaultState::new(addr(9), addr(1));
        assert_eq!(vault.record(addr(2)), U256::ZERO);
    }

    #[test]
    fn credit_then_debit_round_trips() {
        let mut vault = TokenVaultState::new(addr(9), addr(1));
        vault.credit(addr(2), U256::from(5)).unwrap();
        vault.debit(addr(2), U256::from(5)).unwrap();
        assert_eq!(vault.record(addr(2)), U256::ZERO);
    }

    #[test]
    fn debit_beyond_record_fails() {
        let mut vault = NativeVaultState::new(addr(1));
        vault.credit(addr(2), U256::from(3)).unwrap();
        let err = vault.debit(addr(2), U256::from(4)).unwrap_err();
        assert!(matches!(
            err,
            VaultError::InsufficientBalance { available, required, .. }
                if available == U256::from(3) && required == U256::from(4)
        ));
        assert_eq!(vault.record(addr(2)), U256::from(3));
    }

    #[test]
    fn construction_fixes_token_and_owner() {
        let vault = TokenVaultState::new(addr(9), addr(1));
        assert_eq!(vault.token(), addr(9));
        assert_eq!(vault.owner(), addr(1));
    }

    #[test]
    fn total_saved_sums_all_records() {
        let mut vault = NativeVaultState::new(addr(1));
        vault.credit(addr(2), U256::from(3)).unwrap();
        vault.credit(addr(3), U256::from(4)).unwrap();
        assert_eq!(vault.total_saved(), U256::from(7));
    }
}
