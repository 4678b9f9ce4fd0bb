use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::error::{Result, VaultError};

/// Balance ledger of the fungible asset issuer.
///
/// Holds per-owner balances and the (owner, spender) allowance table. Every
/// mutation is checked; the chain decides which events to record and supplies
/// the all-or-nothing call semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenState {
    total_supply: U256,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
}

impl TokenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new units and credit them to `to`.
    pub fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to, credited);
        Ok(())
    }

    /// Grant `spender` the right to move up to `amount` of `owner`'s units.
    /// A later grant overwrites the earlier one; zero revokes.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                account: from,
                available,
                required: amount,
            });
        }
        self.balances.insert(from, available - amount);
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.balances.insert(to, credited);
        Ok(())
    }

    /// Move `amount` from `owner` to `to` on behalf of `spender`, consuming
    /// that much of the standing allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        let granted = self.allowance(owner, spender);
        if granted < amount {
            return Err(VaultError::InsufficientAllowance {
                owner,
                spender,
                granted,
                required: amount,
            });
        }
        self.transfer(owner, to, amount)?;
        self.allowances.insert((owner, spender), granted - amount);
        Ok(())
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }
}
