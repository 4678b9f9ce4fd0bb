use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, VaultError};
use crate::token::TokenState;
use crate::vaults::{NativeVaultState, TokenVaultState};

const CREATE_TAG: &[u8] = b"vb/create";

/// Decimal places of the chain's native coin.
pub const NATIVE_DECIMALS: u32 = 18;

/// `n` whole native coins, in base units.
pub fn native(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(NATIVE_DECIMALS))
}

/// A state-mutating call routed through the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub caller: Address,
    pub target: Address,
    /// Native value carried by the call; moved caller → target before dispatch.
    pub value: U256,
    pub op: Op,
}

impl Call {
    pub fn new(caller: Address, target: Address, op: Op) -> Self {
        Self {
            caller,
            target,
            value: U256::ZERO,
            op,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Operations understood by the deployed contracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Issuer: grant `spender` the right to move up to `amount` of the
    /// caller's units.
    Approve { spender: Address, amount: U256 },
    /// Issuer: move `amount` of the caller's units to `to`.
    Transfer { to: Address, amount: U256 },
    /// Issuer: move `amount` from `owner` to `to`, spending the caller's
    /// allowance.
    TransferFrom {
        owner: Address,
        to: Address,
        amount: U256,
    },
    /// Token vault: pull `amount` from the caller's issuer balance into
    /// custody. Requires a standing allowance for the vault.
    Deposit { amount: U256 },
    /// Token vault: return `amount` from custody to the caller.
    Withdraw { amount: U256 },
    /// Native vault: record the call's attached value. The only payable op.
    SaveNative,
    /// Native vault: return `amount` of native coin from custody.
    WithdrawNative { amount: U256 },
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Approve { .. } => "approve",
            Op::Transfer { .. } => "transfer",
            Op::TransferFrom { .. } => "transfer_from",
            Op::Deposit { .. } => "deposit",
            Op::Withdraw { .. } => "withdraw",
            Op::SaveNative => "save_native",
            Op::WithdrawNative { .. } => "withdraw_native",
        }
    }

    fn payable(&self) -> bool {
        matches!(self, Op::SaveNative)
    }
}

/// Events appended to the world log by successful transactions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Transfer {
        from: Address,
        to: Address,
        amount: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: U256,
    },
    SavingSuccessful {
        account: Address,
        amount: U256,
    },
    WithdrawSuccessful {
        account: Address,
        amount: U256,
    },
}

/// An event plus where and when it was emitted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub height: u64,
    pub contract: Address,
    pub event: Event,
}

/// One deployed contract's state.
#[derive(Clone, Debug)]
pub enum ContractState {
    Token(TokenState),
    TokenVault(TokenVaultState),
    NativeVault(NativeVaultState),
}

type Contracts = BTreeMap<Address, ContractState>;

#[derive(Clone, Debug, Default)]
struct WorldState {
    height: u64,
    native: BTreeMap<Address, U256>,
    contracts: Contracts,
    create_nonces: BTreeMap<Address, u64>,
    events: Vec<EventRecord>,
}

impl WorldState {
    fn native_of(&self, address: Address) -> U256 {
        self.native.get(&address).copied().unwrap_or_default()
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.native_of(from);
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                account: from,
                available,
                required: amount,
            });
        }
        self.native.insert(from, available - amount);
        let credited = self
            .native_of(to)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.native.insert(to, credited);
        Ok(())
    }

    fn token_mut(contracts: &mut Contracts, address: Address) -> Result<&mut TokenState> {
        match contracts.get_mut(&address) {
            Some(ContractState::Token(token)) => Ok(token),
            Some(_) => Err(VaultError::ContractKind {
                address,
                expected: "token",
            }),
            None => Err(VaultError::UnknownContract { address }),
        }
    }

    fn token_vault_ref(contracts: &Contracts, address: Address) -> Result<&TokenVaultState> {
        match contracts.get(&address) {
            Some(ContractState::TokenVault(vault)) => Ok(vault),
            Some(_) => Err(VaultError::ContractKind {
                address,
                expected: "token vault",
            }),
            None => Err(VaultError::UnknownContract { address }),
        }
    }

    fn token_vault_mut(contracts: &mut Contracts, address: Address) -> Result<&mut TokenVaultState> {
        match contracts.get_mut(&address) {
            Some(ContractState::TokenVault(vault)) => Ok(vault),
            Some(_) => Err(VaultError::ContractKind {
                address,
                expected: "token vault",
            }),
            None => Err(VaultError::UnknownContract { address }),
        }
    }

    fn native_vault_mut(
        contracts: &mut Contracts,
        address: Address,
    ) -> Result<&mut NativeVaultState> {
        match contracts.get_mut(&address) {
            Some(ContractState::NativeVault(vault)) => Ok(vault),
            Some(_) => Err(VaultError::ContractKind {
                address,
                expected: "native vault",
            }),
            None => Err(VaultError::UnknownContract { address }),
        }
    }

    /// Apply a single call. May leave partial state behind on error; the
    /// caller restores the pre-call snapshot in that case.
    fn apply(&mut self, call: &Call) -> Result<()> {
        if !call.value.is_zero() && !call.op.payable() {
            return Err(VaultError::NonPayable {
                op: call.op.name(),
            });
        }
        self.move_native(call.caller, call.target, call.value)?;

        // The height this transaction will land at on success.
        let at = self.height + 1;
        match call.op {
            Op::Approve { spender, amount } => {
                let token = Self::token_mut(&mut self.contracts, call.target)?;
                token.approve(call.caller, spender, amount);
                self.events.push(EventRecord {
                    height: at,
                    contract: call.target,
                    event: Event::Approval {
                        owner: call.caller,
                        spender,
                        amount,
                    },
                });
            }
            Op::Transfer { to, amount } => {
                let token = Self::token_mut(&mut self.contracts, call.target)?;
                token.transfer(call.caller, to, amount)?;
                self.events.push(EventRecord {
                    height: at,
                    contract: call.target,
                    event: Event::Transfer {
                        from: call.caller,
                        to,
                        amount,
                    },
                });
            }
            Op::TransferFrom { owner, to, amount } => {
                let token = Self::token_mut(&mut self.contracts, call.target)?;
                token.transfer_from(call.caller, owner, to, amount)?;
                self.events.push(EventRecord {
                    height: at,
                    contract: call.target,
                    event: Event::Transfer {
                        from: owner,
                        to,
                        amount,
                    },
                });
            }
            Op::Deposit { amount } => {
                if amount.is_zero() {
                    return Err(VaultError::InvalidAmount);
                }
                let token_address =
                    Self::token_vault_ref(&self.contracts, call.target)?.token();
                // The issuer's transfer-on-behalf is the source of truth for
                // allowance and balance failures.
                let token = Self::token_mut(&mut self.contracts, token_address)?;
                token.transfer_from(call.target, call.caller, call.target, amount)?;
                self.events.push(EventRecord {
                    height: at,
                    contract: token_address,
                    event: Event::Transfer {
                        from: call.caller,
                        to: call.target,
                        amount,
                    },
                });
                let vault = Self::token_vault_mut(&mut self.contracts, call.target)?;
                vault.credit(call.caller, amount)?;
                self.events.push(EventRecord {
                    height: at,
                    contract: call.target,
                    event: Event::SavingSuccessful {
                        account: call.caller,
                        amount,
                    },
                });
            }
            Op::Withdraw { amount } => {
                if amount.is_zero() {
                    return Err(VaultError::InvalidAmount);
                }
                let token_address =
                    Self::token_vault_ref(&self.contracts, call.target)?.token();
                let vault = Self::token_vault_mut(&mut self.contracts, call.target)?;
                vault.debit(call.caller, amount)?;
                let token = Self::token_mut(&mut self.contracts, token_address)?;
                token.transfer(call.target, call.caller, amount)?;
                self.events.push(EventRecord {
                    height: at,
                    contract: token_address,
                    event: Event::Transfer {
                        from: call.target,
                        to: call.caller,
                        amount,
                    },
                });
                self.events.push(EventRecord {
                    height: at,
                    contract: call.target,
                    event: Event::WithdrawSuccessful {
                        account: call.caller,
                        amount,
                    },
                });
            }
            Op::SaveNative => {
                if call.value.is_zero() {
                    return Err(VaultError::InvalidAmount);
                }
                let vault = Self::native_vault_mut(&mut self.contracts, call.target)?;
                // The attached value is the amount; no event contract exists
                // for the native vault.
                vault.credit(call.caller, call.value)?;
            }
            Op::WithdrawNative { amount } => {
                if amount.is_zero() {
                    return Err(VaultError::InvalidAmount);
                }
                let vault = Self::native_vault_mut(&mut self.contracts, call.target)?;
                vault.debit(call.caller, amount)?;
                self.move_native(call.target, call.caller, amount)?;
            }
        }
        Ok(())
    }
}

/// In-process chain: world state plus the transactional execution surface the
/// contracts run under. Calls are serialized and globally ordered; every
/// mutating transaction either applies fully or not at all.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    world: WorldState,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the last applied transaction.
    pub fn height(&self) -> u64 {
        self.world.height
    }

    /// The full event log, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.world.events
    }

    /// Events emitted by one contract.
    pub fn events_for(&self, contract: Address) -> impl Iterator<Item = &EventRecord> {
        self.world
            .events
            .iter()
            .filter(move |record| record.contract == contract)
    }

    /// Credit native funds to an address out of thin air. Genesis faucet;
    /// not reachable from contract code.
    pub fn fund(&mut self, address: Address, amount: U256) -> Result<()> {
        let credited = self
            .world
            .native_of(address)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        self.world.native.insert(address, credited);
        Ok(())
    }

    pub fn native_balance(&self, address: Address) -> U256 {
        self.world.native_of(address)
    }

    /// Deploy the fungible issuer, minting `initial_supply` to the deployer.
    pub fn deploy_token(&mut self, deployer: Address, initial_supply: U256) -> Result<Address> {
        let mut token = TokenState::new();
        token.mint(deployer, initial_supply)?;
        let address = self.next_address(deployer);
        self.world
            .contracts
            .insert(address, ContractState::Token(token));
        self.world.height += 1;
        if !initial_supply.is_zero() {
            self.world.events.push(EventRecord {
                height: self.world.height,
                contract: address,
                event: Event::Transfer {
                    from: Address::ZERO,
                    to: deployer,
                    amount: initial_supply,
                },
            });
        }
        Ok(address)
    }

    /// Deploy a token vault bound to an existing issuer.
    pub fn deploy_token_vault(&mut self, deployer: Address, token: Address) -> Result<Address> {
        match self.world.contracts.get(&token) {
            Some(ContractState::Token(_)) => {}
            Some(_) => {
                return Err(VaultError::ContractKind {
                    address: token,
                    expected: "token",
                })
            }
            None => return Err(VaultError::UnknownContract { address: token }),
        }
        let address = self.next_address(deployer);
        self.world.contracts.insert(
            address,
            ContractState::TokenVault(TokenVaultState::new(token, deployer)),
        );
        self.world.height += 1;
        Ok(address)
    }

    /// Deploy a native-coin vault.
    pub fn deploy_native_vault(&mut self, deployer: Address) -> Result<Address> {
        let address = self.next_address(deployer);
        self.world.contracts.insert(
            address,
            ContractState::NativeVault(NativeVaultState::new(deployer)),
        );
        self.world.height += 1;
        Ok(address)
    }

    /// Execute a mutating call with all-or-nothing semantics: on error the
    /// world is restored to its pre-call state, height included.
    pub fn execute(&mut self, call: Call) -> Result<()> {
        let checkpoint = self.world.clone();
        match self.world.apply(&call) {
            Ok(()) => {
                self.world.height += 1;
                Ok(())
            }
            Err(err) => {
                self.world = checkpoint;
                Err(err)
            }
        }
    }

    // -- public reads; no access control ---------------------------------

    pub fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self.token_ref(token)?.balance_of(owner))
    }

    pub fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.token_ref(token)?.allowance(owner, spender))
    }

    pub fn token_total_supply(&self, token: Address) -> Result<U256> {
        Ok(self.token_ref(token)?.total_supply())
    }

    /// Recorded token savings of `account` in `vault`.
    pub fn saved_token_balance(&self, vault: Address, account: Address) -> Result<U256> {
        Ok(WorldState::token_vault_ref(&self.world.contracts, vault)?.record(account))
    }

    /// The issuer address a token vault was bound to at construction.
    pub fn vault_token(&self, vault: Address) -> Result<Address> {
        Ok(WorldState::token_vault_ref(&self.world.contracts, vault)?.token())
    }

    /// The deploying account of either vault kind.
    pub fn vault_owner(&self, vault: Address) -> Result<Address> {
        match self.world.contracts.get(&vault) {
            Some(ContractState::TokenVault(v)) => Ok(v.owner()),
            Some(ContractState::NativeVault(v)) => Ok(v.owner()),
            Some(_) => Err(VaultError::ContractKind {
                address: vault,
                expected: "vault",
            }),
            None => Err(VaultError::UnknownContract { address: vault }),
        }
    }

    /// Recorded native savings of `account` in `vault`.
    pub fn saved_native_balance(&self, vault: Address, account: Address) -> Result<U256> {
        match self.world.contracts.get(&vault) {
            Some(ContractState::NativeVault(v)) => Ok(v.record(account)),
            Some(_) => Err(VaultError::ContractKind {
                address: vault,
                expected: "native vault",
            }),
            None => Err(VaultError::UnknownContract { address: vault }),
        }
    }

    fn token_ref(&self, address: Address) -> Result<&TokenState> {
        match self.world.contracts.get(&address) {
            Some(ContractState::Token(token)) => Ok(token),
            Some(_) => Err(VaultError::ContractKind {
                address,
                expected: "token",
            }),
            None => Err(VaultError::UnknownContract { address }),
        }
    }

    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.world.create_nonces.entry(deployer).or_default();
        let address = contract_address(deployer, *nonce);
        *nonce += 1;
        address
    }
}

/// Deterministic contract address: the first 20 bytes of a domain-tagged
/// SHA-256 over (deployer, deploy nonce).
fn contract_address(deployer: Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(CREATE_TAG);
    hasher.update(deployer.as_slice());
    hasher.update(nonce.to_le_bytes());
    let digest = hasher.finalize();
    Address::from_slice(&digest[..20])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    /// Chain with two funded accounts and the full contract trio deployed by
    /// the first one.
    fn deployed() -> (Chain, Address, Address, Address, Address, Address) {
        let mut chain = Chain::new();
        let owner = addr(0x11);
        let other = addr(0x22);
        chain.fund(owner, native(100)).unwrap();
        chain.fund(other, native(100)).unwrap();
        let token = chain.deploy_token(owner, U256::from(1_000_000)).unwrap();
        let token_vault = chain.deploy_token_vault(owner, token).unwrap();
        let native_vault = chain.deploy_native_vault(owner).unwrap();
        (chain, owner, other, token, token_vault, native_vault)
    }

    #[test]
    fn fund_credits_native_balance() {
        let mut chain = Chain::new();
        chain.fund(addr(1), native(3)).unwrap();
        assert_eq!(chain.native_balance(addr(1)), native(3));
        assert_eq!(chain.native_balance(addr(2)), U256::ZERO);
    }

    #[test]
    fn contract_addresses_are_deterministic_and_distinct() {
        let owner = addr(0x11);
        let mut chain = Chain::new();
        let a = chain.deploy_token(owner, U256::ZERO).unwrap();
        let b = chain.deploy_native_vault(owner).unwrap();
        assert_ne!(a, b);

        let mut replay = Chain::new();
        let a2 = replay.deploy_token(owner, U256::ZERO).unwrap();
        assert_eq!(a, a2);
    }

    #[test]
    fn deploy_token_mints_supply_to_deployer() {
        let (chain, owner, _, token, ..) = deployed();
        assert_eq!(
            chain.token_balance(token, owner).unwrap(),
            U256::from(1_000_000)
        );
        assert_eq!(
            chain.token_total_supply(token).unwrap(),
            U256::from(1_000_000)
        );
        let minted = chain.events_for(token).next().unwrap();
        assert_eq!(
            minted.event,
            Event::Transfer {
                from: Address::ZERO,
                to: owner,
                amount: U256::from(1_000_000),
            }
        );
    }

    #[test]
    fn token_vault_requires_a_known_issuer() {
        let mut chain = Chain::new();
        let err = chain.deploy_token_vault(addr(1), addr(0xEE)).unwrap_err();
        assert!(matches!(err, VaultError::UnknownContract { .. }));

        let native_vault = chain.deploy_native_vault(addr(1)).unwrap();
        let err = chain.deploy_token_vault(addr(1), native_vault).unwrap_err();
        assert!(matches!(err, VaultError::ContractKind { .. }));
    }

    #[test]
    fn deposit_without_allowance_fails_and_leaves_state_unchanged() {
        let (mut chain, owner, _, token, token_vault, _) = deployed();
        let height = chain.height();
        let events = chain.events().len();

        let err = chain
            .execute(Call::new(
                owner,
                token_vault,
                Op::Deposit {
                    amount: U256::from(1),
                },
            ))
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientAllowance { .. }));
        assert_eq!(chain.saved_token_balance(token_vault, owner).unwrap(), U256::ZERO);
        assert_eq!(
            chain.token_balance(token, owner).unwrap(),
            U256::from(1_000_000)
        );
        assert_eq!(chain.height(), height);
        assert_eq!(chain.events().len(), events);
    }

    #[test]
    fn deposit_pulls_tokens_and_emits() {
        let (mut chain, owner, _, token, token_vault, _) = deployed();
        let amount = U256::from(1);
        chain
            .execute(Call::new(
                owner,
                token,
                Op::Approve {
                    spender: token_vault,
                    amount,
                },
            ))
            .unwrap();
        chain
            .execute(Call::new(owner, token_vault, Op::Deposit { amount }))
            .unwrap();

        assert_eq!(chain.saved_token_balance(token_vault, owner).unwrap(), amount);
        assert_eq!(chain.token_balance(token, token_vault).unwrap(), amount);
        assert_eq!(chain.token_allowance(token, owner, token_vault).unwrap(), U256::ZERO);

        let saved = chain.events_for(token_vault).last().unwrap();
        assert_eq!(
            saved.event,
            Event::SavingSuccessful {
                account: owner,
                amount,
            }
        );
        assert_eq!(saved.height, chain.height());
    }

    #[test]
    fn deposit_then_withdraw_round_trips() {
        let (mut chain, owner, _, token, token_vault, _) = deployed();
        let amount = U256::from(1);
        let initial = chain.token_balance(token, owner).unwrap();

        chain
            .execute(Call::new(
                owner,
                token,
                Op::Approve {
                    spender: token_vault,
                    amount,
                },
            ))
            .unwrap();
        chain
            .execute(Call::new(owner, token_vault, Op::Deposit { amount }))
            .unwrap();
        chain
            .execute(Call::new(owner, token_vault, Op::Withdraw { amount }))
            .unwrap();

        assert_eq!(chain.saved_token_balance(token_vault, owner).unwrap(), U256::ZERO);
        assert_eq!(chain.token_balance(token, owner).unwrap(), initial);
        assert_eq!(chain.token_balance(token, token_vault).unwrap(), U256::ZERO);

        let last = chain.events_for(token_vault).last().unwrap();
        assert_eq!(
            last.event,
            Event::WithdrawSuccessful {
                account: owner,
                amount,
            }
        );
    }

    #[test]
    fn withdraw_beyond_record_fails_and_rolls_back() {
        let (mut chain, owner, _, token, token_vault, _) = deployed();
        chain
            .execute(Call::new(
                owner,
                token,
                Op::Approve {
                    spender: token_vault,
                    amount: U256::from(5),
                },
            ))
            .unwrap();
        chain
            .execute(Call::new(
                owner,
                token_vault,
                Op::Deposit {
                    amount: U256::from(5),
                },
            ))
            .unwrap();
        let height = chain.height();
        let events = chain.events().len();

        let err = chain
            .execute(Call::new(
                owner,
                token_vault,
                Op::Withdraw {
                    amount: U256::from(6),
                },
            ))
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
        assert_eq!(
            chain.saved_token_balance(token_vault, owner).unwrap(),
            U256::from(5)
        );
        assert_eq!(chain.height(), height);
        assert_eq!(chain.events().len(), events);
    }

    #[test]
    fn zero_amounts_are_rejected() {
        let (mut chain, owner, _, _, token_vault, native_vault) = deployed();
        for op in [
            Op::Deposit { amount: U256::ZERO },
            Op::Withdraw { amount: U256::ZERO },
        ] {
            let err = chain.execute(Call::new(owner, token_vault, op)).unwrap_err();
            assert!(matches!(err, VaultError::InvalidAmount));
        }
        let err = chain
            .execute(Call::new(owner, native_vault, Op::SaveNative))
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount));
        let err = chain
            .execute(Call::new(
                owner,
                native_vault,
                Op::WithdrawNative { amount: U256::ZERO },
            ))
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount));
    }

    #[test]
    fn save_native_records_attached_value() {
        let (mut chain, owner, _, _, _, native_vault) = deployed();
        let before = chain.native_balance(owner);
        chain
            .execute(Call::new(owner, native_vault, Op::SaveNative).with_value(native(1)))
            .unwrap();

        assert_eq!(
            chain.saved_native_balance(native_vault, owner).unwrap(),
            native(1)
        );
        assert_eq!(chain.native_balance(native_vault), native(1));
        assert_eq!(chain.native_balance(owner), before - native(1));
    }

    #[test]
    fn withdraw_native_empties_custody() {
        let (mut chain, owner, _, _, _, native_vault) = deployed();
        let before = chain.native_balance(owner);
        chain
            .execute(Call::new(owner, native_vault, Op::SaveNative).with_value(native(1)))
            .unwrap();
        chain
            .execute(Call::new(
                owner,
                native_vault,
                Op::WithdrawNative { amount: native(1) },
            ))
            .unwrap();

        assert_eq!(
            chain.saved_native_balance(native_vault, owner).unwrap(),
            U256::ZERO
        );
        assert_eq!(chain.native_balance(native_vault), U256::ZERO);
        assert_eq!(chain.native_balance(owner), before);
    }

    #[test]
    fn withdraw_native_beyond_record_fails() {
        let (mut chain, owner, other, _, _, native_vault) = deployed();
        chain
            .execute(Call::new(owner, native_vault, Op::SaveNative).with_value(native(2)))
            .unwrap();
        // `other` never saved; custody holds funds but their record is zero.
        let err = chain
            .execute(Call::new(
                other,
                native_vault,
                Op::WithdrawNative { amount: native(1) },
            ))
            .unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
        assert_eq!(chain.native_balance(native_vault), native(2));
    }

    #[test]
    fn value_on_non_payable_op_rolls_back() {
        let (mut chain, owner, _, _, token_vault, _) = deployed();
        let before = chain.native_balance(owner);
        let err = chain
            .execute(
                Call::new(
                    owner,
                    token_vault,
                    Op::Deposit {
                        amount: U256::from(1),
                    },
                )
                .with_value(native(1)),
            )
            .unwrap_err();
        assert!(matches!(err, VaultError::NonPayable { .. }));
        assert_eq!(chain.native_balance(owner), before);
        assert_eq!(chain.native_balance(token_vault), U256::ZERO);
    }

    #[test]
    fn vault_owner_reads_work_for_both_kinds() {
        let (chain, owner, _, _, token_vault, native_vault) = deployed();
        assert_eq!(chain.vault_owner(token_vault).unwrap(), owner);
        assert_eq!(chain.vault_owner(native_vault).unwrap(), owner);
        let err = chain.vault_owner(addr(0xEE)).unwrap_err();
        assert!(matches!(err, VaultError::UnknownContract { .. }));
    }

    #[test]
    fn custody_never_falls_below_recorded_savings() {
        let (mut chain, owner, other, token, token_vault, _) = deployed();
        chain
            .execute(Call::new(
                owner,
                token,
                Op::Transfer {
                    to: other,
                    amount: U256::from(100),
                },
            ))
            .unwrap();
        for (who, deposit, withdraw) in [
            (owner, 40u64, 15u64),
            (other, 60, 60),
            (owner, 5, 0),
        ] {
            chain
                .execute(Call::new(
                    who,
                    token,
                    Op::Approve {
                        spender: token_vault,
                        amount: U256::from(deposit),
                    },
                ))
                .unwrap();
            chain
                .execute(Call::new(
                    who,
                    token_vault,
                    Op::Deposit {
                        amount: U256::from(deposit),
                    },
                ))
                .unwrap();
            if withdraw > 0 {
                chain
                    .execute(Call::new(
                        who,
                        token_vault,
                        Op::Withdraw {
                            amount: U256::from(withdraw),
                        },
                    ))
                    .unwrap();
            }
        }
        let recorded = chain.saved_token_balance(token_vault, owner).unwrap()
            + chain.saved_token_balance(token_vault, other).unwrap();
        assert_eq!(chain.token_balance(token, token_vault).unwrap(), recorded);
    }
}
