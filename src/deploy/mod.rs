use std::collections::BTreeSet;
use std::path::Path;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::account::AccountKey;
use crate::chain::{native, Chain};
use crate::error::{Result, VaultError};

/// Initial world configuration applied before the contracts are deployed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genesis {
    /// Accounts funded with native coin. The first entry deploys the
    /// contracts and receives the initial token supply.
    pub accounts: Vec<GenesisAccount>,
    /// Token supply minted to the deployer when the issuer is constructed,
    /// in base units.
    pub token_supply: U256,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisAccount {
    pub address: Address,
    pub funding: U256,
}

impl Genesis {
    /// Read a genesis description from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The account that deploys the contracts.
    pub fn deployer(&self) -> Result<Address> {
        self.accounts
            .first()
            .map(|account| account.address)
            .ok_or_else(|| VaultError::Genesis("at least one funded account is required".into()))
    }

    fn validate(&self) -> Result<()> {
        self.deployer()?;
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account.address) {
                return Err(VaultError::Genesis(format!(
                    "duplicate account {}",
                    account.address
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, chain: &mut Chain) -> Result<()> {
        self.validate()?;
        for account in &self.accounts {
            chain.fund(account.address, account.funding)?;
        }
        Ok(())
    }
}

/// Fresh genesis with `count` generated accounts, each funded with `funding`
/// whole coins. The keys are returned so callers can act as those accounts.
pub fn fresh_genesis(count: usize, funding: u64, token_supply: U256) -> (Genesis, Vec<AccountKey>) {
    let keys: Vec<AccountKey> = (0..count).map(|_| AccountKey::generate()).collect();
    let accounts = keys
        .iter()
        .map(|key| GenesisAccount {
            address: key.address(),
            funding: native(funding),
        })
        .collect();
    (
        Genesis {
            accounts,
            token_supply,
        },
        keys,
    )
}

/// Addresses of the three deployed contracts, in deployment order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployedContracts {
    pub token: Address,
    pub token_vault: Address,
    pub native_vault: Address,
}

impl DeployedContracts {
    /// One-line, human-readable deployment report.
    pub fn summary(&self) -> String {
        format!(
            "token deployed at {}... token-vault deployed at {}... native-vault deployed at {}",
            self.token, self.token_vault, self.native_vault
        )
    }
}

/// Apply the genesis and deploy the contract trio in dependency order:
/// issuer first, then the token vault that references it, then the native
/// vault. Any failure aborts the remaining steps.
pub fn deploy_contracts(chain: &mut Chain, genesis: &Genesis) -> Result<DeployedContracts> {
    genesis.apply(chain)?;
    let deployer = genesis.deployer()?;

    let token = chain.deploy_token(deployer, genesis.token_supply)?;
    log::info!("token issuer deployed at {token}");
    let token_vault = chain.deploy_token_vault(deployer, token)?;
    log::info!("token vault deployed at {token_vault}");
    let native_vault = chain.deploy_native_vault(deployer)?;
    log::info!("native vault deployed at {native_vault}");

    Ok(DeployedContracts {
        token,
        token_vault,
        native_vault,
    })
}
