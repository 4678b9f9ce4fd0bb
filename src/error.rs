use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Canonical error type exposed by the bench.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("unknown contract {address}")]
    UnknownContract { address: Address },

    #[error("contract {address} is not a {expected}")]
    ContractKind {
        address: Address,
        expected: &'static str,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient balance in {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: U256,
        required: U256,
    },

    #[error("insufficient allowance from {owner} to {spender}: granted {granted}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        granted: U256,
        required: U256,
    },

    #[error("insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Address,
        available: U256,
        required: U256,
    },

    #[error("{op} does not accept value")]
    NonPayable { op: &'static str },

    #[error("balance arithmetic overflow")]
    Overflow,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid genesis: {0}")]
    Genesis(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VaultError>;
