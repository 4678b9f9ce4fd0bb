//! Deployment and verification bench for a trio of savings contracts.
//!
//! The crate models the execution environment the contracts run under and the
//! contracts themselves:
//!
//! * [`chain`] — an in-process, globally-ordered chain simulation: native
//!   balances, deployed contract states, an append-only event log, and
//!   all-or-nothing call execution.
//! * [`token`] — the fungible asset issuer (balances plus owner/spender
//!   allowances).
//! * [`vaults`] — the two savings vaults: one custodies issuer tokens, one
//!   custodies the chain's native coin.
//! * [`deploy`] — genesis configuration and the dependency-ordered
//!   deployment orchestrator.
//! * [`account`] — ed25519 account identities and address derivation.
//!
//! The modules are intentionally small and focused so the CLI and the test
//! suite can drive every public operation without bespoke plumbing.

pub mod account;
pub mod chain;
pub mod deploy;
pub mod token;
pub mod vaults;

mod error;

pub use error::{Result, VaultError};
