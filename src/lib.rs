//! PowLedger - a minimal single-node proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the chain, canonical hashing and verification
//! - [`transaction`] - Transaction types and request validation
//! - [`mempool`] - Pending-transaction pool
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search and verification
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 helpers and node identity
//!
//! ## Node
//! - [`node`] - Lock-guarded shared ledger and background mining
//! - [`api`] - HTTP transport (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Node & Integration
// ============================================================================
pub mod node;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain, ChainSnapshot};
pub use error::{ChainError, Result};
pub use transaction::Transaction;
