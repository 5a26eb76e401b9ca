// Thin re-export module: implementation is in `blockchain/core.rs` so the
// ledger, its hashing and its verification can live in separate files.

pub mod core;
pub use self::core::*;
