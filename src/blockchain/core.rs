// core.rs splits ledger responsibilities into submodules: the chain itself,
// canonical hashing and chain verification.
pub mod chain;
pub mod hashing;
pub mod validation;

pub use chain::*;
pub use hashing::*;
pub use validation::*;
