//! Proof-of-work search and verification
//!
//! A proof `p` is valid against the previous block's proof `l` when
//! SHA-256 of the decimal text `"{l}{p}"` starts with [`DIFFICULTY`]
//! hex zeros. The search walks the candidates 0, 1, 2, ... and returns
//! the first valid one, so the result for a given `l` is deterministic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::crypto::sha256;
use crate::error::ChainError;

/// Leading hex zeros a proof digest must carry. Fixed, never adjusted.
pub const DIFFICULTY: usize = 4;

/// How many candidates are tried between checks of the cancellation flag.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

fn meets_difficulty(digest: &[u8; 32]) -> bool {
    let full_bytes = DIFFICULTY / 2;
    if digest[..full_bytes].iter().any(|b| *b != 0) {
        return false;
    }
    DIFFICULTY % 2 == 0 || digest[full_bytes] >> 4 == 0
}

/// Checks whether `candidate` is a valid proof following `last_proof`.
pub fn is_valid_proof(last_proof: u64, candidate: u64) -> bool {
    let guess = format!("{}{}", last_proof, candidate);
    meets_difficulty(&sha256(guess.as_bytes()))
}

/// Unbounded search for the first valid proof following `last_proof`.
pub fn find_proof(last_proof: u64) -> u64 {
    let mut candidate = 0;
    while !is_valid_proof(last_proof, candidate) {
        candidate += 1;
    }
    candidate
}

/// Proof search with an optional iteration cap and cancellation flag.
///
/// With neither set, [`ProofSearch::run`] behaves exactly like
/// [`find_proof`].
#[derive(Debug, Clone)]
pub struct ProofSearch {
    last_proof: u64,
    max_iterations: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProofSearch {
    pub fn new(last_proof: u64) -> Self {
        Self {
            last_proof,
            max_iterations: None,
            cancel: None,
        }
    }

    /// Give up with `ProofNotFound` after this many candidates.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Abort with `MiningCancelled` once `flag` becomes true.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn last_proof(&self) -> u64 {
        self.last_proof
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn run(&self) -> Result<u64, ChainError> {
        let mut candidate: u64 = 0;
        loop {
            if let Some(limit) = self.max_iterations {
                if candidate >= limit {
                    return Err(ChainError::ProofNotFound {
                        last_proof: self.last_proof,
                        attempts: candidate,
                    });
                }
            }
            if candidate % CANCEL_CHECK_INTERVAL == 0 && self.cancelled() {
                return Err(ChainError::MiningCancelled);
            }
            if is_valid_proof(self.last_proof, candidate) {
                return Ok(candidate);
            }
            candidate += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_hex;

    fn reference_predicate(last_proof: u64, candidate: u64) -> bool {
        let digest = sha256_hex(format!("{}{}", last_proof, candidate).as_bytes());
        digest[..DIFFICULTY] == "0".repeat(DIFFICULTY)
    }

    #[test]
    fn test_byte_check_matches_hex_prefix() {
        for candidate in 0..5_000 {
            assert_eq!(
                is_valid_proof(100, candidate),
                reference_predicate(100, candidate),
                "mismatch at candidate {}",
                candidate
            );
        }
        let proof = find_proof(100);
        assert!(reference_predicate(100, proof));
    }

    #[test]
    fn test_find_proof_returns_first_match() {
        let proof = find_proof(100);
        assert!(is_valid_proof(100, proof));
        assert!((0..proof).all(|c| !is_valid_proof(100, c)));
    }

    #[test]
    fn test_find_proof_is_deterministic() {
        assert_eq!(find_proof(7), find_proof(7));
    }

    #[test]
    fn test_unbounded_search_matches_find_proof() {
        assert_eq!(ProofSearch::new(100).run(), Ok(find_proof(100)));
    }

    #[test]
    fn test_iteration_cap_surfaces_proof_not_found() {
        let proof = find_proof(100);
        let err = ProofSearch::new(100)
            .with_max_iterations(proof)
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::ProofNotFound {
                last_proof: 100,
                attempts: proof
            }
        );
        assert!(err.is_retryable());

        // One more attempt reaches the valid candidate
        assert_eq!(
            ProofSearch::new(100).with_max_iterations(proof + 1).run(),
            Ok(proof)
        );
    }

    #[test]
    fn test_cancel_flag_stops_search() {
        let flag = Arc::new(AtomicBool::new(true));
        let result = ProofSearch::new(100).with_cancel_flag(flag).run();
        assert_eq!(result, Err(ChainError::MiningCancelled));
    }

    #[test]
    fn test_meets_difficulty_boundaries() {
        let mut digest = [0u8; 32];
        assert!(meets_difficulty(&digest));
        digest[2] = 0xff;
        assert!(meets_difficulty(&digest));
        digest[1] = 0x01;
        assert!(!meets_difficulty(&digest));
    }
}
