use crate::blockchain::core::chain::Block;
use crate::crypto::is_digest_hex;
use crate::error::ChainError;
use crate::miner::is_valid_proof;

/// Checks one block against its predecessor: index, hash link and proof.
pub fn validate_link(previous: &Block, block: &Block) -> Result<(), ChainError> {
    if block.index != previous.index + 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            block.index
        )));
    }

    if !is_digest_hex(&block.previous_hash) {
        return Err(ChainError::InvalidBlockLinkage(format!(
            "Block {} has malformed previous hash {:?}.",
            block.index, block.previous_hash
        )));
    }

    let expected_hash = previous.hash()?;
    if block.previous_hash != expected_hash {
        return Err(ChainError::InvalidBlockLinkage(format!(
            "Block {} points to {}, but block {} hashes to {}.",
            block.index, block.previous_hash, previous.index, expected_hash
        )));
    }

    if !is_valid_proof(previous.proof, block.proof) {
        return Err(ChainError::InvalidProofOfWork(format!(
            "Proof {} of block {} does not follow proof {}.",
            block.proof, block.index, previous.proof
        )));
    }

    Ok(())
}

/// Re-derives the linkage and proof of every block. The genesis block is
/// only required to carry index 1; its proof and previous hash are taken
/// on trust.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainError> {
    let genesis = blocks.first().ok_or(ChainError::EmptyChain)?;
    if genesis.index != 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Chain must start at index 1, but starts at {}.",
            genesis.index
        )));
    }

    blocks
        .windows(2)
        .try_for_each(|pair| validate_link(&pair[0], &pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let mut chain = Blockchain::new("verifier");
        for i in 0..blocks {
            chain.submit_transaction("alice", "bob", i as i64);
            chain.mine_next_block().unwrap();
        }
        chain.read_chain().chain
    }

    #[test]
    fn test_mined_chain_verifies() {
        let blocks = mined_chain(2);
        assert_eq!(blocks.len(), 3);
        assert!(verify_chain(&blocks).is_ok());
        assert!(verify_chain(&blocks[..1]).is_ok());
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert_eq!(verify_chain(&[]), Err(ChainError::EmptyChain));
    }

    #[test]
    fn test_tampered_transaction_breaks_linkage() {
        let mut blocks = mined_chain(2);
        blocks[1].transactions[0].recipient = "mallory".to_string();
        assert!(matches!(
            verify_chain(&blocks),
            Err(ChainError::InvalidBlockLinkage(_))
        ));
    }

    #[test]
    fn test_malformed_previous_hash_rejected() {
        let mut blocks = mined_chain(1);
        blocks[1].previous_hash = "1".to_string();
        let err = verify_chain(&blocks).unwrap_err();
        assert!(err.to_string().contains("malformed previous hash"));
    }

    #[test]
    fn test_bad_proof_detected() {
        let mut blocks = mined_chain(1);
        let previous_proof = blocks[0].proof;
        blocks[1].proof = (0..)
            .find(|p| !is_valid_proof(previous_proof, *p))
            .unwrap();
        assert!(matches!(
            verify_chain(&blocks),
            Err(ChainError::InvalidProofOfWork(_))
        ));
    }

    #[test]
    fn test_index_gap_detected() {
        let mut blocks = mined_chain(1);
        blocks[1].index = 5;
        assert!(matches!(
            verify_chain(&blocks),
            Err(ChainError::InvalidBlock(_))
        ));
    }
}
