use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::hashing::hash_block;
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::miner::find_proof;
use crate::transaction::{Amount, Transaction};

/// Proof stored in the genesis block; the first mined block searches from it.
pub const GENESIS_PROOF: u64 = 100;

/// Stand-in for the previous hash of the genesis block ("no predecessor").
pub const GENESIS_PREVIOUS_HASH: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Canonical SHA-256 digest of this block, lowercase hex.
    pub fn hash(&self) -> Result<String, ChainError> {
        hash_block(self)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }

    /// The mining reward, which a sealed block always carries last. Genesis
    /// has none.
    pub fn reward(&self) -> Option<&Transaction> {
        if self.is_genesis() {
            return None;
        }
        self.transactions.last().filter(|tx| tx.is_coinbase())
    }

    /// Transactions taken from the pool, in submission order. A submitted
    /// transaction that happens to use the reward sender stays in this list.
    pub fn submitted_transactions(&self) -> &[Transaction] {
        match self.reward() {
            Some(_) => &self.transactions[..self.transactions.len() - 1],
            None => &self.transactions,
        }
    }
}

/// Seconds since the Unix epoch with microsecond resolution.
fn current_timestamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Point-in-time copy of the chain handed out to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainSnapshot {
    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }
}

/// The ledger: an append-only chain plus the pool feeding its next block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    mempool: Mempool,
    node_identifier: String,
}

impl Blockchain {
    /// Creates a ledger holding only the genesis block. Mining rewards are
    /// credited to `node_identifier`.
    pub fn new(node_identifier: impl Into<String>) -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            mempool: Mempool::new(),
            node_identifier: node_identifier.into(),
        };
        let genesis = blockchain.append_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        info!(
            node = %blockchain.node_identifier,
            timestamp = genesis.timestamp,
            "genesis block created"
        );
        blockchain
    }

    pub fn node_identifier(&self) -> &str {
        &self.node_identifier
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false once constructed; the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Index the next mined block will carry.
    pub fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }

    /// The previous proof the next block must be mined against.
    pub fn current_proof_target(&self) -> u64 {
        self.last_block().proof
    }

    /// Queues a transaction for the next block and returns that block's index.
    pub fn submit_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> u64 {
        self.add_transaction(Transaction::new(sender, recipient, amount))
    }

    /// Same as [`Blockchain::submit_transaction`] for an already-built transaction.
    pub fn add_transaction(&mut self, tx: Transaction) -> u64 {
        let pending = self.mempool.add_transaction(tx);
        let index = self.next_index();
        debug!(pending, next_block = index, "transaction queued");
        index
    }

    /// Searches for the next proof and forges a block with it, all while
    /// holding `&mut self`. Use [`Blockchain::seal_block`] directly to run
    /// the search elsewhere.
    pub fn mine_next_block(&mut self) -> Result<Block, ChainError> {
        let proof = find_proof(self.current_proof_target());
        self.seal_block(proof)
    }

    /// Queues the mining reward, links to the current tip and appends a
    /// block carrying `proof`. The caller is responsible for `proof` being
    /// valid against [`Blockchain::current_proof_target`].
    pub fn seal_block(&mut self, proof: u64) -> Result<Block, ChainError> {
        // Hash first so a serialization failure leaves the pool untouched
        let previous_hash = self.last_block().hash()?;
        let reward = Transaction::coinbase(&self.node_identifier);
        self.add_transaction(reward);

        let block = self.append_block(proof, previous_hash);
        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "new block forged"
        );
        Ok(block)
    }

    /// Moves the whole pool into a new block on top of the chain and returns
    /// a copy of it. This is the only place the chain grows.
    pub fn append_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let block = Block {
            index: self.next_index(),
            timestamp: current_timestamp(),
            transactions: self.mempool.drain(),
            proof,
            previous_hash,
        };
        self.blocks.push(block.clone());
        block
    }

    pub fn read_chain(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.blocks.clone(),
            length: self.blocks.len(),
        }
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.blocks.get(position)
    }
}
