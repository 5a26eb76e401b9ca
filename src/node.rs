//! Shared, lock-guarded access to the ledger.
//!
//! All chain and pool mutation goes through one `RwLock<Blockchain>`, so a
//! drain and the block that consumes it happen under a single write guard.
//! The proof search runs on the blocking pool with no lock held and only
//! re-acquires the lock to seal the block.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::blockchain::{verify_chain, Block, Blockchain, ChainSnapshot};
use crate::config::{Config, MinerConfig};
use crate::crypto::generate_node_identifier;
use crate::error::ChainError;
use crate::miner::ProofSearch;
use crate::transaction::Transaction;

#[derive(Clone)]
pub struct LedgerNode {
    blockchain: Arc<RwLock<Blockchain>>,
    node_identifier: Arc<str>,
    miner: MinerConfig,
    started_at: Instant,
    is_mining: Arc<AtomicBool>,
    cancel_mining: Arc<AtomicBool>,
    blocks_mined: Arc<AtomicU64>,
    mining_task: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl LedgerNode {
    /// Creates a node with a fresh ledger rewarding `node_identifier`.
    pub fn new(node_identifier: impl Into<String>, miner: MinerConfig) -> Self {
        let node_identifier: String = node_identifier.into();
        let blockchain = Blockchain::new(node_identifier.clone());
        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            node_identifier: Arc::from(node_identifier),
            miner,
            started_at: Instant::now(),
            is_mining: Arc::new(AtomicBool::new(false)),
            cancel_mining: Arc::new(AtomicBool::new(false)),
            blocks_mined: Arc::new(AtomicU64::new(0)),
            mining_task: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds a node from configuration, generating an identity if none is set.
    pub fn from_config(config: &Config) -> Self {
        let identifier = config
            .node
            .identifier
            .clone()
            .unwrap_or_else(generate_node_identifier);
        Self::new(identifier, config.miner.clone())
    }

    pub fn node_identifier(&self) -> &str {
        &self.node_identifier
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_mining(&self) -> bool {
        self.is_mining.load(Ordering::Relaxed)
    }

    /// Blocks forged through this handle, by request or in the background.
    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    pub async fn submit_transaction(&self, tx: Transaction) -> u64 {
        self.blockchain.write().await.add_transaction(tx)
    }

    pub async fn read_chain(&self) -> ChainSnapshot {
        self.blockchain.read().await.read_chain()
    }

    pub async fn chain_length(&self) -> usize {
        self.blockchain.read().await.len()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.blockchain
            .read()
            .await
            .mempool()
            .get_all_transactions()
            .to_vec()
    }

    pub async fn get_block(&self, index: u64) -> Option<Block> {
        self.blockchain.read().await.get_block(index).cloned()
    }

    pub async fn verify(&self) -> Result<(), ChainError> {
        verify_chain(self.blockchain.read().await.blocks())
    }

    /// Mines one block, honouring the configured iteration cap.
    pub async fn mine_block(&self) -> Result<Block, ChainError> {
        self.mine_with(None).await
    }

    async fn mine_with(&self, cancel: Option<Arc<AtomicBool>>) -> Result<Block, ChainError> {
        loop {
            let (last_proof, length) = {
                let chain = self.blockchain.read().await;
                (chain.current_proof_target(), chain.len())
            };

            let mut search = ProofSearch::new(last_proof);
            if let Some(limit) = self.miner.max_iterations {
                search = search.with_max_iterations(limit);
            }
            if let Some(flag) = &cancel {
                search = search.with_cancel_flag(flag.clone());
            }

            let started = Instant::now();
            let proof = tokio::task::spawn_blocking(move || search.run())
                .await
                .map_err(|e| ChainError::MiningTask(e.to_string()))??;

            let mut chain = self.blockchain.write().await;
            if chain.len() != length {
                // Someone else extended the chain; this proof answers a stale tip
                debug!(last_proof, proof, "discarding stale proof");
                continue;
            }

            let block = chain.seal_block(proof)?;
            self.blocks_mined.fetch_add(1, Ordering::SeqCst);
            debug!(
                index = block.index,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "proof search finished"
            );
            return Ok(block);
        }
    }

    /// Starts mining blocks back to back until [`LedgerNode::stop_mining`].
    pub async fn start_mining(&self) -> Result<(), ChainError> {
        // Start and stop both hold this guard, so the flag and the stored
        // handle always change together.
        let mut slot = self.mining_task.write().await;
        if self
            .is_mining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChainError::MiningAlreadyRunning);
        }
        // A loop that ended on its own error leaves its handle behind
        if let Some(finished) = slot.take() {
            reap(finished).await;
        }
        self.cancel_mining.store(false, Ordering::SeqCst);

        let node = self.clone();
        let interval = Duration::from_millis(self.miner.interval_ms);
        *slot = Some(tokio::spawn(async move {
            info!(node = %node.node_identifier, "background mining started");
            while node.is_mining() {
                match node.mine_with(Some(node.cancel_mining.clone())).await {
                    Ok(block) => debug!(index = block.index, "background block forged"),
                    Err(ChainError::MiningCancelled) => break,
                    Err(e) if e.is_retryable() => warn!("mining round gave up: {}", e),
                    Err(e) => {
                        warn!("background mining stopped: {}", e);
                        break;
                    }
                }
                tokio::time::sleep(interval).await;
            }
            node.is_mining.store(false, Ordering::SeqCst);
            info!("background mining stopped");
        }));
        Ok(())
    }

    /// Cancels background mining and waits for the in-flight search to end.
    pub async fn stop_mining(&self) -> Result<(), ChainError> {
        let mut slot = self.mining_task.write().await;
        let was_running = self
            .is_mining
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if was_running {
            self.cancel_mining.store(true, Ordering::SeqCst);
        }

        if let Some(task) = slot.take() {
            reap(task).await;
        }

        if was_running {
            Ok(())
        } else {
            Err(ChainError::MiningNotRunning)
        }
    }
}

async fn reap(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!("mining task ended abnormally: {}", e);
    }
}
