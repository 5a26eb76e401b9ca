/// Transaction types for the ledger
use serde::{Deserialize, Serialize};

/// Amount carried by a transaction.
///
/// Kept as a raw JSON number so integers stay integers and floats stay
/// floats when a block is canonically serialized. No sign check is applied.
pub type Amount = serde_json::Number;

/// Sender recorded on mining-reward transactions ("no sender").
pub const COINBASE_SENDER: &str = "0";

/// Amount paid to the node for each forged block.
pub const MINING_REWARD: i64 = 1;

/// A value transfer waiting in the pool or committed to a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// The reward transaction credited to `node_identifier` for mining a block.
    pub fn coinbase(node_identifier: &str) -> Self {
        Transaction::new(COINBASE_SENDER, node_identifier, MINING_REWARD)
    }

    /// Whether this carries the reward sender. Clients may submit that
    /// sender too, so use [`crate::blockchain::Block::reward`] to find the
    /// reward of a block.
    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE_SENDER
    }
}
