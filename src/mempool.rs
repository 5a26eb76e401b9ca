//! Pending-transaction pool
//!
//! Holds submitted transactions in arrival order until the next block
//! takes them. Draining is the only way out of the pool.

use crate::transaction::Transaction;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction and returns the pool size after insertion.
    pub fn add_transaction(&mut self, tx: Transaction) -> usize {
        self.transactions.push(tx);
        self.transactions.len()
    }

    /// Takes every pending transaction, oldest first, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn get_all_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut pool = Mempool::new();
        assert_eq!(pool.add_transaction(Transaction::new("a", "b", 1)), 1);
        assert_eq!(pool.add_transaction(Transaction::new("c", "d", 2)), 2);

        let senders: Vec<_> = pool
            .get_all_transactions()
            .iter()
            .map(|tx| tx.sender.as_str())
            .collect();
        assert_eq!(senders, vec!["a", "c"]);
    }

    #[test]
    fn test_drain_empties_pool() {
        let mut pool = Mempool::new();
        pool.add_transaction(Transaction::new("a", "b", 1));
        pool.add_transaction(Transaction::new("b", "a", 1));

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Transaction::new("a", "b", 1));
        assert!(pool.is_empty());
        assert!(pool.drain().is_empty());

        // A fresh generation starts counting from one again
        assert_eq!(pool.add_transaction(Transaction::new("x", "y", 3)), 1);
    }
}
