use serde::Deserialize;

use super::types::{Amount, Transaction};
use crate::blockchain::canonical_amount;
use crate::error::ChainError;

/// Transaction submission as received from a client.
///
/// Every field is optional so that a missing one can be reported as a
/// malformed request instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<Amount>,
}

impl TransactionRequest {
    /// Names of the required fields that are absent, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push("sender");
        }
        if self.recipient.is_none() {
            missing.push("recipient");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        missing
    }

    /// Checks presence, and that the amount can be hashed into a block.
    /// Sign and magnitude are otherwise taken as-is.
    pub fn into_transaction(self) -> Result<Transaction, ChainError> {
        match (self.sender, self.recipient, self.amount) {
            (Some(sender), Some(recipient), Some(amount)) => {
                canonical_amount(&amount)?;
                Ok(Transaction {
                    sender,
                    recipient,
                    amount,
                })
            }
            (sender, recipient, amount) => {
                let partial = TransactionRequest {
                    sender,
                    recipient,
                    amount,
                };
                Err(ChainError::MalformedTransaction(format!(
                    "missing required fields: {}",
                    partial.missing_fields().join(", ")
                )))
            }
        }
    }
}

impl TryFrom<TransactionRequest> for Transaction {
    type Error = ChainError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        request.into_transaction()
    }
}
