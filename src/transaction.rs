//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::TransactionRequest;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use serde_json::json;

    #[test]
    fn test_complete_request_converts() {
        let request: TransactionRequest =
            serde_json::from_value(json!({"sender": "alice", "recipient": "bob", "amount": 5}))
                .unwrap();
        let tx = Transaction::try_from(request).unwrap();
        assert_eq!(tx, Transaction::new("alice", "bob", 5));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let request: TransactionRequest =
            serde_json::from_value(json!({"recipient": "bob"})).unwrap();
        assert_eq!(request.missing_fields(), vec!["sender", "amount"]);

        let err = request.into_transaction().unwrap_err();
        assert_eq!(
            err,
            ChainError::MalformedTransaction("missing required fields: sender, amount".to_string())
        );
    }

    #[test]
    fn test_null_amount_counts_as_missing() {
        let request: TransactionRequest =
            serde_json::from_value(json!({"sender": "a", "recipient": "b", "amount": null}))
                .unwrap();
        assert_eq!(request.missing_fields(), vec!["amount"]);
    }

    #[test]
    fn test_negative_and_fractional_amounts_accepted() {
        let request: TransactionRequest =
            serde_json::from_value(json!({"sender": "a", "recipient": "b", "amount": -3}))
                .unwrap();
        assert!(request.into_transaction().is_ok());

        let request: TransactionRequest =
            serde_json::from_value(json!({"sender": "a", "recipient": "b", "amount": 0.25}))
                .unwrap();
        let tx = request.into_transaction().unwrap();
        assert_eq!(tx.amount.as_f64(), Some(0.25));
    }

    #[test]
    fn test_oversized_integer_kept_exactly() {
        let request: TransactionRequest = serde_json::from_str(
            r#"{"sender": "a", "recipient": "b", "amount": 100000000000000000000}"#,
        )
        .unwrap();
        let tx = request.into_transaction().unwrap();
        assert_eq!(tx.amount.to_string(), "100000000000000000000");
    }

    #[test]
    fn test_overflowing_float_amount_rejected() {
        let request: TransactionRequest =
            serde_json::from_str(r#"{"sender": "a", "recipient": "b", "amount": 1e400}"#).unwrap();
        assert!(matches!(
            request.into_transaction(),
            Err(ChainError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_coinbase_transaction() {
        let reward = Transaction::coinbase("node-1");
        assert!(reward.is_coinbase());
        assert_eq!(reward.sender, COINBASE_SENDER);
        assert_eq!(reward.recipient, "node-1");
        assert_eq!(reward.amount, Amount::from(MINING_REWARD));
        assert!(!Transaction::new("alice", "bob", 1).is_coinbase());
    }

    #[test]
    fn test_amount_serializes_without_coercion() {
        let tx = Transaction::new("a", "b", 5);
        assert_eq!(
            serde_json::to_string(&tx).unwrap(),
            r#"{"sender":"a","recipient":"b","amount":5}"#
        );
    }
}
