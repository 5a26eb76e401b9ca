//! Canonical block serialization and digest.
//!
//! Blocks are rendered as JSON with keys sorted at every level, `", "` and
//! `": "` separators and non-ASCII characters escaped as `\uXXXX`.
//! Integers keep every digit. Other numbers are written as the shortest
//! round-trip float, switching to `1e-05` / `1e+16` exponent form outside
//! `[1e-4, 1e16)` and always carrying a fraction or exponent (`100.0`).
//! The output is byte-identical to a sorted-key JSON dump with default
//! separators, so any verifier producing that text agrees on the digest.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};

use super::chain::Block;
use crate::crypto::sha256_hex;
use crate::error::ChainError;
use crate::transaction::Amount;

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    // Quotes, backslashes and control characters never reach this method;
    // the serializer escapes those itself.
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let text = float_repr(value).ok_or_else(|| unrepresentable(&value.to_string()))?;
        writer.write_all(text.as_bytes())
    }

    // Every number arrives here as text while serde_json keeps its digits.
    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let text = number_repr(value).ok_or_else(|| unrepresentable(value))?;
        writer.write_all(text.as_bytes())
    }
}

fn unrepresentable(value: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("number {} has no canonical form", value),
    )
}

/// Canonical text of a JSON number literal. `None` when it is a float that
/// overflows to infinity.
fn number_repr(text: &str) -> Option<String> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.bytes().all(|b| b == b'0') {
            return Some("0".to_string());
        }
        return Some(text.to_string());
    }
    float_repr(text.parse().ok()?)
}

/// Shortest round-trip rendering of a finite float in `repr` layout.
fn float_repr(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        let zero = if value.is_sign_negative() { "-0.0" } else { "0.0" };
        return Some(zero.to_string());
    }

    // `{:e}` yields the shortest digits that parse back to the same value
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = if !(-4..16).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", lead, fraction, sign, exponent.abs())
    } else if exponent < 0 {
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), digits)
    } else {
        let point = exponent as usize + 1;
        if digits.len() > point {
            format!("{}.{}", &digits[..point], &digits[point..])
        } else {
            format!("{}{}.0", digits, "0".repeat(point - digits.len()))
        }
    };

    let sign = if value < 0.0 { "-" } else { "" };
    Some(format!("{}{}", sign, body))
}

/// Canonical text of an amount, or an error when it cannot be hashed.
pub fn canonical_amount(amount: &Amount) -> Result<String, ChainError> {
    let text = amount.to_string();
    number_repr(&text)
        .ok_or_else(|| ChainError::InvalidAmount(format!("{} has no finite value", text)))
}

/// Rebuilds every object with its keys in lexicographic order, whatever map
/// type `serde_json` was compiled with.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Canonical text of any serializable value.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, ChainError> {
    let value = sort_keys(serde_json::to_value(value)?);
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, CanonicalFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| ChainError::Serialization(e.to_string()))
}

/// Canonical text of a block. Non-finite timestamps have no JSON form and
/// are rejected instead of being silently written as `null`.
pub fn canonical_block_json(block: &Block) -> Result<String, ChainError> {
    if !block.timestamp.is_finite() {
        return Err(ChainError::Serialization(format!(
            "block {} has non-finite timestamp {}",
            block.index, block.timestamp
        )));
    }
    canonical_json(block)
}

/// SHA-256 of the canonical block text, lowercase hex.
pub fn hash_block(block: &Block) -> Result<String, ChainError> {
    Ok(sha256_hex(canonical_block_json(block)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::is_digest_hex;
    use crate::transaction::Transaction;
    use serde_json::json;

    fn sample_block() -> Block {
        Block {
            index: 2,
            timestamp: 1_700_000_000.5,
            transactions: vec![Transaction::new("alice", "bob", 5)],
            proof: 35_293,
            previous_hash: "abc".to_string(),
        }
    }

    #[test]
    fn test_canonical_layout() {
        let text = canonical_block_json(&sample_block()).unwrap();
        assert_eq!(
            text,
            r#"{"index": 2, "previous_hash": "abc", "proof": 35293, "timestamp": 1700000000.5, "transactions": [{"amount": 5, "recipient": "bob", "sender": "alice"}]}"#
        );
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = Block {
            index: 1,
            timestamp: 1.0,
            transactions: vec![],
            proof: 100,
            previous_hash: "1".to_string(),
        };
        assert_eq!(
            canonical_block_json(&genesis).unwrap(),
            r#"{"index": 1, "previous_hash": "1", "proof": 100, "timestamp": 1.0, "transactions": []}"#
        );
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let block = sample_block();
        let first = hash_block(&block).unwrap();
        let second = hash_block(&block.clone()).unwrap();
        assert_eq!(first, second);
        assert!(is_digest_hex(&first));
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let block = sample_block();
        let reordered: Block = serde_json::from_value(json!({
            "transactions": [{"recipient": "bob", "amount": 5, "sender": "alice"}],
            "previous_hash": "abc",
            "proof": 35293,
            "timestamp": 1_700_000_000.5,
            "index": 2
        }))
        .unwrap();
        assert_eq!(hash_block(&block).unwrap(), hash_block(&reordered).unwrap());
    }

    #[test]
    fn test_value_changes_change_hash() {
        let block = sample_block();
        let mut other = block.clone();
        other.proof += 1;
        assert_ne!(hash_block(&block).unwrap(), hash_block(&other).unwrap());
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let text = canonical_json(&json!({"name": "caf\u{e9} \u{1f600}\u{7f}"})).unwrap();
        assert_eq!(text, r#"{"name": "caf\u00e9 \ud83d\ude00\u007f"}"#);
    }

    #[test]
    fn test_nested_keys_sorted() {
        let text = canonical_json(&json!({"b": {"z": 1, "a": [{"y": 2, "x": 3}]}, "a": null}))
            .unwrap();
        assert_eq!(text, r#"{"a": null, "b": {"a": [{"x": 3, "y": 2}], "z": 1}}"#);
    }

    fn amount_json(amount: &str) -> String {
        let body = format!(r#"{{"sender": "a", "recipient": "b", "amount": {}}}"#, amount);
        let request: crate::transaction::TransactionRequest =
            serde_json::from_str(&body).unwrap();
        canonical_json(&request.into_transaction().unwrap()).unwrap()
    }

    #[test]
    fn test_amounts_rendered_like_sorted_json_dump() {
        let cases = [
            ("5", "5"),
            ("-3", "-3"),
            ("-0", "0"),
            ("100000000000000000000", "100000000000000000000"),
            ("-123456789012345678901234567890", "-123456789012345678901234567890"),
            ("0.00001", "1e-05"),
            ("0.0001", "0.0001"),
            ("2.50", "2.5"),
            ("1E2", "100.0"),
            ("1e16", "1e+16"),
            ("1.5e300", "1.5e+300"),
            ("1000000000000000.0", "1000000000000000.0"),
            ("-0.0", "-0.0"),
            ("0.30000000000000004", "0.30000000000000004"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                amount_json(input),
                format!(r#"{{"amount": {}, "recipient": "b", "sender": "a"}}"#, expected),
                "amount {}",
                input
            );
        }
    }

    #[test]
    fn test_timestamps_use_float_layout() {
        let mut block = sample_block();
        block.timestamp = 0.000001;
        assert!(canonical_block_json(&block)
            .unwrap()
            .contains(r#""timestamp": 1e-06"#));

        block.timestamp = 1e20;
        assert!(canonical_block_json(&block)
            .unwrap()
            .contains(r#""timestamp": 1e+20"#));
    }

    #[test]
    fn test_overflowing_amount_has_no_canonical_form() {
        let amount: Amount = "1e400".parse().unwrap();
        assert!(matches!(
            canonical_amount(&amount),
            Err(ChainError::InvalidAmount(_))
        ));
        assert_eq!(canonical_amount(&Amount::from(7)).unwrap(), "7");
    }

    #[test]
    fn test_non_finite_timestamp_rejected() {
        let mut block = sample_block();
        block.timestamp = f64::NAN;
        assert!(matches!(
            hash_block(&block),
            Err(ChainError::Serialization(_))
        ));
    }
}
