//! Submission outcome classification.
//!
//! Three terminal states for every submitted request:
//! - `Confirmed`: mined with success status, logs decoded against the
//!   bid contract's event schema
//! - `Reverted`: mined with failure status
//! - `Rejected`: refused by the node before mining
//!
//! Rejection messages decode in two levels (RPC envelope → ABI custom
//! error → UTF-8 payload); malformed input at any level degrades to the
//! most specific representation that did parse, never to a decode error.

use alloy::hex;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::sol_types::{SolError, SolEvent};

use crate::builder::contract::{BidEvent, HintEvent, PeekerReverted};

const REVERT_PREFIX: &str = "execution reverted: ";

/// Terminal state of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Mined, status success.
    Confirmed {
        tx_hash: TxHash,
        block_number: Option<u64>,
        events: Vec<DecodedEvent>,
    },
    /// Mined, status failure. Log contents are irrelevant here.
    Reverted { tx_hash: TxHash },
    /// Never mined.
    Rejected { reason: RejectReason },
}

/// One receipt log rendered against the contract's event schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

/// Most specific successfully-parsed form of a node-level rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The designated peeker's confidential computation failed; the
    /// carried bytes render as text.
    PeekerReverted { peeker: Address, message: String },
    /// Revert data this tool has no ABI entry for.
    Revert { data: Bytes },
    /// Anything else, verbatim.
    Other { message: String },
}

/// Classify a mined transaction by its receipt.
pub fn decode_receipt(receipt: &TransactionReceipt) -> Outcome {
    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        return Outcome::Reverted { tx_hash };
    }

    Outcome::Confirmed {
        tx_hash,
        block_number: receipt.block_number,
        events: receipt.inner.logs().iter().map(decode_log).collect(),
    }
}

/// Classify a node-level rejection by its RPC error message.
pub fn decode_rejection(message: &str) -> RejectReason {
    let Some(revert_payload) = message.strip_prefix(REVERT_PREFIX) else {
        return RejectReason::Other {
            message: message.to_string(),
        };
    };
    let Ok(data) = hex::decode(revert_payload.trim()) else {
        return RejectReason::Other {
            message: message.to_string(),
        };
    };

    if data.len() >= 4 && data[..4] == PeekerReverted::SELECTOR {
        if let Ok(decoded) = PeekerReverted::abi_decode(&data) {
            return RejectReason::PeekerReverted {
                peeker: decoded.peeker,
                message: String::from_utf8_lossy(&decoded.reason).into_owned(),
            };
        }
    }

    RejectReason::Revert { data: data.into() }
}

fn decode_log(log: &Log) -> DecodedEvent {
    if let Ok(decoded) = log.log_decode::<BidEvent>() {
        let event = &decoded.inner.data;
        return DecodedEvent {
            name: "BidEvent".to_string(),
            fields: vec![
                ("bidId".to_string(), event.bidId.to_string()),
                (
                    "decryptedCondition".to_string(),
                    event.decryptedCondition.to_string(),
                ),
                (
                    "allowedPeekers".to_string(),
                    format!("{:?}", event.allowedPeekers),
                ),
            ],
        };
    }
    if let Ok(decoded) = log.log_decode::<HintEvent>() {
        let event = &decoded.inner.data;
        return DecodedEvent {
            name: "HintEvent".to_string(),
            fields: vec![
                ("bidId".to_string(), event.bidId.to_string()),
                ("hint".to_string(), event.hint.to_string()),
            ],
        };
    }

    // unknown log: pass it through raw rather than dropping it
    DecodedEvent {
        name: "UnknownLog".to_string(),
        fields: vec![
            ("address".to_string(), log.address().to_string()),
            ("data".to_string(), log.data().data.to_string()),
        ],
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Confirmed {
                block_number,
                events,
                ..
            } => {
                match block_number {
                    Some(n) => write!(f, "confirmed in block {}", n)?,
                    None => write!(f, "confirmed")?,
                }
                for event in events {
                    write!(f, "; {}", event)?;
                }
                Ok(())
            }
            Outcome::Reverted { .. } => write!(f, "reverted on-chain"),
            Outcome::Rejected { reason } => write!(f, "rejected: {}", reason),
        }
    }
}

impl std::fmt::Display for DecodedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, ")")
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::PeekerReverted { peeker, message } => {
                write!(f, "PeekerReverted({}, '{}')", peeker, message)
            }
            RejectReason::Revert { data } => write!(f, "execution reverted: {}", data),
            RejectReason::Other { message } => write!(f, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{FixedBytes, B256};
    use serde_json::json;

    #[test]
    fn test_peeker_reverted_selector() {
        assert_eq!(PeekerReverted::SELECTOR, [0x75, 0xff, 0xf4, 0x67]);
    }

    #[test]
    fn test_decode_peeker_reverted_rejection() {
        let peeker = Address::repeat_byte(0x42);
        let raw = PeekerReverted {
            peeker,
            reason: Bytes::from_static(b"not allowed to peek"),
        }
        .abi_encode();
        let message = format!("{}0x{}", REVERT_PREFIX, hex::encode(raw));

        let reason = decode_rejection(&message);
        assert_eq!(
            reason,
            RejectReason::PeekerReverted {
                peeker,
                message: "not allowed to peek".to_string(),
            }
        );
        assert!(reason.to_string().contains("not allowed to peek"));
    }

    #[test]
    fn test_unknown_selector_degrades_to_raw_revert() {
        let message = format!("{}0xdeadbeef01020304", REVERT_PREFIX);
        let reason = decode_rejection(&message);
        assert_eq!(
            reason,
            RejectReason::Revert {
                data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04]),
            }
        );
    }

    #[test]
    fn test_known_selector_with_garbage_degrades_to_raw_revert() {
        // right selector, payload too short to ABI-decode
        let message = format!("{}0x75fff46700", REVERT_PREFIX);
        assert!(matches!(
            decode_rejection(&message),
            RejectReason::Revert { .. }
        ));
    }

    #[test]
    fn test_non_hex_and_unprefixed_messages_pass_through() {
        let reason = decode_rejection("nonce too low");
        assert_eq!(
            reason,
            RejectReason::Other {
                message: "nonce too low".to_string(),
            }
        );

        let reason = decode_rejection("execution reverted: not-hex-at-all");
        assert_eq!(
            reason,
            RejectReason::Other {
                message: "execution reverted: not-hex-at-all".to_string(),
            }
        );
    }

    fn receipt_from_json(status: &str, logs: serde_json::Value) -> TransactionReceipt {
        serde_json::from_value(json!({
            "transactionHash": format!("{}", B256::repeat_byte(0x11)),
            "transactionIndex": "0x0",
            "blockHash": format!("{}", B256::repeat_byte(0x22)),
            "blockNumber": "0xa9",
            "from": format!("{}", Address::repeat_byte(0x33)),
            "to": format!("{}", Address::repeat_byte(0x44)),
            "cumulativeGasUsed": "0x0",
            "gasUsed": "0x5208",
            "contractAddress": null,
            "logs": logs,
            "status": status,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "type": "0x0",
            "effectiveGasPrice": "0x4a817c800"
        }))
        .unwrap()
    }

    fn bid_event_log_json() -> serde_json::Value {
        let event = BidEvent {
            bidId: FixedBytes::<16>::repeat_byte(0xab),
            decryptedCondition: 169,
            allowedPeekers: vec![Address::repeat_byte(0x01)],
        };
        let log_data = event.encode_log_data();
        json!({
            "address": format!("{}", Address::repeat_byte(0x44)),
            "topics": log_data.topics().iter().map(|t| format!("{}", t)).collect::<Vec<_>>(),
            "data": format!("{}", log_data.data),
            "blockNumber": "0xa9",
            "transactionHash": format!("{}", B256::repeat_byte(0x11)),
            "transactionIndex": "0x0",
            "blockHash": format!("{}", B256::repeat_byte(0x22)),
            "logIndex": "0x0",
            "removed": false
        })
    }

    #[test]
    fn test_success_receipt_decodes_events() {
        let receipt = receipt_from_json("0x1", json!([bid_event_log_json()]));
        let outcome = decode_receipt(&receipt);

        let Outcome::Confirmed {
            block_number,
            events,
            ..
        } = outcome
        else {
            panic!("expected Confirmed, got {:?}", outcome);
        };
        assert_eq!(block_number, Some(169));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "BidEvent");
        assert_eq!(events[0].fields[1].1, "169");
    }

    #[test]
    fn test_failed_receipt_is_reverted_regardless_of_logs() {
        let receipt = receipt_from_json("0x0", json!([bid_event_log_json()]));
        assert!(matches!(
            decode_receipt(&receipt),
            Outcome::Reverted { .. }
        ));
    }
}
