//! ABI surface of the block-bid contract.
//!
//! One binding serves every consumer: calldata assembly, receipt log
//! decoding, and revert-reason decoding all read from this module.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};

use crate::beacon::BeaconEventData;
use crate::relay::ValidatorMsg;

sol! {
    /// Withdrawal expected in the proposed block.
    #[derive(Debug, PartialEq, Eq)]
    struct Withdrawal {
        uint64 index;
        uint64 validator;
        address recipient;
        uint64 amount;
    }

    /// Everything the contract needs to assemble a block for one slot.
    #[derive(Debug, PartialEq, Eq)]
    struct BuildBlockArgs {
        uint64 slot;
        bytes proposerPubkey;
        bytes32 parent;
        uint64 timestamp;
        address feeRecipient;
        uint64 gasLimit;
        bytes32 random;
        Withdrawal[] withdrawals;
    }

    function buildMevShare(BuildBlockArgs blockArgs, uint256 blockHeight);

    function newBid(uint256 blockHeight, address[] allowedPeekers);

    /// Emitted when a bid is decrypted and registered.
    #[derive(Debug, PartialEq, Eq)]
    event BidEvent(bytes16 bidId, uint64 decryptedCondition, address[] allowedPeekers);

    /// Emitted alongside a bid to expose its hint.
    #[derive(Debug, PartialEq, Eq)]
    event HintEvent(bytes16 bidId, bytes hint);

    /// Raised when a peeker's confidential computation fails.
    #[derive(Debug, PartialEq, Eq)]
    error PeekerReverted(address peeker, bytes reason);
}

/// Combine a slot event and a resolved duty into the contract's
/// argument shape. Lives for one loop iteration.
pub fn build_block_args(beacon: &BeaconEventData, validator: &ValidatorMsg) -> BuildBlockArgs {
    let withdrawals = beacon
        .payload_attributes
        .withdrawals
        .iter()
        .map(|w| Withdrawal {
            index: w.index,
            validator: w.validator_index,
            recipient: w.address,
            amount: w.amount,
        })
        .collect();

    BuildBlockArgs {
        slot: beacon.proposal_slot,
        proposerPubkey: Bytes::copy_from_slice(validator.pubkey.as_slice()),
        parent: beacon.parent_block_hash,
        timestamp: beacon.payload_attributes.timestamp,
        feeRecipient: validator.fee_recipient,
        gasLimit: validator.gas_limit,
        random: beacon.payload_attributes.prev_randao,
        withdrawals,
    }
}

/// Calldata for the per-slot block build call.
pub fn build_block_calldata(args: BuildBlockArgs, block_height: u64) -> Bytes {
    buildMevShareCall {
        blockArgs: args,
        blockHeight: U256::from(block_height),
    }
    .abi_encode()
    .into()
}

/// Calldata registering a new bid for a target block.
pub fn new_bid_calldata(block_height: u64, allowed_peekers: Vec<Address>) -> Bytes {
    newBidCall {
        blockHeight: U256::from(block_height),
        allowedPeekers: allowed_peekers,
    }
    .abi_encode()
    .into()
}

/// ABI-wrap opaque bundle bytes the way the contract reads its
/// confidential input (a single `bytes` value).
pub fn encode_confidential_bundle(bundle_json: &[u8]) -> Bytes {
    Bytes::copy_from_slice(bundle_json).abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::types::{PayloadAttributes, Withdrawal as BeaconWithdrawal};
    use alloy::primitives::{FixedBytes, B256};

    fn beacon_event() -> BeaconEventData {
        BeaconEventData {
            proposal_slot: 173,
            parent_block_hash: B256::repeat_byte(0x05),
            parent_block_number: 168,
            payload_attributes: PayloadAttributes {
                timestamp: 1_682_524_512,
                prev_randao: B256::repeat_byte(0x07),
                suggested_fee_recipient: None,
                withdrawals: vec![BeaconWithdrawal {
                    index: 47,
                    validator_index: 201,
                    address: Address::repeat_byte(0x6b),
                    amount: 3402,
                }],
            },
        }
    }

    fn validator() -> ValidatorMsg {
        ValidatorMsg {
            pubkey: FixedBytes::<48>::repeat_byte(0x84),
            fee_recipient: Address::repeat_byte(0x6b),
            gas_limit: 30_000_000,
        }
    }

    #[test]
    fn test_build_block_args_assembly() {
        let args = build_block_args(&beacon_event(), &validator());

        assert_eq!(args.slot, 173);
        assert_eq!(args.parent, B256::repeat_byte(0x05));
        assert_eq!(args.random, B256::repeat_byte(0x07));
        assert_eq!(args.proposerPubkey.len(), 48);
        assert_eq!(args.feeRecipient, Address::repeat_byte(0x6b));
        assert_eq!(args.gasLimit, 30_000_000);
        assert_eq!(args.withdrawals.len(), 1);
        assert_eq!(args.withdrawals[0].validator, 201);
        assert_eq!(args.withdrawals[0].amount, 3402);
    }

    #[test]
    fn test_calldata_selectors() {
        let args = build_block_args(&beacon_event(), &validator());
        let calldata = build_block_calldata(args, 169);
        assert_eq!(&calldata[..4], &buildMevShareCall::SELECTOR[..]);

        let calldata = new_bid_calldata(169, vec![Address::repeat_byte(0x01)]);
        assert_eq!(&calldata[..4], &newBidCall::SELECTOR[..]);
    }

    #[test]
    fn test_confidential_bundle_is_abi_wrapped_bytes() {
        let wrapped = encode_confidential_bundle(b"{\"txs\":[]}");
        // head offset word + length word + one padded content word
        assert_eq!(wrapped.len(), 96);
        let unwrapped = Bytes::abi_decode(&wrapped).unwrap();
        assert_eq!(unwrapped.as_ref(), b"{\"txs\":[]}");
    }
}
