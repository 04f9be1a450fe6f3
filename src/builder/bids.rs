//! Bundle bid submission.
//!
//! Wraps externally signed transactions into a bundle, carries the
//! bundle bytes as the confidential payload, and registers one bid per
//! target block. Shares the record encoding path with the block-build
//! loop; there is exactly one encoder in this tool.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::blockchain::{ChainClient, ChainError, Wallet};
use crate::builder::orchestrator::BuilderError;
use crate::builder::{contract, outcome, sign_and_submit};
use crate::codec::TransactionCodec;

/// Bundle carried confidentially to the bid contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Raw signed transactions, in execution order.
    pub txs: Vec<Bytes>,
    /// Transactions allowed to revert without invalidating the bundle.
    pub reverting_hashes: Vec<B256>,
    pub refund_percent: u8,
}

impl Bundle {
    pub fn from_raw_txs(txs: Vec<Bytes>) -> Self {
        Self {
            txs,
            reverting_hashes: Vec::new(),
            refund_percent: 0,
        }
    }

    /// Serialize and ABI-wrap the bundle as the confidential payload.
    pub fn to_confidential_bytes(&self) -> Result<Bytes, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(contract::encode_confidential_bundle(&json))
    }
}

/// Per-run settings for bid submission.
#[derive(Debug, Clone)]
pub struct BidJob {
    pub bid_contract: Address,
    pub execution_node: Address,
    /// Addresses allowed to read the confidential payload.
    pub allowed_peekers: Vec<Address>,
    /// First target block; defaults to the chain head plus one.
    pub start_block: Option<u64>,
    /// Number of consecutive target blocks to bid on.
    pub n_blocks: u64,
}

/// Summary of a finished bid run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BidReport {
    pub submitted: u64,
    pub rejected: u64,
}

/// Submits one bundle bid per target block.
pub struct BidSender {
    client: ChainClient,
    wallet: Wallet,
    codec: TransactionCodec,
    job: BidJob,
}

impl BidSender {
    pub fn new(client: ChainClient, wallet: Wallet, codec: TransactionCodec, job: BidJob) -> Self {
        Self {
            client,
            wallet,
            codec,
            job,
        }
    }

    /// Submit the bundle as a bid for each target block.
    pub async fn run(&self, bundle: Bundle) -> Result<BidReport, BuilderError> {
        let confidential_data = bundle.to_confidential_bytes()?;

        let start_block = match self.job.start_block {
            Some(block) => block,
            None => self.client.get_block_number().await? + 1,
        };

        tracing::info!(
            bid_contract = %self.job.bid_contract,
            start_block,
            n_blocks = self.job.n_blocks,
            bundle_txs = bundle.txs.len(),
            "Sending bundle bids"
        );

        let mut report = BidReport::default();
        for block_height in start_block..start_block + self.job.n_blocks {
            let calldata =
                contract::new_bid_calldata(block_height, self.job.allowed_peekers.clone());

            let result = sign_and_submit(
                &self.client,
                &self.wallet,
                &self.codec,
                self.job.bid_contract,
                calldata,
                self.job.execution_node,
                confidential_data.clone(),
            )
            .await;

            match result {
                Ok(tx_hash) => {
                    report.submitted += 1;
                    tracing::info!(block_height, tx_hash = %tx_hash, "Bid submitted");
                }
                Err(BuilderError::Chain(ChainError::Rejected(message))) => {
                    report.rejected += 1;
                    let reason = outcome::decode_rejection(&message);
                    tracing::error!(block_height, reason = %reason, "Bid rejected");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            submitted = report.submitted,
            rejected = report.rejected,
            "Bundle bids finished"
        );
        Ok(report)
    }
}
