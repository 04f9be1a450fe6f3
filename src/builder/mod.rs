//! Block building subsystem.
//!
//! # Data Flow
//! ```text
//! beacon listener ──slot event──▶ orchestrator.rs
//! relay resolver ──validator────▶ orchestrator.rs
//!     → contract.rs (calldata assembly)
//!     → codec (record → sign → request bytes)
//!     → chain client (raw submission)
//!     → outcome.rs (receipt logs / revert reasons)
//!
//! bids.rs reuses the same encode/sign/submit path for bundle bids.
//! ```

pub mod bids;
pub mod contract;
pub mod orchestrator;
pub mod outcome;

pub use bids::{BidJob, BidReport, BidSender, Bundle};
pub use orchestrator::{BlockBuildOrchestrator, BuildJob, BuildReport, BuilderError};
pub use outcome::{DecodedEvent, Outcome, RejectReason};

use alloy::primitives::{keccak256, Address, Bytes, TxHash};

use crate::blockchain::{ChainClient, Wallet};
use crate::codec::{ConfidentialComputeRequest, TransactionCodec};

/// Build, sign, and submit one confidential-compute request.
///
/// The single encoding path for every submission this tool makes. The
/// sender nonce is read from the chain and synced into the wallet before
/// use; iterations never overlap, so the read cannot race itself.
pub(crate) async fn sign_and_submit(
    client: &ChainClient,
    wallet: &Wallet,
    codec: &TransactionCodec,
    to: Address,
    calldata: Bytes,
    execution_node: Address,
    confidential_data: Bytes,
) -> Result<TxHash, BuilderError> {
    let chain_nonce = client.get_transaction_count(wallet.address()).await?;
    wallet.set_nonce(chain_nonce);
    let nonce = wallet.get_and_increment_nonce();

    let record = codec.build_record(
        nonce,
        to,
        calldata,
        execution_node,
        keccak256(&confidential_data),
    )?;
    let signed = wallet.sign_record(record).await?;
    let request = ConfidentialComputeRequest::new(signed, confidential_data)?;

    Ok(client.send_raw_transaction(&request.encode()).await?)
}
