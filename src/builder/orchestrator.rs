//! The per-slot block building loop.
//!
//! # Responsibilities
//! - Drive `n_slots` successful iterations of the build pipeline
//! - Retry the same iteration on slots with no known validator
//! - Keep submission strictly sequential while confirmations complete
//!   their own log lines in the background
//! - Stop everything together on shutdown
//!
//! # Failure Policy
//! A rejected submission or an on-chain revert is logged and the loop
//! continues. The only fatal condition is the slot stream never
//! establishing, which propagates to the caller.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxHash};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::beacon::{BeaconError, BeaconEventData, BeaconSlotListener};
use crate::blockchain::{ChainClient, ChainError, Wallet};
use crate::builder::{contract, outcome, sign_and_submit};
use crate::codec::{CodecError, TransactionCodec};
use crate::lifecycle::Shutdown;
use crate::relay::{ValidatorDutyResolver, ValidatorMsg};

/// Errors that abort a build run.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Beacon(#[from] BeaconError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Bundle serialization failed before anything was submitted.
    #[error("bundle encoding failed: {0}")]
    Bundle(#[from] serde_json::Error),
}

/// Per-run settings, resolved from config and CLI before the loop starts.
#[derive(Debug, Clone)]
pub struct BuildJob {
    /// Number of successful iterations to run. Slots without a known
    /// validator do not count against this budget.
    pub n_slots: u64,
    pub builder_contract: Address,
    pub execution_node: Address,
}

/// Summary of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Iterations that consumed budget (a validator was known).
    pub built: u64,
    /// Submissions the node accepted.
    pub submitted: u64,
    /// Submissions refused or failed before acceptance.
    pub rejected: u64,
}

/// Drives {wait for slot → resolve duty → assemble → encode/sign →
/// submit → decode} for a bounded number of slots.
pub struct BlockBuildOrchestrator {
    client: ChainClient,
    wallet: Wallet,
    codec: TransactionCodec,
    listener: BeaconSlotListener,
    resolver: ValidatorDutyResolver,
    job: BuildJob,
    shutdown: Arc<Shutdown>,
}

impl BlockBuildOrchestrator {
    pub fn new(
        client: ChainClient,
        wallet: Wallet,
        codec: TransactionCodec,
        listener: BeaconSlotListener,
        resolver: ValidatorDutyResolver,
        job: BuildJob,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            client,
            wallet,
            codec,
            listener,
            resolver,
            job,
            shutdown,
        }
    }

    /// Run the loop to completion.
    pub async fn run(mut self) -> Result<BuildReport, BuilderError> {
        let mut report = BuildReport::default();
        let mut confirmations = JoinSet::new();
        let mut shutting_down = false;

        tracing::info!(
            n_slots = self.job.n_slots,
            signer = %self.wallet.address(),
            builder_contract = %self.job.builder_contract,
            "Building blocks"
        );

        while report.built < self.job.n_slots {
            let payload = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, stopping block building");
                    shutting_down = true;
                    break;
                }
                payload = self.listener.wait_for_next_slot() => payload?,
            };
            let slot = payload.proposal_slot;

            let validator = match self.resolver.resolve(slot).await {
                Ok(Some(validator)) => validator,
                Ok(None) => {
                    // expected and common; the iteration budget is untouched
                    tracing::info!(slot, "No validator for slot, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(slot, error = %e, "Duty lookup failed, skipping slot");
                    continue;
                }
            };

            report.built += 1;
            match self.build_and_submit(&payload, &validator).await {
                Ok(tx_hash) => {
                    report.submitted += 1;
                    tracing::info!(slot, tx_hash = %tx_hash, "Block build transaction submitted");
                    self.spawn_confirmation(&mut confirmations, slot, tx_hash);
                }
                Err(BuilderError::Chain(ChainError::Rejected(message))) => {
                    report.rejected += 1;
                    let reason = outcome::decode_rejection(&message);
                    tracing::error!(slot, reason = %reason, "Submission rejected");
                }
                Err(e) => {
                    report.rejected += 1;
                    tracing::error!(slot, error = %e, "Slot iteration failed");
                }
            }
        }

        // let in-flight confirmation waits finish their own log lines;
        // shutdown aborts them with everything else
        if shutting_down {
            confirmations.abort_all();
        }
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled(), if !shutting_down => {
                    shutting_down = true;
                    confirmations.abort_all();
                }
                joined = confirmations.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            built = report.built,
            submitted = report.submitted,
            rejected = report.rejected,
            "Block building finished"
        );
        Ok(report)
    }

    async fn build_and_submit(
        &self,
        payload: &BeaconEventData,
        validator: &ValidatorMsg,
    ) -> Result<TxHash, BuilderError> {
        let args = contract::build_block_args(payload, validator);
        let next_block_number = payload.parent_block_number + 1;
        let calldata = contract::build_block_calldata(args, next_block_number);

        // the block-build call carries no confidential payload
        sign_and_submit(
            &self.client,
            &self.wallet,
            &self.codec,
            self.job.builder_contract,
            calldata,
            self.job.execution_node,
            Bytes::new(),
        )
        .await
    }

    /// Await one confirmation without gating the next iteration; the
    /// decoded outcome completes this slot's log line.
    fn spawn_confirmation(&self, confirmations: &mut JoinSet<()>, slot: u64, tx_hash: TxHash) {
        let client = self.client.clone();
        confirmations.spawn(async move {
            match client.wait_for_receipt(tx_hash).await {
                Ok(receipt) => {
                    let outcome = outcome::decode_receipt(&receipt);
                    match &outcome {
                        outcome::Outcome::Confirmed { .. } => {
                            tracing::info!(slot, tx_hash = %tx_hash, outcome = %outcome, "Block build confirmed")
                        }
                        _ => {
                            tracing::error!(slot, tx_hash = %tx_hash, outcome = %outcome, "Block build failed on-chain")
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(slot, tx_hash = %tx_hash, error = %e, "Confirmation wait failed")
                }
            }
        });
    }
}
