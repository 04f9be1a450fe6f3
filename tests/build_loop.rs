//! End-to-end tests: the real orchestrator stack driven against mock
//! beacon, relay, and RPC endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::sol_types::{SolCall, SolError};

use confidential_builder::beacon::BeaconSlotListener;
use confidential_builder::blockchain::{ChainClient, Wallet};
use confidential_builder::builder::contract::{buildMevShareCall, PeekerReverted};
use confidential_builder::builder::{BlockBuildOrchestrator, BuildJob, BuildReport};
use confidential_builder::codec::{
    ConfidentialComputeRequest, TransactionCodec, CONFIDENTIAL_COMPUTE_REQUEST_TYPE,
};
use confidential_builder::config::schema::ChainConfig;
use confidential_builder::lifecycle::Shutdown;
use confidential_builder::relay::ValidatorDutyResolver;

const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const CHAIN_ID: u64 = 424_242;

fn test_wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY, CHAIN_ID).unwrap()
}

fn test_codec() -> TransactionCodec {
    TransactionCodec::new(CHAIN_ID, 10_000_000, U256::from(20_000_000_000u64))
}

async fn test_client(rpc_url: String) -> ChainClient {
    let config = ChainConfig {
        rpc_url,
        chain_id: CHAIN_ID,
        rpc_timeout_secs: 5,
        confirmation_timeout_secs: 5,
    };
    ChainClient::new(config).await.unwrap()
}

fn test_job(n_slots: u64) -> BuildJob {
    BuildJob {
        n_slots,
        builder_contract: Address::repeat_byte(0x8f),
        execution_node: Address::repeat_byte(0x4e),
    }
}

async fn build_orchestrator(
    beacon_url: String,
    relay_url: String,
    rpc_url: String,
    n_slots: u64,
    shutdown: Arc<Shutdown>,
) -> BlockBuildOrchestrator {
    let client = test_client(rpc_url).await;
    let listener = BeaconSlotListener::new(beacon_url.parse().unwrap(), shutdown.clone());
    let resolver =
        ValidatorDutyResolver::new(relay_url.parse().unwrap(), Duration::from_secs(5)).unwrap();
    BlockBuildOrchestrator::new(
        client,
        test_wallet(),
        test_codec(),
        listener,
        resolver,
        test_job(n_slots),
        shutdown,
    )
}

#[tokio::test]
async fn test_budget_counts_only_duty_slots() {
    // duty is absent for slots 1-2 and present for 3-4; a budget of two
    // must consume exactly slots 3 and 4
    let beacon_url = common::start_mock_beacon(vec![1, 2, 3, 4]).await;
    let relay_url = common::start_mock_relay(vec![3, 4]).await;
    let rpc = common::MockRpc::new(CHAIN_ID);
    let rpc_url = common::start_mock_rpc(rpc.clone()).await;

    let orchestrator = build_orchestrator(
        beacon_url,
        relay_url,
        rpc_url,
        2,
        Arc::new(Shutdown::new()),
    )
    .await;

    let report = tokio::time::timeout(Duration::from_secs(30), orchestrator.run())
        .await
        .expect("run did not finish in time")
        .unwrap();
    assert_eq!(
        report,
        BuildReport {
            built: 2,
            submitted: 2,
            rejected: 0,
        }
    );

    let submissions = rpc.submissions();
    assert_eq!(submissions.len(), 2);

    let wallet = test_wallet();
    let mut slots = Vec::new();
    for raw in &submissions {
        assert_eq!(raw[0], CONFIDENTIAL_COMPUTE_REQUEST_TYPE);

        let request = ConfidentialComputeRequest::decode(raw).unwrap();
        assert_eq!(
            request.record().recover_signer().unwrap(),
            wallet.address()
        );

        let record = request.record().record();
        assert_eq!(record.chain_id, CHAIN_ID);
        assert_eq!(record.nonce, 7);
        assert_eq!(record.to, Address::repeat_byte(0x8f));
        assert_eq!(record.execution_node, Address::repeat_byte(0x4e));

        let call = buildMevShareCall::abi_decode(&record.data).unwrap();
        assert_eq!(call.blockArgs.gasLimit, 30_000_000);
        assert_eq!(call.blockArgs.withdrawals.len(), 1);
        // mock beacon reports parent block 100 + slot
        assert_eq!(call.blockHeight, U256::from(call.blockArgs.slot + 101));
        slots.push(call.blockArgs.slot);
    }
    assert_eq!(slots, vec![3, 4]);
}

#[tokio::test]
async fn test_rejected_submissions_do_not_abort_the_run() {
    let beacon_url = common::start_mock_beacon(vec![10, 11]).await;
    let relay_url = common::start_mock_relay(vec![10, 11]).await;

    let revert_data = PeekerReverted {
        peeker: Address::repeat_byte(0x42),
        reason: alloy::primitives::Bytes::from_static(b"not allowed to peek"),
    }
    .abi_encode();
    let message = format!("execution reverted: 0x{}", alloy::hex::encode(revert_data));
    let rpc = common::MockRpc::rejecting(CHAIN_ID, &message);
    let rpc_url = common::start_mock_rpc(rpc.clone()).await;

    let orchestrator = build_orchestrator(
        beacon_url,
        relay_url,
        rpc_url,
        2,
        Arc::new(Shutdown::new()),
    )
    .await;

    let report = tokio::time::timeout(Duration::from_secs(30), orchestrator.run())
        .await
        .expect("run did not finish in time")
        .unwrap();

    // every submission was refused, yet the run completed its budget
    assert_eq!(
        report,
        BuildReport {
            built: 2,
            submitted: 0,
            rejected: 2,
        }
    );
    assert!(rpc.submissions().is_empty());
}

#[tokio::test]
async fn test_shutdown_stops_the_loop_early() {
    // no duties registered: left alone, the loop would wait forever
    let beacon_url = common::start_mock_beacon(vec![20, 21]).await;
    let relay_url = common::start_mock_relay(Vec::new()).await;
    let rpc = common::MockRpc::new(CHAIN_ID);
    let rpc_url = common::start_mock_rpc(rpc.clone()).await;

    let shutdown = Arc::new(Shutdown::new());
    let orchestrator =
        build_orchestrator(beacon_url, relay_url, rpc_url, 2, shutdown.clone()).await;

    let run = tokio::spawn(orchestrator.run());
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.trigger();

    let report = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run did not stop on shutdown")
        .unwrap()
        .unwrap();
    assert_eq!(report.built, 0);
    assert!(rpc.submissions().is_empty());
}
