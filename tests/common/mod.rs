//! Shared mock endpoints for integration tests: a beacon node emitting
//! slot events over SSE, a relay serving validator duties, and a
//! JSON-RPC node recording raw submissions.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};

/// Bind on an ephemeral port, serve the router in the background, and
/// return the base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn beacon_event_json(slot: u64) -> Value {
    json!({
        "version": "capella",
        "data": {
            "proposal_slot": slot.to_string(),
            "parent_block_number": (100 + slot).to_string(),
            "parent_block_hash": format!("0x{:064x}", slot),
            "payload_attributes": {
                "timestamp": (1_700_000_000u64 + slot * 12).to_string(),
                "prev_randao": format!("0x{:064x}", 0xff00u64 + slot),
                "suggested_fee_recipient": "0x0000000000000000000000000000000000000000",
                "withdrawals": [
                    {
                        "index": "47",
                        "validator_index": "201",
                        "address": "0x6b2ddd4c9ee1b8b0d5e1d7e5e9c00184382c6a63",
                        "amount": "3402"
                    }
                ]
            }
        }
    })
}

async fn sse_handler(
    State(slots): State<Arc<Vec<u64>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events: Vec<_> = slots
        .iter()
        .map(|slot| {
            Ok(Event::default()
                .event("payload_attributes")
                .data(beacon_event_json(*slot).to_string()))
        })
        .collect();
    // hold the connection open after the scripted events
    Sse::new(stream::iter(events).chain(stream::pending()))
}

/// Mock beacon node emitting one `payload_attributes` event per slot.
pub async fn start_mock_beacon(slots: Vec<u64>) -> String {
    let app = Router::new()
        .route("/eth/v1/events", get(sse_handler))
        .with_state(Arc::new(slots));
    serve(app).await
}

/// Mock relay with validator duties registered for the given slots.
pub async fn start_mock_relay(duty_slots: Vec<u64>) -> String {
    let registrations: Vec<Value> = duty_slots
        .iter()
        .map(|slot| {
            json!({
                "slot": slot.to_string(),
                "entry": {
                    "message": {
                        "fee_recipient": "0x6b2ddd4c9ee1b8b0d5e1d7e5e9c00184382c6a63",
                        "gas_limit": "30000000",
                        "pubkey": format!("0x{:096x}", 0x8400u64 + slot)
                    }
                }
            })
        })
        .collect();
    let registrations = Arc::new(Value::Array(registrations));

    async fn registrations_handler(State(body): State<Arc<Value>>) -> Json<Value> {
        Json(body.as_ref().clone())
    }

    let app = Router::new()
        .route("/relay/v1/builder/validators", get(registrations_handler))
        .with_state(registrations);
    serve(app).await
}

/// Shared state of the mock JSON-RPC node.
#[derive(Clone)]
pub struct MockRpc {
    pub chain_id: u64,
    /// Raw submission bytes, in arrival order.
    pub submissions: Arc<Mutex<Vec<Vec<u8>>>>,
    /// When set, every submission is refused with this error message.
    pub reject_with: Option<String>,
}

impl MockRpc {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            submissions: Arc::new(Mutex::new(Vec::new())),
            reject_with: None,
        }
    }

    pub fn rejecting(chain_id: u64, message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::new(chain_id)
        }
    }

    pub fn submissions(&self) -> Vec<Vec<u8>> {
        self.submissions.lock().unwrap().clone()
    }
}

fn receipt_json(tx_hash: &str) -> Value {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{:064x}", 0xb10cu64),
        "blockNumber": "0xa9",
        "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        "to": "0x8f21b4e51e17b09afa77b1ff87b6bcb26fdb0ea0",
        "cumulativeGasUsed": "0x0",
        "gasUsed": "0x5208",
        "contractAddress": null,
        "logs": [],
        "status": "0x1",
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "effectiveGasPrice": "0x4a817c800"
    })
}

async fn rpc_handler(State(state): State<MockRpc>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();

    let result = match method {
        "eth_chainId" => json!(format!("{:#x}", state.chain_id)),
        "eth_blockNumber" => json!("0xa8"),
        "eth_getTransactionCount" => json!("0x7"),
        "eth_sendRawTransaction" => {
            if let Some(message) = &state.reject_with {
                return Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": 3, "message": message }
                }));
            }
            let raw = request["params"][0].as_str().unwrap_or_default();
            let bytes = alloy::hex::decode(raw).expect("submission is hex");
            let mut submissions = state.submissions.lock().unwrap();
            submissions.push(bytes);
            json!(format!("0x{:064x}", submissions.len()))
        }
        "eth_getTransactionReceipt" => {
            let tx_hash = request["params"][0].as_str().unwrap_or_default();
            receipt_json(tx_hash)
        }
        other => panic!("mock rpc: unexpected method {}", other),
    };

    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

/// Mock JSON-RPC node answering the calls the builder makes.
pub async fn start_mock_rpc(state: MockRpc) -> String {
    let app = Router::new().route("/", post(rpc_handler)).with_state(state);
    serve(app).await
}
