//! Slot event listener over the beacon node's server-sent-events API.
//!
//! # Responsibilities
//! - Subscribe lazily to `/eth/v1/events?topics=payload_attributes`
//! - Reassemble SSE frames that span chunk boundaries
//! - Reconnect transparently with jittered exponential backoff
//! - Deliver complete events only, in non-decreasing slot order
//!
//! The first connection failing entirely is fatal; after that the
//! background task owns reconnection and the caller never observes a
//! partial event. The task stops when the shutdown signal fires or the
//! listener is dropped, whichever comes first.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use rand::Rng;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::beacon::types::{BeaconEventData, PayloadAttributesEvent};
use crate::lifecycle::Shutdown;

const PAYLOAD_ATTRIBUTES_TOPIC: &str = "payload_attributes";

/// Errors from the slot event stream.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// The subscription could not be established at all.
    #[error("beacon subscription failed: {0}")]
    Subscribe(String),

    /// The background stream task gave up (listener dropped mid-wait or
    /// task aborted); no further events will arrive.
    #[error("beacon event stream closed")]
    StreamClosed,
}

/// Blocking access to the next proposer/payload-attributes event.
///
/// Long-lived: one subscription is shared by every `wait_for_next_slot`
/// call. The background task stops on shutdown or when the listener is
/// dropped.
pub struct BeaconSlotListener {
    beacon_url: Url,
    events: Option<mpsc::Receiver<BeaconEventData>>,
    last_slot: Option<u64>,
    shutdown: Arc<Shutdown>,
}

impl BeaconSlotListener {
    pub fn new(beacon_url: Url, shutdown: Arc<Shutdown>) -> Self {
        Self {
            beacon_url,
            events: None,
            last_slot: None,
            shutdown,
        }
    }

    #[cfg(test)]
    fn from_channel(events: mpsc::Receiver<BeaconEventData>) -> Self {
        Self {
            beacon_url: "http://unused.invalid".parse().expect("static url"),
            events: Some(events),
            last_slot: None,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Suspend until the next slot event arrives.
    ///
    /// Establishes the subscription on first use. Duplicate or
    /// regressing slot numbers are dropped silently; only forward
    /// progress is meaningful to callers.
    pub async fn wait_for_next_slot(&mut self) -> Result<BeaconEventData, BeaconError> {
        if self.events.is_none() {
            let rx = subscribe(self.beacon_url.clone(), self.shutdown.clone()).await?;
            self.events = Some(rx);
        }
        let Some(rx) = self.events.as_mut() else {
            return Err(BeaconError::StreamClosed);
        };

        loop {
            match rx.recv().await {
                Some(event) => {
                    let slot = event.proposal_slot;
                    if self.last_slot.is_some_and(|last| slot <= last) {
                        tracing::debug!(slot, "Dropping duplicate or regressing slot event");
                        continue;
                    }
                    self.last_slot = Some(slot);
                    return Ok(event);
                }
                None => return Err(BeaconError::StreamClosed),
            }
        }
    }
}

fn events_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path("/eth/v1/events");
    url.set_query(Some(&format!("topics={}", PAYLOAD_ATTRIBUTES_TOPIC)));
    url
}

/// Open the stream once (errors here are fatal to the caller), then hand
/// it to a background task that reconnects on every later failure.
async fn subscribe(
    beacon_url: Url,
    shutdown: Arc<Shutdown>,
) -> Result<mpsc::Receiver<BeaconEventData>, BeaconError> {
    let url = events_url(&beacon_url);
    let client = reqwest::Client::new();

    let response = client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| BeaconError::Subscribe(e.to_string()))?;

    tracing::info!(url = %url, "Subscribed to beacon payload_attributes events");

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(stream_events(client, url, response, tx, shutdown));
    Ok(rx)
}

async fn stream_events(
    client: reqwest::Client,
    url: Url,
    first: reqwest::Response,
    tx: mpsc::Sender<BeaconEventData>,
    shutdown: Arc<Shutdown>,
) {
    let mut response = Some(first);
    let mut attempt: u32 = 0;

    loop {
        let current = match response.take() {
            Some(r) => r,
            None => {
                attempt += 1;
                let reconnect = async {
                    tokio::time::sleep(reconnect_backoff(attempt)).await;
                    client
                        .get(url.clone())
                        .header(ACCEPT, "text/event-stream")
                        .send()
                        .await
                        .and_then(|r| r.error_for_status())
                };
                let result = tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Beacon stream task stopping on shutdown");
                        return;
                    }
                    result = reconnect => result,
                };
                match result {
                    Ok(r) => {
                        tracing::info!(url = %url, "Beacon stream reconnected");
                        r
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "Beacon stream reconnect failed");
                        continue;
                    }
                }
            }
        };

        let mut parser = SseParser::default();
        let mut stream = current.bytes_stream();

        loop {
            let chunk = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Beacon stream task stopping on shutdown");
                    return;
                }
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(data)) => {
                    attempt = 0;
                    for frame in parser.push(&String::from_utf8_lossy(&data)) {
                        if let Some(event) = decode_frame(&frame) {
                            if tx.send(event).await.is_err() {
                                // listener dropped; nobody is waiting
                                return;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Beacon stream error, reconnecting");
                    break;
                }
                None => break,
            }
        }
        // stream ended or errored; loop around and resubscribe
    }
}

/// Exponential backoff with jitter (0 to 10% of the delay).
fn reconnect_backoff(attempt: u32) -> Duration {
    const BASE_MS: u64 = 500;
    const MAX_MS: u64 = 15_000;

    let exponential_base = 2u64.saturating_pow(attempt.saturating_sub(1));
    let capped_delay = BASE_MS.saturating_mul(exponential_base).min(MAX_MS);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// One reassembled server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SseFrame {
    event: Option<String>,
    data: String,
}

/// Incremental SSE parser. Frames end at a blank line and may span any
/// number of transport chunks.
#[derive(Debug, Default)]
struct SseParser {
    buf: String,
}

impl SseParser {
    fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buf.push_str(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.find("\n\n") {
            let raw: String = self.buf.drain(..pos + 2).collect();
            if let Some(frame) = parse_frame(&raw) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data = String::new();

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        }
        // comment lines (leading ':') and unknown fields are ignored
    }

    if data.is_empty() {
        None
    } else {
        Some(SseFrame { event, data })
    }
}

fn decode_frame(frame: &SseFrame) -> Option<BeaconEventData> {
    if frame
        .event
        .as_deref()
        .is_some_and(|name| name != PAYLOAD_ATTRIBUTES_TOPIC)
    {
        return None;
    }
    match serde_json::from_str::<PayloadAttributesEvent>(&frame.data) {
        Ok(envelope) => Some(envelope.data),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed beacon event");
            None
        }
    }
}
