//! Beacon chain event subsystem.
//!
//! # Data Flow
//! ```text
//! beacon node SSE endpoint
//!     → listener.rs (subscription, reassembly, reconnection)
//!     → bounded channel
//!     → wait_for_next_slot (dedup, ordering)
//!     → orchestrator
//! ```

pub mod listener;
pub mod types;

pub use listener::{BeaconError, BeaconSlotListener};
pub use types::{BeaconEventData, PayloadAttributes, Withdrawal};
