//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)
//!     → wallet.rs (key loading, record signing)
//!     → client.rs (RPC connection with timeouts, raw submission,
//!                  receipt polling)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - A wrong chain ID is fatal before anything is signed

pub mod client;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use types::{ChainConfig, ChainError, ChainResult};
pub use wallet::Wallet;
