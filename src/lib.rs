//! Confidential Block Builder Library

pub mod beacon;
pub mod blockchain;
pub mod builder;
pub mod codec;
pub mod config;
pub mod lifecycle;
pub mod relay;

pub use builder::BlockBuildOrchestrator;
pub use codec::TransactionCodec;
pub use config::BuilderConfig;
pub use lifecycle::Shutdown;
