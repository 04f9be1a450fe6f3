//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BuilderConfig (validated, immutable)
//!     → handed to the orchestrator at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The signing key is never part of the file; it comes from the
//!   environment only

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BuilderConfig;
pub use schema::ChainConfig;
pub use schema::JobConfig;
