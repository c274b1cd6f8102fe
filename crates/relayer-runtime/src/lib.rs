//! # Relayer Runtime Library
//!
//! Configuration, logging and wiring for the relayer binary, exposed as a
//! library so integration tests can build the same process in-memory.
//!
//! ## Modules
//!
//! - `config/` - `RelayerConfig` (TOML + `XC_*` environment overrides)
//! - `logging/` - `tracing-subscriber` setup
//! - `devnet/` - in-process BCDNS, committee and chains
//! - `runtime/` - startup and graceful shutdown

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod devnet;
pub mod logging;
pub mod runtime;

pub use config::{
    CommitteeConfig, ConfigError, LoggingConfig, RelayerConfig, StorageBackend, StorageConfig,
};
pub use devnet::DevNet;
pub use logging::init_tracing;
pub use runtime::RelayerRuntime;
