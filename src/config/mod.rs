//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → daemon syncs targets into the store, evicts stale endpoints
//!     → Collector::update_settings swaps CollectorConfig
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid reload never replaces a running configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{CollectorConfig, Config, HostConfig, ObservabilityConfig, StorageConfig, TargetEntry};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
