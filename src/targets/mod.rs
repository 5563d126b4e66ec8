//! Target configuration and endpoint resolution.
//!
//! # Data Flow
//! ```text
//! TargetConfiguration (from store)
//!     → resolver.rs (cache hit? absolute uri? relative to host?)
//!     → host.rs (this host's base address)
//!     → absolute Url for the report fetcher
//! ```

pub mod host;
pub mod resolver;
pub mod types;

pub use host::{HostAddressProvider, StaticHostAddress};
pub use resolver::{AddressCache, EndpointResolver};
pub use types::{ResolutionError, TargetConfiguration, TargetId};
