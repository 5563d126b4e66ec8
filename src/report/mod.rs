//! Health report fetching.
//!
//! # Data Flow
//! ```text
//! TargetConfiguration
//!     → EndpointResolver (absolute Url)
//!     → transport.rs (GET, headers first)
//!     → fetcher.rs (classify, parse, or synthesize failure)
//!     → HealthReport (types.rs)
//! ```

pub mod fetcher;
pub mod transport;
pub mod types;

pub use fetcher::{FetchOutcome, ReportFetcher};
pub use transport::{BasicAuth, ReqwestTransport, Transport, TransportError, TransportResponse};
pub use types::{HealthReport, HealthStatus, ReportEntry, FAILURE_ENTRY_NAME};
