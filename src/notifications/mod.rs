//! Transition detection and notification.
//!
//! # Data Flow
//! ```text
//! HealthReport + previous ExecutionRecord
//!     → detector.rs (Recovered / NewFailure / ContinuingFailure / SteadyHealthy)
//!     → debounce.rs (down events only, when enabled)
//!     → sink.rs (NotificationSink → NotificationRecord in store)
//! ```

pub mod debounce;
pub mod detector;
pub mod sink;
pub mod types;

pub use debounce::NotificationDebouncer;
pub use detector::Transition;
pub use sink::{NotificationSink, NotifyError, RecordingNotifier};
pub use types::NotificationRecord;
