//! Per-target extension hooks.

use async_trait::async_trait;

use crate::report::types::HealthReport;
use crate::targets::TargetConfiguration;

/// Error returned by an interceptor.
pub type InterceptorError = Box<dyn std::error::Error + Send + Sync>;

/// Hooks invoked around each target of a cycle, in registration order.
///
/// Failures are logged and isolated: they neither stop other interceptors
/// nor affect the target's processing.
#[async_trait]
pub trait CollectorInterceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called before the target's report is fetched.
    async fn on_before_target(&self, _target: &TargetConfiguration) -> Result<(), InterceptorError> {
        Ok(())
    }

    /// Called with the final report once the target has been processed.
    async fn on_after_target(
        &self,
        _target: &TargetConfiguration,
        _report: &HealthReport,
    ) -> Result<(), InterceptorError> {
        Ok(())
    }
}
