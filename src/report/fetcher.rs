//! Report fetching.
//!
//! # Responsibilities
//! - Resolve the target endpoint
//! - Request the report and classify the response before reading the body
//! - Parse the body tolerantly
//!
//! # Design Decisions
//! - `fetch` never fails: every failure becomes an Unhealthy report with a
//!   synthesized entry describing the cause
//! - Non-2xx responses are accepted when they carry JSON, since some targets
//!   publish their report with an error status code

use std::sync::Arc;
use url::Url;

use crate::observability::metrics;
use crate::report::transport::{BasicAuth, Transport};
use crate::report::types::HealthReport;
use crate::targets::{EndpointResolver, TargetConfiguration};

/// Result of one fetch before it is normalized into a report.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(HealthReport),
    Failure(String),
}

impl FetchOutcome {
    pub fn into_report(self) -> HealthReport {
        match self {
            FetchOutcome::Success(report) => report,
            FetchOutcome::Failure(reason) => HealthReport::from_failure(reason),
        }
    }
}

/// Fetches and normalizes health reports.
#[derive(Clone)]
pub struct ReportFetcher {
    resolver: EndpointResolver,
    transport: Arc<dyn Transport>,
}

impl ReportFetcher {
    pub fn new(resolver: EndpointResolver, transport: Arc<dyn Transport>) -> Self {
        Self { resolver, transport }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Fetch the report of a target.
    pub async fn fetch(&self, target: &TargetConfiguration) -> HealthReport {
        let outcome = self.try_fetch(target).await;
        if let FetchOutcome::Failure(reason) = &outcome {
            tracing::error!(
                target_name = %target.name,
                uri = %target.uri,
                error = %reason,
                "Failed to get health report"
            );
            metrics::record_fetch_failure(&target.name);
        }
        outcome.into_report()
    }

    async fn try_fetch(&self, target: &TargetConfiguration) -> FetchOutcome {
        let url = match self.resolver.resolve(target) {
            Ok(url) => url,
            Err(e) => return FetchOutcome::Failure(e.to_string()),
        };
        let (url, auth) = split_credentials(url);
        let failure = |cause: &dyn std::fmt::Display| {
            FetchOutcome::Failure(format!(
                "Failed to get report from {} configured with name {}: {}",
                target.uri, target.name, cause
            ))
        };

        let response = match self.transport.get(&url, auth.as_ref()).await {
            Ok(response) => response,
            Err(e) => return failure(&e),
        };

        let status = response.status();
        let is_json = response.content_type().is_some_and(is_json_media_type);
        if !(200..300).contains(&status) && !is_json {
            return FetchOutcome::Failure(format!(
                "HTTP response is not in valid state ({}) when trying to get report from {} configured with name {}.",
                status, target.uri, target.name
            ));
        }

        let body = match response.body().await {
            Ok(body) => body,
            Err(e) => return failure(&e),
        };
        match serde_json::from_slice::<HealthReport>(&body) {
            Ok(report) => FetchOutcome::Success(report),
            Err(e) => failure(&format!("invalid health report: {e}")),
        }
    }
}

/// Move `user:password` out of the URL. Credentials are only used when both
/// parts are present and non-empty.
fn split_credentials(mut url: Url) -> (Url, Option<BasicAuth>) {
    let username = url.username().to_string();
    let password = url.password().map(str::to_string);
    if username.is_empty() && password.is_none() {
        return (url, None);
    }

    // Only fails for cannot-be-a-base URLs, which the resolver rejects.
    let _ = url.set_username("");
    let _ = url.set_password(None);

    match password {
        Some(password) if !username.is_empty() && !password.is_empty() => {
            (url, Some(BasicAuth { username, password }))
        }
        _ => (url, None),
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    media_type.eq_ignore_ascii_case("application/json")
        || media_type.to_ascii_lowercase().ends_with("+json")
}
