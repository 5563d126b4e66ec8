//! The collection cycle orchestrator.

use arc_swap::ArcSwap;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::collector::interceptor::CollectorInterceptor;
use crate::collector::{CollectorError, CycleReport, CycleState, TargetOutcome};
use crate::config::CollectorConfig;
use crate::history::HistoryReconciler;
use crate::notifications::{NotificationDebouncer, NotificationSink, Transition};
use crate::observability::metrics;
use crate::report::{HealthReport, ReportFetcher, Transport};
use crate::store::{Store, StoreError};
use crate::targets::{EndpointResolver, TargetConfiguration};

/// Runs collection cycles over every configured target.
pub struct Collector {
    store: Arc<dyn Store>,
    fetcher: ReportFetcher,
    reconciler: HistoryReconciler,
    debouncer: NotificationDebouncer,
    notifier: Arc<dyn NotificationSink>,
    interceptors: Vec<Arc<dyn CollectorInterceptor>>,
    settings: ArcSwap<CollectorConfig>,
    /// Serializes overlapping cycles per target name.
    target_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Collector {
    pub fn new(
        store: Arc<dyn Store>,
        resolver: EndpointResolver,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn NotificationSink>,
        settings: CollectorConfig,
    ) -> Self {
        Self {
            fetcher: ReportFetcher::new(resolver.clone(), transport),
            reconciler: HistoryReconciler::new(store.clone(), resolver),
            debouncer: NotificationDebouncer::new(store.clone()),
            store,
            notifier,
            interceptors: Vec::new(),
            settings: ArcSwap::from_pointee(settings),
            target_locks: DashMap::new(),
        }
    }

    /// Register an interceptor. Interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn CollectorInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn resolver(&self) -> &EndpointResolver {
        self.fetcher.resolver()
    }

    pub fn settings(&self) -> Arc<CollectorConfig> {
        self.settings.load_full()
    }

    /// Swap settings; the next cycle picks them up.
    pub fn update_settings(&self, settings: CollectorConfig) {
        self.settings.store(Arc::new(settings));
    }

    /// Run one cycle over all targets.
    ///
    /// Cancellation is observed between targets. Targets processed before
    /// the token fired keep their committed results.
    pub async fn collect(&self, cancel: &CancellationToken) -> Result<CycleReport, CollectorError> {
        let cycle_id = Uuid::new_v4();
        self.run_cycle(cycle_id, cancel)
            .instrument(tracing::info_span!("collect", cycle_id = %cycle_id))
            .await
    }

    async fn run_cycle(&self, cycle_id: Uuid, cancel: &CancellationToken) -> Result<CycleReport, CollectorError> {
        let started = Instant::now();
        let mut cycle = CycleReport::new(cycle_id);

        let mut targets = self
            .store
            .list_configurations()
            .await
            .map_err(CollectorError::ListTargets)?;
        targets.sort_by_key(|t| t.id);
        self.prune_locks(&targets);
        let settings = self.settings.load_full();

        cycle.transition(CycleState::Running);
        tracing::debug!(targets = targets.len(), "Collecting health check results");

        for target in &targets {
            if cancel.is_cancelled() {
                tracing::debug!("Collection cycle has been cancelled");
                cycle.transition(CycleState::Cancelled);
                break;
            }

            match self.process_target(target, &settings).await {
                Ok(outcome) => cycle.outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(target_name = %target.name, error = %e, "Failed to process target");
                    metrics::record_persistence_error();
                    cycle.failures.push(e);
                }
            }
        }

        if cycle.state == CycleState::Running {
            cycle.transition(CycleState::Completed);
        }

        if let Err(e) = self.store.flush().await {
            tracing::error!(error = %e, "Failed to flush store");
            metrics::record_persistence_error();
        }

        metrics::record_cycle(cycle.state.as_str(), started.elapsed());
        tracing::debug!(
            processed = cycle.outcomes.len(),
            failed = cycle.failures.len(),
            state = cycle.state.as_str(),
            "Collection cycle finished"
        );
        Ok(cycle)
    }

    /// Drop locks of targets that are no longer configured.
    fn prune_locks(&self, targets: &[TargetConfiguration]) {
        let configured: HashSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        self.target_locks.retain(|name, _| configured.contains(name.as_str()));
    }

    async fn process_target(
        &self,
        target: &TargetConfiguration,
        settings: &CollectorConfig,
    ) -> Result<TargetOutcome, CollectorError> {
        let lock = self.target_locks.entry(target.name.clone()).or_default().clone();
        let _guard = lock.lock().await;

        for interceptor in &self.interceptors {
            if let Err(e) = interceptor.on_before_target(target).await {
                tracing::warn!(interceptor = interceptor.name(), target_name = %target.name, error = %e, "Interceptor failed before target");
            }
        }

        let report = self.fetcher.fetch(target).await;
        let result = self.notify_and_reconcile(target, &report, settings).await;

        for interceptor in &self.interceptors {
            if let Err(e) = interceptor.on_after_target(target, &report).await {
                tracing::warn!(interceptor = interceptor.name(), target_name = %target.name, error = %e, "Interceptor failed after target");
            }
        }

        metrics::record_target_status(&target.name, report.status);
        result
    }

    async fn notify_and_reconcile(
        &self,
        target: &TargetConfiguration,
        report: &HealthReport,
        settings: &CollectorConfig,
    ) -> Result<TargetOutcome, CollectorError> {
        let persist = |source: StoreError| CollectorError::Persistence {
            target: target.name.clone(),
            source,
        };

        let previous = self.store.get_execution(&target.name).await.map_err(&persist)?;
        let transition = Transition::classify(report, previous.as_ref());
        let mut outcome = TargetOutcome {
            name: target.name.clone(),
            status: report.status,
            notified_down: false,
            notified_up: false,
        };

        if transition.is_down() {
            if self.should_notify_down(&target.name, settings).await {
                if let Err(e) = self.notifier.notify_down(&target.name, report).await {
                    tracing::warn!(target_name = %target.name, error = %e, "Down notification failed");
                }
                outcome.notified_down = true;
            }
        } else if transition.is_recovery() {
            if let Err(e) = self.notifier.notify_up(&target.name).await {
                tracing::warn!(target_name = %target.name, error = %e, "Recovery notification failed");
            }
            outcome.notified_up = true;
        }

        self.reconciler
            .apply(previous, target, report, Utc::now())
            .await
            .map_err(&persist)?;
        Ok(outcome)
    }

    async fn should_notify_down(&self, name: &str, settings: &CollectorConfig) -> bool {
        if !settings.notify_unhealthy_once_until_change {
            return true;
        }
        // A failed lookup lets the notification through.
        self.debouncer.should_notify(name).await.unwrap_or_else(|e| {
            tracing::warn!(target_name = %name, error = %e, "Debounce lookup failed");
            true
        })
    }
}
