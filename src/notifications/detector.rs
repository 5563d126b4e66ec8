//! Status transition detection.

use crate::history::types::ExecutionRecord;
use crate::report::types::HealthReport;

/// How a fresh report relates to the previously persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Healthy now, and either healthy before or never seen.
    SteadyHealthy,
    /// Healthy now after a non-healthy record.
    Recovered,
    /// Not healthy now; healthy before or never seen.
    NewFailure,
    /// Not healthy now and not healthy before.
    ContinuingFailure,
}

impl Transition {
    pub fn classify(report: &HealthReport, previous: Option<&ExecutionRecord>) -> Self {
        let was_failing = previous.is_some_and(|p| !p.status.is_healthy());
        match (report.status.is_healthy(), was_failing) {
            (true, true) => Transition::Recovered,
            (true, false) => Transition::SteadyHealthy,
            (false, true) => Transition::ContinuingFailure,
            (false, false) => Transition::NewFailure,
        }
    }

    /// True for a "down" event.
    pub fn is_down(&self) -> bool {
        matches!(self, Transition::NewFailure | Transition::ContinuingFailure)
    }

    /// True for a "recovered" event.
    pub fn is_recovery(&self) -> bool {
        *self == Transition::Recovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::HealthStatus;
    use chrono::Utc;

    fn previous(status: HealthStatus) -> ExecutionRecord {
        ExecutionRecord {
            name: "api".into(),
            status,
            uri: "/health".into(),
            discovery_service: None,
            last_executed: Utc::now(),
            on_state_from: Utc::now(),
            entries: Vec::new(),
            history: Vec::new(),
        }
    }

    #[test]
    fn test_first_healthy_observation_is_not_recovery() {
        let t = Transition::classify(&HealthReport::new(HealthStatus::Healthy), None);
        assert_eq!(t, Transition::SteadyHealthy);
        assert!(!t.is_recovery());
        assert!(!t.is_down());
    }

    #[test]
    fn test_recovery() {
        for before in [HealthStatus::Unhealthy, HealthStatus::Degraded] {
            let t = Transition::classify(&HealthReport::new(HealthStatus::Healthy), Some(&previous(before)));
            assert_eq!(t, Transition::Recovered);
        }
    }

    #[test]
    fn test_failures_are_down_events() {
        let report = HealthReport::new(HealthStatus::Degraded);
        assert_eq!(Transition::classify(&report, None), Transition::NewFailure);
        assert_eq!(
            Transition::classify(&report, Some(&previous(HealthStatus::Healthy))),
            Transition::NewFailure
        );
        let continuing = Transition::classify(&report, Some(&previous(HealthStatus::Unhealthy)));
        assert_eq!(continuing, Transition::ContinuingFailure);
        assert!(continuing.is_down());
    }

    #[test]
    fn test_steady_healthy() {
        let t = Transition::classify(
            &HealthReport::new(HealthStatus::Healthy),
            Some(&previous(HealthStatus::Healthy)),
        );
        assert_eq!(t, Transition::SteadyHealthy);
    }
}
