//! Pipeline hook wiring for the normalization engine

use alert_model::{Alert, PipelineHook, PROMETHEUS_EVENT_TYPE};

use crate::engine::Normalizer;

impl PipelineHook for Normalizer {
    /// Run the engine for metrics-alerting events only; every other
    /// event type belongs to a different source and is left alone.
    fn on_receive(&self, alert: &mut Alert) {
        if alert.event_type == PROMETHEUS_EVENT_TYPE {
            self.process(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    fn engine() -> Normalizer {
        Normalizer::new(NormalizerConfig::default()).unwrap()
    }

    #[test]
    fn test_on_receive_processes_prometheus_alerts() {
        let mut alert = Alert::new(PROMETHEUS_EVENT_TYPE, "PodCrashLooping");
        alert.tags = vec!["peer_id=acme".to_string()];

        engine().on_receive(&mut alert);

        assert_eq!(alert.origin, "prometheus/acme");
        assert!(alert.timeout > 0);
    }

    #[test]
    fn test_on_receive_ignores_other_event_types() {
        let mut alert = Alert::new("cloudwatchAlarm", "PodCrashLooping");
        alert.tags = vec!["peer_id=acme".to_string(), "env=prd".to_string()];
        let before = alert.clone();

        engine().on_receive(&mut alert);

        assert_eq!(alert, before);
    }

    #[test]
    fn test_other_hooks_are_noops() {
        let engine = engine();
        let mut alert = Alert::new(PROMETHEUS_EVENT_TYPE, "PodCrashLooping");
        alert.tags = vec!["peer_id=acme".to_string()];
        engine.on_receive(&mut alert);
        let before = alert.clone();

        engine.on_accepted(&alert);
        engine.on_status_change(&alert, "ack", "acknowledged by operator");

        assert_eq!(alert, before);
    }
}
