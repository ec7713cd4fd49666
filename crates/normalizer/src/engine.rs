//! Normalization engine: eligibility filtering and field derivation

use tracing::{debug, info, warn};

use alert_model::Alert;

use crate::config::{NormalizerConfig, SeverityRemap, SuffixRule, SuffixStyle};
use crate::error::ConfigError;
use crate::tags::{self, ParsedTags};

/// Alert rule name of the alertmanager heartbeat
const WATCHDOG_EVENT: &str = "Watchdog";
/// Alert rule whose resource suffix prefers the autoscaler name
const HPA_EVENT: &str = "KubeHpaMaxedOut";
/// Tag key carrying the container name
const CONTAINER_KEY: &str = "container";
/// Origin prefix identifying the metrics source
const ORIGIN_PREFIX: &str = "prometheus";
/// Service assigned when no namespace tag is present
const GLOBAL_SERVICE: &str = "global";
/// Environment whose alerts are covered around the clock
const PROD_ENVIRONMENT: &str = "prod";
/// Timeperiod attribute for production environments
const ALWAYS_ON_TIMEPERIOD: &str = "24x7";

/// Stateless alert normalization engine.
///
/// Holds an immutable rule configuration and rewrites one alert per
/// call; safe to share across ingestion workers.
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create an engine after validating the configuration
    pub fn new(config: NormalizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!("Creating alert normalizer with config: {:?}", config);
        Ok(Self { config })
    }

    /// Access the active configuration
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a single alert in place.
    ///
    /// Alerts without the eligibility tag belong to another source and
    /// pass through with only the attribute promotion applied.
    pub fn process(&self, alert: &mut Alert) {
        let parsed = tags::decode(&alert.tags);
        tags::promote(
            &parsed,
            &self.config.promotable_tag_keys,
            &mut alert.attributes,
        );

        let Some(peer) = tags::get(&parsed, &self.config.eligibility_key) else {
            debug!(
                "Alert {} has no {} tag, passing through",
                alert.id, self.config.eligibility_key
            );
            return;
        };
        let peer = peer.to_string();

        if alert.event.is_empty() {
            warn!(
                "Alert {} from peer {} has an empty event name, passing through unnormalized",
                alert.id, peer
            );
            return;
        }

        self.assign_timeout(alert);
        self.remap_severity(alert);
        self.demote_noisy(alert);
        self.derive_service(alert, &parsed);
        self.derive_environment(alert, &parsed);
        self.assign_timeperiod(alert);
        self.assign_origin(alert, &peer);
        self.compose_resource(alert, &parsed);

        info!(
            "Normalized prometheus alert {}: {}",
            alert.id, alert.resource
        );
    }

    /// Heartbeats expire on their own cadence and always page; everything
    /// else gets the regular repeat-interval timeout.
    fn assign_timeout(&self, alert: &mut Alert) {
        if alert.event == WATCHDOG_EVENT {
            alert.timeout = self.config.watchdog_timeout_secs;
            alert.severity = "critical".to_string();
        } else {
            alert.timeout = self.config.alert_timeout_secs;
        }
    }

    fn remap_severity(&self, alert: &mut Alert) {
        let mapped = match &self.config.severity_remap {
            SeverityRemap::Table(table) => table.get(&alert.severity),
            SeverityRemap::PerEvent(overrides) => overrides.get(&alert.event),
        };
        if let Some(severity) = mapped {
            alert.severity = severity.clone();
        }
    }

    fn demote_noisy(&self, alert: &mut Alert) {
        if self.config.demoted_events.contains(&alert.event) {
            debug!("Demoting known-noisy event {} to warning", alert.event);
            alert.severity = "warning".to_string();
        }
    }

    /// Some scrape configs rewrite the true namespace into
    /// `exported_namespace`; that value wins when present.
    fn namespace<'a>(&self, parsed: &'a ParsedTags) -> Option<&'a str> {
        tags::get(parsed, "exported_namespace").or_else(|| tags::get(parsed, "namespace"))
    }

    fn derive_service(&self, alert: &mut Alert, parsed: &ParsedTags) {
        let missing = alert.service.first().map_or(true, |s| s.is_empty());
        if missing {
            let service = self.namespace(parsed).unwrap_or(GLOBAL_SERVICE);
            alert.service = vec![service.to_string()];
        }
    }

    fn derive_environment(&self, alert: &mut Alert, parsed: &ParsedTags) {
        let env = tags::get(parsed, "env").unwrap_or(self.config.default_environment.as_str());
        alert.environment = match self.config.environment_aliases.get(env) {
            Some(canonical) => canonical.clone(),
            None => env.to_string(),
        };
    }

    /// First write wins: an operator- or tag-supplied timeperiod is kept
    fn assign_timeperiod(&self, alert: &mut Alert) {
        let occupied = alert
            .attributes
            .get("timeperiod")
            .is_some_and(|v| !v.is_empty());
        if occupied {
            return;
        }
        let timeperiod = if alert.environment == PROD_ENVIRONMENT {
            ALWAYS_ON_TIMEPERIOD
        } else {
            self.config.offhours_timeperiod.as_str()
        };
        alert
            .attributes
            .insert("timeperiod".to_string(), timeperiod.to_string());
    }

    /// Downstream heartbeat partitioning needs the peer attribute even
    /// when the host already set one, so this write is forced.
    fn assign_origin(&self, alert: &mut Alert, peer: &str) {
        alert.origin = format!("{}/{}", ORIGIN_PREFIX, peer);
        alert
            .attributes
            .insert(self.config.eligibility_key.clone(), peer.to_string());
    }

    fn compose_resource(&self, alert: &mut Alert, parsed: &ParsedTags) {
        alert.resource = format!(
            "{}/{}/{}/{}",
            alert.environment, alert.origin, alert.event, alert.service[0]
        );
        if let Some(suffix) = self.select_suffix(&alert.event, parsed) {
            alert.resource.push('/');
            alert.resource.push_str(&suffix);
        }
    }

    /// Pick at most one disambiguating suffix, in priority order
    fn select_suffix(&self, event: &str, parsed: &ParsedTags) -> Option<String> {
        if event == HPA_EVENT {
            if let Some(suffix) = self.render_suffix(&self.config.hpa_suffix, parsed) {
                return Some(suffix);
            }
        }
        self.config
            .resource_suffixes
            .iter()
            .find_map(|rule| self.render_suffix(rule, parsed))
    }

    fn render_suffix(&self, rule: &SuffixRule, parsed: &ParsedTags) -> Option<String> {
        let value = tags::get(parsed, &rule.key)?;
        if rule.key == CONTAINER_KEY && self.config.sidecar_exclusion.excludes(value) {
            debug!("Skipping sidecar container {} as resource suffix", value);
            return None;
        }
        Some(match rule.style {
            SuffixStyle::KeyValue => format!("{}={}", rule.key, value),
            SuffixStyle::Bare => value.to_string(),
        })
    }
}
