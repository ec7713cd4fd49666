//! Engine configuration and rule tables
//!
//! Severity remaps, noise-reduction events, environment aliases,
//! resource suffix priority, and timeouts all vary between
//! deployments, so they are carried as data rather than code.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How raw severities are rewritten before an alert is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityRemap {
    /// Rewrite every alert through a raw -> canonical severity table
    Table(HashMap<String, String>),
    /// Rewrite severity only for specific alert rules (event -> severity)
    PerEvent(HashMap<String, String>),
}

/// How a matched suffix value is rendered onto the resource string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixStyle {
    /// `/key=value`
    KeyValue,
    /// `/value` (keys that predate the key=value suffix convention)
    Bare,
}

/// One entry in the resource suffix priority list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuffixRule {
    /// Tag key to look up
    pub key: String,
    /// Rendering style for the matched value
    pub style: SuffixStyle,
}

/// Matcher deciding when a container value names a sidecar proxy and
/// must not be used as a resource suffix
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarMatcher {
    /// Exclude only this exact container name
    Exact(String),
    /// Exclude any container name starting with this prefix
    Prefix(String),
}

impl SidecarMatcher {
    /// Whether the given container name is excluded
    pub fn excludes(&self, container: &str) -> bool {
        match self {
            SidecarMatcher::Exact(name) => container == name,
            SidecarMatcher::Prefix(prefix) => container.starts_with(prefix.as_str()),
        }
    }
}

/// Normalization engine configuration
///
/// Loaded once at process start and never mutated afterwards; the
/// engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Environment assigned when no `env` tag is present
    pub default_environment: String,
    /// Tag keys promoted into alert attributes
    pub promotable_tag_keys: Vec<String>,
    /// Tag key whose presence marks an alert as in scope
    pub eligibility_key: String,
    /// Expiry timeout for regular alerts (seconds)
    pub alert_timeout_secs: u64,
    /// Expiry timeout for Watchdog heartbeat alerts (seconds)
    pub watchdog_timeout_secs: u64,
    /// Severity rewrite mode
    pub severity_remap: SeverityRemap,
    /// Alert rules demoted to warning to avoid paging
    pub demoted_events: HashSet<String>,
    /// Historical environment spellings mapped to canonical names
    pub environment_aliases: HashMap<String, String>,
    /// Timeperiod attribute for non-production environments
    pub offhours_timeperiod: String,
    /// Ordered suffix candidates for the resource string
    pub resource_suffixes: Vec<SuffixRule>,
    /// Suffix tried first for KubeHpaMaxedOut alerts
    pub hpa_suffix: SuffixRule,
    /// Container names excluded from suffix selection
    pub sidecar_exclusion: SidecarMatcher,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_environment: "production".to_string(),
            promotable_tag_keys: vec![
                "timeperiod".to_string(),
                "env".to_string(),
                "cluster".to_string(),
                "peer_id".to_string(),
            ],
            eligibility_key: "peer_id".to_string(),
            alert_timeout_secs: 1800,
            watchdog_timeout_secs: 600,
            severity_remap: SeverityRemap::Table(default_severity_table()),
            demoted_events: default_demoted_events(),
            environment_aliases: default_environment_aliases(),
            offhours_timeperiod: "8x5".to_string(),
            resource_suffixes: vec![
                SuffixRule {
                    key: "container".to_string(),
                    style: SuffixStyle::KeyValue,
                },
                SuffixRule {
                    key: "name".to_string(),
                    style: SuffixStyle::Bare,
                },
                SuffixRule {
                    key: "job".to_string(),
                    style: SuffixStyle::KeyValue,
                },
            ],
            hpa_suffix: SuffixRule {
                key: "horizontalpodautoscaler".to_string(),
                style: SuffixStyle::Bare,
            },
            sidecar_exclusion: SidecarMatcher::Prefix("kube-rbac-proxy".to_string()),
        }
    }
}

/// Paging-system severities mapped into the monitoring vocabulary.
///
/// The two vocabularies are inverted in meaning, so `warning` from the
/// paging side lands above `info` on the monitoring side.
fn default_severity_table() -> HashMap<String, String> {
    [
        ("page", "critical"),
        ("email", "critical"),
        ("warning", "major"),
        ("info", "warning"),
        ("minor", "info"),
    ]
    .into_iter()
    .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
    .collect()
}

/// Known-chatty alert rules kept enabled but demoted below paging
fn default_demoted_events() -> HashSet<String> {
    [
        "KubeCPUOvercommit",
        "KubernetesVolumeFullInFourDays",
        "ThanosQueryGrpcClientErrorRate",
        "NodeNetworkInterfaceFlapping",
        "KubeAggregatedAPIErrors",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// 3-character spellings left over from older cluster generations
fn default_environment_aliases() -> HashMap<String, String> {
    [("pro", "prod"), ("prd", "prod")]
        .into_iter()
        .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
        .collect()
}

impl NormalizerConfig {
    /// Load configuration from an optional file plus `NORMALIZER_*`
    /// environment variables, then validate it.
    ///
    /// Fails fast so a misconfigured host never reaches the per-alert
    /// path.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("NORMALIZER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: NormalizerConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check the invariants that must hold before the engine starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_environment.trim().is_empty() {
            return Err(ConfigError::MissingField("default_environment"));
        }
        if self.eligibility_key.trim().is_empty() {
            return Err(ConfigError::MissingField("eligibility_key"));
        }
        if self.offhours_timeperiod.trim().is_empty() {
            return Err(ConfigError::MissingField("offhours_timeperiod"));
        }
        if self.alert_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                field: "alert_timeout_secs",
            });
        }
        if self.watchdog_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                field: "watchdog_timeout_secs",
            });
        }
        let suffix_keys_ok = self
            .resource_suffixes
            .iter()
            .chain(std::iter::once(&self.hpa_suffix))
            .all(|rule| !rule.key.trim().is_empty());
        if !suffix_keys_ok {
            return Err(ConfigError::MissingField("resource_suffixes.key"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NormalizerConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.eligibility_key, "peer_id");
        assert_eq!(config.alert_timeout_secs, 1800);
        assert_eq!(config.watchdog_timeout_secs, 600);
    }

    #[test]
    fn test_validate_rejects_empty_default_environment() {
        let config = NormalizerConfig {
            default_environment: String::new(),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("default_environment"))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = NormalizerConfig {
            watchdog_timeout_secs: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout {
                field: "watchdog_timeout_secs"
            })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_suffix_key() {
        let mut config = NormalizerConfig::default();
        config.resource_suffixes.push(SuffixRule {
            key: "  ".to_string(),
            style: SuffixStyle::Bare,
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sidecar_matcher_modes() {
        let exact = SidecarMatcher::Exact("kube-rbac-proxy-main".to_string());
        let prefix = SidecarMatcher::Prefix("kube-rbac-proxy".to_string());

        assert!(exact.excludes("kube-rbac-proxy-main"));
        assert!(!exact.excludes("kube-rbac-proxy-self"));
        assert!(prefix.excludes("kube-rbac-proxy-main"));
        assert!(prefix.excludes("kube-rbac-proxy-self"));
        assert!(!prefix.excludes("payments-api"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let path = std::env::temp_dir().join("normalizer-config-test.toml");
        std::fs::write(
            &path,
            r#"
default_environment = "staging"
eligibility_key = "tenant_id"
offhours_timeperiod = "12x5"
"#,
        )
        .unwrap();

        let config = NormalizerConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.default_environment, "staging");
        assert_eq!(config.eligibility_key, "tenant_id");
        assert_eq!(config.offhours_timeperiod, "12x5");
        // Untouched fields keep their defaults
        assert_eq!(config.alert_timeout_secs, 1800);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join("normalizer-config-bad.toml");
        std::fs::write(&path, "default_environment = \"\"\n").unwrap();

        let result = NormalizerConfig::load(path.to_str());
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            result,
            Err(ConfigError::MissingField("default_environment"))
        ));
    }
}
