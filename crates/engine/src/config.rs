use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use responder_common::retry::RetryPolicy;

use crate::incident::model::Severity;
use crate::workflow::orchestrator::WorkflowConfig;
use crate::workflow::policy::PolicyRule;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_coalescing_window_ms")]
    pub coalescing_window_ms: i64,
    #[serde(default = "default_stabilization_window_ms")]
    pub stabilization_window_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub attempt_backoff: BackoffConfig,
    #[serde(default)]
    pub route_retry: RouteRetryConfig,
    #[serde(default = "default_threshold")]
    pub auto_remediation_threshold: Severity,
    #[serde(default = "default_retention_ms")]
    pub retention_ms: i64,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default = "default_call_timeout_ms")]
    pub control_plane_call_timeout_ms: u64,
    /// Ordered policy rules; empty falls back to the built-in table.
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_base_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_backoff_base_ms(),
            max_delay_ms: default_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRetryConfig {
    #[serde(default = "default_route_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub max_delay_ms: u64,
}

impl Default for RouteRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_route_attempts(),
            base_delay_ms: default_backoff_base_ms(),
            max_delay_ms: default_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

fn default_coalescing_window_ms() -> i64 {
    10_000
}

fn default_stabilization_window_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_route_attempts() -> u32 {
    5
}

fn default_threshold() -> Severity {
    Severity::Warning
}

fn default_retention_ms() -> i64 {
    24 * 60 * 60 * 1_000
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_namespace() -> String {
    "apps".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalescing_window_ms: default_coalescing_window_ms(),
            stabilization_window_ms: default_stabilization_window_ms(),
            max_attempts: default_max_attempts(),
            attempt_backoff: BackoffConfig::default(),
            route_retry: RouteRetryConfig::default(),
            auto_remediation_threshold: default_threshold(),
            retention_ms: default_retention_ms(),
            target: TargetConfig::default(),
            control_plane_call_timeout_ms: default_call_timeout_ms(),
            policies: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            max_attempts: self.max_attempts,
            attempt_backoff: RetryPolicy {
                max_attempts: self.max_attempts,
                base_delay: Duration::from_millis(self.attempt_backoff.base_delay_ms),
                max_delay: Duration::from_millis(self.attempt_backoff.max_delay_ms),
                jitter_fraction: 0.1,
            },
            stabilization_window: Duration::from_millis(self.stabilization_window_ms),
            default_namespace: self.target.namespace.clone(),
        }
    }

    pub fn route_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.route_retry.max_attempts,
            base_delay: Duration::from_millis(self.route_retry.base_delay_ms),
            max_delay: Duration::from_millis(self.route_retry.max_delay_ms),
            jitter_fraction: 0.1,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.control_plane_call_timeout_ms)
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<EngineConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<EngineConfig, LoadError> {
    let cfg: EngineConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &EngineConfig) -> Result<(), LoadError> {
    if cfg.coalescing_window_ms <= 0 {
        return Err(LoadError::Validation(
            "coalescing_window_ms must be > 0".into(),
        ));
    }
    if cfg.stabilization_window_ms == 0 {
        return Err(LoadError::Validation(
            "stabilization_window_ms must be > 0".into(),
        ));
    }
    if cfg.max_attempts == 0 {
        return Err(LoadError::Validation("max_attempts must be > 0".into()));
    }
    if cfg.route_retry.max_attempts == 0 {
        return Err(LoadError::Validation(
            "route_retry.max_attempts must be > 0".into(),
        ));
    }
    if cfg.target.namespace.is_empty() {
        return Err(LoadError::Validation(
            "target.namespace must not be empty".into(),
        ));
    }
    for rule in &cfg.policies {
        if rule.actions.is_empty() {
            return Err(LoadError::Validation(format!(
                "policy rule {:?} has no actions",
                rule.name
            )));
        }
    }
    Ok(())
}
