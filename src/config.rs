use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging and metrics
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Correlation engine
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Escalation scheduler
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Notification engine and senders
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Maintenance window checks
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Entity store seeding
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("ALM_CONFIG_PATH").unwrap_or_else(|_| "config/alm.toml".to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration with an explicit override file
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: ALM_)
            .add_source(
                config::Environment::with_prefix("ALM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Enable correlation on alarm creation
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// BFS hop limit for rules without a positive traversal depth
    #[serde(default = "default_traversal_depth")]
    pub default_traversal_depth: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_traversal_depth: default_traversal_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Enable escalation scheduling
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Enable policy-driven notifications
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Webhook and Slack request timeout (seconds)
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// User-Agent header for outbound HTTP dispatch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_timeout_secs: default_webhook_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Enable maintenance window checks
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateConfig {
    /// YAML/JSON fixture with rules, policies, windows and topologies
    pub seed_path: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_traversal_depth() -> usize {
    5
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("alm-engine/{}", env!("CARGO_PKG_VERSION"))
}
