use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::{DEFAULT_SERVER_SCRIPT, DEFAULT_SETTLE_MS, SessionOptions};
use crate::navigation::navigator::NavigatorConfig;

pub const DEFAULT_CONFIG_PATH: &str = "portal-nav.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "portal-nav",
    version,
    about = "Page-graph navigation for browser-driven portal tests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: portal-nav.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run navigation specs against a site map
    Run {
        /// Site map YAML declaring the page graph
        #[arg(long)]
        site: String,

        /// Spec YAML file or directory of YAML files
        #[arg(long)]
        spec: String,

        /// Origin that `open` steps load page paths on
        #[arg(long)]
        base_url: Option<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a site map and print its prerequisite forest
    Graph {
        /// Site map YAML declaring the page graph
        #[arg(long)]
        site: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `portal-nav.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserConfig {
    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            server_script: default_server_script(),
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub output: Option<String>,
}

fn default_server_script() -> String {
    DEFAULT_SERVER_SCRIPT.to_string()
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

pub fn build_session_options(config: &AppConfig) -> SessionOptions {
    SessionOptions {
        server_script: config.browser.server_script.clone(),
        settle_ms: config.browser.settle_ms,
    }
}

/// Navigator settings with the CLI base URL taking precedence.
pub fn build_navigator_config(config: &AppConfig, base_url: Option<&str>) -> NavigatorConfig {
    NavigatorConfig {
        base_url: base_url
            .map(|s| s.to_string())
            .or_else(|| config.navigator.base_url.clone()),
        ..config.navigator.clone()
    }
}
