//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::collections::HashMap;

use crate::output::DisplayMode;

/// Environment variable prefix
const ENV_PREFIX: &str = "GIT_TEST_BRANCH";

/// Overrides read from `GIT_TEST_BRANCH_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Worker count from GIT_TEST_BRANCH_JOBS
    pub jobs: Option<usize>,
    /// Shell from GIT_TEST_BRANCH_SHELL
    pub shell: Option<String>,
    /// Record notes from GIT_TEST_BRANCH_NOTES
    pub notes: Option<bool>,
    /// Display mode from GIT_TEST_BRANCH_DISPLAY
    pub display: Option<DisplayMode>,
    /// Config file from GIT_TEST_BRANCH_CONFIG
    pub config_file: Option<String>,
    /// Log level from GIT_TEST_BRANCH_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from the process environment
    pub fn load() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(ENV_PREFIX)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|name| (name.to_string(), v))
            })
            .collect();

        Self {
            jobs: vars.get("JOBS").and_then(|v| v.parse().ok()),
            shell: vars.get("SHELL").filter(|v| !v.is_empty()).cloned(),
            notes: vars.get("NOTES").map(|v| parse_bool(v)),
            display: vars.get("DISPLAY").and_then(|v| DisplayMode::from_str(v)),
            config_file: vars.get("CONFIG").cloned(),
            log_level: vars.get("LOG").cloned(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
