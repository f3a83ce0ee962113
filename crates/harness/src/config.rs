//! Harness configuration

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};
use crate::settings::SettingValue;

/// Top-level configuration, usually loaded from `ftr.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FtrConfig {
    /// Application under test
    pub app: AppConfig,

    /// Browser automation endpoint
    pub webdriver: WebDriverConfig,

    /// Retry and lookup budgets
    pub timeouts: TimeoutConfig,

    /// Suite execution
    pub run: RunConfig,

    /// Settings applied before scenarios start
    pub ui_settings: BTreeMap<String, SettingValue>,
}

impl FtrConfig {
    /// Parse a configuration from TOML
    pub fn from_toml(content: &str) -> HarnessResult<Self> {
        let config: FtrConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !self.app.base_url.starts_with("http://") && !self.app.base_url.starts_with("https://") {
            return Err(HarnessError::Config(format!(
                "app.base_url must be an http(s) URL, got '{}'",
                self.app.base_url
            )));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(HarnessError::Config(
                "timeouts.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL, e.g. `http://localhost:5601`
    pub base_url: String,

    /// Path of each app below the base URL, keyed by app name
    pub apps: BTreeMap<String, String>,

    /// Index pattern every scenario's data is read from
    pub default_index: String,
}

impl AppConfig {
    /// URL of an app, falling back to `/app/<name>` for unknown names.
    pub fn app_url(&self, app: &str) -> String {
        let path = self
            .apps
            .get(app)
            .cloned()
            .unwrap_or_else(|| format!("/app/{app}"));
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let apps = [
            ("dashboards", "/app/dashboards"),
            ("discover", "/app/discover"),
            ("visualize", "/app/visualize"),
            ("management", "/app/management"),
            ("settings", "/app/management/opensearch-dashboards/settings"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), path.to_string()))
        .collect();

        Self {
            base_url: "http://localhost:5601".to_string(),
            apps,
            default_index: "logstash-*".to_string(),
        }
    }
}

/// WebDriver endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Remote end URL (chromedriver, geckodriver, selenium)
    pub url: String,

    /// Browser name sent in the session capabilities
    pub browser: String,

    pub headless: bool,

    pub window_width: u32,
    pub window_height: u32,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9515".to_string(),
            browser: "chrome".to_string(),
            headless: true,
            window_width: 1600,
            window_height: 1000,
        }
    }
}

/// Retry budgets in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Budget for locating a single element
    pub find_ms: u64,

    /// How long an existence check waits before answering `false`
    pub exists_ms: u64,

    /// Default budget of `retry.try`
    pub try_ms: u64,

    /// Default budget of `retry.wait_for`
    pub wait_for_ms: u64,

    /// Sleep between attempts
    pub poll_interval_ms: u64,
}

impl TimeoutConfig {
    pub fn find_timeout(&self) -> Duration {
        Duration::from_millis(self.find_ms)
    }

    pub fn exists_timeout(&self) -> Duration {
        Duration::from_millis(self.exists_ms)
    }

    pub fn try_timeout(&self) -> Duration {
        Duration::from_millis(self.try_ms)
    }

    pub fn wait_for_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_for_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            find_ms: 10_000,
            exists_ms: 2_500,
            try_ms: 120_000,
            wait_for_ms: 20_000,
            poll_interval_ms: 500,
        }
    }
}

/// Suite execution options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Skip the remaining cases of a suite after its first failure
    pub bail: bool,

    /// Where `test-results.json` is written
    pub output_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bail: true,
            output_dir: "test-results".to_string(),
        }
    }
}
