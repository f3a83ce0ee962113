//! Access to the application's persisted UI settings
//!
//! Scenarios flip feature flags (for example `discover:v2` or
//! `visualize:enableLabs`) through [`SettingsGateway`]. Writes are
//! acknowledged by the store before the call returns; the new value becomes
//! visible to the application on its next read, so callers usually refresh
//! the page afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};

/// A single setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Number(n) => write!(f, "{n}"),
            SettingValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Number(value.into())
    }
}

/// Setting key to value
pub type SettingsKv = BTreeMap<String, SettingValue>;

/// Build a [`SettingsKv`] from pairs.
pub fn settings_kv<I, K, V>(pairs: I) -> SettingsKv
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<SettingValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Durable key/value store behind the application's advanced settings.
#[async_trait]
pub trait UiSettingsStore: Send + Sync {
    /// Apply a batch of changes. `None` removes the user value, reverting
    /// the key to its default.
    async fn apply(&self, changes: BTreeMap<String, Option<SettingValue>>) -> HarnessResult<()>;

    /// Current user-provided values. Keys at their default are absent.
    async fn user_values(&self) -> HarnessResult<SettingsKv>;
}

/// The `uiSettings` service used by scenarios and workflows
pub struct SettingsGateway {
    store: Arc<dyn UiSettingsStore>,
}

impl SettingsGateway {
    pub fn new(store: Arc<dyn UiSettingsStore>) -> Self {
        Self { store }
    }

    /// Override the given keys; other keys are left untouched.
    pub async fn replace(&self, kv: SettingsKv) -> HarnessResult<()> {
        if kv.is_empty() {
            return Ok(());
        }
        info!("Replacing ui settings: {:?}", kv);
        let changes = kv.into_iter().map(|(k, v)| (k, Some(v))).collect();
        self.store.apply(changes).await
    }

    /// Revert the given keys to their defaults.
    pub async fn clear(&self, keys: &[&str]) -> HarnessResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        info!("Clearing ui settings: {:?}", keys);
        let changes = keys.iter().map(|k| (k.to_string(), None)).collect();
        self.store.apply(changes).await
    }

    /// User value of `key`, `None` when the key is at its default.
    pub async fn get(&self, key: &str) -> HarnessResult<Option<SettingValue>> {
        let mut values = self.store.user_values().await?;
        let value = values.remove(key);
        debug!("ui setting {} = {:?}", key, value);
        Ok(value)
    }

    /// Apply the configured defaults before a run.
    pub async fn apply_defaults(&self, defaults: &SettingsKv) -> HarnessResult<()> {
        self.replace(defaults.clone()).await
    }
}

/// Settings store backed by the application's HTTP settings API
pub struct HttpUiSettings {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SettingsResponse {
    #[serde(default)]
    settings: BTreeMap<String, SettingEntry>,
}

#[derive(Debug, Deserialize)]
struct SettingEntry {
    #[serde(rename = "userValue")]
    user_value: Option<serde_json::Value>,
}

impl HttpUiSettings {
    pub fn new(base_url: &str) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/api/opensearch-dashboards/settings",
                base_url.trim_end_matches('/')
            ),
        })
    }

    async fn check(resp: reqwest::Response) -> HarnessResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(HarnessError::Settings(format!("{status}: {body}")))
    }
}

fn changes_body(changes: &BTreeMap<String, Option<SettingValue>>) -> serde_json::Value {
    serde_json::json!({ "changes": changes })
}

fn parse_user_values(body: &str) -> HarnessResult<SettingsKv> {
    let response: SettingsResponse = serde_json::from_str(body)?;
    let mut values = SettingsKv::new();
    for (key, entry) in response.settings {
        let Some(raw) = entry.user_value else { continue };
        if raw.is_null() {
            continue;
        }
        let value: SettingValue = serde_json::from_value(raw).map_err(|e| {
            HarnessError::Settings(format!("unsupported value for '{key}': {e}"))
        })?;
        values.insert(key, value);
    }
    Ok(values)
}

#[async_trait]
impl UiSettingsStore for HttpUiSettings {
    async fn apply(&self, changes: BTreeMap<String, Option<SettingValue>>) -> HarnessResult<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("osd-xsrf", "ftr")
            .json(&changes_body(&changes))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn user_values(&self) -> HarnessResult<SettingsKv> {
        let resp = self.client.get(&self.endpoint).send().await?;
        let body = Self::check(resp).await?.text().await?;
        parse_user_values(&body)
    }
}

/// Settings store kept in memory
#[derive(Default)]
pub struct InMemorySettingsStore {
    values: Mutex<SettingsKv>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read for in-process collaborators.
    pub fn value(&self, key: &str) -> Option<SettingValue> {
        self.values.lock().get(key).cloned()
    }
}

#[async_trait]
impl UiSettingsStore for InMemorySettingsStore {
    async fn apply(&self, changes: BTreeMap<String, Option<SettingValue>>) -> HarnessResult<()> {
        let mut values = self.values.lock();
        for (key, change) in changes {
            match change {
                Some(value) => values.insert(key, value),
                None => values.remove(&key),
            };
        }
        Ok(())
    }

    async fn user_values(&self) -> HarnessResult<SettingsKv> {
        Ok(self.values.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> (SettingsGateway, Arc<InMemorySettingsStore>) {
        let store = Arc::new(InMemorySettingsStore::new());
        (SettingsGateway::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_replace_then_read() {
        let (settings, _) = gateway();
        settings
            .replace(settings_kv([("discover:v2", false)]))
            .await
            .unwrap();
        assert_eq!(
            settings.get("discover:v2").await.unwrap(),
            Some(SettingValue::Bool(false))
        );
    }

    #[tokio::test]
    async fn test_clear_reverts_to_default() {
        let (settings, store) = gateway();
        settings
            .replace(settings_kv([("visualize:enableLabs", false)]))
            .await
            .unwrap();
        settings.clear(&["visualize:enableLabs"]).await.unwrap();
        assert_eq!(settings.get("visualize:enableLabs").await.unwrap(), None);
        assert!(store.value("visualize:enableLabs").is_none());
    }

    #[tokio::test]
    async fn test_writes_are_idempotent() {
        let (settings, store) = gateway();
        let kv = settings_kv([("dateFormat:tz", "UTC")]);
        settings.replace(kv.clone()).await.unwrap();
        settings.replace(kv).await.unwrap();
        settings.clear(&["never:set"]).await.unwrap();
        settings.clear(&["never:set"]).await.unwrap();
        assert_eq!(store.value("dateFormat:tz"), Some("UTC".into()));
    }

    #[tokio::test]
    async fn test_replace_merges() {
        let (settings, store) = gateway();
        settings.replace(settings_kv([("a", 1i64)])).await.unwrap();
        settings.replace(settings_kv([("b", true)])).await.unwrap();
        assert_eq!(store.value("a"), Some(SettingValue::from(1i64)));
        assert_eq!(store.value("b"), Some(SettingValue::Bool(true)));
    }

    #[test]
    fn test_changes_body_uses_null_for_clear() {
        let mut changes = BTreeMap::new();
        changes.insert("discover:v2".to_string(), Some(SettingValue::Bool(false)));
        changes.insert("visualize:enableLabs".to_string(), None);
        let body = changes_body(&changes);
        assert_eq!(
            body,
            serde_json::json!({
                "changes": { "discover:v2": false, "visualize:enableLabs": null }
            })
        );
    }

    #[test]
    fn test_parse_user_values_skips_defaults() {
        let body = r#"{
            "settings": {
                "buildNum": { "readonly": true, "userValue": 9007199254740991 },
                "discover:v2": { "userValue": false },
                "defaultIndex": { "userValue": "logstash-*" },
                "theme:darkMode": {}
            }
        }"#;
        let values = parse_user_values(body).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values.get("discover:v2"), Some(&SettingValue::Bool(false)));
        assert!(!values.contains_key("theme:darkMode"));
    }
}
