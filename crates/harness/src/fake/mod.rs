//! In-memory stand-in for the application under test
//!
//! [`FakeDashboards`] implements [`Driver`] over a small model of the
//! dashboards, discover, visualize and advanced settings apps, and shares an
//! [`InMemorySettingsStore`] with the settings gateway. Scenarios run against
//! it exactly as they would against a browser.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::AppConfig;
use crate::driver::{Driver, ElementHandle, Selector};
use crate::error::{HarnessError, HarnessResult};
use crate::settings::{InMemorySettingsStore, UiSettingsStore};

mod app;

use app::{AppState, Effect, Element, ElementKey};

/// Knobs for the fake's timing quirks
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeOptions {
    /// Element lookups answered with only the loading indicator after each
    /// navigation
    pub loading_polls: u32,
    /// Clicks on "add visualization" that are swallowed before the dialog
    /// opens
    pub dropped_add_visualization_clicks: u32,
}

pub struct FakeDashboards {
    state: Mutex<AppState>,
    settings: Arc<InMemorySettingsStore>,
}

impl FakeDashboards {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_options(config, FakeOptions::default())
    }

    pub fn with_options(config: &AppConfig, options: FakeOptions) -> Self {
        let settings = Arc::new(InMemorySettingsStore::new());
        Self {
            state: Mutex::new(AppState::new(config, options, settings.clone())),
            settings,
        }
    }

    /// Settings store backing the app's advanced settings
    pub fn settings_store(&self) -> Arc<InMemorySettingsStore> {
        self.settings.clone()
    }

    /// Titles of the panels on the open dashboard
    pub fn panel_titles(&self) -> Vec<String> {
        self.state.lock().panel_titles()
    }

    /// Columns stored with a saved search
    pub fn saved_search_columns(&self, title: &str) -> Option<Vec<String>> {
        self.state.lock().saved_search_columns(title)
    }

    pub fn saved_visualization_titles(&self) -> Vec<String> {
        self.state.lock().saved_visualization_titles()
    }

    /// Start and end of the time picker
    pub fn time_range(&self) -> (String, String) {
        self.state.lock().time_range()
    }

    /// How many times the browser session was ended
    pub fn quit_count(&self) -> u32 {
        self.state.lock().quits()
    }

    /// Element behind `handle` on the page as currently rendered
    fn resolve(state: &AppState, handle: &ElementHandle) -> HarnessResult<(Element, usize)> {
        let (key, index) = decode_handle(handle).ok_or_else(|| stale(handle))?;
        state
            .render()
            .into_iter()
            .filter(|element| element.key == key)
            .nth(index)
            .map(|element| (element, index))
            .ok_or_else(|| stale(handle))
    }
}

#[async_trait]
impl Driver for FakeDashboards {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        trace!("fake navigate {}", url);
        self.state.lock().load(url)
    }

    async fn current_url(&self) -> HarnessResult<String> {
        Ok(self.state.lock().current_url())
    }

    async fn refresh(&self) -> HarnessResult<()> {
        let mut state = self.state.lock();
        let url = state.current_url();
        state.load(&url)
    }

    async fn find_elements(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let elements = self.state.lock().poll();
        let mut counts: Vec<(ElementKey, usize)> = Vec::new();
        let mut handles = Vec::new();
        for element in elements {
            let index = match counts.iter_mut().find(|(key, _)| *key == element.key) {
                Some((_, count)) => {
                    *count += 1;
                    *count - 1
                }
                None => {
                    counts.push((element.key.clone(), 1));
                    0
                }
            };
            if matches(selector, &element.key) {
                handles.push(encode_handle(&element.key, index));
            }
        }
        Ok(handles)
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        trace!("fake click {}", element.0);
        let effect = {
            let mut state = self.state.lock();
            let (found, index) = Self::resolve(&state, element)?;
            state.click(&found.key, index)?
        };
        match effect {
            Effect::None => Ok(()),
            Effect::ApplySettings(changes) => self.settings.apply(changes).await,
        }
    }

    async fn clear(&self, element: &ElementHandle) -> HarnessResult<()> {
        let mut state = self.state.lock();
        let subject = Self::input_subject(&state, element)?;
        state.clear_input(&subject)
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> HarnessResult<()> {
        let mut state = self.state.lock();
        let subject = Self::input_subject(&state, element)?;
        state.type_into(&subject, text)
    }

    async fn text(&self, element: &ElementHandle) -> HarnessResult<String> {
        let state = self.state.lock();
        Ok(Self::resolve(&state, element)?.0.text)
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> HarnessResult<Option<String>> {
        let state = self.state.lock();
        let (found, _) = Self::resolve(&state, element)?;
        Ok(match name {
            "aria-checked" => found.checked.map(|checked| checked.to_string()),
            "value" => Some(found.text),
            "data-test-subj" => match found.key {
                ElementKey::Subject(subject) => Some(subject),
                ElementKey::Css(_) => None,
            },
            _ => None,
        })
    }

    async fn is_displayed(&self, element: &ElementHandle) -> HarnessResult<bool> {
        let state = self.state.lock();
        Ok(Self::resolve(&state, element).is_ok())
    }

    async fn quit(&self) -> HarnessResult<()> {
        self.state.lock().quit();
        Ok(())
    }
}

impl FakeDashboards {
    fn input_subject(state: &AppState, element: &ElementHandle) -> HarnessResult<String> {
        match Self::resolve(state, element)?.0.key {
            ElementKey::Subject(subject) => Ok(subject),
            ElementKey::Css(css) => Err(HarnessError::Driver {
                code: "element not interactable".to_string(),
                message: format!("{css} does not accept input"),
            }),
        }
    }
}

/// Only the innermost part of a nested test subject selector is matched;
/// the fake has no element tree.
fn matches(selector: &Selector, key: &ElementKey) -> bool {
    match (selector, key) {
        (Selector::Css(wanted), ElementKey::Css(css)) => wanted == css,
        (Selector::TestSubject(wanted), ElementKey::Subject(subject)) => {
            let innermost = wanted.rsplit('>').next().unwrap_or("").trim();
            match innermost.strip_prefix('~') {
                Some(word) => subject.split_whitespace().any(|w| w == word),
                None => innermost == subject,
            }
        }
        _ => false,
    }
}

fn encode_handle(key: &ElementKey, index: usize) -> ElementHandle {
    match key {
        ElementKey::Subject(subject) => ElementHandle(format!("subj:{subject}#{index}")),
        ElementKey::Css(css) => ElementHandle(format!("css:{css}#{index}")),
    }
}

fn decode_handle(handle: &ElementHandle) -> Option<(ElementKey, usize)> {
    let (key, index) = handle.0.rsplit_once('#')?;
    let index = index.parse().ok()?;
    if let Some(subject) = key.strip_prefix("subj:") {
        Some((ElementKey::Subject(subject.to_string()), index))
    } else {
        key.strip_prefix("css:")
            .map(|css| (ElementKey::Css(css.to_string()), index))
    }
}

fn stale(handle: &ElementHandle) -> HarnessError {
    HarnessError::Driver {
        code: "stale element reference".to_string(),
        message: format!("{} is no longer attached to the page", handle.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingValue;

    fn app() -> FakeDashboards {
        FakeDashboards::new(&AppConfig::default())
    }

    async fn click(app: &FakeDashboards, subject: &str) {
        let handles = app
            .find_elements(&Selector::test_subject(subject))
            .await
            .unwrap();
        let handle = handles.first().unwrap_or_else(|| panic!("{subject} not on page"));
        app.click(handle).await.unwrap();
    }

    async fn present(app: &FakeDashboards, subject: &str) -> bool {
        !app.find_elements(&Selector::test_subject(subject))
            .await
            .unwrap()
            .is_empty()
    }

    #[tokio::test]
    async fn test_blank_until_navigated() {
        let app = app();
        assert_eq!(app.current_url().await.unwrap(), "about:blank");
        assert!(!present(&app, "globalLoadingIndicator-hidden").await);
    }

    #[tokio::test]
    async fn test_new_dashboard_url_roundtrips() {
        let app = app();
        app.navigate("http://localhost:5601/app/dashboards").await.unwrap();
        assert!(present(&app, "dashboardLandingPage").await);
        click(&app, "newItemButton").await;
        let url = app.current_url().await.unwrap();
        assert_eq!(
            url,
            "http://localhost:5601/app/dashboards#/create?_a=(viewMode:edit)"
        );
        app.refresh().await.unwrap();
        assert!(present(&app, "dashboardSaveMenuItem").await);
    }

    #[tokio::test]
    async fn test_loading_indicator_hides_page() {
        let app = FakeDashboards::with_options(
            &AppConfig::default(),
            FakeOptions {
                loading_polls: 2,
                ..Default::default()
            },
        );
        app.navigate("http://localhost:5601/app/dashboards").await.unwrap();
        assert!(present(&app, "globalLoadingIndicator").await);
        assert!(!present(&app, "dashboardLandingPage").await);
        assert!(present(&app, "dashboardLandingPage").await);
    }

    #[tokio::test]
    async fn test_handle_goes_stale_after_navigation() {
        let app = app();
        app.navigate("http://localhost:5601/app/dashboards").await.unwrap();
        let handle = app
            .find_elements(&Selector::test_subject("dashboardLandingPage"))
            .await
            .unwrap()
            .remove(0);
        app.navigate("http://localhost:5601/app/discover").await.unwrap();
        let err = app.click(&handle).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_word_and_nested_subject_matching() {
        let app = app();
        app.navigate("http://localhost:5601/app/dashboards").await.unwrap();
        assert!(present(&app, "~breadcrumb").await);
        assert!(present(&app, "globalHeader > breadcrumb last").await);
        assert!(!present(&app, "breadcrumb").await);
    }

    #[tokio::test]
    async fn test_add_panel_filters_saved_objects() {
        let app = app();
        app.navigate("http://localhost:5601/app/dashboards#/create").await.unwrap();
        click(&app, "dashboardAddPanelButton").await;
        let input = app
            .find_elements(&Selector::test_subject("savedObjectFinderSearchInput"))
            .await
            .unwrap()
            .remove(0);
        app.send_keys(&input, "\"Visualization PieChart\"").await.unwrap();
        assert!(present(&app, "savedObjectTitleVisualization-PieChart").await);
        assert!(!present(&app, "savedObjectTitleVisualization-MetricChart").await);

        click(&app, "savedObjectTitleVisualization-PieChart").await;
        assert!(present(&app, "addObjectToDashboardSuccess").await);
        assert_eq!(app.panel_titles(), vec!["Visualization PieChart".to_string()]);
    }

    #[tokio::test]
    async fn test_saving_advanced_settings_writes_store() {
        let app = app();
        app.navigate("http://localhost:5601/app/management/opensearch-dashboards/settings")
            .await
            .unwrap();
        let field = "advancedSetting-editField-visualize:enableLabs";
        let handle = app
            .find_elements(&Selector::test_subject(field))
            .await
            .unwrap()
            .remove(0);
        assert_eq!(
            app.attribute(&handle, "aria-checked").await.unwrap().as_deref(),
            Some("true")
        );
        assert!(!present(&app, "advancedSetting-saveButton").await);

        click(&app, field).await;
        click(&app, "advancedSetting-saveButton").await;
        assert_eq!(
            app.settings_store().value("visualize:enableLabs"),
            Some(SettingValue::Bool(false))
        );

        click(&app, "advancedSetting-resetField-visualize:enableLabs").await;
        click(&app, "advancedSetting-saveButton").await;
        assert!(app.settings_store().value("visualize:enableLabs").is_none());
    }

    #[tokio::test]
    async fn test_discover_layout_follows_setting() {
        let app = app();
        app.navigate("http://localhost:5601/app/discover").await.unwrap();
        assert!(present(&app, "dscCanvas").await);
        assert!(!present(&app, "discoverSaveButton").await);

        app.settings_store()
            .apply([("discover:v2".to_string(), Some(SettingValue::Bool(false)))].into())
            .await
            .unwrap();
        app.refresh().await.unwrap();
        assert!(present(&app, "discoverSaveButton").await);
    }

    #[test]
    fn test_handle_codec() {
        let key = ElementKey::Css("li.euiListGroupItem:nth-of-type(2)".to_string());
        let handle = encode_handle(&key, 3);
        assert_eq!(decode_handle(&handle), Some((key, 3)));
        assert_eq!(decode_handle(&ElementHandle("garbage".to_string())), None);
    }
}
