//! Per-run provider context
//!
//! [`FtrContext`] owns the registry for one test run. Every service and page
//! object is registered up front and constructed on first lookup.

use std::sync::Arc;

use tracing::info;

use crate::config::FtrConfig;
use crate::driver::{Driver, WebDriverClient};
use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::{
    self, CommonPage, DashboardPage, DiscoverPage, HeaderPage, SettingsPage, TimePickerPage, VisEditorPage,
    VisualizePage,
};
use crate::registry::{ProviderKind, ServiceBundle, ServiceKey, ServiceRegistry};
use crate::retry::RetryService;
use crate::services::dashboard_visualizations::DashboardVisualizationsDeps;
use crate::services::{
    self, BrowserService, DashboardAddPanel, DashboardPanelActions, DashboardVisualizations, FindService,
    ListingTable, QueryBar, TestSubjects,
};
use crate::settings::{HttpUiSettings, SettingsGateway, UiSettingsStore};

pub struct FtrContext {
    config: Arc<FtrConfig>,
    registry: ServiceRegistry,
}

impl FtrContext {
    /// Build a context over the given browser and settings backends.
    pub fn new(
        config: FtrConfig,
        driver: Arc<dyn Driver>,
        settings_store: Arc<dyn UiSettingsStore>,
    ) -> HarnessResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let registry = ServiceRegistry::new();

        registry.register_instance(services::CONFIG, config.clone())?;
        registry.register(services::BROWSER, move |_| Ok(BrowserService::new(driver.clone())))?;
        registry.register(services::UI_SETTINGS, move |_| {
            Ok(SettingsGateway::new(settings_store.clone()))
        })?;
        register_services(&registry)?;
        register_page_objects(&registry)?;

        Ok(Self { config, registry })
    }

    /// Connect to the configured WebDriver endpoint and settings API.
    pub async fn connect(config: FtrConfig) -> HarnessResult<Self> {
        info!(
            "Connecting to {} ({}) for {}",
            config.webdriver.url, config.webdriver.browser, config.app.base_url
        );
        let driver = WebDriverClient::connect(&config.webdriver).await?;
        let settings = HttpUiSettings::new(&config.app.base_url)?;
        Self::new(config, Arc::new(driver), Arc::new(settings))
    }

    pub fn config(&self) -> &FtrConfig {
        &self.config
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn get_service<T>(&self, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_kind(ProviderKind::Service, key)
    }

    pub fn get_page_object<T>(&self, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_kind(ProviderKind::PageObject, key)
    }

    fn resolve_kind<T>(&self, kind: ProviderKind, key: ServiceKey<T>) -> HarnessResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        if key.kind() != kind {
            return Err(HarnessError::UnknownService {
                kind,
                name: key.name().to_string(),
            });
        }
        self.registry.resolve(key)
    }

    /// Resolve a set of page objects by name.
    pub fn get_page_objects(&self, names: &[&str]) -> HarnessResult<ServiceBundle> {
        self.registry.resolve_many(ProviderKind::PageObject, names)
    }

    /// Apply the configured settings defaults.
    pub async fn apply_ui_settings_defaults(&self) -> HarnessResult<()> {
        let settings = self.get_service(services::UI_SETTINGS)?;
        settings.apply_defaults(&self.config.ui_settings).await
    }

    /// End the browser session.
    pub async fn shutdown(&self) -> HarnessResult<()> {
        self.get_service(services::BROWSER)?.quit().await
    }
}

fn register_services(registry: &ServiceRegistry) -> HarnessResult<()> {
    registry.register(services::RETRY, |r| {
        Ok(RetryService::new(&r.resolve(services::CONFIG)?.timeouts))
    })?;
    registry.register(services::FIND, |r| {
        let config = r.resolve(services::CONFIG)?;
        let browser = r.resolve(services::BROWSER)?;
        Ok(FindService::new(&browser, r.resolve(services::RETRY)?, &config.timeouts))
    })?;
    registry.register(services::TEST_SUBJECTS, |r| {
        Ok(TestSubjects::new(r.resolve(services::FIND)?))
    })?;
    registry.register(services::QUERY_BAR, |r| {
        Ok(QueryBar::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(services::LISTING_TABLE, |r| {
        Ok(ListingTable::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(services::DASHBOARD_ADD_PANEL, |r| {
        Ok(DashboardAddPanel::new(
            r.resolve(services::RETRY)?,
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(services::DASHBOARD_PANEL_ACTIONS, |r| {
        Ok(DashboardPanelActions::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(services::DASHBOARD_VISUALIZATIONS, |r| {
        Ok(DashboardVisualizations::new(DashboardVisualizationsDeps {
            browser: r.resolve(services::BROWSER)?,
            find: r.resolve(services::FIND)?,
            retry: r.resolve(services::RETRY)?,
            query_bar: r.resolve(services::QUERY_BAR)?,
            test_subjects: r.resolve(services::TEST_SUBJECTS)?,
            dashboard_add_panel: r.resolve(services::DASHBOARD_ADD_PANEL)?,
            ui_settings: r.resolve(services::UI_SETTINGS)?,
            dashboard: r.resolve(page_objects::DASHBOARD)?,
            visualize: r.resolve(page_objects::VISUALIZE)?,
            vis_editor: r.resolve(page_objects::VIS_EDITOR)?,
            header: r.resolve(page_objects::HEADER)?,
            discover: r.resolve(page_objects::DISCOVER)?,
            time_picker: r.resolve(page_objects::TIME_PICKER)?,
        }))
    })?;
    Ok(())
}

fn register_page_objects(registry: &ServiceRegistry) -> HarnessResult<()> {
    registry.register(page_objects::HEADER, |r| {
        Ok(HeaderPage::new(r.resolve(services::TEST_SUBJECTS)?))
    })?;
    registry.register(page_objects::COMMON, |r| {
        Ok(CommonPage::new(
            r.resolve(services::CONFIG)?.app.clone(),
            r.resolve(services::BROWSER)?,
            r.resolve(services::RETRY)?,
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::DASHBOARD, |r| {
        Ok(DashboardPage::new(
            r.resolve(services::CONFIG)?.app.default_index.clone(),
            r.resolve(services::RETRY)?,
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(services::UI_SETTINGS)?,
            r.resolve(page_objects::COMMON)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::DISCOVER, |r| {
        Ok(DiscoverPage::new(
            r.resolve(services::RETRY)?,
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::VISUALIZE, |r| {
        Ok(VisualizePage::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::COMMON)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::VIS_EDITOR, |r| {
        Ok(VisEditorPage::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::TIME_PICKER, |r| {
        Ok(TimePickerPage::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    registry.register(page_objects::SETTINGS, |r| {
        Ok(SettingsPage::new(
            r.resolve(services::TEST_SUBJECTS)?,
            r.resolve(page_objects::HEADER)?,
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDashboards;

    fn context() -> FtrContext {
        let config = FtrConfig::default();
        let app = Arc::new(FakeDashboards::new(&config.app));
        let settings = app.settings_store();
        FtrContext::new(config, app, settings).unwrap()
    }

    #[test]
    fn test_every_provider_resolves() {
        let ctx = context();
        for name in ctx.registry().names(ProviderKind::Service) {
            ctx.registry()
                .resolve_many(ProviderKind::Service, &[name.as_str()])
                .unwrap();
        }
        let pages = ctx.registry().names(ProviderKind::PageObject);
        let names: Vec<&str> = pages.iter().map(String::as_str).collect();
        let bundle = ctx.get_page_objects(&names).unwrap();
        assert_eq!(bundle.len(), 8);
    }

    #[test]
    fn test_composites_share_instances() {
        let ctx = context();
        let header = ctx.get_page_object(page_objects::HEADER).unwrap();
        let bundle = ctx.get_page_objects(&["dashboard", "header"]).unwrap();
        assert!(Arc::ptr_eq(&header, &bundle.get(page_objects::HEADER).unwrap()));
        assert!(bundle.get(page_objects::DISCOVER).is_err());
    }

    #[test]
    fn test_entry_points_check_namespace() {
        let ctx = context();
        let err = ctx.get_service(page_objects::HEADER).err().unwrap();
        assert!(matches!(
            err,
            HarnessError::UnknownService { kind: ProviderKind::Service, ref name } if name == "header"
        ));
        let err = ctx.get_page_object(services::TEST_SUBJECTS).err().unwrap();
        assert!(matches!(
            err,
            HarnessError::UnknownService { kind: ProviderKind::PageObject, .. }
        ));
        assert!(ctx.get_page_object(page_objects::HEADER).is_ok());
    }

    #[test]
    fn test_unknown_page_object() {
        let ctx = context();
        assert!(ctx.get_page_objects(&["dashboard", "canvas"]).is_err());
    }
}
