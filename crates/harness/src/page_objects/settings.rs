//! Stack management: advanced settings

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

/// Toggles experimental visualizations
pub const VISUALIZE_ENABLE_LABS_SETTING: &str = "visualize:enableLabs";

pub struct SettingsPage {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl SettingsPage {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    pub async fn click_open_search_dashboards_settings(&self) -> HarnessResult<()> {
        debug!("Settings.clickOpenSearchDashboardsSettings");
        self.test_subjects.click("settings").await?;
        self.header.wait_until_loading_has_finished().await?;
        self.test_subjects.exist_or_fail("managementSettingsTitle").await
    }

    /// Flip a boolean advanced setting and save it.
    pub async fn toggle_advanced_setting_checkbox(&self, key: &str) -> HarnessResult<()> {
        debug!("Settings.toggleAdvancedSettingCheckbox({})", key);
        self.test_subjects
            .click(&format!("advancedSetting-editField-{key}"))
            .await?;
        self.save_advanced_settings().await
    }

    /// Reset an advanced setting to its default and save.
    pub async fn clear_advanced_settings(&self, key: &str) -> HarnessResult<()> {
        debug!("Settings.clearAdvancedSettings({})", key);
        self.test_subjects
            .click(&format!("advancedSetting-resetField-{key}"))
            .await?;
        self.save_advanced_settings().await
    }

    pub async fn get_advanced_setting_checkbox(&self, key: &str) -> HarnessResult<bool> {
        let checked = self
            .test_subjects
            .get_attribute(&format!("advancedSetting-editField-{key}"), "aria-checked")
            .await?;
        Ok(checked.as_deref() == Some("true"))
    }

    async fn save_advanced_settings(&self) -> HarnessResult<()> {
        self.header.wait_until_loading_has_finished().await?;
        self.test_subjects.click("advancedSetting-saveButton").await?;
        self.header.wait_until_loading_has_finished().await
    }
}
