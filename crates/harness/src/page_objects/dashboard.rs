//! Dashboard app: listing, view/edit mode and saving

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::common::CommonPage;
use crate::page_objects::header::HeaderPage;
use crate::retry::RetryService;
use crate::services::test_subjects::TestSubjects;
use crate::settings::{settings_kv, SettingsGateway};

/// Saved visualization every dashboard test data set ships with
pub const PIE_CHART_VIS_NAME: &str = "Visualization PieChart";

/// Which mode the open dashboard is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardMode {
    View,
    Edit,
    /// A single panel is expanded to fill the dashboard
    FullScreen,
}

impl fmt::Display for DashboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardMode::View => write!(f, "view"),
            DashboardMode::Edit => write!(f, "edit"),
            DashboardMode::FullScreen => write!(f, "full screen"),
        }
    }
}

/// Options of [`DashboardPage::save_dashboard`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveDashboardOptions {
    /// Wait for the save modal to disappear before returning.
    pub wait_dialog_is_closed: bool,
    /// Set the "store time with dashboard" switch; `None` leaves it alone.
    pub store_time_with_dashboard: Option<bool>,
    /// Set the "save as new" switch; `None` leaves it alone.
    pub save_as_new: Option<bool>,
}

impl Default for SaveDashboardOptions {
    fn default() -> Self {
        Self {
            wait_dialog_is_closed: true,
            store_time_with_dashboard: None,
            save_as_new: None,
        }
    }
}

pub struct DashboardPage {
    default_index: String,
    retry: Arc<RetryService>,
    test_subjects: Arc<TestSubjects>,
    ui_settings: Arc<SettingsGateway>,
    common: Arc<CommonPage>,
    header: Arc<HeaderPage>,
}

impl DashboardPage {
    pub fn new(
        default_index: String,
        retry: Arc<RetryService>,
        test_subjects: Arc<TestSubjects>,
        ui_settings: Arc<SettingsGateway>,
        common: Arc<CommonPage>,
        header: Arc<HeaderPage>,
    ) -> Self {
        Self {
            default_index,
            retry,
            test_subjects,
            ui_settings,
            common,
            header,
        }
    }

    /// Point the app at the test index pattern and open the dashboard listing.
    pub async fn init_tests(&self) -> HarnessResult<()> {
        debug!("Dashboard.initTests");
        self.ui_settings
            .replace(settings_kv([("defaultIndex", self.default_index.as_str())]))
            .await?;
        self.common.navigate_to_app("dashboards").await
    }

    /// Visit the app through the navigation so its last route is remembered
    /// when other apps link back to it.
    pub async fn preserve_cross_app_state(&self) -> HarnessResult<()> {
        debug!("Dashboard.preserveCrossAppState");
        self.common.navigate_to_app("dashboards").await?;
        self.header.click_dashboard().await
    }

    pub async fn on_dashboard_landing_page(&self) -> HarnessResult<bool> {
        self.test_subjects.exists("dashboardLandingPage").await
    }

    pub async fn goto_dashboard_landing_page(&self) -> HarnessResult<()> {
        debug!("Dashboard.gotoDashboardLandingPage");
        if self.on_dashboard_landing_page().await? {
            return Ok(());
        }
        self.test_subjects.click("breadcrumb first").await?;
        // Leaving an edited dashboard asks for confirmation.
        if self.test_subjects.exists("confirmModalConfirmButton").await? {
            self.test_subjects.click("confirmModalConfirmButton").await?;
        }
        self.header.wait_until_loading_has_finished().await?;
        self.test_subjects.exist_or_fail("dashboardLandingPage").await
    }

    pub async fn click_new_dashboard(&self) -> HarnessResult<()> {
        debug!("Dashboard.clickNewDashboard");
        self.test_subjects.click("newItemButton").await?;
        self.header.wait_until_loading_has_finished().await
    }

    /// The edit button is only offered while viewing.
    pub async fn get_is_in_view_mode(&self) -> HarnessResult<bool> {
        self.test_subjects.exists("dashboardEditMode").await
    }

    pub async fn switch_to_edit_mode(&self) -> HarnessResult<()> {
        debug!("Dashboard.switchToEditMode");
        self.test_subjects.click("dashboardEditMode").await?;
        let test_subjects = &self.test_subjects;
        self.retry
            .wait_for("dashboard to be in edit mode", move || async move {
                Ok(!test_subjects.find_all("dashboardSaveMenuItem").await?.is_empty())
            })
            .await
    }

    /// Switch to edit mode unless already editing.
    pub async fn ensure_edit_mode(&self) -> HarnessResult<()> {
        if self.get_is_in_view_mode().await? {
            self.switch_to_edit_mode().await?;
        }
        Ok(())
    }

    pub async fn mode(&self) -> HarnessResult<DashboardMode> {
        if !self.test_subjects.find_all("dashboardExpandedPanel").await?.is_empty() {
            return Ok(DashboardMode::FullScreen);
        }
        if self.get_is_in_view_mode().await? {
            Ok(DashboardMode::View)
        } else {
            Ok(DashboardMode::Edit)
        }
    }

    pub async fn get_panel_count(&self) -> HarnessResult<usize> {
        let panels = self.test_subjects.find_all("embeddablePanel").await?;
        debug!("Dashboard.getPanelCount = {}", panels.len());
        Ok(panels.len())
    }

    /// Save under `name`; the dashboard is back in view mode afterwards.
    pub async fn save_dashboard(&self, name: &str, options: SaveDashboardOptions) -> HarnessResult<()> {
        debug!("Dashboard.saveDashboard({})", name);
        self.retry
            .try_default(move || async move {
                self.enter_dashboard_title_and_click_save(name, options).await?;
                self.test_subjects.exist_or_fail("saveDashboardSuccess").await
            })
            .await?;

        let message = self.common.close_toast().await?;
        debug!("Save toast: {}", message);
        self.header.wait_until_loading_has_finished().await?;
        if options.wait_dialog_is_closed {
            self.common.wait_for_save_modal_to_close().await?;
        }
        Ok(())
    }

    async fn enter_dashboard_title_and_click_save(
        &self,
        name: &str,
        options: SaveDashboardOptions,
    ) -> HarnessResult<()> {
        if !self.test_subjects.exists("savedObjectSaveModal").await? {
            self.test_subjects.click("dashboardSaveMenuItem").await?;
        }
        self.test_subjects.find("savedObjectSaveModal").await?;
        self.test_subjects.set_value("savedObjectTitle", name).await?;
        if let Some(store_time) = options.store_time_with_dashboard {
            self.test_subjects
                .set_checkbox("storeTimeWithDashboard", store_time)
                .await?;
        }
        if let Some(save_as_new) = options.save_as_new {
            self.test_subjects
                .set_checkbox("saveAsNewCheckbox", save_as_new)
                .await?;
        }
        self.test_subjects.click("confirmSaveSavedObjectButton").await
    }

    pub async fn get_dashboard_title(&self) -> HarnessResult<String> {
        self.test_subjects.get_visible_text("breadcrumb last").await
    }

    /// Fail unless the dashboard is in `expected` mode.
    pub async fn expect_mode(&self, expected: DashboardMode) -> HarnessResult<()> {
        let actual = self.mode().await?;
        if actual == expected {
            Ok(())
        } else {
            Err(HarnessError::assertion(format!(
                "expected dashboard in {expected} mode, it is in {actual} mode"
            )))
        }
    }
}
