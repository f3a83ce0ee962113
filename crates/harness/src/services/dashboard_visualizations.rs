//! The `dashboardVisualizations` service: multi-step dashboard workflows
//!
//! Each workflow is a strict sequence of page object calls. A workflow
//! returning `Ok` only means every step ran; callers confirm the outcome by
//! querying the UI (panel count, toasts, breadcrumbs).

use std::sync::Arc;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::dashboard::DashboardPage;
use crate::page_objects::discover::DiscoverPage;
use crate::page_objects::header::HeaderPage;
use crate::page_objects::time_picker::TimePickerPage;
use crate::page_objects::vis_editor::VisEditorPage;
use crate::page_objects::visualize::{SaveVisualizationOptions, VisualizePage};
use crate::retry::{RetryPolicy, RetryService};
use crate::services::browser::BrowserService;
use crate::services::dashboard_add_panel::DashboardAddPanel;
use crate::services::find::FindService;
use crate::services::query_bar::QueryBar;
use crate::services::test_subjects::TestSubjects;
use crate::settings::{settings_kv, SettingsGateway};

/// Message of the retry that waits for the new visualization dialog
pub const NEW_VIS_DIALOG_NOT_OPEN: &str = "New Vis Dialog still not open, trying again.";

/// A saved search to create in Discover
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSearchSpec {
    pub name: String,
    /// Query submitted before saving
    pub query: Option<String>,
    /// Columns added to the document table, in order
    pub fields: Vec<String>,
}

impl SavedSearchSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A markdown visualization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownSpec {
    pub name: String,
    pub markdown: String,
}

/// Collaborators of [`DashboardVisualizations`], all resolved from the registry
pub struct DashboardVisualizationsDeps {
    pub browser: Arc<BrowserService>,
    pub find: Arc<FindService>,
    pub retry: Arc<RetryService>,
    pub query_bar: Arc<QueryBar>,
    pub test_subjects: Arc<TestSubjects>,
    pub dashboard_add_panel: Arc<DashboardAddPanel>,
    pub ui_settings: Arc<SettingsGateway>,
    pub dashboard: Arc<DashboardPage>,
    pub visualize: Arc<VisualizePage>,
    pub vis_editor: Arc<VisEditorPage>,
    pub header: Arc<HeaderPage>,
    pub discover: Arc<DiscoverPage>,
    pub time_picker: Arc<TimePickerPage>,
}

pub struct DashboardVisualizations {
    deps: DashboardVisualizationsDeps,
}

impl DashboardVisualizations {
    pub fn new(deps: DashboardVisualizationsDeps) -> Self {
        Self { deps }
    }

    /// Create a TSVB visualization from the add panel flyout and save it.
    pub async fn create_and_add_tsvb_visualization(&self, name: &str) -> HarnessResult<()> {
        debug!("createAndAddTSVBVisualization({})", name);
        let d = &self.deps;
        d.dashboard.ensure_edit_mode().await?;
        d.dashboard_add_panel.ensure_add_panel_is_showing().await?;
        d.dashboard_add_panel
            .click_add_new_embeddable_link("visualization")
            .await?;
        d.visualize.click_visual_builder().await?;
        d.visualize
            .save_visualization_expect_success(name, SaveVisualizationOptions::default())
            .await?;
        Ok(())
    }

    /// Save a search in legacy Discover. Afterwards the `saveSearchSuccess`
    /// toast is present.
    pub async fn create_saved_search(&self, search: &SavedSearchSpec) -> HarnessResult<()> {
        debug!("createSavedSearch({})", search.name);
        let d = &self.deps;

        d.ui_settings
            .replace(settings_kv([("discover:v2", false)]))
            .await?;
        d.browser.refresh().await?;
        d.header.click_discover().await?;

        d.time_picker.set_historical_data_range().await?;

        if let Some(query) = &search.query {
            d.query_bar.set_query(query).await?;
            d.query_bar.submit_query().await?;
        }

        for field in &search.fields {
            d.discover.click_field_list_item_add(field).await?;
        }

        d.discover.save_search(&search.name).await?;
        d.header.wait_until_loading_has_finished().await?;
        d.test_subjects.exists("saveSearchSuccess").await?;
        Ok(())
    }

    /// Save a search, then add it to the dashboard open in the dashboard app.
    pub async fn create_and_add_saved_search(&self, search: &SavedSearchSpec) -> HarnessResult<()> {
        debug!("createAndAddSavedSearch({})", search.name);
        let d = &self.deps;
        self.create_saved_search(search).await?;

        d.header.click_dashboard().await?;
        d.dashboard.ensure_edit_mode().await?;
        d.dashboard_add_panel.add_saved_search(&search.name).await
    }

    pub async fn click_add_visualization_button(&self) -> HarnessResult<()> {
        debug!("DashboardVisualizations.clickAddVisualizationButton");
        self.deps.test_subjects.click("addVisualizationButton").await
    }

    pub async fn is_new_vis_dialog_showing(&self) -> HarnessResult<bool> {
        debug!("DashboardVisualizations.isNewVisDialogShowing");
        self.deps.find.exists_by_css_selector(".visNewVisDialog").await
    }

    /// Click "add visualization" until the new visualization dialog shows.
    ///
    /// Gives up with `RetryExhausted` carrying [`NEW_VIS_DIALOG_NOT_OPEN`]
    /// once the default `try` budget is spent.
    pub async fn ensure_new_visualization_dialog_is_showing(&self) -> HarnessResult<()> {
        let is_showing = self.is_new_vis_dialog_showing().await?;
        debug!("DashboardVisualizations.ensureNewVisualizationDialogIsShowing:{}", is_showing);
        if is_showing {
            return Ok(());
        }

        let policy: RetryPolicy = self
            .deps
            .retry
            .default_policy()
            .with_failure_message(NEW_VIS_DIALOG_NOT_OPEN);
        self.deps
            .retry
            .try_with(&policy, move || async move {
                self.click_add_visualization_button().await?;
                let is_showing = self.is_new_vis_dialog_showing().await?;
                debug!("DashboardVisualizations.ensureNewVisualizationDialogIsShowing:{}", is_showing);
                if is_showing {
                    Ok(())
                } else {
                    Err(HarnessError::not_ready(NEW_VIS_DIALOG_NOT_OPEN))
                }
            })
            .await
    }

    /// Create a markdown visualization and return to the dashboard with it
    /// added as a panel.
    pub async fn create_and_add_markdown(&self, spec: &MarkdownSpec) -> HarnessResult<()> {
        debug!("createAndAddMarkdown({})", spec.markdown);
        let d = &self.deps;
        self.open_markdown_editor(&spec.markdown).await?;
        d.visualize
            .save_visualization_expect_success(
                &spec.name,
                SaveVisualizationOptions {
                    save_as_new: false,
                    redirect_to_origin: Some(true),
                },
            )
            .await?;
        Ok(())
    }

    /// Start a metric visualization on the second listed source and open its
    /// save dialog.
    pub async fn create_and_embed_metric(&self, name: &str) -> HarnessResult<()> {
        debug!("createAndEmbedMetric({})", name);
        let d = &self.deps;
        d.dashboard.ensure_edit_mode().await?;
        self.ensure_new_visualization_dialog_is_showing().await?;
        d.visualize.click_metric().await?;
        d.find
            .click_by_css_selector("li.euiListGroupItem:nth-of-type(2)")
            .await?;
        d.test_subjects.exists("visualizeSaveButton").await?;
        d.test_subjects.click("visualizeSaveButton").await
    }

    /// Write a markdown visualization and open its save dialog.
    pub async fn create_and_embed_markdown(&self, spec: &MarkdownSpec) -> HarnessResult<()> {
        debug!("createAndEmbedMarkdown({})", spec.markdown);
        self.open_markdown_editor(&spec.markdown).await?;
        self.deps.test_subjects.click("visualizeSaveButton").await
    }

    async fn open_markdown_editor(&self, markdown: &str) -> HarnessResult<()> {
        let d = &self.deps;
        d.dashboard.ensure_edit_mode().await?;
        self.ensure_new_visualization_dialog_is_showing().await?;
        d.visualize.click_markdown_widget().await?;
        d.vis_editor.set_markdown_txt(markdown).await?;
        d.vis_editor.click_go().await
    }
}
