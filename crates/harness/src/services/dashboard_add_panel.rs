//! The `dashboardAddPanel` service: the add panel flyout

use std::sync::Arc;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::header::HeaderPage;
use crate::retry::RetryService;
use crate::services::test_subjects::{saved_object_title_subject, TestSubjects};

pub struct DashboardAddPanel {
    retry: Arc<RetryService>,
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl DashboardAddPanel {
    pub fn new(retry: Arc<RetryService>, test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            retry,
            test_subjects,
            header,
        }
    }

    pub async fn is_add_panel_open(&self) -> HarnessResult<bool> {
        self.test_subjects.exists("dashboardAddPanel").await
    }

    pub async fn click_open_add_panel(&self) -> HarnessResult<()> {
        debug!("DashboardAddPanel.clickOpenAddPanel");
        self.test_subjects.click("dashboardAddPanelButton").await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn ensure_add_panel_is_showing(&self) -> HarnessResult<()> {
        debug!("DashboardAddPanel.ensureAddPanelIsShowing");
        if self.is_add_panel_open().await? {
            return Ok(());
        }
        self.retry
            .try_default(move || async move {
                self.click_open_add_panel().await?;
                if self.is_add_panel_open().await? {
                    Ok(())
                } else {
                    Err(HarnessError::not_ready("Add panel still not open, trying again."))
                }
            })
            .await
    }

    pub async fn close_add_panel(&self) -> HarnessResult<()> {
        debug!("DashboardAddPanel.closeAddPanel");
        self.test_subjects.click("euiFlyoutCloseButton").await?;
        self.test_subjects.missing_or_fail("dashboardAddPanel").await
    }

    /// Start creating a new embeddable of `embeddable_type` from the flyout.
    pub async fn click_add_new_embeddable_link(&self, embeddable_type: &str) -> HarnessResult<()> {
        debug!("DashboardAddPanel.clickAddNewEmbeddableLink({})", embeddable_type);
        let link = format!("createNew-{embeddable_type}");
        self.test_subjects.click("createNew").await?;
        self.test_subjects.click(&link).await?;
        self.test_subjects.missing_or_fail(&link).await
    }

    pub async fn filter_embeddable_names(&self, name: &str) -> HarnessResult<()> {
        self.test_subjects
            .set_value("savedObjectFinderSearchInput", name)
            .await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn add_visualization(&self, name: &str) -> HarnessResult<()> {
        debug!("DashboardAddPanel.addVisualization({})", name);
        self.add_embeddable(name).await
    }

    pub async fn add_saved_search(&self, name: &str) -> HarnessResult<()> {
        debug!("DashboardAddPanel.addSavedSearch({})", name);
        self.add_embeddable(name).await
    }

    async fn add_embeddable(&self, name: &str) -> HarnessResult<()> {
        self.ensure_add_panel_is_showing().await?;
        self.filter_embeddable_names(&format!("\"{}\"", name.replacen('-', " ", 1)))
            .await?;
        self.test_subjects
            .click(&saved_object_title_subject("savedObjectTitle", name))
            .await?;
        self.test_subjects.exists("addObjectToDashboardSuccess").await?;
        self.close_add_panel().await
    }
}
