//! Visualize app: type chooser and saving

use std::sync::Arc;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::common::CommonPage;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

/// Options of [`VisualizePage::save_visualization_expect_success`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveVisualizationOptions {
    /// Save a copy instead of overwriting the loaded visualization.
    pub save_as_new: bool,
    /// Return to the dashboard the editor was opened from. `None` keeps the
    /// app's default; ignored when the editor was not opened from another app.
    pub redirect_to_origin: Option<bool>,
}

pub struct VisualizePage {
    test_subjects: Arc<TestSubjects>,
    common: Arc<CommonPage>,
    header: Arc<HeaderPage>,
}

impl VisualizePage {
    pub fn new(test_subjects: Arc<TestSubjects>, common: Arc<CommonPage>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            common,
            header,
        }
    }

    pub async fn click_new_visualization(&self) -> HarnessResult<()> {
        self.test_subjects.click("newItemButton").await
    }

    /// TSVB
    pub async fn click_visual_builder(&self) -> HarnessResult<()> {
        self.click_vis_type("metrics").await
    }

    pub async fn click_markdown_widget(&self) -> HarnessResult<()> {
        self.click_vis_type("markdown").await
    }

    pub async fn click_metric(&self) -> HarnessResult<()> {
        self.click_vis_type("metric").await
    }

    async fn click_vis_type(&self, vis_type: &str) -> HarnessResult<()> {
        debug!("Visualize.clickVisType({})", vis_type);
        self.test_subjects.click(&format!("visType-{vis_type}")).await?;
        self.header.wait_until_loading_has_finished().await
    }

    /// Save under `name` and fail unless the success toast appears.
    /// Returns the toast text.
    pub async fn save_visualization_expect_success(
        &self,
        name: &str,
        options: SaveVisualizationOptions,
    ) -> HarnessResult<String> {
        debug!("Visualize.saveVisualization({}, {:?})", name, options);
        if !self.test_subjects.exists("savedObjectSaveModal").await? {
            self.test_subjects.click("visualizeSaveButton").await?;
        }
        self.test_subjects.set_value("savedObjectTitle", name).await?;
        if options.save_as_new {
            self.test_subjects.set_checkbox("saveAsNewCheckbox", true).await?;
        }
        if let Some(redirect) = options.redirect_to_origin {
            if self.test_subjects.exists("returnToOriginModeSwitch").await? {
                self.test_subjects
                    .set_checkbox("returnToOriginModeSwitch", redirect)
                    .await?;
            }
        }
        self.test_subjects.click("confirmSaveSavedObjectButton").await?;
        self.test_subjects.exist_or_fail("saveVisualizationSuccess").await?;

        let message = self.common.close_toast().await?;
        self.header.wait_until_loading_has_finished().await?;
        self.common.wait_for_save_modal_to_close().await?;
        if message.is_empty() {
            return Err(HarnessError::assertion(format!(
                "expected a save toast for visualization '{name}'"
            )));
        }
        Ok(message)
    }
}
