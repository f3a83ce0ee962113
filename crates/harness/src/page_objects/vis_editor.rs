//! Visualization editor sidebar

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

pub struct VisEditorPage {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl VisEditorPage {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    pub async fn set_markdown_txt(&self, markdown: &str) -> HarnessResult<()> {
        debug!("VisEditor.setMarkdownTxt");
        self.test_subjects.set_value("markdownTextarea", markdown).await
    }

    /// Apply pending editor changes.
    pub async fn click_go(&self) -> HarnessResult<()> {
        debug!("VisEditor.clickGo");
        self.test_subjects.click("visualizeEditorRenderButton").await?;
        self.header.wait_until_loading_has_finished().await
    }
}
