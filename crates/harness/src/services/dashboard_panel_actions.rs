//! The `dashboardPanelActions` service: a panel's context menu

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

const OPEN_CONTEXT_MENU_SUBJ: &str = "embeddablePanelContextMenuOpen";
const TOGGLE_CONTEXT_MENU_SUBJ: &str = "embeddablePanelToggleMenuIcon";
const EDIT_PANEL_SUBJ: &str = "embeddablePanelAction-editPanel";
const CLONE_PANEL_SUBJ: &str = "embeddablePanelAction-clonePanel";
const REPLACE_PANEL_SUBJ: &str = "embeddablePanelAction-replacePanel";
const REMOVE_PANEL_SUBJ: &str = "embeddablePanelAction-deletePanel";
const TOGGLE_EXPAND_PANEL_SUBJ: &str = "embeddablePanelAction-togglePanel";

/// Actions are looked up on the first panel of the dashboard.
pub struct DashboardPanelActions {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl DashboardPanelActions {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    pub async fn is_context_menu_icon_visible(&self) -> HarnessResult<bool> {
        self.test_subjects.exists(TOGGLE_CONTEXT_MENU_SUBJ).await
    }

    pub async fn is_context_menu_open(&self) -> HarnessResult<bool> {
        Ok(!self.test_subjects.find_all(OPEN_CONTEXT_MENU_SUBJ).await?.is_empty())
    }

    /// Open the context menu; a no-op when it is already open.
    pub async fn open_context_menu(&self) -> HarnessResult<()> {
        debug!("DashboardPanelActions.openContextMenu");
        if self.is_context_menu_open().await? {
            return Ok(());
        }
        self.test_subjects.click(TOGGLE_CONTEXT_MENU_SUBJ).await?;
        self.test_subjects.exist_or_fail(OPEN_CONTEXT_MENU_SUBJ).await
    }

    /// Open the panel in its app's editor.
    pub async fn click_edit(&self) -> HarnessResult<()> {
        debug!("DashboardPanelActions.clickEdit");
        self.click_action(EDIT_PANEL_SUBJ).await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn remove_panel(&self) -> HarnessResult<()> {
        debug!("DashboardPanelActions.removePanel");
        self.click_action(REMOVE_PANEL_SUBJ).await
    }

    pub async fn clone_panel(&self) -> HarnessResult<()> {
        debug!("DashboardPanelActions.clonePanel");
        self.click_action(CLONE_PANEL_SUBJ).await
    }

    pub async fn click_expand_panel_toggle(&self) -> HarnessResult<()> {
        debug!("DashboardPanelActions.clickExpandPanelToggle");
        self.click_action(TOGGLE_EXPAND_PANEL_SUBJ).await
    }

    async fn click_action(&self, subject: &str) -> HarnessResult<()> {
        self.open_context_menu().await?;
        self.test_subjects.click(subject).await
    }

    pub async fn expect_exists_edit_panel_action(&self) -> HarnessResult<()> {
        self.expect_exists(EDIT_PANEL_SUBJ).await
    }

    pub async fn expect_exists_clone_panel_action(&self) -> HarnessResult<()> {
        self.expect_exists(CLONE_PANEL_SUBJ).await
    }

    pub async fn expect_exists_replace_panel_action(&self) -> HarnessResult<()> {
        self.expect_exists(REPLACE_PANEL_SUBJ).await
    }

    pub async fn expect_exists_remove_panel_action(&self) -> HarnessResult<()> {
        self.expect_exists(REMOVE_PANEL_SUBJ).await
    }

    pub async fn expect_exists_toggle_expand_action(&self) -> HarnessResult<()> {
        self.expect_exists(TOGGLE_EXPAND_PANEL_SUBJ).await
    }

    pub async fn expect_missing_edit_panel_action(&self) -> HarnessResult<()> {
        self.expect_missing(EDIT_PANEL_SUBJ).await
    }

    /// "Duplicate" is the label of the clone action.
    pub async fn expect_missing_duplicate_panel_action(&self) -> HarnessResult<()> {
        self.expect_missing(CLONE_PANEL_SUBJ).await
    }

    pub async fn expect_missing_replace_panel_action(&self) -> HarnessResult<()> {
        self.expect_missing(REPLACE_PANEL_SUBJ).await
    }

    pub async fn expect_missing_remove_panel_action(&self) -> HarnessResult<()> {
        self.expect_missing(REMOVE_PANEL_SUBJ).await
    }

    async fn expect_exists(&self, subject: &str) -> HarnessResult<()> {
        debug!("DashboardPanelActions.expectExists({})", subject);
        self.open_context_menu().await?;
        self.test_subjects.exist_or_fail(subject).await
    }

    async fn expect_missing(&self, subject: &str) -> HarnessResult<()> {
        debug!("DashboardPanelActions.expectMissing({})", subject);
        self.open_context_menu().await?;
        self.test_subjects.missing_or_fail(subject).await
    }
}
