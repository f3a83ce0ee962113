//! Global header: side navigation and the loading indicator

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::services::test_subjects::TestSubjects;

pub struct HeaderPage {
    test_subjects: Arc<TestSubjects>,
}

impl HeaderPage {
    pub fn new(test_subjects: Arc<TestSubjects>) -> Self {
        Self { test_subjects }
    }

    pub async fn click_dashboard(&self) -> HarnessResult<()> {
        self.click_app_link("dashboards").await
    }

    pub async fn click_discover(&self) -> HarnessResult<()> {
        self.click_app_link("discover").await
    }

    pub async fn click_visualize(&self) -> HarnessResult<()> {
        self.click_app_link("visualize").await
    }

    pub async fn click_stack_management(&self) -> HarnessResult<()> {
        self.click_app_link("management").await
    }

    /// Open the collapsible navigation if needed and follow an app link.
    async fn click_app_link(&self, app: &str) -> HarnessResult<()> {
        debug!("Header.clickAppLink({})", app);
        let link = format!("collapsibleNavAppLink-{app}");
        if !self.test_subjects.exists(&link).await? {
            self.test_subjects.click("toggleNavButton").await?;
        }
        self.test_subjects.click(&link).await?;
        self.wait_until_loading_has_finished().await
    }

    pub async fn wait_until_loading_has_finished(&self) -> HarnessResult<()> {
        self.test_subjects.find("globalLoadingIndicator-hidden").await?;
        Ok(())
    }

    pub async fn is_global_loading_indicator_visible(&self) -> HarnessResult<bool> {
        Ok(!self.test_subjects.find_all("globalLoadingIndicator").await?.is_empty())
    }
}
