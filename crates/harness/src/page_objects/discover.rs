//! Discover app (legacy layout)

use std::sync::Arc;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::header::HeaderPage;
use crate::retry::RetryService;
use crate::services::test_subjects::{saved_object_title_subject, TestSubjects};

pub struct DiscoverPage {
    retry: Arc<RetryService>,
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl DiscoverPage {
    pub fn new(retry: Arc<RetryService>, test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            retry,
            test_subjects,
            header,
        }
    }

    pub async fn click_new_search_button(&self) -> HarnessResult<()> {
        debug!("Discover.clickNewSearchButton");
        self.test_subjects.click("discoverNewButton").await?;
        self.header.wait_until_loading_has_finished().await
    }

    /// Add `field` as a column of the document table.
    pub async fn click_field_list_item_add(&self, field: &str) -> HarnessResult<()> {
        debug!("Discover.clickFieldListItemAdd({})", field);
        self.test_subjects.click(&format!("fieldToggle-{field}")).await
    }

    /// Save the current search and wait until the breadcrumb shows its name.
    pub async fn save_search(&self, name: &str) -> HarnessResult<()> {
        debug!("Discover.saveSearch({})", name);
        self.test_subjects.click("discoverSaveButton").await?;
        self.test_subjects.set_value("savedObjectTitle", name).await?;
        self.test_subjects.click("confirmSaveSavedObjectButton").await?;
        self.header.wait_until_loading_has_finished().await?;

        self.retry
            .wait_for(
                &format!("saved search was persisted with name {name}"),
                move || async move { Ok(self.get_current_query_name().await? == name) },
            )
            .await
    }

    pub async fn get_current_query_name(&self) -> HarnessResult<String> {
        self.test_subjects.get_visible_text("breadcrumb last").await
    }

    pub async fn open_load_saved_search_panel(&self) -> HarnessResult<()> {
        debug!("Discover.openLoadSavedSearchPanel");
        if self.test_subjects.exists("loadSearchForm").await? {
            return Ok(());
        }
        self.retry
            .try_default(move || async move {
                self.test_subjects.click("discoverOpenButton").await?;
                if self.test_subjects.exists("loadSearchForm").await? {
                    Ok(())
                } else {
                    Err(HarnessError::not_ready("load saved search panel not open yet"))
                }
            })
            .await
    }

    pub async fn close_load_saved_search_panel(&self) -> HarnessResult<()> {
        debug!("Discover.closeLoadSavedSearchPanel");
        self.test_subjects.click("euiFlyoutCloseButton").await?;
        self.test_subjects.missing_or_fail("loadSearchForm").await
    }

    /// Whether the open load panel lists a search titled `name`.
    pub async fn has_saved_search(&self, name: &str) -> HarnessResult<bool> {
        self.test_subjects
            .exists(&saved_object_title_subject("savedObjectTitle", name))
            .await
    }
}
