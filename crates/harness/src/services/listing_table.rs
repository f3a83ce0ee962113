//! The `listingTable` service: saved object listing pages

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::{saved_object_title_subject, TestSubjects};

pub struct ListingTable {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl ListingTable {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    /// Open the item titled `name` from the `app_type` listing (e.g. `dashboard`).
    pub async fn click_item_link(&self, app_type: &str, name: &str) -> HarnessResult<()> {
        debug!("ListingTable.clickItemLink({}, {})", app_type, name);
        let subject = saved_object_title_subject(&format!("{app_type}ListingTitleLink-"), name);
        self.test_subjects.click(&subject).await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn item_exists(&self, app_type: &str, name: &str) -> HarnessResult<bool> {
        let subject = saved_object_title_subject(&format!("{app_type}ListingTitleLink-"), name);
        self.test_subjects.exists(&subject).await
    }

    pub async fn click_new_button(&self) -> HarnessResult<()> {
        self.test_subjects.click("newItemButton").await?;
        self.header.wait_until_loading_has_finished().await
    }
}
