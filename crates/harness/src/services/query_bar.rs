//! The `queryBar` service

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

pub struct QueryBar {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl QueryBar {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    pub async fn set_query(&self, query: &str) -> HarnessResult<()> {
        debug!("QueryBar.setQuery({})", query);
        self.test_subjects.set_value("queryInput", query).await
    }

    pub async fn submit_query(&self) -> HarnessResult<()> {
        debug!("QueryBar.submitQuery");
        self.test_subjects.click("querySubmitButton").await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn get_query_string(&self) -> HarnessResult<String> {
        self.test_subjects.get_visible_text("queryInput").await
    }
}
