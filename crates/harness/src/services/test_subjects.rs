//! The `testSubjects` service: lookups by `data-test-subj`

use std::sync::Arc;
use std::time::Duration;

use crate::driver::{ElementHandle, Selector};
use crate::error::{HarnessError, HarnessResult};
use crate::services::find::FindService;

pub struct TestSubjects {
    find: Arc<FindService>,
}

impl TestSubjects {
    pub fn new(find: Arc<FindService>) -> Self {
        Self { find }
    }

    fn selector(subject: &str) -> Selector {
        Selector::test_subject(subject)
    }

    pub async fn exists(&self, subject: &str) -> HarnessResult<bool> {
        self.find.exists(&Self::selector(subject)).await
    }

    pub async fn exists_with_timeout(&self, subject: &str, timeout: Duration) -> HarnessResult<bool> {
        self.find
            .exists_with_timeout(&Self::selector(subject), timeout)
            .await
    }

    /// First match, waiting up to the find timeout.
    pub async fn find(&self, subject: &str) -> HarnessResult<ElementHandle> {
        self.find.find(&Self::selector(subject)).await
    }

    /// Fails with an assertion error unless the subject shows up.
    pub async fn exist_or_fail(&self, subject: &str) -> HarnessResult<()> {
        if self.exists(subject).await? {
            Ok(())
        } else {
            Err(HarnessError::assertion(format!(
                "expected test subject '{subject}' to exist"
            )))
        }
    }

    pub async fn missing_or_fail(&self, subject: &str) -> HarnessResult<()> {
        self.find.missing_or_fail(&Self::selector(subject)).await
    }

    pub async fn click(&self, subject: &str) -> HarnessResult<()> {
        self.find.click(&Self::selector(subject)).await
    }

    pub async fn set_value(&self, subject: &str, value: &str) -> HarnessResult<()> {
        self.find.set_value(&Self::selector(subject), value).await
    }

    pub async fn get_visible_text(&self, subject: &str) -> HarnessResult<String> {
        self.find.visible_text(&Self::selector(subject)).await
    }

    pub async fn get_attribute(&self, subject: &str, name: &str) -> HarnessResult<Option<String>> {
        self.find.attribute(&Self::selector(subject), name).await
    }

    /// Every current match, without waiting.
    pub async fn find_all(&self, subject: &str) -> HarnessResult<Vec<ElementHandle>> {
        self.find.all(&Self::selector(subject)).await
    }

    /// Click a checkbox or switch until its `aria-checked` state is `checked`.
    pub async fn set_checkbox(&self, subject: &str, checked: bool) -> HarnessResult<()> {
        let current = self.get_attribute(subject, "aria-checked").await?;
        let is_checked = current.as_deref() == Some("true");
        if is_checked != checked {
            self.click(subject).await?;
        }
        Ok(())
    }
}

/// Test subject of a saved object title link, which uses dashes for spaces.
pub fn saved_object_title_subject(prefix: &str, title: &str) -> String {
    format!("{}{}", prefix, title.split(' ').collect::<Vec<_>>().join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_subjects_replace_spaces() {
        assert_eq!(
            saved_object_title_subject("savedObjectTitle", "my search"),
            "savedObjectTitlemy-search"
        );
        assert_eq!(
            saved_object_title_subject("dashboardListingTitleLink-", "Dashboard Panel Controls Test"),
            "dashboardListingTitleLink-Dashboard-Panel-Controls-Test"
        );
    }
}
