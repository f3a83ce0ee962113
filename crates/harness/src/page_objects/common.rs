//! App navigation and shared widgets (toasts, save modal)

use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::page_objects::header::HeaderPage;
use crate::retry::RetryService;
use crate::services::browser::BrowserService;
use crate::services::test_subjects::TestSubjects;

/// Options of [`CommonPage::navigate_to_url`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Retry until the browser reports a URL inside the requested app.
    pub ensure_current_url: bool,
    /// Force a full page load even when only the hash route changes.
    pub hard_refresh: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            ensure_current_url: true,
            hard_refresh: false,
        }
    }
}

pub struct CommonPage {
    app: AppConfig,
    browser: Arc<BrowserService>,
    retry: Arc<RetryService>,
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl CommonPage {
    pub fn new(
        app: AppConfig,
        browser: Arc<BrowserService>,
        retry: Arc<RetryService>,
        test_subjects: Arc<TestSubjects>,
        header: Arc<HeaderPage>,
    ) -> Self {
        Self {
            app,
            browser,
            retry,
            test_subjects,
            header,
        }
    }

    pub fn app_url(&self, app: &str) -> String {
        self.app.app_url(app)
    }

    pub async fn navigate_to_app(&self, app: &str) -> HarnessResult<()> {
        self.navigate_to_url(app, "", NavigateOptions::default()).await
    }

    /// Navigate to `subpath` (for example `#/create`) below an app.
    pub async fn navigate_to_url(&self, app: &str, subpath: &str, options: NavigateOptions) -> HarnessResult<()> {
        let app_url = self.app_url(app);
        let url = format!("{app_url}{subpath}");
        debug!("navigateToUrl {}", url);

        self.browser.get(&url, options.hard_refresh).await?;
        self.header.wait_until_loading_has_finished().await?;

        if options.ensure_current_url {
            let app_url = app_url.as_str();
            self.retry
                .try_default(move || async move {
                    let current = self.browser.get_current_url().await?;
                    if current.starts_with(app_url) {
                        Ok(())
                    } else {
                        Err(HarnessError::not_ready(format!(
                            "expected to be on {app_url}, browser is on {current}"
                        )))
                    }
                })
                .await?;
        }
        Ok(())
    }

    /// Close the first toast and return its text.
    pub async fn close_toast(&self) -> HarnessResult<String> {
        let title = self.test_subjects.get_visible_text("euiToastHeader").await?;
        self.test_subjects.click("toastCloseButton").await?;
        debug!("Closed toast: {}", title);
        Ok(title)
    }

    pub async fn wait_for_save_modal_to_close(&self) -> HarnessResult<()> {
        self.test_subjects.missing_or_fail("savedObjectSaveModal").await
    }
}
