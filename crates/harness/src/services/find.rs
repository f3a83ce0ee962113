//! The `find` service: element lookup with bounded waiting

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::TimeoutConfig;
use crate::driver::{Driver, ElementHandle, Selector};
use crate::error::{HarnessError, HarnessResult};
use crate::retry::{RetryPolicy, RetryService};
use crate::services::browser::BrowserService;

pub struct FindService {
    driver: Arc<dyn Driver>,
    retry: Arc<RetryService>,
    find_timeout: Duration,
    exists_timeout: Duration,
    poll_interval: Duration,
}

impl FindService {
    pub fn new(browser: &BrowserService, retry: Arc<RetryService>, timeouts: &TimeoutConfig) -> Self {
        Self {
            driver: browser.driver().clone(),
            retry,
            find_timeout: timeouts.find_timeout(),
            exists_timeout: timeouts.exists_timeout(),
            poll_interval: timeouts.poll_interval(),
        }
    }

    fn policy(&self, timeout: Duration) -> RetryPolicy {
        RetryPolicy::duration(timeout).with_poll_interval(self.poll_interval)
    }

    /// Every element currently matching, without waiting.
    pub async fn all(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        self.driver.find_elements(selector).await
    }

    /// First element matching, waiting up to the find timeout.
    pub async fn find(&self, selector: &Selector) -> HarnessResult<ElementHandle> {
        let policy = self
            .policy(self.find_timeout)
            .with_failure_message(format!("waiting for {selector}"));
        self.retry
            .try_with(&policy, move || async move {
                self.driver
                    .find_elements(selector)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| HarnessError::ElementNotFound {
                        selector: selector.to_string(),
                    })
            })
            .await
    }

    /// Whether an element shows up within the exists timeout.
    pub async fn exists(&self, selector: &Selector) -> HarnessResult<bool> {
        self.exists_with_timeout(selector, self.exists_timeout).await
    }

    pub async fn exists_with_timeout(&self, selector: &Selector, timeout: Duration) -> HarnessResult<bool> {
        let result = self
            .retry
            .try_with(&self.policy(timeout), move || async move {
                if self.driver.find_elements(selector).await?.is_empty() {
                    Err(HarnessError::ElementNotFound {
                        selector: selector.to_string(),
                    })
                } else {
                    Ok(())
                }
            })
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(HarnessError::RetryExhausted { .. }) => {
                debug!("{} does not exist", selector);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait until nothing matches `selector`; fails if it stays present.
    pub async fn missing_or_fail(&self, selector: &Selector) -> HarnessResult<()> {
        let result = self
            .retry
            .try_with(&self.policy(self.find_timeout), move || async move {
                if self.driver.find_elements(selector).await?.is_empty() {
                    Ok(())
                } else {
                    Err(HarnessError::not_ready(format!("{selector} is still present")))
                }
            })
            .await;

        match result {
            Err(HarnessError::RetryExhausted { .. }) => Err(HarnessError::assertion(format!(
                "expected {selector} to be missing"
            ))),
            other => other,
        }
    }

    /// Locate and click. Fails with `UiAction` when the element cannot be
    /// clicked within the find timeout.
    pub async fn click(&self, selector: &Selector) -> HarnessResult<()> {
        debug!("click {}", selector);
        let policy = self
            .policy(self.find_timeout)
            .with_failure_message(format!("clicking {selector}"));
        self.retry
            .try_with(&policy, move || async move {
                let element = self.first(selector).await?;
                self.driver.click(&element).await
            })
            .await
            .map_err(|e| HarnessError::ui_action(format!("click {selector}"), e))
    }

    /// Replace the value of an input.
    pub async fn set_value(&self, selector: &Selector, value: &str) -> HarnessResult<()> {
        debug!("set {} = {:?}", selector, value);
        let policy = self
            .policy(self.find_timeout)
            .with_failure_message(format!("typing into {selector}"));
        self.retry
            .try_with(&policy, move || async move {
                let element = self.first(selector).await?;
                self.driver.clear(&element).await?;
                self.driver.send_keys(&element, value).await
            })
            .await
            .map_err(|e| HarnessError::ui_action(format!("set value of {selector}"), e))
    }

    pub async fn visible_text(&self, selector: &Selector) -> HarnessResult<String> {
        let element = self.find(selector).await?;
        self.driver.text(&element).await
    }

    pub async fn attribute(&self, selector: &Selector, name: &str) -> HarnessResult<Option<String>> {
        let element = self.find(selector).await?;
        self.driver.attribute(&element, name).await
    }

    pub async fn exists_by_css_selector(&self, css: &str) -> HarnessResult<bool> {
        self.exists(&Selector::css(css)).await
    }

    pub async fn click_by_css_selector(&self, css: &str) -> HarnessResult<()> {
        self.click(&Selector::css(css)).await
    }

    async fn first(&self, selector: &Selector) -> HarnessResult<ElementHandle> {
        self.driver
            .find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarnessError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}
