//! The `browser` service: navigation on top of the active driver

use std::sync::Arc;

use reqwest::Url;
use tracing::debug;

use crate::driver::Driver;
use crate::error::{HarnessError, HarnessResult};

/// Query parameter that forces the browser to reload instead of reusing the
/// in-app route.
const HARD_REFRESH_PARAM: &str = "_t";

pub struct BrowserService {
    driver: Arc<dyn Driver>,
}

impl BrowserService {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub async fn get_current_url(&self) -> HarnessResult<String> {
        self.driver.current_url().await
    }

    /// Navigate to `url`. With `include_timestamp_for_hard_refresh` a
    /// timestamp is added to the query so the page is fully reloaded even
    /// when only the hash route would otherwise change.
    pub async fn get(&self, url: &str, include_timestamp_for_hard_refresh: bool) -> HarnessResult<()> {
        let target = if include_timestamp_for_hard_refresh {
            with_timestamp(url, chrono::Utc::now().timestamp_millis())?
        } else {
            url.to_string()
        };
        debug!("browser.get({})", target);
        self.driver.navigate(&target).await
    }

    pub async fn refresh(&self) -> HarnessResult<()> {
        debug!("browser.refresh()");
        self.driver.refresh().await
    }

    pub async fn quit(&self) -> HarnessResult<()> {
        self.driver.quit().await
    }
}

fn with_timestamp(url: &str, millis: i64) -> HarnessResult<String> {
    let mut parsed = Url::parse(url)
        .map_err(|e| HarnessError::ui_action("browser.get", format!("invalid url '{url}': {e}")))?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != HARD_REFRESH_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(HARD_REFRESH_PARAM, &millis.to_string());
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_goes_before_hash_route() {
        let url = "http://localhost:5601/app/dashboards#/view/abc?_a=(viewMode:edit)";
        assert_eq!(
            with_timestamp(url, 42).unwrap(),
            "http://localhost:5601/app/dashboards?_t=42#/view/abc?_a=(viewMode:edit)"
        );
    }

    #[test]
    fn test_existing_timestamp_is_replaced() {
        let url = "http://localhost:5601/app/discover?foo=1&_t=1#/";
        assert_eq!(
            with_timestamp(url, 7).unwrap(),
            "http://localhost:5601/app/discover?foo=1&_t=7#/"
        );
    }

    #[test]
    fn test_invalid_url_is_a_ui_action_error() {
        assert!(matches!(
            with_timestamp("not a url", 1),
            Err(HarnessError::UiAction { .. })
        ));
    }
}
