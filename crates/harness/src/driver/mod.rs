//! Browser driver boundary
//!
//! Page objects never talk to a browser directly; they go through the
//! [`Driver`] trait. [`webdriver::WebDriverClient`] drives a real browser
//! over the W3C WebDriver protocol, and the `fake` module (feature
//! `fake-app`) implements the same trait in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;

pub mod selector;
pub mod webdriver;

pub use selector::Selector;
pub use webdriver::WebDriverClient;

/// Opaque reference to an element found by the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

/// Operations every browser backend provides.
///
/// An element missing from the page is not an error for `find_elements`; it
/// returns an empty list. Operations on an element that went away fail with
/// a retryable error.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str) -> HarnessResult<()>;

    async fn current_url(&self) -> HarnessResult<String>;

    async fn refresh(&self) -> HarnessResult<()>;

    async fn find_elements(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>>;

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()>;

    async fn clear(&self, element: &ElementHandle) -> HarnessResult<()>;

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> HarnessResult<()>;

    async fn text(&self, element: &ElementHandle) -> HarnessResult<String>;

    async fn attribute(&self, element: &ElementHandle, name: &str) -> HarnessResult<Option<String>>;

    async fn is_displayed(&self, element: &ElementHandle) -> HarnessResult<bool>;

    /// End the browser session.
    async fn quit(&self) -> HarnessResult<()>;
}
