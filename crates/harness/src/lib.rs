//! Dashboards Functional Test Harness
//!
//! Building blocks for browser-driven functional tests of the Dashboards web
//! application:
//! - a typed service registry with lazy, dependency-ordered construction
//! - a retry executor for eventually-consistent UI conditions
//! - page objects and composite services that express user intents
//! - a settings gateway over the application's settings API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  FtrContext                                                  │
//! │    └── ServiceRegistry (services + page objects)             │
//! │          ├── retry, find, testSubjects, browser, uiSettings  │
//! │          ├── dashboardAddPanel, dashboardPanelActions,       │
//! │          │   dashboardVisualizations, queryBar, listingTable │
//! │          └── common, header, dashboard, discover, ...        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Driver (trait)                                              │
//! │    ├── WebDriverClient  (W3C WebDriver over HTTP)            │
//! │    └── FakeDashboards   (in memory, feature `fake-app`)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
#[cfg(any(test, feature = "fake-app"))]
pub mod fake;
pub mod page_objects;
pub mod registry;
pub mod retry;
pub mod services;
pub mod settings;

pub use config::{AppConfig, FtrConfig, RunConfig, TimeoutConfig, WebDriverConfig};
pub use context::FtrContext;
pub use driver::{Driver, ElementHandle, Selector, WebDriverClient};
pub use error::{HarnessError, HarnessResult};
pub use registry::{ProviderKind, Resolver, ServiceBundle, ServiceKey, ServiceRegistry};
pub use retry::{RetryPolicy, RetryService};
pub use settings::{settings_kv, SettingValue, SettingsGateway, SettingsKv, UiSettingsStore};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
