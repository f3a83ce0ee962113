//! Services resolved through the registry
//!
//! Each key's name matches the name scenarios use to look the service up.

use crate::config::FtrConfig;
use crate::registry::ServiceKey;
use crate::retry::RetryService;
use crate::settings::SettingsGateway;

pub mod browser;
pub mod dashboard_add_panel;
pub mod dashboard_panel_actions;
pub mod dashboard_visualizations;
pub mod find;
pub mod listing_table;
pub mod query_bar;
pub mod test_subjects;

pub use browser::BrowserService;
pub use dashboard_add_panel::DashboardAddPanel;
pub use dashboard_panel_actions::DashboardPanelActions;
pub use dashboard_visualizations::{DashboardVisualizations, MarkdownSpec, SavedSearchSpec};
pub use find::FindService;
pub use listing_table::ListingTable;
pub use query_bar::QueryBar;
pub use test_subjects::TestSubjects;

pub const CONFIG: ServiceKey<FtrConfig> = ServiceKey::service("config");
pub const BROWSER: ServiceKey<BrowserService> = ServiceKey::service("browser");
pub const RETRY: ServiceKey<RetryService> = ServiceKey::service("retry");
pub const FIND: ServiceKey<FindService> = ServiceKey::service("find");
pub const TEST_SUBJECTS: ServiceKey<TestSubjects> = ServiceKey::service("testSubjects");
pub const QUERY_BAR: ServiceKey<QueryBar> = ServiceKey::service("queryBar");
pub const LISTING_TABLE: ServiceKey<ListingTable> = ServiceKey::service("listingTable");
pub const DASHBOARD_ADD_PANEL: ServiceKey<DashboardAddPanel> = ServiceKey::service("dashboardAddPanel");
pub const DASHBOARD_PANEL_ACTIONS: ServiceKey<DashboardPanelActions> =
    ServiceKey::service("dashboardPanelActions");
pub const DASHBOARD_VISUALIZATIONS: ServiceKey<DashboardVisualizations> =
    ServiceKey::service("dashboardVisualizations");
/// Application settings, reached through the server in the test suites
pub const UI_SETTINGS: ServiceKey<SettingsGateway> = ServiceKey::service("uiSettings");
