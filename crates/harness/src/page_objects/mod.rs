//! Page objects: intent-level facades over one UI surface each
//!
//! Queries such as "exists" or "is showing" answer `false` when an element
//! is absent; actions fail with `UiAction` when their target cannot be
//! found within the lookup budget.

use crate::registry::ServiceKey;

pub mod common;
pub mod dashboard;
pub mod discover;
pub mod header;
pub mod settings;
pub mod time_picker;
pub mod vis_editor;
pub mod visualize;

pub use common::{CommonPage, NavigateOptions};
pub use dashboard::{DashboardMode, DashboardPage, SaveDashboardOptions, PIE_CHART_VIS_NAME};
pub use discover::DiscoverPage;
pub use header::HeaderPage;
pub use settings::{SettingsPage, VISUALIZE_ENABLE_LABS_SETTING};
pub use time_picker::TimePickerPage;
pub use vis_editor::VisEditorPage;
pub use visualize::{SaveVisualizationOptions, VisualizePage};

pub const COMMON: ServiceKey<CommonPage> = ServiceKey::page_object("common");
pub const HEADER: ServiceKey<HeaderPage> = ServiceKey::page_object("header");
pub const DASHBOARD: ServiceKey<DashboardPage> = ServiceKey::page_object("dashboard");
pub const DISCOVER: ServiceKey<DiscoverPage> = ServiceKey::page_object("discover");
pub const VISUALIZE: ServiceKey<VisualizePage> = ServiceKey::page_object("visualize");
pub const VIS_EDITOR: ServiceKey<VisEditorPage> = ServiceKey::page_object("visEditor");
pub const TIME_PICKER: ServiceKey<TimePickerPage> = ServiceKey::page_object("timePicker");
pub const SETTINGS: ServiceKey<SettingsPage> = ServiceKey::page_object("settings");
