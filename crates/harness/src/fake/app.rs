//! State machine of the fake application
//!
//! The page is never stored as a DOM. Every lookup renders the current state
//! into a flat list of elements keyed by test subject (or by one of the few
//! CSS selectors the page objects use), and every click is dispatched on the
//! clicked element's key.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use reqwest::Url;

use crate::config::AppConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::fake::FakeOptions;
use crate::services::test_subjects::saved_object_title_subject;
use crate::settings::{InMemorySettingsStore, SettingValue};

/// Fields of the sample index pattern
const FIELDS: &[&str] = &["@timestamp", "bytes", "extension", "host", "machine.os"];

const INDEX_PATTERNS: &[&str] = &["logstash-*", "shakespeare"];

/// Boolean advanced settings and their defaults
const BOOLEAN_SETTINGS: &[(&str, bool)] = &[("discover:v2", true), ("visualize:enableLabs", true)];

/// Subjects that accept keyboard input
const INPUTS: &[&str] = &[
    "queryInput",
    "savedObjectFinderSearchInput",
    "savedObjectTitle",
    "superDatePickerAbsoluteDateInput",
    "markdownTextarea",
];

const VIS_TYPES: &[&str] = &["metrics", "markdown", "metric", "pie"];

const NAV_APPS: &[&str] = &["dashboards", "discover", "visualize", "management"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ElementKey {
    Subject(String),
    Css(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub key: ElementKey,
    pub text: String,
    pub checked: Option<bool>,
}

/// Work the driver finishes after the state lock is released
pub(crate) enum Effect {
    None,
    ApplySettings(BTreeMap<String, Option<SettingValue>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Visualization,
    Search,
}

#[derive(Debug, Clone)]
struct Panel {
    kind: ObjectKind,
    object_id: String,
    title: String,
}

#[derive(Debug, Clone)]
struct SavedVisualization {
    id: String,
    title: String,
    vis_type: String,
}

#[derive(Debug, Clone)]
struct SavedSearch {
    id: String,
    title: String,
    columns: Vec<String>,
    query: String,
}

#[derive(Debug, Clone)]
struct SavedDashboard {
    id: String,
    title: String,
    panels: Vec<Panel>,
}

#[derive(Debug, Default)]
struct SavedObjects {
    visualizations: Vec<SavedVisualization>,
    searches: Vec<SavedSearch>,
    dashboards: Vec<SavedDashboard>,
}

#[derive(Debug, Clone, Default)]
struct DashboardSession {
    id: Option<String>,
    title: Option<String>,
    panels: Vec<Panel>,
    edit: bool,
    expanded: Option<usize>,
    context_menu: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct DiscoverSession {
    id: Option<String>,
    title: Option<String>,
    columns: Vec<String>,
    query: String,
}

#[derive(Debug, Clone, Default)]
struct EditorSession {
    id: Option<String>,
    title: Option<String>,
    vis_type: String,
    from_dashboard: bool,
    markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Blank,
    DashboardListing,
    Dashboard,
    Discover,
    VisualizeListing,
    VisSourceChooser { vis_type: String, from_dashboard: bool },
    VisEditor,
    Management,
    AdvancedSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveTarget {
    Dashboard,
    Search,
    Visualization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    None,
    AddPanel { create_menu: bool },
    NewVisDialog { from_dashboard: bool },
    SaveModal(SaveTarget),
    LoadSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateEdge {
    Start,
    End,
}

#[derive(Debug, Clone)]
struct TimePicker {
    show_dates: bool,
    popover: Option<DateEdge>,
    absolute_tab: bool,
    start: String,
    end: String,
}

impl Default for TimePicker {
    fn default() -> Self {
        Self {
            show_dates: false,
            popover: None,
            absolute_tab: false,
            start: "now-15m".to_string(),
            end: "now".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Toast {
    subject: &'static str,
    title: String,
}

/// App name to URL path, longest path first
struct AppRoutes {
    base: String,
    apps: Vec<(String, String)>,
}

impl AppRoutes {
    fn new(config: &AppConfig) -> Self {
        let mut apps: Vec<(String, String)> = config
            .apps
            .keys()
            .filter_map(|name| {
                let url = Url::parse(&config.app_url(name)).ok()?;
                Some((name.clone(), url.path().trim_end_matches('/').to_string()))
            })
            .collect();
        apps.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        Self {
            base: config.base_url.trim_end_matches('/').to_string(),
            apps,
        }
    }

    fn url(&self, app: &str, route: &str) -> String {
        let path = self
            .apps
            .iter()
            .find(|(name, _)| name == app)
            .map(|(_, path)| path.clone())
            .unwrap_or_else(|| format!("/app/{app}"));
        match route {
            "" => format!("{}{}", self.base, path),
            route => format!("{}{}#{}", self.base, path, route),
        }
    }

    /// App name, hash route and hash query of `url`
    fn locate(&self, url: &str) -> HarnessResult<(Option<String>, String, String)> {
        let parsed = Url::parse(url).map_err(|e| HarnessError::Driver {
            code: "invalid argument".to_string(),
            message: format!("cannot navigate to '{url}': {e}"),
        })?;
        let path = parsed.path().trim_end_matches('/');
        let app = self
            .apps
            .iter()
            .find(|(_, app_path)| app_path == path)
            .map(|(name, _)| name.clone());
        let fragment = parsed.fragment().unwrap_or("");
        let (route, query) = fragment.split_once('?').unwrap_or((fragment, ""));
        Ok((app, route.to_string(), query.to_string()))
    }
}

pub(crate) struct AppState {
    routes: AppRoutes,
    options: FakeOptions,
    settings: Arc<InMemorySettingsStore>,
    page: Page,
    overlay: Overlay,
    nav_open: bool,
    loading_polls: u32,
    dropped_add_vis_clicks: u32,
    toast: Option<Toast>,
    legacy_discover: bool,
    time: TimePicker,
    inputs: HashMap<String, String>,
    checks: HashMap<String, bool>,
    dashboard: Option<DashboardSession>,
    discover: Option<DiscoverSession>,
    editor: Option<EditorSession>,
    pending_settings: BTreeMap<String, Option<SettingValue>>,
    saved: SavedObjects,
    next_id: u32,
    quits: u32,
}

impl AppState {
    pub fn new(config: &AppConfig, options: FakeOptions, settings: Arc<InMemorySettingsStore>) -> Self {
        let saved = SavedObjects {
            visualizations: vec![
                SavedVisualization {
                    id: "vis-pie".to_string(),
                    title: "Visualization PieChart".to_string(),
                    vis_type: "pie".to_string(),
                },
                SavedVisualization {
                    id: "vis-metric".to_string(),
                    title: "Visualization MetricChart".to_string(),
                    vis_type: "metric".to_string(),
                },
            ],
            ..Default::default()
        };
        Self {
            routes: AppRoutes::new(config),
            dropped_add_vis_clicks: options.dropped_add_visualization_clicks,
            options,
            settings,
            page: Page::Blank,
            overlay: Overlay::None,
            nav_open: false,
            loading_polls: 0,
            toast: None,
            legacy_discover: false,
            time: TimePicker::default(),
            inputs: HashMap::new(),
            checks: HashMap::new(),
            dashboard: None,
            discover: None,
            editor: None,
            pending_settings: BTreeMap::new(),
            saved,
            next_id: 1,
            quits: 0,
        }
    }

    // === Navigation ===

    /// Full page load: overlays, toasts and the in-memory routes of other
    /// apps are lost; settings are read again.
    pub fn load(&mut self, url: &str) -> HarnessResult<()> {
        let (app, route, query) = self.routes.locate(url)?;
        self.overlay = Overlay::None;
        self.nav_open = false;
        self.toast = None;
        self.pending_settings.clear();
        self.inputs.clear();
        self.checks.clear();
        self.time.popover = None;
        self.time.show_dates = false;
        self.legacy_discover = !self.boolean_setting("discover:v2");
        self.dashboard = None;
        self.discover = None;
        self.editor = None;
        self.loading_polls = self.options.loading_polls;

        let app = app.unwrap_or_default();
        let route = route.as_str();
        self.page = match app.as_str() {
            "dashboards" => self.load_dashboard_route(route, &query),
            "discover" => {
                let session = route
                    .strip_prefix("/view/")
                    .and_then(|id| self.saved_search_session(id))
                    .unwrap_or_default();
                self.discover = Some(session);
                Page::Discover
            }
            "visualize" => self.load_visualize_route(route, &query),
            "management" => Page::Management,
            "settings" => Page::AdvancedSettings,
            _ => Page::Blank,
        };
        Ok(())
    }

    fn load_dashboard_route(&mut self, route: &str, query: &str) -> Page {
        let edit = query.contains("viewMode:edit");
        if let Some(id) = route.strip_prefix("/view/") {
            if let Some(saved) = self.saved.dashboards.iter().find(|d| d.id == id) {
                self.dashboard = Some(DashboardSession {
                    id: Some(saved.id.clone()),
                    title: Some(saved.title.clone()),
                    panels: saved.panels.clone(),
                    edit,
                    ..Default::default()
                });
                return Page::Dashboard;
            }
        } else if route == "/create" {
            self.dashboard = Some(DashboardSession {
                edit: !query.contains("viewMode:view"),
                ..Default::default()
            });
            return Page::Dashboard;
        }
        Page::DashboardListing
    }

    fn load_visualize_route(&mut self, route: &str, query: &str) -> Page {
        let vis_type = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("type="))
            .unwrap_or("markdown")
            .to_string();
        if let Some(id) = route.strip_prefix("/edit/") {
            if let Some(vis) = self.saved.visualizations.iter().find(|v| v.id == id) {
                self.editor = Some(EditorSession {
                    id: Some(vis.id.clone()),
                    title: Some(vis.title.clone()),
                    vis_type: vis.vis_type.clone(),
                    ..Default::default()
                });
                return Page::VisEditor;
            }
        } else if route == "/create" {
            self.editor = Some(EditorSession {
                vis_type,
                ..Default::default()
            });
            return Page::VisEditor;
        } else if route == "/new" {
            return Page::VisSourceChooser {
                vis_type,
                from_dashboard: false,
            };
        }
        Page::VisualizeListing
    }

    /// In-app navigation: each app resumes where it was left.
    fn open_app(&mut self, app: &str) {
        self.overlay = Overlay::None;
        self.nav_open = false;
        self.loading_polls = self.options.loading_polls;
        self.page = match app {
            "dashboards" => match self.dashboard.as_mut() {
                Some(session) => {
                    session.context_menu = None;
                    Page::Dashboard
                }
                None => Page::DashboardListing,
            },
            "discover" => {
                self.discover.get_or_insert_with(DiscoverSession::default);
                Page::Discover
            }
            "visualize" => match self.editor {
                Some(_) => Page::VisEditor,
                None => Page::VisualizeListing,
            },
            "management" => Page::Management,
            "settings" => Page::AdvancedSettings,
            _ => Page::Blank,
        };
    }

    pub fn current_url(&self) -> String {
        match &self.page {
            Page::Blank => "about:blank".to_string(),
            Page::DashboardListing => self.routes.url("dashboards", "/list"),
            Page::Dashboard => {
                let session = self.dashboard.clone().unwrap_or_default();
                let mode = if session.edit { "edit" } else { "view" };
                let route = match &session.id {
                    Some(id) => format!("/view/{id}?_a=(viewMode:{mode})"),
                    None => format!("/create?_a=(viewMode:{mode})"),
                };
                self.routes.url("dashboards", &route)
            }
            Page::Discover => match self.discover.as_ref().and_then(|s| s.id.as_ref()) {
                Some(id) => self.routes.url("discover", &format!("/view/{id}")),
                None => self.routes.url("discover", "/"),
            },
            Page::VisualizeListing => self.routes.url("visualize", "/"),
            Page::VisSourceChooser { vis_type, .. } => {
                self.routes.url("visualize", &format!("/new?type={vis_type}"))
            }
            Page::VisEditor => {
                let session = self.editor.clone().unwrap_or_default();
                match &session.id {
                    Some(id) => self.routes.url("visualize", &format!("/edit/{id}")),
                    None => self
                        .routes
                        .url("visualize", &format!("/create?type={}", session.vis_type)),
                }
            }
            Page::Management => self.routes.url("management", ""),
            Page::AdvancedSettings => self.routes.url("settings", ""),
        }
    }

    pub fn quit(&mut self) {
        self.page = Page::Blank;
        self.overlay = Overlay::None;
        self.quits += 1;
    }

    pub fn quits(&self) -> u32 {
        self.quits
    }

    /// One lookup's worth of the page. While the page is loading only the
    /// loading indicator is present.
    pub fn poll(&mut self) -> Vec<Element> {
        if self.loading_polls > 0 {
            self.loading_polls -= 1;
            return vec![Element::subject("globalLoadingIndicator")];
        }
        self.render()
    }

    // === Rendering ===

    pub fn render(&self) -> Vec<Element> {
        let mut out = Vec::new();
        if self.page == Page::Blank {
            return out;
        }

        out.push(Element::subject("globalLoadingIndicator-hidden"));
        out.push(Element::subject("toggleNavButton"));
        if self.nav_open {
            for app in NAV_APPS {
                out.push(Element::subject(format!("collapsibleNavAppLink-{app}")));
            }
        }
        if let Some(toast) = &self.toast {
            out.push(Element::subject(toast.subject));
            out.push(Element::subject("euiToastHeader").with_text(&toast.title));
            out.push(Element::subject("toastCloseButton"));
        }
        let (app_title, page_title) = self.breadcrumbs();
        out.push(Element::subject("breadcrumb first").with_text(app_title));
        out.push(Element::subject("breadcrumb last").with_text(&page_title));

        match &self.page {
            Page::Blank => {}
            Page::DashboardListing => {
                out.push(Element::subject("dashboardLandingPage"));
                out.push(Element::subject("newItemButton"));
                for dashboard in &self.saved.dashboards {
                    out.push(
                        Element::subject(saved_object_title_subject(
                            "dashboardListingTitleLink-",
                            &dashboard.title,
                        ))
                        .with_text(&dashboard.title),
                    );
                }
            }
            Page::Dashboard => self.render_dashboard(&mut out),
            Page::Discover => self.render_discover(&mut out),
            Page::VisualizeListing => {
                out.push(Element::subject("visualizeLandingPage"));
                out.push(Element::subject("newItemButton"));
                for vis in &self.saved.visualizations {
                    out.push(
                        Element::subject(saved_object_title_subject("visListingTitleLink-", &vis.title))
                            .with_text(&vis.title),
                    );
                }
            }
            Page::VisSourceChooser { .. } => {
                for (i, source) in self.sources().iter().enumerate() {
                    out.push(
                        Element::css(format!("li.euiListGroupItem:nth-of-type({})", i + 1)).with_text(source),
                    );
                }
            }
            Page::VisEditor => {
                out.push(Element::subject("visualizeSaveButton"));
                out.push(Element::subject("visualizeEditorRenderButton"));
                if self.editor.as_ref().is_some_and(|e| e.vis_type == "markdown") {
                    out.push(self.input("markdownTextarea"));
                }
            }
            Page::Management => {
                out.push(Element::subject("managementHome"));
                out.push(Element::subject("settings").with_text("Advanced settings"));
            }
            Page::AdvancedSettings => self.render_advanced_settings(&mut out),
        }

        self.render_overlay(&mut out);
        out
    }

    fn breadcrumbs(&self) -> (&'static str, String) {
        match &self.page {
            Page::Blank => ("", String::new()),
            Page::DashboardListing => ("Dashboards", "Dashboards".to_string()),
            Page::Dashboard => (
                "Dashboards",
                self.dashboard
                    .as_ref()
                    .and_then(|s| s.title.clone())
                    .unwrap_or_else(|| "Editing New Dashboard".to_string()),
            ),
            Page::Discover => (
                "Discover",
                self.discover
                    .as_ref()
                    .and_then(|s| s.title.clone())
                    .unwrap_or_else(|| "New".to_string()),
            ),
            Page::VisualizeListing | Page::VisSourceChooser { .. } => ("Visualize", "Visualize".to_string()),
            Page::VisEditor => (
                "Visualize",
                self.editor
                    .as_ref()
                    .and_then(|s| s.title.clone())
                    .unwrap_or_else(|| "Create".to_string()),
            ),
            Page::Management => ("Stack Management", "Stack Management".to_string()),
            Page::AdvancedSettings => ("Stack Management", "Advanced settings".to_string()),
        }
    }

    fn render_time_picker(&self, out: &mut Vec<Element>) {
        out.push(self.input("queryInput"));
        out.push(Element::subject("querySubmitButton"));
        if !self.time.show_dates {
            out.push(Element::subject("superDatePickerShowDatesButton"));
        } else {
            out.push(Element::subject("superDatePickerstartDatePopoverButton").with_text(&self.time.start));
            out.push(Element::subject("superDatePickerendDatePopoverButton").with_text(&self.time.end));
        }
        if self.time.popover.is_some() {
            out.push(Element::subject("superDatePickerAbsoluteTab"));
            if self.time.absolute_tab {
                out.push(self.input("superDatePickerAbsoluteDateInput"));
            }
        }
    }

    fn render_dashboard(&self, out: &mut Vec<Element>) {
        let Some(session) = &self.dashboard else {
            return;
        };
        self.render_time_picker(out);
        if session.edit {
            out.push(Element::subject("dashboardSaveMenuItem"));
            out.push(Element::subject("dashboardAddPanelButton"));
            out.push(Element::subject("addVisualizationButton"));
        } else {
            out.push(Element::subject("dashboardEditMode"));
        }

        let visible: Vec<usize> = match session.expanded {
            Some(i) => {
                out.push(Element::subject("dashboardExpandedPanel"));
                vec![i]
            }
            None => (0..session.panels.len()).collect(),
        };
        for &i in &visible {
            let Some(panel) = session.panels.get(i) else {
                continue;
            };
            out.push(Element::subject("embeddablePanel"));
            out.push(Element::subject("dashboardPanelTitle").with_text(&panel.title));
            out.push(Element::subject("embeddablePanelToggleMenuIcon"));
        }

        if session.context_menu.is_some() {
            out.push(Element::subject("embeddablePanelContextMenuOpen"));
            if session.edit {
                out.push(Element::subject("embeddablePanelAction-editPanel"));
                out.push(Element::subject("embeddablePanelAction-clonePanel"));
                out.push(Element::subject("embeddablePanelAction-replacePanel"));
                if session.expanded.is_none() {
                    out.push(Element::subject("embeddablePanelAction-deletePanel"));
                }
            }
            out.push(Element::subject("embeddablePanelAction-togglePanel"));
        }
    }

    fn render_discover(&self, out: &mut Vec<Element>) {
        out.push(Element::subject("discoverNewButton"));
        if !self.legacy_discover {
            out.push(Element::subject("dscCanvas"));
            return;
        }
        out.push(Element::subject("discoverSaveButton"));
        out.push(Element::subject("discoverOpenButton"));
        self.render_time_picker(out);
        let columns = self
            .discover
            .as_ref()
            .map(|s| s.columns.clone())
            .unwrap_or_default();
        for field in FIELDS {
            out.push(Element::subject(format!("field-{field}")));
            out.push(Element::subject(format!("fieldToggle-{field}")));
        }
        for column in &columns {
            out.push(Element::subject(format!("docTableHeader-{column}")));
        }
    }

    fn render_advanced_settings(&self, out: &mut Vec<Element>) {
        out.push(Element::subject("managementSettingsTitle"));
        for (key, _) in BOOLEAN_SETTINGS {
            out.push(
                Element::subject(format!("advancedSetting-editField-{key}"))
                    .with_checked(self.effective_boolean_setting(key)),
            );
            let has_user_value = match self.pending_settings.get(*key) {
                Some(pending) => pending.is_some(),
                None => self.settings.value(key).is_some(),
            };
            if has_user_value {
                out.push(Element::subject(format!("advancedSetting-resetField-{key}")));
            }
        }
        if !self.pending_settings.is_empty() {
            out.push(Element::subject("advancedSetting-saveButton"));
        }
    }

    fn render_overlay(&self, out: &mut Vec<Element>) {
        match self.overlay {
            Overlay::None => {}
            Overlay::AddPanel { create_menu } => {
                out.push(Element::subject("dashboardAddPanel"));
                out.push(Element::subject("euiFlyoutCloseButton"));
                out.push(self.input("savedObjectFinderSearchInput"));
                out.push(Element::subject("createNew"));
                if create_menu {
                    out.push(Element::subject("createNew-visualization"));
                }
                for (_, _, title) in self.finder_matches() {
                    out.push(Element::subject(saved_object_title_subject("savedObjectTitle", &title)).with_text(&title));
                }
            }
            Overlay::NewVisDialog { .. } => {
                out.push(Element::css(".visNewVisDialog"));
                for vis_type in VIS_TYPES {
                    out.push(Element::subject(format!("visType-{vis_type}")));
                }
            }
            Overlay::SaveModal(target) => {
                out.push(Element::subject("savedObjectSaveModal"));
                out.push(self.input("savedObjectTitle"));
                out.push(Element::subject("confirmSaveSavedObjectButton"));
                if self.saving_existing(target) {
                    out.push(self.checkbox("saveAsNewCheckbox"));
                }
                match target {
                    SaveTarget::Dashboard => out.push(self.checkbox("storeTimeWithDashboard")),
                    SaveTarget::Visualization if self.editor.as_ref().is_some_and(|e| e.from_dashboard) => {
                        out.push(self.checkbox("returnToOriginModeSwitch"))
                    }
                    _ => {}
                }
            }
            Overlay::LoadSearch => {
                out.push(Element::subject("loadSearchForm"));
                out.push(Element::subject("euiFlyoutCloseButton"));
                for search in &self.saved.searches {
                    out.push(
                        Element::subject(saved_object_title_subject("savedObjectTitle", &search.title))
                            .with_text(&search.title),
                    );
                }
            }
        }
    }

    fn input(&self, subject: &str) -> Element {
        Element::subject(subject).with_text(self.inputs.get(subject).map(String::as_str).unwrap_or(""))
    }

    fn checkbox(&self, subject: &str) -> Element {
        Element::subject(subject).with_checked(self.checks.get(subject).copied().unwrap_or(false))
    }

    /// Saved objects the add panel finder lists for the current filter
    fn finder_matches(&self) -> Vec<(ObjectKind, String, String)> {
        let filter = self
            .inputs
            .get("savedObjectFinderSearchInput")
            .map(|f| f.trim_matches('"').to_lowercase())
            .unwrap_or_default();
        let visualizations = self
            .saved
            .visualizations
            .iter()
            .map(|v| (ObjectKind::Visualization, v.id.clone(), v.title.clone()));
        let searches = self
            .saved
            .searches
            .iter()
            .map(|s| (ObjectKind::Search, s.id.clone(), s.title.clone()));
        visualizations
            .chain(searches)
            .filter(|(_, _, title)| title.to_lowercase().contains(&filter))
            .collect()
    }

    fn sources(&self) -> Vec<String> {
        INDEX_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(self.saved.searches.iter().map(|s| s.title.clone()))
            .collect()
    }

    fn saving_existing(&self, target: SaveTarget) -> bool {
        match target {
            SaveTarget::Dashboard => self.dashboard.as_ref().is_some_and(|s| s.id.is_some()),
            SaveTarget::Search => self.discover.as_ref().is_some_and(|s| s.id.is_some()),
            SaveTarget::Visualization => self.editor.as_ref().is_some_and(|s| s.id.is_some()),
        }
    }

    // === Settings ===

    fn boolean_setting(&self, key: &str) -> bool {
        match self.settings.value(key) {
            Some(SettingValue::Bool(value)) => value,
            _ => default_boolean_setting(key),
        }
    }

    fn effective_boolean_setting(&self, key: &str) -> bool {
        match self.pending_settings.get(key) {
            Some(Some(SettingValue::Bool(value))) => *value,
            Some(_) => default_boolean_setting(key),
            None => self.boolean_setting(key),
        }
    }

    // === Input ===

    pub fn clear_input(&mut self, subject: &str) -> HarnessResult<()> {
        self.set_input(subject, String::new())
    }

    pub fn type_into(&mut self, subject: &str, text: &str) -> HarnessResult<()> {
        let value = format!("{}{}", self.inputs.get(subject).map(String::as_str).unwrap_or(""), text);
        self.set_input(subject, value)
    }

    fn set_input(&mut self, subject: &str, value: String) -> HarnessResult<()> {
        if !INPUTS.contains(&subject) {
            return Err(not_interactable(subject));
        }
        match subject {
            "superDatePickerAbsoluteDateInput" => match self.time.popover {
                Some(DateEdge::Start) => self.time.start = value.clone(),
                Some(DateEdge::End) => self.time.end = value.clone(),
                None => return Err(not_interactable(subject)),
            },
            "markdownTextarea" => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.markdown = value.clone();
                }
            }
            _ => {}
        }
        self.inputs.insert(subject.to_string(), value);
        Ok(())
    }

    // === Clicks ===

    pub fn click(&mut self, key: &ElementKey, index: usize) -> HarnessResult<Effect> {
        match key {
            ElementKey::Css(css) => {
                self.click_css(css);
                Ok(Effect::None)
            }
            ElementKey::Subject(subject) => self.click_subject(subject, index),
        }
    }

    fn click_css(&mut self, css: &str) {
        let chosen = css
            .strip_prefix("li.euiListGroupItem:nth-of-type(")
            .and_then(|rest| rest.strip_suffix(')'));
        if let (Some(_), Page::VisSourceChooser { vis_type, from_dashboard }) = (chosen, &self.page) {
            self.editor = Some(EditorSession {
                vis_type: vis_type.clone(),
                from_dashboard: *from_dashboard,
                ..Default::default()
            });
            self.page = Page::VisEditor;
            self.loading_polls = self.options.loading_polls;
        }
    }

    fn click_subject(&mut self, subject: &str, index: usize) -> HarnessResult<Effect> {
        if let Some(app) = subject.strip_prefix("collapsibleNavAppLink-") {
            self.open_app(app);
            return Ok(Effect::None);
        }
        if let Some(field) = subject.strip_prefix("fieldToggle-") {
            if let Some(session) = self.discover.as_mut() {
                match session.columns.iter().position(|c| c == field) {
                    Some(pos) => {
                        session.columns.remove(pos);
                    }
                    None => session.columns.push(field.to_string()),
                }
            }
            return Ok(Effect::None);
        }
        if let Some(vis_type) = subject.strip_prefix("visType-") {
            self.choose_vis_type(vis_type);
            return Ok(Effect::None);
        }
        if let Some(key) = subject.strip_prefix("advancedSetting-editField-") {
            let toggled = !self.effective_boolean_setting(key);
            self.pending_settings
                .insert(key.to_string(), Some(SettingValue::Bool(toggled)));
            return Ok(Effect::None);
        }
        if let Some(key) = subject.strip_prefix("advancedSetting-resetField-") {
            self.pending_settings.insert(key.to_string(), None);
            return Ok(Effect::None);
        }
        if subject.starts_with("dashboardListingTitleLink-") {
            self.open_listed_dashboard(subject);
            return Ok(Effect::None);
        }
        if subject.starts_with("savedObjectTitle") && subject != "savedObjectTitle" {
            self.pick_saved_object(subject);
            return Ok(Effect::None);
        }
        if subject.starts_with("embeddablePanelAction-") {
            self.panel_action(subject);
            return Ok(Effect::None);
        }

        match subject {
            "toggleNavButton" => self.nav_open = !self.nav_open,
            "toastCloseButton" => self.toast = None,
            "breadcrumb first" => self.follow_first_breadcrumb(),
            "newItemButton" => match self.page {
                Page::DashboardListing => {
                    self.dashboard = Some(DashboardSession {
                        edit: true,
                        ..Default::default()
                    });
                    self.page = Page::Dashboard;
                    self.loading_polls = self.options.loading_polls;
                }
                Page::VisualizeListing => {
                    self.overlay = Overlay::NewVisDialog { from_dashboard: false };
                }
                _ => {}
            },
            "dashboardEditMode" => {
                if let Some(session) = self.dashboard.as_mut() {
                    session.edit = true;
                    session.context_menu = None;
                }
            }
            "dashboardSaveMenuItem" => self.open_save_modal(SaveTarget::Dashboard),
            "dashboardAddPanelButton" => {
                self.overlay = Overlay::AddPanel { create_menu: false };
                self.inputs.remove("savedObjectFinderSearchInput");
            }
            "addVisualizationButton" => {
                if self.dropped_add_vis_clicks > 0 {
                    self.dropped_add_vis_clicks -= 1;
                } else {
                    self.overlay = Overlay::NewVisDialog { from_dashboard: true };
                }
            }
            "embeddablePanelToggleMenuIcon" => {
                if let Some(session) = self.dashboard.as_mut() {
                    let panel = session.expanded.unwrap_or(index);
                    session.context_menu = match session.context_menu {
                        Some(_) => None,
                        None => Some(panel),
                    };
                }
            }
            "createNew" => {
                if let Overlay::AddPanel { .. } = self.overlay {
                    self.overlay = Overlay::AddPanel { create_menu: true };
                }
            }
            "createNew-visualization" => {
                self.overlay = Overlay::NewVisDialog { from_dashboard: true };
            }
            "euiFlyoutCloseButton" => self.overlay = Overlay::None,
            "discoverNewButton" => {
                self.discover = Some(DiscoverSession::default());
                self.inputs.remove("queryInput");
                self.loading_polls = self.options.loading_polls;
            }
            "discoverSaveButton" => self.open_save_modal(SaveTarget::Search),
            "discoverOpenButton" => self.overlay = Overlay::LoadSearch,
            "visualizeSaveButton" => self.open_save_modal(SaveTarget::Visualization),
            "visualizeEditorRenderButton" => {}
            "querySubmitButton" => {
                self.time.popover = None;
                self.time.absolute_tab = false;
                let query = self.inputs.get("queryInput").cloned().unwrap_or_default();
                if let Some(session) = self.discover.as_mut() {
                    session.query = query;
                }
            }
            "superDatePickerShowDatesButton" => self.time.show_dates = true,
            "superDatePickerstartDatePopoverButton" => self.open_date_popover(DateEdge::Start),
            "superDatePickerendDatePopoverButton" => self.open_date_popover(DateEdge::End),
            "superDatePickerAbsoluteTab" => self.time.absolute_tab = true,
            "storeTimeWithDashboard" | "saveAsNewCheckbox" | "returnToOriginModeSwitch" => {
                let checked = self.checks.entry(subject.to_string()).or_insert(false);
                *checked = !*checked;
            }
            "confirmSaveSavedObjectButton" => self.confirm_save(),
            "settings" => {
                self.page = Page::AdvancedSettings;
                self.pending_settings.clear();
                self.loading_polls = self.options.loading_polls;
            }
            "advancedSetting-saveButton" => {
                let changes = std::mem::take(&mut self.pending_settings);
                return Ok(Effect::ApplySettings(changes));
            }
            _ => {}
        }
        Ok(Effect::None)
    }

    fn follow_first_breadcrumb(&mut self) {
        match self.page {
            Page::Dashboard | Page::DashboardListing => {
                self.dashboard = None;
                self.open_app("dashboards");
            }
            Page::VisEditor | Page::VisSourceChooser { .. } | Page::VisualizeListing => {
                self.editor = None;
                self.open_app("visualize");
            }
            Page::AdvancedSettings | Page::Management => self.open_app("management"),
            Page::Discover | Page::Blank => {}
        }
    }

    fn open_date_popover(&mut self, edge: DateEdge) {
        self.time.popover = Some(edge);
        self.time.absolute_tab = false;
        let current = match edge {
            DateEdge::Start => self.time.start.clone(),
            DateEdge::End => self.time.end.clone(),
        };
        self.inputs
            .insert("superDatePickerAbsoluteDateInput".to_string(), current);
    }

    fn open_listed_dashboard(&mut self, subject: &str) {
        let found = self
            .saved
            .dashboards
            .iter()
            .find(|d| saved_object_title_subject("dashboardListingTitleLink-", &d.title) == subject)
            .cloned();
        if let Some(saved) = found {
            self.dashboard = Some(DashboardSession {
                id: Some(saved.id),
                title: Some(saved.title),
                panels: saved.panels,
                edit: false,
                ..Default::default()
            });
            self.page = Page::Dashboard;
            self.loading_polls = self.options.loading_polls;
        }
    }

    /// A title link in the add panel finder or the load search panel.
    fn pick_saved_object(&mut self, subject: &str) {
        match self.overlay {
            Overlay::AddPanel { .. } => {
                let picked = self
                    .finder_matches()
                    .into_iter()
                    .find(|(_, _, title)| saved_object_title_subject("savedObjectTitle", title) == subject);
                if let (Some((kind, object_id, title)), Some(session)) = (picked, self.dashboard.as_mut()) {
                    session.panels.push(Panel {
                        kind,
                        object_id,
                        title: title.clone(),
                    });
                    self.toast = Some(Toast {
                        subject: "addObjectToDashboardSuccess",
                        title: format!("{title} was added"),
                    });
                }
            }
            Overlay::LoadSearch => {
                let picked = self
                    .saved
                    .searches
                    .iter()
                    .find(|s| saved_object_title_subject("savedObjectTitle", &s.title) == subject)
                    .map(|s| s.id.clone());
                if let Some(session) = picked.and_then(|id| self.saved_search_session(&id)) {
                    self.discover = Some(session);
                    self.overlay = Overlay::None;
                    self.loading_polls = self.options.loading_polls;
                }
            }
            _ => {}
        }
    }

    fn panel_action(&mut self, subject: &str) {
        let Some(session) = self.dashboard.as_mut() else {
            return;
        };
        let Some(index) = session.context_menu.take() else {
            return;
        };
        let Some(panel) = session.panels.get(index).cloned() else {
            return;
        };
        match subject {
            "embeddablePanelAction-editPanel" => match panel.kind {
                ObjectKind::Visualization => {
                    let vis_type = self
                        .saved
                        .visualizations
                        .iter()
                        .find(|v| v.id == panel.object_id)
                        .map(|v| v.vis_type.clone())
                        .unwrap_or_default();
                    self.editor = Some(EditorSession {
                        id: Some(panel.object_id),
                        title: Some(panel.title),
                        vis_type,
                        from_dashboard: true,
                        markdown: String::new(),
                    });
                    self.page = Page::VisEditor;
                    self.loading_polls = self.options.loading_polls;
                }
                ObjectKind::Search => {
                    self.discover = self.saved_search_session(&panel.object_id);
                    self.page = Page::Discover;
                    self.loading_polls = self.options.loading_polls;
                }
            },
            "embeddablePanelAction-clonePanel" => session.panels.insert(index + 1, panel),
            "embeddablePanelAction-deletePanel" => {
                session.panels.remove(index);
                session.expanded = None;
            }
            "embeddablePanelAction-togglePanel" => {
                session.expanded = match session.expanded {
                    Some(_) => None,
                    None => Some(index),
                };
            }
            _ => {}
        }
    }

    fn choose_vis_type(&mut self, vis_type: &str) {
        let Overlay::NewVisDialog { from_dashboard } = self.overlay else {
            return;
        };
        self.overlay = Overlay::None;
        self.loading_polls = self.options.loading_polls;
        if vis_type == "metric" {
            self.page = Page::VisSourceChooser {
                vis_type: vis_type.to_string(),
                from_dashboard,
            };
            return;
        }
        self.editor = Some(EditorSession {
            vis_type: vis_type.to_string(),
            from_dashboard,
            ..Default::default()
        });
        self.page = Page::VisEditor;
    }

    fn open_save_modal(&mut self, target: SaveTarget) {
        let title = match target {
            SaveTarget::Dashboard => self.dashboard.as_ref().and_then(|s| s.title.clone()),
            SaveTarget::Search => self.discover.as_ref().and_then(|s| s.title.clone()),
            SaveTarget::Visualization => self.editor.as_ref().and_then(|s| s.title.clone()),
        };
        self.inputs
            .insert("savedObjectTitle".to_string(), title.unwrap_or_default());
        self.checks.clear();
        let from_dashboard = self.editor.as_ref().is_some_and(|e| e.from_dashboard);
        self.checks
            .insert("returnToOriginModeSwitch".to_string(), from_dashboard);
        self.overlay = Overlay::SaveModal(target);
    }

    fn confirm_save(&mut self) {
        let Overlay::SaveModal(target) = self.overlay else {
            return;
        };
        let title = self.inputs.get("savedObjectTitle").cloned().unwrap_or_default();
        if title.trim().is_empty() {
            return;
        }
        let save_as_new = self.checks.get("saveAsNewCheckbox").copied().unwrap_or(false);
        self.overlay = Overlay::None;
        match target {
            SaveTarget::Dashboard => self.save_dashboard(title, save_as_new),
            SaveTarget::Search => self.save_search(title, save_as_new),
            SaveTarget::Visualization => self.save_visualization(title, save_as_new),
        }
    }

    fn new_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn reuse_or_new_id(&mut self, existing: Option<String>, save_as_new: bool, prefix: &str) -> String {
        match existing {
            Some(id) if !save_as_new => id,
            _ => self.new_id(prefix),
        }
    }

    fn save_dashboard(&mut self, title: String, save_as_new: bool) {
        let Some(session) = self.dashboard.clone() else {
            return;
        };
        let id = self.reuse_or_new_id(session.id, save_as_new, "dashboard");
        let saved = SavedDashboard {
            id: id.clone(),
            title: title.clone(),
            panels: session.panels,
        };
        upsert(&mut self.saved.dashboards, saved, |d| &d.id);
        if let Some(session) = self.dashboard.as_mut() {
            session.id = Some(id);
            session.title = Some(title.clone());
            session.edit = false;
            session.context_menu = None;
        }
        self.toast = Some(Toast {
            subject: "saveDashboardSuccess",
            title: format!("Dashboard '{title}' was saved"),
        });
    }

    fn save_search(&mut self, title: String, save_as_new: bool) {
        let Some(session) = self.discover.clone() else {
            return;
        };
        let id = self.reuse_or_new_id(session.id, save_as_new, "search");
        let saved = SavedSearch {
            id: id.clone(),
            title: title.clone(),
            columns: session.columns,
            query: session.query,
        };
        upsert(&mut self.saved.searches, saved, |s| &s.id);
        if let Some(session) = self.discover.as_mut() {
            session.id = Some(id);
            session.title = Some(title.clone());
        }
        self.loading_polls = self.options.loading_polls;
        self.toast = Some(Toast {
            subject: "saveSearchSuccess",
            title: format!("Search '{title}' was saved"),
        });
    }

    fn save_visualization(&mut self, title: String, save_as_new: bool) {
        let Some(session) = self.editor.clone() else {
            return;
        };
        let id = self.reuse_or_new_id(session.id, save_as_new, "vis");
        let saved = SavedVisualization {
            id: id.clone(),
            title: title.clone(),
            vis_type: session.vis_type,
        };
        upsert(&mut self.saved.visualizations, saved, |v| &v.id);
        self.toast = Some(Toast {
            subject: "saveVisualizationSuccess",
            title: format!("Saved '{title}'"),
        });

        let return_to_origin = session.from_dashboard
            && self.checks.get("returnToOriginModeSwitch").copied().unwrap_or(false);
        if return_to_origin {
            if let Some(dashboard) = self.dashboard.as_mut() {
                dashboard.panels.push(Panel {
                    kind: ObjectKind::Visualization,
                    object_id: id,
                    title,
                });
                self.editor = None;
                self.open_app("dashboards");
                return;
            }
        }
        if let Some(editor) = self.editor.as_mut() {
            editor.id = Some(id);
            editor.title = Some(title);
        }
    }

    fn saved_search_session(&self, id: &str) -> Option<DiscoverSession> {
        self.saved
            .searches
            .iter()
            .find(|s| s.id == id)
            .map(|s| DiscoverSession {
                id: Some(s.id.clone()),
                title: Some(s.title.clone()),
                columns: s.columns.clone(),
                query: s.query.clone(),
            })
    }

    // === Inspection for tests ===

    pub fn panel_titles(&self) -> Vec<String> {
        self.dashboard
            .as_ref()
            .map(|s| s.panels.iter().map(|p| p.title.clone()).collect())
            .unwrap_or_default()
    }

    pub fn saved_search_columns(&self, title: &str) -> Option<Vec<String>> {
        self.saved
            .searches
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.columns.clone())
    }

    pub fn saved_visualization_titles(&self) -> Vec<String> {
        self.saved.visualizations.iter().map(|v| v.title.clone()).collect()
    }

    pub fn time_range(&self) -> (String, String) {
        (self.time.start.clone(), self.time.end.clone())
    }
}

impl Element {
    fn subject(subject: impl Into<String>) -> Self {
        Self {
            key: ElementKey::Subject(subject.into()),
            text: String::new(),
            checked: None,
        }
    }

    fn css(css: impl Into<String>) -> Self {
        Self {
            key: ElementKey::Css(css.into()),
            text: String::new(),
            checked: None,
        }
    }

    fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }
}

fn default_boolean_setting(key: &str) -> bool {
    BOOLEAN_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(false)
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(pos) => items[pos] = item,
        None => items.push(item),
    }
}

fn not_interactable(subject: &str) -> HarnessError {
    HarnessError::Driver {
        code: "element not interactable".to_string(),
        message: format!("{subject} does not accept input"),
    }
}
