//! Dashboard panel context menu
//!
//! The edit, clone, replace and delete actions only show in edit mode; the
//! expand toggle always shows. Delete is hidden on an expanded panel.

use std::sync::Arc;

use futures::FutureExt;

use ftr_harness::page_objects::{
    self, DashboardPage, DiscoverPage, HeaderPage, SaveDashboardOptions, TimePickerPage, PIE_CHART_VIS_NAME,
};
use ftr_harness::services::{
    self, BrowserService, DashboardAddPanel, DashboardPanelActions, DashboardVisualizations, ListingTable,
    SavedSearchSpec,
};
use ftr_harness::{settings_kv, FtrContext, HarnessResult, SettingsGateway};

use crate::runner::{check, Suite};

const DASHBOARD_NAME: &str = "Dashboard Panel Controls Test";
const SAVED_SEARCH_NAME: &str = "my search";

struct Pages {
    browser: Arc<BrowserService>,
    ui_settings: Arc<SettingsGateway>,
    listing_table: Arc<ListingTable>,
    add_panel: Arc<DashboardAddPanel>,
    panel_actions: Arc<DashboardPanelActions>,
    dashboard_visualizations: Arc<DashboardVisualizations>,
    dashboard: Arc<DashboardPage>,
    header: Arc<HeaderPage>,
    discover: Arc<DiscoverPage>,
    time_picker: Arc<TimePickerPage>,
}

impl Pages {
    fn resolve(ctx: &FtrContext) -> HarnessResult<Self> {
        let pages = ctx.get_page_objects(&["dashboard", "header", "discover", "timePicker"])?;
        Ok(Self {
            browser: ctx.get_service(services::BROWSER)?,
            ui_settings: ctx.get_service(services::UI_SETTINGS)?,
            listing_table: ctx.get_service(services::LISTING_TABLE)?,
            add_panel: ctx.get_service(services::DASHBOARD_ADD_PANEL)?,
            panel_actions: ctx.get_service(services::DASHBOARD_PANEL_ACTIONS)?,
            dashboard_visualizations: ctx.get_service(services::DASHBOARD_VISUALIZATIONS)?,
            dashboard: pages.get(page_objects::DASHBOARD)?,
            header: pages.get(page_objects::HEADER)?,
            discover: pages.get(page_objects::DISCOVER)?,
            time_picker: pages.get(page_objects::TIME_PICKER)?,
        })
    }

    async fn expect_panel_count(&self, expected: usize) -> HarnessResult<()> {
        let count = self.dashboard.get_panel_count().await?;
        check(count == expected, format!("expected {expected} panel(s), found {count}"))
    }
}

pub fn suite() -> Suite {
    Suite::new("dashboard panel context menu")
        .before(|ctx| new_dashboard_with_pie_chart(ctx).boxed())
        .after(|ctx| async move { Pages::resolve(ctx)?.dashboard.goto_dashboard_landing_page().await }.boxed())
        .it("are hidden in view mode", |ctx| hidden_in_view_mode(ctx).boxed())
        .it("are shown in edit mode", |ctx| shown_in_edit_mode(ctx).boxed())
        .it("are shown in edit mode after a hard refresh", |ctx| {
            shown_after_hard_refresh(ctx).boxed()
        })
        .describe(
            Suite::new("visualization object edit menu")
                .it("opens a visualization when edit link is clicked", |ctx| {
                    edit_opens_visualization(ctx).boxed()
                })
                .it("deletes the visualization when delete link is clicked", |ctx| {
                    delete_visualization(ctx).boxed()
                }),
        )
        .describe(
            Suite::new("saved search object edit menu")
                .before(|ctx| add_saved_search_panel(ctx).boxed())
                .it("should be one panel on dashboard", |ctx| {
                    async move { Pages::resolve(ctx)?.expect_panel_count(1).await }.boxed()
                })
                .it("opens a saved search when edit link is clicked", |ctx| {
                    edit_opens_saved_search(ctx).boxed()
                })
                .it("deletes the saved search when delete link is clicked", |ctx| {
                    delete_saved_search(ctx).boxed()
                }),
        )
        .describe(
            Suite::new("on an expanded panel")
                .before(|ctx| expand_fresh_panel(ctx).boxed())
                .it("are hidden in view mode", |ctx| expanded_hidden_in_view_mode(ctx).boxed())
                .it("in edit mode hides remove icons", |ctx| {
                    expanded_shown_in_edit_mode(ctx).boxed()
                }),
        )
}

async fn new_dashboard_with_pie_chart(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.dashboard.init_tests().await?;
    p.dashboard.preserve_cross_app_state().await?;
    p.dashboard.click_new_dashboard().await?;
    p.time_picker.set_historical_data_range().await?;
    p.add_panel.add_visualization(PIE_CHART_VIS_NAME).await?;
    p.expect_panel_count(1).await
}

async fn hidden_in_view_mode(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.dashboard
        .save_dashboard(DASHBOARD_NAME, SaveDashboardOptions::default())
        .await?;
    p.panel_actions.open_context_menu().await?;
    p.panel_actions.expect_missing_edit_panel_action().await?;
    p.panel_actions.expect_missing_remove_panel_action().await
}

async fn expect_full_edit_menu(p: &Pages) -> HarnessResult<()> {
    p.panel_actions.open_context_menu().await?;
    p.panel_actions.expect_exists_edit_panel_action().await?;
    p.panel_actions.expect_exists_replace_panel_action().await?;
    p.panel_actions.expect_exists_clone_panel_action().await?;
    p.panel_actions.expect_exists_toggle_expand_action().await?;
    p.panel_actions.expect_exists_remove_panel_action().await
}

async fn shown_in_edit_mode(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.dashboard.switch_to_edit_mode().await?;
    check(
        p.panel_actions.is_context_menu_icon_visible().await?,
        "panel context menu icon should be visible",
    )?;
    expect_full_edit_menu(&p).await
}

async fn shown_after_hard_refresh(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    let current_url = p.browser.get_current_url().await?;
    p.browser.get(&current_url, false).await?;
    p.header.wait_until_loading_has_finished().await?;
    expect_full_edit_menu(&p).await
}

async fn edit_opens_visualization(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.panel_actions.click_edit().await?;
    let current_url = p.browser.get_current_url().await?;
    check(
        current_url.contains("/edit"),
        format!("expected the visualization editor, got {current_url}"),
    )
}

async fn delete_visualization(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.header.click_dashboard().await?;
    p.panel_actions.remove_panel().await?;
    p.expect_panel_count(0).await?;
    p.dashboard
        .save_dashboard(DASHBOARD_NAME, SaveDashboardOptions::default())
        .await
}

async fn add_saved_search_panel(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.ui_settings
        .replace(settings_kv([("discover:v2", false)]))
        .await?;
    p.browser.refresh().await?;
    p.header.click_discover().await?;
    p.discover.click_new_search_button().await?;
    p.dashboard_visualizations
        .create_saved_search(&SavedSearchSpec::new(SAVED_SEARCH_NAME).with_fields(["bytes"]))
        .await?;
    p.header.wait_until_loading_has_finished().await?;
    p.header.click_dashboard().await?;
    p.listing_table
        .click_item_link("dashboard", DASHBOARD_NAME)
        .await?;
    p.dashboard.ensure_edit_mode().await?;
    p.add_panel.add_saved_search(SAVED_SEARCH_NAME).await
}

async fn edit_opens_saved_search(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.panel_actions.click_edit().await?;
    p.header.wait_until_loading_has_finished().await?;
    let query_name = p.discover.get_current_query_name().await?;
    check(
        query_name == SAVED_SEARCH_NAME,
        format!("expected saved search '{SAVED_SEARCH_NAME}', got '{query_name}'"),
    )
}

async fn delete_saved_search(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.header.click_dashboard().await?;
    p.panel_actions.remove_panel().await?;
    p.expect_panel_count(0).await
}

async fn expand_fresh_panel(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    let current_url = p.browser.get_current_url().await?;
    p.browser.get(&current_url, false).await?;
    p.header.wait_until_loading_has_finished().await?;
    p.dashboard.ensure_edit_mode().await?;
    p.add_panel.add_visualization(PIE_CHART_VIS_NAME).await?;
    p.dashboard
        .save_dashboard(DASHBOARD_NAME, SaveDashboardOptions::default())
        .await?;
    p.panel_actions.click_expand_panel_toggle().await
}

async fn expanded_hidden_in_view_mode(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.panel_actions.expect_missing_edit_panel_action().await?;
    p.panel_actions.expect_missing_duplicate_panel_action().await?;
    p.panel_actions.expect_missing_replace_panel_action().await?;
    p.panel_actions.expect_missing_remove_panel_action().await?;
    p.panel_actions.expect_exists_toggle_expand_action().await
}

async fn expanded_shown_in_edit_mode(ctx: &FtrContext) -> HarnessResult<()> {
    let p = Pages::resolve(ctx)?;
    p.dashboard.switch_to_edit_mode().await?;
    p.panel_actions.expect_exists_edit_panel_action().await?;
    p.panel_actions.expect_exists_clone_panel_action().await?;
    p.panel_actions.expect_exists_replace_panel_action().await?;
    p.panel_actions.expect_missing_remove_panel_action().await
}
