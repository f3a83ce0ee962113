//! Dashboard workflows of the `dashboardVisualizations` service and friends

mod common;

use std::sync::Arc;

use ftr_harness::fake::{FakeDashboards, FakeOptions};
use ftr_harness::page_objects::time_picker::{TimeRange, DEFAULT_END_TIME, DEFAULT_START_TIME};
use ftr_harness::page_objects::{self, DashboardMode, SaveDashboardOptions, PIE_CHART_VIS_NAME};
use ftr_harness::services::dashboard_visualizations::NEW_VIS_DIALOG_NOT_OPEN;
use ftr_harness::services::{self, MarkdownSpec, SavedSearchSpec};
use ftr_harness::{FtrContext, HarnessError, TimeoutConfig};

use common::{fake_context, fake_context_with, fast_config};

/// A new dashboard in edit mode
async fn new_dashboard(ctx: &FtrContext) {
    let dashboard = ctx.get_page_object(page_objects::DASHBOARD).unwrap();
    dashboard.init_tests().await.unwrap();
    dashboard.click_new_dashboard().await.unwrap();
}

fn markdown(name: &str) -> MarkdownSpec {
    MarkdownSpec {
        name: name.to_string(),
        markdown: "# Release notes".to_string(),
    }
}

fn flaky_add_visualization(dropped: u32, try_ms: u64) -> (FtrContext, Arc<FakeDashboards>) {
    let mut config = fast_config();
    config.timeouts = TimeoutConfig {
        try_ms,
        ..config.timeouts
    };
    fake_context_with(
        config,
        FakeOptions {
            loading_polls: 1,
            dropped_add_visualization_clicks: dropped,
        },
    )
}

#[tokio::test]
async fn test_create_and_add_markdown() {
    let (ctx, app) = fake_context();
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();

    dv.create_and_add_markdown(&markdown("Release Notes"))
        .await
        .unwrap();

    assert_eq!(app.panel_titles(), vec!["Release Notes".to_string()]);
    let dashboard = ctx.get_page_object(page_objects::DASHBOARD).unwrap();
    assert_eq!(dashboard.get_panel_count().await.unwrap(), 1);
    dashboard.expect_mode(DashboardMode::Edit).await.unwrap();
}

#[tokio::test]
async fn test_new_vis_dialog_survives_dropped_clicks() {
    let (ctx, _app) = flaky_add_visualization(2, 2_000);
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();

    dv.ensure_new_visualization_dialog_is_showing().await.unwrap();
    assert!(dv.is_new_vis_dialog_showing().await.unwrap());
}

#[tokio::test]
async fn test_new_vis_dialog_gives_up() {
    let (ctx, _app) = flaky_add_visualization(u32::MAX, 300);
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();

    let err = dv.ensure_new_visualization_dialog_is_showing().await.unwrap_err();
    match err {
        HarnessError::RetryExhausted { message, attempts, .. } => {
            assert_eq!(message, NEW_VIS_DIALOG_NOT_OPEN);
            assert!(attempts > 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_and_add_tsvb_visualization() {
    let (ctx, app) = fake_context();
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();

    dv.create_and_add_tsvb_visualization("TSVB traffic").await.unwrap();

    assert_eq!(app.panel_titles(), vec!["TSVB traffic".to_string()]);
    assert!(app
        .saved_visualization_titles()
        .contains(&"TSVB traffic".to_string()));
}

#[tokio::test]
async fn test_create_and_embed_metric_opens_save_dialog() {
    let (ctx, _app) = fake_context();
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();
    let test_subjects = ctx.get_service(services::TEST_SUBJECTS).unwrap();

    dv.create_and_embed_metric("Bytes metric").await.unwrap();

    assert!(test_subjects.exists("savedObjectSaveModal").await.unwrap());
}

#[tokio::test]
async fn test_create_and_embed_markdown_opens_save_dialog() {
    let (ctx, _app) = fake_context();
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();
    let test_subjects = ctx.get_service(services::TEST_SUBJECTS).unwrap();

    dv.create_and_embed_markdown(&markdown("Draft")).await.unwrap();

    assert!(test_subjects.exists("savedObjectSaveModal").await.unwrap());
    assert!(test_subjects.exists("markdownTextarea").await.unwrap());
}

#[tokio::test]
async fn test_create_and_add_saved_search() {
    let (ctx, app) = fake_context();
    new_dashboard(&ctx).await;
    let dv = ctx.get_service(services::DASHBOARD_VISUALIZATIONS).unwrap();
    let search = SavedSearchSpec::new("errors only")
        .with_query("response:404")
        .with_fields(["bytes", "extension"]);

    dv.create_and_add_saved_search(&search).await.unwrap();

    assert_eq!(app.panel_titles(), vec!["errors only".to_string()]);
    assert_eq!(
        app.saved_search_columns("errors only"),
        Some(vec!["bytes".to_string(), "extension".to_string()])
    );
}

#[tokio::test]
async fn test_historical_time_range() {
    let (ctx, app) = fake_context();
    new_dashboard(&ctx).await;
    let time_picker = ctx.get_page_object(page_objects::TIME_PICKER).unwrap();

    time_picker.set_historical_data_range().await.unwrap();

    assert_eq!(
        time_picker.get_time_config().await.unwrap(),
        TimeRange {
            start: DEFAULT_START_TIME.to_string(),
            end: DEFAULT_END_TIME.to_string(),
        }
    );
    assert_eq!(
        app.time_range(),
        (DEFAULT_START_TIME.to_string(), DEFAULT_END_TIME.to_string())
    );
}

#[tokio::test]
async fn test_clone_and_expand_panel() {
    let (ctx, app) = fake_context();
    new_dashboard(&ctx).await;
    let add_panel = ctx.get_service(services::DASHBOARD_ADD_PANEL).unwrap();
    let panel_actions = ctx.get_service(services::DASHBOARD_PANEL_ACTIONS).unwrap();
    let dashboard = ctx.get_page_object(page_objects::DASHBOARD).unwrap();

    add_panel.add_visualization(PIE_CHART_VIS_NAME).await.unwrap();
    panel_actions.clone_panel().await.unwrap();
    assert_eq!(app.panel_titles().len(), 2);
    assert_eq!(dashboard.get_panel_count().await.unwrap(), 2);

    panel_actions.click_expand_panel_toggle().await.unwrap();
    dashboard.expect_mode(DashboardMode::FullScreen).await.unwrap();
    assert_eq!(dashboard.get_panel_count().await.unwrap(), 1);
    panel_actions.expect_missing_remove_panel_action().await.unwrap();
}

#[tokio::test]
async fn test_save_dashboard_as_copy() {
    let (ctx, _app) = fake_context();
    new_dashboard(&ctx).await;
    let dashboard = ctx.get_page_object(page_objects::DASHBOARD).unwrap();
    let listing = ctx.get_service(services::LISTING_TABLE).unwrap();

    dashboard
        .save_dashboard("Original", SaveDashboardOptions::default())
        .await
        .unwrap();
    dashboard.expect_mode(DashboardMode::View).await.unwrap();
    dashboard.switch_to_edit_mode().await.unwrap();
    dashboard
        .save_dashboard(
            "Copy",
            SaveDashboardOptions {
                save_as_new: Some(true),
                store_time_with_dashboard: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(dashboard.get_dashboard_title().await.unwrap(), "Copy");

    dashboard.goto_dashboard_landing_page().await.unwrap();
    assert!(listing.item_exists("dashboard", "Original").await.unwrap());
    assert!(listing.item_exists("dashboard", "Copy").await.unwrap());
}

#[tokio::test]
async fn test_timestamped_reload_keeps_edit_mode() {
    let (ctx, _app) = fake_context();
    new_dashboard(&ctx).await;
    let add_panel = ctx.get_service(services::DASHBOARD_ADD_PANEL).unwrap();
    let browser = ctx.get_service(services::BROWSER).unwrap();
    let header = ctx.get_page_object(page_objects::HEADER).unwrap();
    let dashboard = ctx.get_page_object(page_objects::DASHBOARD).unwrap();

    add_panel.add_visualization(PIE_CHART_VIS_NAME).await.unwrap();
    dashboard
        .save_dashboard("Hard refresh", SaveDashboardOptions::default())
        .await
        .unwrap();
    dashboard.switch_to_edit_mode().await.unwrap();

    let current_url = browser.get_current_url().await.unwrap();
    browser.get(&current_url, true).await.unwrap();
    header.wait_until_loading_has_finished().await.unwrap();

    assert!(!dashboard.get_is_in_view_mode().await.unwrap());
    dashboard.expect_mode(DashboardMode::Edit).await.unwrap();
    assert_eq!(dashboard.get_panel_count().await.unwrap(), 1);
}
