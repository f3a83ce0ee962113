//! Visualize lab mode
//!
//! Turning off `visualize:enableLabs` must not break loading saved searches
//! in legacy Discover.

use futures::FutureExt;

use ftr_harness::page_objects::{self, NavigateOptions, VISUALIZE_ENABLE_LABS_SETTING};
use ftr_harness::services;
use ftr_harness::{settings_kv, FtrContext, HarnessResult};

use crate::runner::{check, Suite};

const SAVED_SEARCH_NAME: &str = "visualize_lab_mode_test";

pub fn suite() -> Suite {
    Suite::new("visualize lab mode")
        .before(|ctx| {
            async move {
                ctx.get_service(services::UI_SETTINGS)?
                    .replace(settings_kv([("discover:v2", false)]))
                    .await
            }
            .boxed()
        })
        .it("disabling does not break loading saved searches", |ctx| {
            disabling_keeps_saved_searches(ctx).boxed()
        })
        .after(|ctx| reset_lab_mode(ctx).boxed())
}

async fn expect_saved_search_listed(ctx: &FtrContext) -> HarnessResult<()> {
    let discover = ctx.get_page_object(page_objects::DISCOVER)?;
    discover.open_load_saved_search_panel().await?;
    check(
        discover.has_saved_search(SAVED_SEARCH_NAME).await?,
        format!("saved search '{SAVED_SEARCH_NAME}' should be listed"),
    )
}

async fn disabling_keeps_saved_searches(ctx: &FtrContext) -> HarnessResult<()> {
    let common = ctx.get_page_object(page_objects::COMMON)?;
    let discover = ctx.get_page_object(page_objects::DISCOVER)?;
    let header = ctx.get_page_object(page_objects::HEADER)?;
    let settings = ctx.get_page_object(page_objects::SETTINGS)?;

    common
        .navigate_to_url("discover", "", NavigateOptions::default())
        .await?;
    discover.save_search(SAVED_SEARCH_NAME).await?;
    expect_saved_search_listed(ctx).await?;
    discover.close_load_saved_search_panel().await?;

    // Disable lab mode
    header.click_stack_management().await?;
    settings.click_open_search_dashboards_settings().await?;
    settings
        .toggle_advanced_setting_checkbox(VISUALIZE_ENABLE_LABS_SETTING)
        .await?;
    check(
        !settings
            .get_advanced_setting_checkbox(VISUALIZE_ENABLE_LABS_SETTING)
            .await?,
        "lab mode should be off",
    )?;

    header.click_discover().await?;
    expect_saved_search_listed(ctx).await
}

async fn reset_lab_mode(ctx: &FtrContext) -> HarnessResult<()> {
    let discover = ctx.get_page_object(page_objects::DISCOVER)?;
    let header = ctx.get_page_object(page_objects::HEADER)?;
    let settings = ctx.get_page_object(page_objects::SETTINGS)?;

    discover.close_load_saved_search_panel().await?;
    header.click_stack_management().await?;
    settings.click_open_search_dashboards_settings().await?;
    settings
        .clear_advanced_settings(VISUALIZE_ENABLE_LABS_SETTING)
        .await
}
