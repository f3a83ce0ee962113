//! Shipped scenarios run end to end against the in-memory application

mod common;

use futures::FutureExt;

use ftr_e2e::{scenarios, Outcome, RunOptions, Suite, SuiteRunner};
use ftr_harness::page_objects;
use ftr_harness::services;
use ftr_harness::SettingValue;

use common::fake_context;

fn bail() -> RunOptions {
    RunOptions {
        bail: true,
        grep: None,
    }
}

#[tokio::test]
async fn test_panel_context_menu_scenario_passes() {
    let (ctx, app) = fake_context();
    let suite = scenarios::by_id("panel_context_menu").unwrap();

    let result = SuiteRunner::new(&ctx, bail()).run(&suite).await;

    for case in &result.cases {
        assert_eq!(case.outcome, Outcome::Passed, "{}: {:?}", case.title, case.error);
    }
    assert!(result.hook_failures.is_empty(), "{:?}", result.hook_failures);
    assert_eq!(result.passed, 10);
    // after hook returns to the listing
    assert!(app.panel_titles().is_empty());
    assert!(app.saved_search_columns("my search").is_some());
}

#[tokio::test]
async fn test_lab_mode_scenario_resets_setting() {
    let (ctx, app) = fake_context();
    let suite = scenarios::by_id("lab_mode").unwrap();

    let result = SuiteRunner::new(&ctx, bail()).run(&suite).await;

    assert!(result.success(), "{:?} {:?}", result.cases, result.hook_failures);
    assert_eq!(result.passed, 1);
    assert!(app.settings_store().value("visualize:enableLabs").is_none());
    assert_eq!(
        app.settings_store().value("discover:v2"),
        Some(SettingValue::Bool(false))
    );
}

#[tokio::test]
async fn test_all_scenarios_share_one_context() {
    let (ctx, _app) = fake_context();
    let runner = SuiteRunner::new(&ctx, bail());
    for suite in scenarios::all() {
        let result = runner.run(&suite).await;
        assert!(result.success(), "{}: {:?}", result.name, result.cases);
    }
}

#[tokio::test]
async fn test_grep_runs_single_case() {
    let (ctx, _app) = fake_context();
    let suite = scenarios::by_id("panel_context_menu").unwrap();
    let options = RunOptions {
        bail: true,
        grep: Some("are hidden in view mode".to_string()),
    };

    let result = SuiteRunner::new(&ctx, options).run(&suite).await;

    // the top-level case and the expanded panel one share the name
    assert_eq!(result.total, 2);
    assert!(result.success(), "{:?}", result.cases);
}

#[tokio::test]
async fn test_missing_element_fails_case_with_ui_action() {
    let (ctx, _app) = fake_context();
    let suite = Suite::new("broken")
        .before(|ctx| {
            async move { ctx.get_page_object(page_objects::DASHBOARD)?.init_tests().await }.boxed()
        })
        .it("clicks something that is not there", |ctx| {
            async move {
                ctx.get_service(services::TEST_SUBJECTS)?
                    .click("noSuchButton")
                    .await
            }
            .boxed()
        })
        .it("never runs", |_| async { Ok(()) }.boxed());

    let result = SuiteRunner::new(&ctx, bail()).run(&suite).await;

    let failed = result.case("clicks something that is not there").unwrap();
    assert_eq!(failed.outcome, Outcome::Failed);
    assert!(failed.error.as_deref().unwrap().contains("noSuchButton"));
    assert_eq!(result.case("never runs").unwrap().outcome, Outcome::Skipped);
}
