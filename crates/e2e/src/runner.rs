//! Suite tree and the runner that walks it
//!
//! A [`Suite`] holds `before`/`after` hooks, `it` cases and nested suites.
//! [`SuiteRunner`] runs before hooks, then cases in declaration order, then
//! nested suites, then after hooks. After hooks always run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ftr_harness::{FtrContext, HarnessError, HarnessResult};

use crate::error::E2eResult;

/// Future returned by hooks and cases
pub type StepFuture<'a> = BoxFuture<'a, HarnessResult<()>>;

type Step = Box<dyn for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync>;

struct Case {
    name: String,
    step: Step,
}

/// A named group of cases with setup and teardown hooks.
pub struct Suite {
    name: String,
    before: Vec<Step>,
    after: Vec<Step>,
    cases: Vec<Case>,
    suites: Vec<Suite>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: Vec::new(),
            after: Vec::new(),
            cases: Vec::new(),
            suites: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.before.push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.after.push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn it<F>(mut self, name: impl Into<String>, case: F) -> Self
    where
        F: for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.cases.push(Case {
            name: name.into(),
            step: Box::new(case),
        });
        self
    }

    #[must_use]
    pub fn describe(mut self, suite: Suite) -> Self {
        self.suites.push(suite);
        self
    }

    /// Full titles of every case, depth first in run order.
    pub fn titles(&self) -> Vec<String> {
        let mut titles = Vec::new();
        self.collect_titles("", &mut titles);
        titles
    }

    fn collect_titles(&self, parent: &str, out: &mut Vec<String>) {
        let path = join_title(parent, &self.name);
        for case in &self.cases {
            out.push(join_title(&path, &case.name));
        }
        for suite in &self.suites {
            suite.collect_titles(&path, out);
        }
    }
}

fn join_title(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent} {name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Result of one `it` case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub title: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// A `before` or `after` hook that failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookFailure {
    pub suite: String,
    pub hook: String,
    pub error: String,
}

/// Result of running a suite tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub cases: Vec<CaseResult>,
    pub hook_failures: Vec<HookFailure>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.hook_failures.is_empty()
    }

    /// Result of the case whose full title ends with `name`.
    pub fn case(&self, name: &str) -> Option<&CaseResult> {
        self.cases.iter().find(|c| c.title.ends_with(name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip the rest of a suite after its first failure
    pub bail: bool,
    /// Only run cases whose full title contains this text
    pub grep: Option<String>,
}

#[derive(Default)]
struct Report {
    cases: Vec<CaseResult>,
    hook_failures: Vec<HookFailure>,
}

pub struct SuiteRunner<'c> {
    ctx: &'c FtrContext,
    options: RunOptions,
}

impl<'c> SuiteRunner<'c> {
    pub fn new(ctx: &'c FtrContext, options: RunOptions) -> Self {
        Self { ctx, options }
    }

    pub async fn run(&self, suite: &Suite) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut report = Report::default();

        info!("Running suite '{}'", suite.name);
        self.run_suite(suite, String::new(), &mut report).await;

        let count = |outcome| report.cases.iter().filter(|c| c.outcome == outcome).count();
        let result = SuiteResult {
            name: suite.name.clone(),
            started_at,
            total: report.cases.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            duration_ms: start.elapsed().as_millis() as u64,
            cases: report.cases,
            hook_failures: report.hook_failures,
        };

        info!(
            "Suite '{}': {} passed, {} failed, {} skipped ({} ms)",
            result.name, result.passed, result.failed, result.skipped, result.duration_ms
        );
        result
    }

    fn selected(&self, title: &str) -> bool {
        self.options
            .grep
            .as_deref()
            .map_or(true, |grep| title.contains(grep))
    }

    /// Returns whether anything in the suite failed.
    fn run_suite<'s>(&'s self, suite: &'s Suite, parent: String, report: &'s mut Report) -> BoxFuture<'s, bool> {
        async move {
            let path = join_title(&parent, &suite.name);
            if !suite.titles_under(&parent).iter().any(|t| self.selected(t)) {
                debug!("No selected cases in '{}'", path);
                return false;
            }

            let mut failed = false;
            let mut skipping = false;

            for hook in &suite.before {
                if let Err(e) = hook(self.ctx).await {
                    error!("✗ \"before\" hook in '{}' - {}", path, e);
                    report.hook_failures.push(hook_failure(&path, "before", &e));
                    failed = true;
                    skipping = true;
                    break;
                }
            }

            for case in &suite.cases {
                let title = join_title(&path, &case.name);
                if !self.selected(&title) {
                    continue;
                }
                if skipping {
                    report.cases.push(skipped(title));
                    continue;
                }

                let start = Instant::now();
                debug!("Running case: {}", title);
                let outcome = (case.step)(self.ctx).await;
                let duration_ms = start.elapsed().as_millis() as u64;
                match outcome {
                    Ok(()) => {
                        info!("✓ {} ({} ms)", title, duration_ms);
                        report.cases.push(CaseResult {
                            title,
                            outcome: Outcome::Passed,
                            duration_ms,
                            error: None,
                        });
                    }
                    Err(e) => {
                        error!("✗ {} - {}", title, e);
                        report.cases.push(CaseResult {
                            title,
                            outcome: Outcome::Failed,
                            duration_ms,
                            error: Some(e.to_string()),
                        });
                        failed = true;
                        skipping = self.options.bail;
                    }
                }
            }

            for child in &suite.suites {
                if skipping {
                    self.skip_suite(child, &path, report);
                } else if self.run_suite(child, path.clone(), &mut *report).await {
                    failed = true;
                    skipping = self.options.bail;
                }
            }

            for hook in &suite.after {
                if let Err(e) = hook(self.ctx).await {
                    warn!("✗ \"after\" hook in '{}' - {}", path, e);
                    report.hook_failures.push(hook_failure(&path, "after", &e));
                    failed = true;
                }
            }

            failed
        }
        .boxed()
    }

    fn skip_suite(&self, suite: &Suite, parent: &str, report: &mut Report) {
        for title in suite.titles_under(parent) {
            if self.selected(&title) {
                report.cases.push(skipped(title));
            }
        }
    }
}

impl Suite {
    fn titles_under(&self, parent: &str) -> Vec<String> {
        let mut titles = Vec::new();
        self.collect_titles(parent, &mut titles);
        titles
    }
}

fn skipped(title: String) -> CaseResult {
    CaseResult {
        title,
        outcome: Outcome::Skipped,
        duration_ms: 0,
        error: None,
    }
}

fn hook_failure(suite: &str, hook: &str, error: &HarnessError) -> HookFailure {
    HookFailure {
        suite: suite.to_string(),
        hook: hook.to_string(),
        error: error.to_string(),
    }
}

/// Fail the current case unless `condition` holds.
pub fn check(condition: bool, message: impl Into<String>) -> HarnessResult<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::assertion(message))
    }
}

/// Apply the configured settings defaults and run `suites` in order. The
/// browser session is ended afterwards, also when setup fails.
pub async fn run_session(
    ctx: &FtrContext,
    suites: &[Suite],
    options: RunOptions,
) -> HarnessResult<Vec<SuiteResult>> {
    let outcome = async {
        ctx.apply_ui_settings_defaults().await?;
        let runner = SuiteRunner::new(ctx, options);
        let mut results = Vec::with_capacity(suites.len());
        for suite in suites {
            results.push(runner.run(suite).await);
        }
        Ok(results)
    }
    .await;

    if let Err(e) = ctx.shutdown().await {
        error!("Failed to end browser session: {}", e);
    }
    outcome
}

/// Write results to `test-results.json` under `output_dir`.
pub fn write_results(output_dir: &Path, results: &[SuiteResult]) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use ftr_harness::fake::FakeDashboards;
    use ftr_harness::{FtrConfig, SettingValue, SettingsKv, UiSettingsStore};

    use super::*;

    fn context() -> FtrContext {
        let config = FtrConfig::default();
        let app = Arc::new(FakeDashboards::new(&config.app));
        let settings = app.settings_store();
        FtrContext::new(config, app, settings).unwrap()
    }

    struct RejectingStore;

    #[async_trait]
    impl UiSettingsStore for RejectingStore {
        async fn apply(&self, _changes: BTreeMap<String, Option<SettingValue>>) -> HarnessResult<()> {
            Err(HarnessError::Settings("403 Forbidden".to_string()))
        }

        async fn user_values(&self) -> HarnessResult<SettingsKv> {
            Ok(SettingsKv::new())
        }
    }

    fn pass() -> impl for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static {
        |_| async { Ok(()) }.boxed()
    }

    fn fail() -> impl for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static {
        |_| async { Err(HarnessError::assertion("boom")) }.boxed()
    }

    fn counting(counter: &Arc<AtomicUsize>) -> impl for<'a> Fn(&'a FtrContext) -> StepFuture<'a> + Send + Sync + 'static {
        let counter = counter.clone();
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        }
    }

    fn outcomes(result: &SuiteResult) -> Vec<(&str, Outcome)> {
        result
            .cases
            .iter()
            .map(|c| (c.title.as_str(), c.outcome))
            .collect()
    }

    #[tokio::test]
    async fn test_cases_then_nested_suites_in_order() {
        let ctx = context();
        let suite = Suite::new("root")
            .it("a", pass())
            .describe(Suite::new("child").it("b", pass()))
            .it("c", pass());
        let result = SuiteRunner::new(&ctx, RunOptions::default()).run(&suite).await;
        assert_eq!(
            outcomes(&result),
            vec![
                ("root a", Outcome::Passed),
                ("root c", Outcome::Passed),
                ("root child b", Outcome::Passed),
            ]
        );
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_failure_without_bail_keeps_going() {
        let ctx = context();
        let suite = Suite::new("root").it("a", fail()).it("b", pass());
        let result = SuiteRunner::new(&ctx, RunOptions::default()).run(&suite).await;
        assert_eq!((result.passed, result.failed, result.skipped), (1, 1, 0));
        assert_eq!(result.case("a").unwrap().error.as_deref(), Some("Assertion failed: boom"));
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_bail_skips_rest_of_suite() {
        let ctx = context();
        let after = Arc::new(AtomicUsize::new(0));
        let suite = Suite::new("root")
            .after(counting(&after))
            .it("a", fail())
            .it("b", pass())
            .describe(Suite::new("child").it("c", pass()));
        let options = RunOptions {
            bail: true,
            ..Default::default()
        };
        let result = SuiteRunner::new(&ctx, options).run(&suite).await;
        assert_eq!(
            outcomes(&result),
            vec![
                ("root a", Outcome::Failed),
                ("root b", Outcome::Skipped),
                ("root child c", Outcome::Skipped),
            ]
        );
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_before_hook_skips_cases_but_runs_after() {
        let ctx = context();
        let after = Arc::new(AtomicUsize::new(0));
        let suite = Suite::new("root")
            .before(fail())
            .after(counting(&after))
            .it("a", pass());
        let result = SuiteRunner::new(&ctx, RunOptions::default()).run(&suite).await;
        assert_eq!(outcomes(&result), vec![("root a", Outcome::Skipped)]);
        assert_eq!(result.hook_failures.len(), 1);
        assert_eq!(result.hook_failures[0].hook, "before");
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_grep_skips_unselected_suites_entirely() {
        let ctx = context();
        let hooks = Arc::new(AtomicUsize::new(0));
        let suite = Suite::new("root")
            .it("alpha", pass())
            .describe(Suite::new("child").before(counting(&hooks)).it("beta", pass()));
        let options = RunOptions {
            grep: Some("alpha".to_string()),
            ..Default::default()
        };
        let result = SuiteRunner::new(&ctx, options).run(&suite).await;
        assert_eq!(outcomes(&result), vec![("root alpha", Outcome::Passed)]);
        assert_eq!(hooks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_titles() {
        let suite = Suite::new("root")
            .it("a", pass())
            .describe(Suite::new("child").it("b", pass()));
        assert_eq!(suite.titles(), vec!["root a", "root child b"]);
    }

    #[tokio::test]
    async fn test_write_results() {
        let ctx = context();
        let suite = Suite::new("root").it("a", pass());
        let result = SuiteRunner::new(&ctx, RunOptions::default()).run(&suite).await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), &[result]).unwrap();
        let written: Vec<SuiteResult> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written[0].passed, 1);
        assert_eq!(written[0].cases[0].title, "root a");
    }

    #[tokio::test]
    async fn test_session_ends_browser_when_settings_fail() {
        let mut config = FtrConfig::default();
        config
            .ui_settings
            .insert("discover:v2".to_string(), SettingValue::Bool(false));
        let app = Arc::new(FakeDashboards::new(&config.app));
        let ctx = FtrContext::new(config, app.clone(), Arc::new(RejectingStore)).unwrap();
        let cases = Arc::new(AtomicUsize::new(0));
        let suite = Suite::new("never started").it("counts", counting(&cases));

        let err = run_session(&ctx, &[suite], RunOptions::default()).await.unwrap_err();

        assert!(matches!(err, HarnessError::Settings(_)));
        assert_eq!(cases.load(Ordering::SeqCst), 0);
        assert_eq!(app.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_session_runs_suites_then_ends_browser() {
        let config = FtrConfig::default();
        let app = Arc::new(FakeDashboards::new(&config.app));
        let settings = app.settings_store();
        let ctx = FtrContext::new(config, app.clone(), settings).unwrap();
        let suites = [Suite::new("a").it("passes", pass()), Suite::new("b").it("fails", fail())];

        let results = run_session(&ctx, &suites, RunOptions::default()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].success());
        assert_eq!(results[1].failed, 1);
        assert_eq!(app.quit_count(), 1);
    }
}
