//! Dashboards Functional Test Runner
//!
//! Suites are trees of async hooks and cases over an
//! [`FtrContext`](ftr_harness::FtrContext). The `ftr` binary resolves the
//! context from a config file and runs the shipped scenarios against a
//! WebDriver endpoint.
//!
//! ```text
//! ftr run [scenario] --config ftr.toml
//!   └── SuiteRunner
//!         ├── before hooks
//!         ├── it cases (in order; --bail skips the rest after a failure)
//!         ├── nested suites
//!         ├── after hooks (always)
//!         └── test-results.json
//! ```

pub mod error;
pub mod runner;
pub mod scenarios;

pub use error::{E2eError, E2eResult};
pub use runner::{
    check, run_session, write_results, CaseResult, Outcome, RunOptions, Suite, SuiteResult, SuiteRunner,
};
