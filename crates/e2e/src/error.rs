//! Error types for the scenario runner

use ftr_harness::HarnessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("No case matches '{0}'")]
    NothingToRun(String),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
