//! Shipped functional test suites

use crate::error::{E2eError, E2eResult};
use crate::runner::Suite;

pub mod lab_mode;
pub mod panel_context_menu;

/// Scenario ids accepted on the command line, in run order
pub const SCENARIOS: &[(&str, fn() -> Suite)] = &[
    ("panel_context_menu", panel_context_menu::suite),
    ("lab_mode", lab_mode::suite),
];

pub fn all() -> Vec<Suite> {
    SCENARIOS.iter().map(|(_, build)| build()).collect()
}

pub fn by_id(id: &str) -> E2eResult<Suite> {
    SCENARIOS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, build)| build())
        .ok_or_else(|| E2eError::UnknownScenario(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(by_id("lab_mode").unwrap().name(), "visualize lab mode");
        assert!(matches!(by_id("canvas"), Err(E2eError::UnknownScenario(_))));
        assert_eq!(all().len(), SCENARIOS.len());
    }
}
