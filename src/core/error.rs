use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// Raised once, at normalization time, for out-of-range or inconsistent inputs.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("invalid solver config: {0}")]
    InvalidSolveConfig(String),
}

impl ScenarioError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ScenarioError::InvalidScenario(msg.into())
    }
}
