/// Errors raised while setting up or driving a chain.
///
/// Constraint failures during a run are not errors: a rejected proposal just
/// re-emits the current state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// Malformed updater or constraint setup, detected before any step runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The initial partition does not satisfy its own validator.
    #[error("initial partition fails constraint `{constraint}`")]
    InvalidInitialState { constraint: &'static str },

    /// There is no cut edge to flip along (single-part partition).
    #[error("partition has no cut edges to propose a flip along")]
    EmptyCutEdges,

    /// An incrementally maintained statistic disagrees with a fresh recomputation.
    #[error("statistic `{name}` disagrees with a fresh recomputation")]
    StaleStatistic { name: String },
}

impl ChainError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T, E = ChainError> = std::result::Result<T, E>;
