use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("pair budget exceeded: {requested} pair evaluations requested, limit is {limit}")]
    PairBudgetExceeded { requested: usize, limit: usize },

    #[error("snapshot I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
