#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("record is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("record serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
