use serde_json::Value;

/// Characters of query text kept in an [`ApplicationError`].
pub const QUERY_EXCERPT_CHARS: usize = 100;

/// A response that arrived intact but carried a non-null `errors` field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "query: {query_excerpt}\n\nvariables: {}\n\nerror: {}",
    pretty(.variables),
    pretty(.errors)
)]
pub struct ApplicationError {
    pub query_excerpt: String,
    pub variables: Value,
    pub errors: Value,
}

impl ApplicationError {
    pub fn new(query: &str, variables: &Value, errors: Value) -> Self {
        Self {
            query_excerpt: query.chars().take(QUERY_EXCERPT_CHARS).collect(),
            variables: variables.clone(),
            errors,
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Connection, I/O, or timeout failure; no response body was obtained.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a GraphQL `errors` payload.
    #[error("query failed:\n{0}")]
    Application(#[from] ApplicationError),

    /// A body arrived but is not a GraphQL JSON response.
    #[error("undecodable response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("invalid endpoint URL {url:?}: {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl QueryError {
    pub fn is_application(&self) -> bool {
        matches!(self, QueryError::Application(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, QueryError::Transport(_))
    }
}
