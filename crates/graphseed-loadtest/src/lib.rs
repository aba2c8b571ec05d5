//! Graphseed load test
//!
//! Replays a named GraphQL query against one or more APIs:
//!
//! ```text
//! snapshot ──► sample userID ──► QueryTemplate::for_user ──► GraphqlRequest
//!                                                                 │
//!                  ┌──────────────────────────────────────────────┤
//!                  ▼                                              ▼
//!        endpoint A: req 1 → req 2 → … → req N        endpoint B: req 1 → …
//!                  │                                              │
//!                  └──────────────► LoadTestReport ◄──────────────┘
//! ```
//!
//! Each response is classified as data, an application error (`errors` in
//! the body), or a transport failure.

pub mod client;
pub mod error;
pub mod harness;
pub mod queries;

pub use client::{classify_response, GraphqlClient, GraphqlEndpoint, API_KEY_HEADER, GRAPHQL_PATH};
pub use error::{ApplicationError, QueryError, QUERY_EXCERPT_CHARS};
pub use harness::{
    run_endpoint, sample_from_dataset, sample_user_id, EndpointReport, EndpointSchedule,
    LatencySummary, LoadTest, LoadTestConfig, LoadTestReport, RequestOutcome, DEFAULT_REPETITIONS,
};
pub use queries::{GraphqlRequest, QueryTemplate, BUILTIN_TEMPLATES, OPERATION_NAME};
