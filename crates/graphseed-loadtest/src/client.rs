//! HTTP client for a single GraphQL API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{ApplicationError, QueryError};
use crate::queries::GraphqlRequest;

/// Every request goes to this path on the endpoint's origin.
pub const GRAPHQL_PATH: &str = "/graphql";
pub const API_KEY_HEADER: &str = "x-api-key";

/// A GraphQL API under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphqlEndpoint {
    pub label: String,
    pub url: String,
    pub api_key: String,
}

impl GraphqlEndpoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// The endpoint's scheme and host with the path replaced by `/graphql`.
    pub fn request_url(&self) -> Result<Url, QueryError> {
        let mut url = Url::parse(&self.url).map_err(|e| QueryError::InvalidEndpoint {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(QueryError::InvalidEndpoint {
                url: self.url.clone(),
                message: "URL has no host".to_string(),
            });
        }
        url.set_path(GRAPHQL_PATH);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

/// Sort a finished response into data, application error, or decode error.
///
/// A JSON `null` for `errors` counts as no errors.
pub fn classify_response(
    request: &GraphqlRequest,
    status: u16,
    body: &[u8],
) -> Result<Value, QueryError> {
    let response: GraphqlResponse =
        serde_json::from_slice(body).map_err(|e| QueryError::Decode {
            status,
            message: e.to_string(),
        })?;

    match response.errors {
        Some(errors) => Err(ApplicationError::new(&request.query, &request.variables, errors).into()),
        None => Ok(response.data.unwrap_or(Value::Null)),
    }
}

#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
}

impl GraphqlClient {
    /// Build a client; `None` leaves requests without a deadline.
    pub fn new(timeout: Option<Duration>) -> Result<Self, QueryError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| QueryError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    /// POST `request` to the endpoint and classify the reply.
    pub async fn execute(
        &self,
        endpoint: &GraphqlEndpoint,
        request: &GraphqlRequest,
    ) -> Result<Value, QueryError> {
        let url = endpoint.request_url()?;

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &endpoint.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        classify_response(request, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::QueryTemplate;
    use serde_json::json;

    fn request() -> GraphqlRequest {
        QueryTemplate::default_template().for_user("USER#7x@y.z")
    }

    #[test]
    fn test_request_url_keeps_origin_only() {
        let endpoint = GraphqlEndpoint::new(
            "api",
            "https://abc.appsync-api.us-east-1.amazonaws.com/graphql?x=1",
            "k",
        );
        assert_eq!(
            endpoint.request_url().unwrap().as_str(),
            "https://abc.appsync-api.us-east-1.amazonaws.com/graphql"
        );

        let endpoint = GraphqlEndpoint::new("api", "http://127.0.0.1:8080/other/path", "k");
        assert_eq!(endpoint.request_url().unwrap().as_str(), "http://127.0.0.1:8080/graphql");
    }

    #[test]
    fn test_request_url_rejects_garbage() {
        let endpoint = GraphqlEndpoint::new("api", "not a url", "k");
        assert!(matches!(
            endpoint.request_url(),
            Err(QueryError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_classify_data() {
        let body = br#"{"data":{"getUser":{"PK":"USER#7x@y.z"}}}"#;
        let data = classify_response(&request(), 200, body).unwrap();
        assert_eq!(data["getUser"]["PK"], "USER#7x@y.z");
    }

    #[test]
    fn test_classify_null_errors_is_success() {
        let body = br#"{"data":null,"errors":null}"#;
        assert_eq!(classify_response(&request(), 200, body).unwrap(), Value::Null);
    }

    #[test]
    fn test_classify_errors_payload() {
        let body = br#"{"data":null,"errors":[{"message":"boom"}]}"#;
        match classify_response(&request(), 200, body) {
            Err(QueryError::Application(err)) => {
                assert_eq!(err.variables, json!({"userID": "USER#7x@y.z"}));
                assert_eq!(err.errors[0]["message"], "boom");
                assert!(err.query_excerpt.chars().count() <= 100);
            }
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_non_json_body() {
        let err = classify_response(&request(), 502, b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, QueryError::Decode { status: 502, .. }));
    }
}
