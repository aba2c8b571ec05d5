//! Named GraphQL query templates.
//!
//! Each template takes a single `$userID` variable and walks progressively
//! deeper through the follow graph.

use serde::Serialize;
use serde_json::{json, Value};

/// Operation name used by every built-in template.
pub const OPERATION_NAME: &str = "MyQuery";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub operation_name: &'static str,
    pub text: &'static str,
}

/// `getUser -> following`.
const FOLLOWING: &str = r#"
  query MyQuery($userID: String!) {
    getUser(userID: $userID) {
      PK
      following {
        PK
        SK
      }
    }
  }"#;

/// `getUser -> following -> reviews`.
const FOLLOWING_REVIEWS: &str = r#"
  query MyQuery($userID: String!) {
    getUser(userID: $userID) {
      PK
      following {
        PK
        SK
        reviews {
          PK
          SK
        }
      }
    }
  }"#;

/// `getUser -> following -> reviews -> movie`.
const FOLLOWING_REVIEWS_MOVIES: &str = r#"
  query MyQuery($userID: String!) {
    getUser(userID: $userID) {
      PK
      following {
        PK
        SK
        reviews {
          PK
          SK
          movie {
            PK
            SK
          }
        }
      }
    }
  }"#;

pub const BUILTIN_TEMPLATES: [QueryTemplate; 3] = [
    QueryTemplate {
        name: "query1",
        operation_name: OPERATION_NAME,
        text: FOLLOWING,
    },
    QueryTemplate {
        name: "query2",
        operation_name: OPERATION_NAME,
        text: FOLLOWING_REVIEWS,
    },
    QueryTemplate {
        name: "query3",
        operation_name: OPERATION_NAME,
        text: FOLLOWING_REVIEWS_MOVIES,
    },
];

impl QueryTemplate {
    pub fn find(name: &str) -> Option<&'static QueryTemplate> {
        BUILTIN_TEMPLATES.iter().find(|t| t.name == name)
    }

    /// The template used when none is named.
    pub fn default_template() -> &'static QueryTemplate {
        &BUILTIN_TEMPLATES[0]
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN_TEMPLATES.iter().map(|t| t.name)
    }

    /// Bind the template's `$userID` placeholder.
    pub fn for_user(&self, user_id: &str) -> GraphqlRequest {
        GraphqlRequest {
            query: self.text.to_string(),
            operation_name: self.operation_name.to_string(),
            variables: json!({ "userID": user_id }),
        }
    }
}

/// POST body of a GraphQL call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    pub operation_name: String,
    pub variables: Value,
}
