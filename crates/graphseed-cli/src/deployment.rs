//! Deployment outputs: table names and API endpoints.
//!
//! Outputs come either from the deployment state document
//! (`components.<Component>.outputs.<Name>`) or from environment variables
//! named after the output in UPPER_SNAKE_CASE (`MoviesTableID` →
//! `MOVIES_TABLE_ID`). Any missing output is fatal.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use graphseed_fixtures::EntityKind;
use graphseed_loadtest::{GraphqlEndpoint, QueryError};

pub const DEFAULT_STATE_PATH: &str = ".serverless/state.dev.json";

const MULTI_TABLE_DB: &str = "MultiTableDB";
const SINGLE_TABLE_DB: &str = "SingleTableDB";
const SINGLE_TABLE_API: &str = "SingleTableAPI";
const MULTI_TABLE_API: &str = "MultiTableAPI";

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("failed to read deployment state {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("deployment state {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("deployment state has no component {0:?}")]
    MissingComponent(String),

    #[error("component {component:?} has no string output {output:?}")]
    MissingOutput { component: String, output: String },

    #[error("environment variable {variable} (output {output:?}) is not set")]
    MissingVariable { variable: String, output: String },

    #[error("component {component:?} has an unusable endpoint: {source}")]
    InvalidEndpoint {
        component: String,
        #[source]
        source: QueryError,
    },
}

/// `MoviesTableID` → `MOVIES_TABLE_ID`.
///
/// Every run of capitals starts a new word; a run is kept together.
pub fn env_var_name(output: &str) -> String {
    let mut name = String::with_capacity(output.len() + 4);
    let mut prev_upper = false;
    for c in output.chars() {
        let upper = c.is_ascii_uppercase();
        if upper && !prev_upper && !name.is_empty() {
            name.push('_');
        }
        name.push(c.to_ascii_uppercase());
        prev_upper = upper;
    }
    name
}

pub fn read_state(path: &Path) -> Result<Value, DeploymentError> {
    let text = fs::read_to_string(path).map_err(|source| DeploymentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DeploymentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Where outputs are looked up.
#[derive(Debug, Clone)]
pub enum OutputSource {
    State(Value),
    Env(BTreeMap<String, String>),
}

impl OutputSource {
    pub fn from_state_file(path: &Path) -> Result<Self, DeploymentError> {
        read_state(path).map(OutputSource::State)
    }

    pub fn from_process_env() -> Self {
        OutputSource::Env(std::env::vars().collect())
    }

    pub fn output(&self, component: &str, output: &str) -> Result<String, DeploymentError> {
        match self {
            OutputSource::State(state) => {
                let outputs = state
                    .get("components")
                    .and_then(|c| c.get(component))
                    .ok_or_else(|| DeploymentError::MissingComponent(component.to_string()))?
                    .get("outputs");
                outputs
                    .and_then(|o| o.get(output))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| DeploymentError::MissingOutput {
                        component: component.to_string(),
                        output: output.to_string(),
                    })
            }
            OutputSource::Env(vars) => {
                let variable = env_var_name(output);
                vars.get(&variable)
                    .cloned()
                    .ok_or_else(|| DeploymentError::MissingVariable {
                        variable,
                        output: output.to_string(),
                    })
            }
        }
    }
}

/// One table per entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTables {
    pub movies: String,
    pub users: String,
    pub reviews: String,
    pub lists: String,
    pub associations: String,
    pub relationships: String,
}

impl MultiTables {
    pub fn resolve(source: &OutputSource) -> Result<Self, DeploymentError> {
        let table = |output: &str| source.output(MULTI_TABLE_DB, output);
        Ok(Self {
            movies: table("MoviesTableID")?,
            users: table("UsersTableID")?,
            reviews: table("ReviewsTableID")?,
            lists: table("ListsTableID")?,
            associations: table("AssociationsTableID")?,
            relationships: table("RelationshipsTableID")?,
        })
    }

    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Movie => &self.movies,
            EntityKind::User => &self.users,
            EntityKind::Review => &self.reviews,
            EntityKind::List => &self.lists,
            EntityKind::Association => &self.associations,
            EntityKind::Follow => &self.relationships,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTargets {
    /// `None` when only the combined table is loaded.
    pub multi: Option<MultiTables>,
    pub combined: String,
}

impl TableTargets {
    pub fn resolve(source: &OutputSource, single_table_only: bool) -> Result<Self, DeploymentError> {
        let multi = if single_table_only {
            None
        } else {
            Some(MultiTables::resolve(source)?)
        };
        let combined = source.output(SINGLE_TABLE_DB, "SingleTableID")?;
        Ok(Self { multi, combined })
    }

    /// Placeholder names for runs that never reach a real store.
    pub fn logical(single_table_only: bool) -> Self {
        let multi = (!single_table_only).then(|| MultiTables {
            movies: "movies".to_string(),
            users: "users".to_string(),
            reviews: "reviews".to_string(),
            lists: "lists".to_string(),
            associations: "associations".to_string(),
            relationships: "relationships".to_string(),
        });
        Self {
            multi,
            combined: "single-table".to_string(),
        }
    }
}

/// The two GraphQL APIs, single-table first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTargets {
    pub single_table: GraphqlEndpoint,
    pub multi_table: GraphqlEndpoint,
}

impl ApiTargets {
    /// Both endpoints, with their URLs checked up front.
    pub fn resolve(source: &OutputSource) -> Result<Self, DeploymentError> {
        Ok(Self {
            single_table: endpoint(
                source,
                SINGLE_TABLE_API,
                "AppsyncGraphQlApiUrl",
                "AppsyncGraphQlApiKeyDefault",
            )?,
            multi_table: endpoint(
                source,
                MULTI_TABLE_API,
                "Appsync2GraphQlApiUrl",
                "Appsync2GraphQlApiKeyDefault",
            )?,
        })
    }

    pub fn endpoints(&self) -> [GraphqlEndpoint; 2] {
        [self.single_table.clone(), self.multi_table.clone()]
    }
}

fn endpoint(
    source: &OutputSource,
    component: &str,
    url_output: &str,
    key_output: &str,
) -> Result<GraphqlEndpoint, DeploymentError> {
    let endpoint = GraphqlEndpoint::new(
        component,
        source.output(component, url_output)?,
        source.output(component, key_output)?,
    );
    endpoint
        .request_url()
        .map_err(|source| DeploymentError::InvalidEndpoint {
            component: component.to_string(),
            source,
        })?;
    Ok(endpoint)
}

/// `UPPER_SNAKE=value` for every output of every component.
///
/// Non-string outputs are written as JSON.
pub fn env_lines(state: &Value) -> Vec<String> {
    let Some(components) = state.get("components").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for component in components.values() {
        let Some(outputs) = component.get("outputs").and_then(Value::as_object) else {
            continue;
        };
        for (name, value) in outputs {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("{}={}", env_var_name(name), rendered));
        }
    }
    lines
}
