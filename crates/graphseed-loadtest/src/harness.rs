//! Repeated query runs against one or more endpoints.
//!
//! Requests to the same endpoint are strictly sequential: request `n + 1` is
//! issued only after request `n` has resolved. Endpoints themselves run one
//! after another ([`EndpointSchedule::Sequential`]) or side by side
//! ([`EndpointSchedule::Concurrent`]).

use std::sync::Arc;
use std::time::{Duration, Instant};

use graphseed_fixtures::{Dataset, Record, User};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::client::{GraphqlClient, GraphqlEndpoint};
use crate::error::QueryError;
use crate::queries::GraphqlRequest;

pub const DEFAULT_REPETITIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointSchedule {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadTestConfig {
    pub repetitions: usize,
    /// Per-request deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub schedule: EndpointSchedule,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            timeout: None,
            schedule: EndpointSchedule::Sequential,
        }
    }
}

/// Pick the `userID` variable uniformly from a dataset's users.
pub fn sample_user_id<R: Rng + ?Sized>(rng: &mut R, users: &[User]) -> Option<String> {
    users
        .choose(rng)
        .map(|user| user.partition_key().to_string())
}

#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// Zero-based position in the endpoint's sequence.
    pub iteration: usize,
    pub elapsed: Duration,
    pub result: Result<Value, QueryError>,
}

/// Latency over every request that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone)]
pub struct EndpointReport {
    pub label: String,
    pub outcomes: Vec<RequestOutcome>,
}

impl EndpointReport {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn application_errors(&self) -> usize {
        self.count_errors(QueryError::is_application)
    }

    /// Failures with no usable response: transport and decode errors.
    pub fn transport_errors(&self) -> usize {
        self.count_errors(|err| !err.is_application())
    }

    fn count_errors(&self, pred: impl Fn(&QueryError) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Err(err) if pred(err)))
            .count()
    }

    /// `None` when no request got a response.
    pub fn latency(&self) -> Option<LatencySummary> {
        let answered: Vec<Duration> = self
            .outcomes
            .iter()
            .filter(|o| match &o.result {
                Ok(_) => true,
                Err(err) => err.is_application(),
            })
            .map(|o| o.elapsed)
            .collect();

        let min = *answered.iter().min()?;
        let max = *answered.iter().max()?;
        let total: Duration = answered.iter().sum();
        let mean = total / answered.len() as u32;
        Some(LatencySummary { min, mean, max })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadTestReport {
    /// One entry per endpoint, in the order the endpoints were given.
    pub endpoints: Vec<EndpointReport>,
}

impl LoadTestReport {
    pub fn total_requests(&self) -> usize {
        self.endpoints.iter().map(|e| e.outcomes.len()).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.endpoints
            .iter()
            .map(|e| e.outcomes.len() - e.successes())
            .sum()
    }
}

pub struct LoadTest {
    client: GraphqlClient,
    config: LoadTestConfig,
}

impl LoadTest {
    pub fn new(config: LoadTestConfig) -> Result<Self, QueryError> {
        let client = GraphqlClient::new(config.timeout)?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: GraphqlClient, config: LoadTestConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Run the request against every endpoint.
    pub async fn run(&self, endpoints: &[GraphqlEndpoint], request: &GraphqlRequest) -> LoadTestReport {
        let mut reports = Vec::with_capacity(endpoints.len());

        match self.config.schedule {
            EndpointSchedule::Sequential => {
                for endpoint in endpoints {
                    reports.push(
                        run_endpoint(&self.client, endpoint, request, self.config.repetitions).await,
                    );
                }
            }
            EndpointSchedule::Concurrent => {
                let request = Arc::new(request.clone());
                let mut tasks = JoinSet::new();
                for (index, endpoint) in endpoints.iter().cloned().enumerate() {
                    let client = self.client.clone();
                    let request = Arc::clone(&request);
                    let repetitions = self.config.repetitions;
                    tasks.spawn(async move {
                        let report = run_endpoint(&client, &endpoint, &request, repetitions).await;
                        (index, report)
                    });
                }

                let mut slots: Vec<Option<EndpointReport>> = vec![None; endpoints.len()];
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok((index, report)) => slots[index] = Some(report),
                        Err(err) => error!(error = %err, "endpoint task failed"),
                    }
                }
                for (slot, endpoint) in slots.into_iter().zip(endpoints) {
                    reports.push(slot.unwrap_or_else(|| EndpointReport {
                        label: endpoint.label.clone(),
                        outcomes: Vec::new(),
                    }));
                }
            }
        }

        LoadTestReport { endpoints: reports }
    }
}

/// Issue `repetitions` requests one at a time, logging each as it resolves.
pub async fn run_endpoint(
    client: &GraphqlClient,
    endpoint: &GraphqlEndpoint,
    request: &GraphqlRequest,
    repetitions: usize,
) -> EndpointReport {
    let mut outcomes = Vec::with_capacity(repetitions);

    for iteration in 0..repetitions {
        let started = Instant::now();
        let result = client.execute(endpoint, request).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match &result {
            Ok(data) => info!(
                endpoint = %endpoint.label,
                iteration,
                elapsed_ms,
                data = %data,
                "query succeeded"
            ),
            Err(err @ QueryError::Application(_)) => error!(
                endpoint = %endpoint.label,
                iteration,
                elapsed_ms,
                "{err}"
            ),
            Err(err) => warn!(
                endpoint = %endpoint.label,
                iteration,
                error = %err,
                "query request failed"
            ),
        }

        outcomes.push(RequestOutcome {
            iteration,
            elapsed,
            result,
        });
    }

    EndpointReport {
        label: endpoint.label.clone(),
        outcomes,
    }
}

/// Convenience for callers holding a snapshot.
pub fn sample_from_dataset<R: Rng + ?Sized>(rng: &mut R, dataset: &Dataset) -> Option<String> {
    sample_user_id(rng, &dataset.users)
}
