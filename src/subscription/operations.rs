//! Subscription alias operations
//!
//! Creating an alias starts an asynchronous provisioning operation on the
//! management plane. Submission is retried while the provider throttles;
//! completion is observed by polling the same alias until it reaches a
//! terminal state.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{AliasRequest, AliasStatus};
use crate::error::{Result, SubvendError};
use crate::utils::clock::{Clock, TokioClock};
use crate::utils::endpoint::ArmEndpoint;
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use crate::utils::retry::{BackoffPolicy, PollPolicy};

/// Trait for subscription alias operations
#[async_trait]
pub trait AliasOperations: Send + Sync {
    /// Submit an alias creation; `Ok` means accepted, not finished
    async fn submit(&self, token: &str, request: &AliasRequest) -> Result<()>;

    /// Read the current state of an alias once
    async fn get_alias(&self, token: &str, alias: &str) -> Result<AliasStatus>;

    /// Poll an alias until it succeeds with a subscription id, fails, or
    /// the policy's timeout runs out. Returns the subscription id.
    async fn poll_until_terminal(
        &self,
        token: &str,
        alias: &str,
        policy: &PollPolicy,
    ) -> Result<String>;
}

/// Alias operations against Azure Resource Manager
pub struct AzureAliasOperations {
    http_client: Client,
    endpoint: ArmEndpoint,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
}

impl AzureAliasOperations {
    pub fn new(endpoint: ArmEndpoint, backoff: BackoffPolicy) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        Ok(Self {
            http_client,
            endpoint,
            backoff,
            clock: Arc::new(TokioClock::new()),
        })
    }

    /// Replace the time source used for backoff and polling
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl AliasOperations for AzureAliasOperations {
    async fn submit(&self, token: &str, request: &AliasRequest) -> Result<()> {
        let url = self.endpoint.resource_url(&request.alias)?;
        let body = request.to_body();
        let max_attempts = self.backoff.max_attempts.max(1);
        let mut interval = std::cmp::min(self.backoff.initial_interval, self.backoff.max_interval);

        for attempt in 1..=max_attempts {
            info!(attempt, alias = %request.alias, %url, "Submitting subscription alias");

            let response = self
                .http_client
                .put(url.clone())
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .map_err(|e| classify_network_error(&e, url.as_str()))?;

            let status = response.status();
            if status.is_success() {
                info!(alias = %request.alias, status = status.as_u16(), "Alias accepted");
                return Ok(());
            }

            let text = response
                .text()
                .await
                .map_err(|e| classify_network_error(&e, url.as_str()))?;

            match status {
                StatusCode::FORBIDDEN => {
                    return Err(SubvendError::permission(request.billing_scope.as_str(), text));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt == max_attempts {
                        break;
                    }
                    warn!(
                        attempt,
                        alias = %request.alias,
                        backoff_secs = interval.as_secs_f64(),
                        "Throttled (429), backing off before retrying"
                    );
                    self.clock.sleep(interval).await;
                    interval = self.backoff.next_interval(interval);
                }
                _ => {
                    return Err(SubvendError::SubmissionError {
                        alias: request.alias.clone(),
                        status: status.as_u16(),
                        body: text,
                    });
                }
            }
        }

        Err(SubvendError::ThrottleExhausted {
            alias: request.alias.clone(),
            attempts: max_attempts,
        })
    }

    async fn get_alias(&self, token: &str, alias: &str) -> Result<AliasStatus> {
        let url = self.endpoint.resource_url(alias)?;
        let transport_error = |e: reqwest::Error| SubvendError::PollRequestError {
            alias: alias.to_string(),
            status: None,
            body: classify_network_error(&e, url.as_str()).to_string(),
        };

        let response = self
            .http_client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(SubvendError::PollRequestError {
                alias: alias.to_string(),
                status: Some(status.as_u16()),
                body,
            });
        }

        AliasStatus::from_body(alias, body.clone()).map_err(|e| SubvendError::PollRequestError {
            alias: alias.to_string(),
            status: Some(status.as_u16()),
            body: format!("response is not an alias resource ({}): {}", e, body),
        })
    }

    async fn poll_until_terminal(
        &self,
        token: &str,
        alias: &str,
        policy: &PollPolicy,
    ) -> Result<String> {
        let started = self.clock.now();
        info!(alias, "Waiting for provisioning to complete");

        loop {
            let status = self.get_alias(token, alias).await?;
            info!(
                alias,
                state = %status.state,
                subscription_id = status.subscription_id.as_deref().unwrap_or("None"),
                "Polled alias"
            );

            if let Some(subscription_id) = status.completed_subscription() {
                info!(alias, subscription_id, "Subscription created");
                return Ok(subscription_id.to_string());
            }

            if status.state.is_failure() {
                return Err(SubvendError::ProvisioningFailed {
                    alias: alias.to_string(),
                    state: status.state.to_string(),
                    body: status.body,
                });
            }

            if status.state.is_terminal() {
                // Succeeded, but the subscription id is not populated yet
                debug!(alias, "Alias succeeded without a subscription id, polling again");
            }

            self.clock.sleep(policy.interval).await;

            let elapsed = self.clock.now().saturating_sub(started);
            if elapsed >= policy.timeout {
                return Err(SubvendError::ProvisioningTimeout {
                    alias: alias.to_string(),
                    last_state: status.state.to_string(),
                    elapsed_secs: elapsed.as_secs(),
                });
            }
        }
    }
}
