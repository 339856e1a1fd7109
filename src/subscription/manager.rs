//! Subscription provisioning facade
//!
//! Combines token acquisition with alias operations: one token per run,
//! one alias per creation, submission strictly before polling.

use chrono::Utc;
use std::sync::Arc;

use super::models::{AliasRequest, AliasStatus, CreatedSubscription};
use super::operations::AliasOperations;
use crate::auth::provider::TokenProvider;
use crate::error::Result;
use crate::utils::format::DisplayUtils;
use crate::utils::retry::PollPolicy;

/// High-level subscription manager
pub struct SubscriptionManager {
    token_provider: Arc<dyn TokenProvider>,
    alias_ops: Arc<dyn AliasOperations>,
    display_utils: DisplayUtils,
}

impl SubscriptionManager {
    pub fn new(
        token_provider: Arc<dyn TokenProvider>,
        alias_ops: Arc<dyn AliasOperations>,
        display_utils: DisplayUtils,
    ) -> Self {
        Self {
            token_provider,
            alias_ops,
            display_utils,
        }
    }

    async fn management_token(&self) -> Result<String> {
        let token = self.token_provider.get_token().await?;
        Ok(token.token.secret().to_string())
    }

    /// Create a subscription and wait until it is provisioned
    pub async fn create_subscription(
        &self,
        request: &AliasRequest,
        poll: &PollPolicy,
    ) -> Result<CreatedSubscription> {
        let token = self.management_token().await?;

        self.display_utils.print_info(&format!(
            "Creating alias '{}' for '{}'...",
            request.alias, request.display_name
        ));
        self.alias_ops.submit(&token, request).await?;
        self.display_utils
            .print_info("Alias accepted, waiting for provisioning to complete...");

        let subscription_id = self
            .alias_ops
            .poll_until_terminal(&token, &request.alias, poll)
            .await?;

        self.display_utils.print_success(&format!(
            "Created subscription {} and attached it to {}",
            subscription_id, request.management_group_id
        ));

        Ok(CreatedSubscription {
            subscription_id,
            display_name: request.display_name.clone(),
            alias: request.alias.clone(),
            management_group_id: request.management_group_id.clone(),
            completed_at: Utc::now(),
        })
    }

    /// Submit the alias without waiting for provisioning
    pub async fn submit_only(&self, request: &AliasRequest) -> Result<()> {
        let token = self.management_token().await?;
        self.alias_ops.submit(&token, request).await?;
        self.display_utils.print_success(&format!(
            "Alias '{}' accepted. Follow it with `subvend status {}`",
            request.alias, request.alias
        ));
        Ok(())
    }

    /// Resume waiting on an alias created by an earlier run
    pub async fn wait_for_alias(&self, alias: &str, poll: &PollPolicy) -> Result<String> {
        let token = self.management_token().await?;
        let subscription_id = self
            .alias_ops
            .poll_until_terminal(&token, alias, poll)
            .await?;
        self.display_utils
            .print_success(&format!("Alias '{}' resolved to subscription {}", alias, subscription_id));
        Ok(subscription_id)
    }

    /// Single status read of an alias
    pub async fn alias_status(&self, alias: &str) -> Result<AliasStatus> {
        let token = self.management_token().await?;
        self.alias_ops.get_alias(&token, alias).await
    }
}
