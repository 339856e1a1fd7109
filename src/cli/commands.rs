//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, their arguments and their execution.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use crate::auth::provider::{token_preview, ClientSecretProvider, Credentials};
use crate::config::Config;
use crate::error::{Result, SubvendError};
use crate::subscription::{
    AliasRequest, AliasStatus, AzureAliasOperations, ProvisioningState, SubscriptionManager,
};
use crate::utils::endpoint::ArmEndpoint;
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};

/// Characters of the token shown by `subvend auth`
const TOKEN_PREVIEW_LEN: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "subvend")]
#[command(about = "Provision Azure subscriptions under a billing scope and management group")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file (defaults to ./variables.json, then the user config dir)
    #[arg(long, global = true, value_name = "PATH", env = "SUBVEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a subscription named `<prefix><NAME>` and wait until it exists
    Create {
        /// Name part appended to the display name prefix (e.g. Marie -> Sandbox-Marie)
        name: String,
        /// Use this display name verbatim instead of prefix + NAME
        #[arg(long)]
        display_name: Option<String>,
        /// Give up waiting after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
        /// Seconds between status polls
        #[arg(long, value_name = "SECONDS")]
        poll_interval: Option<u64>,
        /// Submission attempts while throttled
        #[arg(long)]
        max_retries: Option<usize>,
        /// Submit the alias and exit without waiting for provisioning
        #[arg(long)]
        no_wait: bool,
    },
    /// Check the service principal credentials by acquiring a token
    Auth,
    /// Show or wait on an existing subscription alias
    Status {
        /// Alias name printed by `create`
        alias: String,
        /// Read the state once instead of waiting for a terminal state
        #[arg(long)]
        once: bool,
        /// Give up waiting after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
        /// Seconds between status polls
        #[arg(long, value_name = "SECONDS")]
        poll_interval: Option<u64>,
    },
}

impl Commands {
    /// Check the configuration sections this command reads. Only `create`
    /// needs billing and management group settings.
    pub fn validate_config(&self, config: &Config) -> Result<()> {
        match self {
            Commands::Create { .. } => config.validate(),
            Commands::Auth => config.validate_auth(),
            Commands::Status { .. } => {
                config.validate_auth()?;
                config.validate_provisioning()
            }
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct AliasStatusRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Subscription ID")]
    subscription_id: String,
}

impl From<&AliasStatus> for AliasStatusRow {
    fn from(status: &AliasStatus) -> Self {
        Self {
            alias: status.alias.clone(),
            state: status.state.to_string(),
            subscription_id: status.subscription_id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct SubmittedAliasRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        let display = DisplayUtils::new(self.no_color).quiet(self.format == OutputFormat::Json);
        let formatter = TableFormatter::new(self.format, self.no_color);

        match self.command {
            Commands::Create {
                name,
                display_name,
                timeout,
                poll_interval,
                max_retries,
                no_wait,
            } => {
                apply_overrides(&mut config, timeout, poll_interval, max_retries)?;
                let display_name = display_name.unwrap_or_else(|| config.display_name_for(&name));
                execute_create(&config, display_name, no_wait, display, &formatter).await
            }
            Commands::Auth => execute_auth(&config, &display).await,
            Commands::Status {
                alias,
                once,
                timeout,
                poll_interval,
            } => {
                apply_overrides(&mut config, timeout, poll_interval, None)?;
                execute_status(&config, &alias, once, display, &formatter).await
            }
        }
    }
}

fn apply_overrides(
    config: &mut Config,
    timeout: Option<u64>,
    poll_interval: Option<u64>,
    max_retries: Option<usize>,
) -> Result<()> {
    if let Some(seconds) = timeout {
        config.provisioning.timeout_secs = seconds;
    }
    if let Some(seconds) = poll_interval {
        if seconds == 0 {
            return Err(SubvendError::invalid_argument(
                "--poll-interval must be greater than 0",
            ));
        }
        config.provisioning.poll_interval_secs = seconds;
    }
    if let Some(retries) = max_retries {
        if retries == 0 {
            return Err(SubvendError::invalid_argument(
                "--max-retries must be at least 1",
            ));
        }
        config.provisioning.max_retries = retries;
    }
    Ok(())
}

fn credentials_from(config: &Config) -> Result<Credentials> {
    Credentials::new(
        config.auth.tenant_id.as_str(),
        config.auth.client_id.as_str(),
        config.auth.client_secret_value.as_str(),
    )
    .map_err(|e| SubvendError::config(format!("Invalid auth section: {}", e)))
}

fn create_subscription_manager(config: &Config, display: DisplayUtils) -> Result<SubscriptionManager> {
    let provider = ClientSecretProvider::with_authority(
        credentials_from(config)?,
        &config.endpoints.authority_host,
    )?;
    let endpoint = ArmEndpoint::subscription_aliases(
        &config.endpoints.resource_manager,
        &config.endpoints.alias_api_version,
    )?;
    let alias_ops = AzureAliasOperations::new(endpoint, config.provisioning.backoff_policy())?;

    Ok(SubscriptionManager::new(
        Arc::new(provider),
        Arc::new(alias_ops),
        display,
    ))
}

async fn execute_create(
    config: &Config,
    display_name: String,
    no_wait: bool,
    display: DisplayUtils,
    formatter: &TableFormatter,
) -> Result<()> {
    if display_name.trim().is_empty() {
        return Err(SubvendError::invalid_argument("Display name must not be empty"));
    }

    let billing_scope = config.billing_scope();
    let management_group_id = config.management_group_id()?;

    display.print_header("Subscription");
    println_unless_quiet(
        &display,
        &display.format_key_value_pairs(&[
            ("Display name", display_name.as_str()),
            ("Billing scope", billing_scope.as_str()),
            ("Management group", management_group_id.as_str()),
        ]),
    );

    let request = AliasRequest::new(
        display_name,
        billing_scope,
        config.auth.tenant_id.as_str(),
        management_group_id,
    )
    .with_tags(config.subscription.tags.clone())
    .with_workload(config.subscription.workload.as_str());

    let manager = create_subscription_manager(config, display)?;

    if no_wait {
        manager.submit_only(&request).await?;
        let row = SubmittedAliasRow {
            alias: request.alias.clone(),
            display_name: request.display_name.clone(),
        };
        println!("{}", formatter.format_table(&[row])?);
        return Ok(());
    }

    let created = manager
        .create_subscription(&request, &config.provisioning.poll_policy())
        .await?;
    println!("{}", formatter.format_table(&[created])?);
    Ok(())
}

async fn execute_auth(config: &Config, display: &DisplayUtils) -> Result<()> {
    let provider = ClientSecretProvider::with_authority(
        credentials_from(config)?,
        &config.endpoints.authority_host,
    )?;

    display.print_info(&format!(
        "Authenticating with secret on Azure (tenant {}, client {})",
        provider.credentials().tenant_id(),
        provider.credentials().client_id()
    ));
    let token = provider.acquire_token().await?;
    display.print_success(&format!(
        "Auth OK, token (start): {}",
        token_preview(token.token.secret(), TOKEN_PREVIEW_LEN)
    ));
    Ok(())
}

async fn execute_status(
    config: &Config,
    alias: &str,
    once: bool,
    display: DisplayUtils,
    formatter: &TableFormatter,
) -> Result<()> {
    let manager = create_subscription_manager(config, display)?;

    let status = if once {
        manager.alias_status(alias).await?
    } else {
        let subscription_id = manager
            .wait_for_alias(alias, &config.provisioning.poll_policy())
            .await?;
        AliasStatus {
            alias: alias.to_string(),
            state: ProvisioningState::Succeeded,
            subscription_id: Some(subscription_id),
            body: String::new(),
        }
    };

    println!("{}", formatter.format_table(&[AliasStatusRow::from(&status)])?);
    Ok(())
}

fn println_unless_quiet(display: &DisplayUtils, text: &str) {
    if !display.is_quiet() {
        println!("{}", text);
    }
}
