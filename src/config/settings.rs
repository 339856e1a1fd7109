//! Configuration settings management
//!
//! This module handles loading the provisioning configuration from a file,
//! applying environment overrides, and validating the result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

use crate::error::{Result, SubvendError};
use crate::utils::endpoint::{ALIAS_API_VERSION, DEFAULT_AUTHORITY_HOST, DEFAULT_RESOURCE_MANAGER};
use crate::utils::retry::{BackoffPolicy, PollPolicy};

/// File looked up in the working directory before the user config dir
pub const LOCAL_CONFIG_FILE: &str = "variables.json";

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret_value: Zeroizing<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret_value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub billing_account: String,
    #[serde(default)]
    pub billing_profile: String,
    #[serde(default)]
    pub invoice_section: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default)]
    pub management_group_id: Option<String>,
    #[serde(default)]
    pub management_group_name: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default = "default_display_name_prefix")]
    pub display_name_prefix: String,
    #[serde(default = "default_workload")]
    pub workload: String,
}

fn default_display_name_prefix() -> String {
    "Sandbox-".to_string()
}

fn default_workload() -> String {
    crate::subscription::models::DEFAULT_WORKLOAD.to_string()
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            management_group_id: None,
            management_group_name: None,
            tags: None,
            display_name_prefix: default_display_name_prefix(),
            workload: default_workload(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub max_retries: usize,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            max_retries: 6,
            initial_backoff_secs: 30,
            max_backoff_secs: 300,
            poll_interval_secs: 10,
            timeout_secs: 900,
        }
    }
}

impl ProvisioningConfig {
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_retries,
            initial_interval: Duration::from_secs(self.initial_backoff_secs),
            max_interval: Duration::from_secs(self.max_backoff_secs),
            ..Default::default()
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub authority_host: String,
    pub resource_manager: String,
    pub alias_api_version: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            resource_manager: DEFAULT_RESOURCE_MANAGER.to_string(),
            alias_api_version: ALIAS_API_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl Config {
    /// Full validation, needed before creating a subscription
    pub fn validate(&self) -> Result<()> {
        self.validate_auth()?;
        require(&[
            ("billing.billing_account", self.billing.billing_account.as_str()),
            ("billing.billing_profile", self.billing.billing_profile.as_str()),
            ("billing.invoice_section", self.billing.invoice_section.as_str()),
        ])?;
        self.management_group_id()?;
        self.validate_provisioning()
    }

    /// Service principal section only
    pub fn validate_auth(&self) -> Result<()> {
        require(&[
            ("auth.tenant_id", self.auth.tenant_id.as_str()),
            ("auth.client_id", self.auth.client_id.as_str()),
            ("auth.client_secret_value", self.auth.client_secret_value.as_str()),
        ])
    }

    pub fn validate_provisioning(&self) -> Result<()> {
        if self.provisioning.max_retries == 0 {
            return Err(SubvendError::config(
                "provisioning.max_retries must be at least 1",
            ));
        }
        if self.provisioning.poll_interval_secs == 0 {
            return Err(SubvendError::config(
                "provisioning.poll_interval_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Invoice-section billing scope the subscription is charged to
    pub fn billing_scope(&self) -> String {
        format!(
            "/billingAccounts/{}/billingProfiles/{}/invoiceSections/{}",
            self.billing.billing_account, self.billing.billing_profile, self.billing.invoice_section
        )
    }

    /// Management group resource id; an explicit id wins over a name
    pub fn management_group_id(&self) -> Result<String> {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        if let Some(id) = non_empty(&self.subscription.management_group_id) {
            return Ok(id);
        }
        if let Some(name) = non_empty(&self.subscription.management_group_name) {
            return Ok(format!(
                "/providers/Microsoft.Management/managementGroups/{}",
                name
            ));
        }
        Err(SubvendError::config(
            "subscription.management_group_id or subscription.management_group_name is required",
        ))
    }

    /// Display name for a new subscription from the configured prefix
    pub fn display_name_for(&self, name_part: &str) -> String {
        format!("{}{}", self.subscription.display_name_prefix, name_part)
    }

    /// User-level configuration file location
    pub fn get_config_path() -> Result<PathBuf> {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| SubvendError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("subvend").join("subvend.json"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| SubvendError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("subvend").join("subvend.json"))
        }
    }

    /// Override file values from environment variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AZURE_TENANT_ID") {
            self.auth.tenant_id = value;
        }
        if let Some(value) = lookup("AZURE_CLIENT_ID") {
            self.auth.client_id = value;
        }
        if let Some(value) = lookup("AZURE_CLIENT_SECRET") {
            self.auth.client_secret_value = Zeroizing::new(value);
        }
        if let Some(value) = lookup("SUBVEND_MANAGEMENT_GROUP_ID") {
            self.subscription.management_group_id = Some(value);
        }
        if let Some(seconds) = lookup("SUBVEND_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.provisioning.timeout_secs = seconds;
        }
        if let Some(seconds) = lookup("SUBVEND_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.provisioning.poll_interval_secs = seconds;
        }
    }
}

fn require(fields: &[(&str, &str)]) -> Result<()> {
    for (key, value) in fields {
        if value.trim().is_empty() {
            return Err(SubvendError::config(format!("{} is required", key)));
        }
    }
    Ok(())
}

/// Pick the configuration file: explicit path, then `./variables.json`,
/// then the user config directory
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(SubvendError::config(format!(
                "{} not found",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(local);
    }

    let user = Config::get_config_path()?;
    if user.is_file() {
        return Ok(user);
    }

    Err(SubvendError::config(format!(
        "{} not found in current folder and no {} exists",
        LOCAL_CONFIG_FILE,
        user.display()
    )))
}

/// Parse a configuration file; TOML first, JSON as fallback
pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    if let Ok(config) = toml::from_str::<Config>(&contents) {
        return Ok(config);
    }

    serde_json::from_str::<Config>(&contents).map_err(|e| {
        SubvendError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Load configuration with priority: environment > file > defaults.
/// Validation is left to the caller, since commands need different sections.
pub async fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = resolve_config_path(explicit)?;
    let mut config = load_from_file(&path).await?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
