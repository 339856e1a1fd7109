//! Azure Resource Manager endpoint construction
//!
//! All alias URLs are built here so the API version and path escaping live
//! in one place.

use crate::error::{Result, SubvendError};
use url::Url;

pub const DEFAULT_RESOURCE_MANAGER: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const ALIAS_RESOURCE_PATH: &str = "providers/Microsoft.Subscription/aliases";
pub const ALIAS_API_VERSION: &str = "2021-10-01";

/// Builds URLs for a single resource collection on the management plane
#[derive(Debug, Clone)]
pub struct ArmEndpoint {
    base: Url,
    resource_path: String,
    api_version: String,
}

impl ArmEndpoint {
    pub fn new(base: &str, resource_path: &str, api_version: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| SubvendError::config(format!("Invalid management endpoint '{}': {}", base, e)))?;
        if base.cannot_be_a_base() {
            return Err(SubvendError::config(format!(
                "Management endpoint '{}' cannot be used as a base URL",
                base
            )));
        }
        Ok(Self {
            base,
            resource_path: resource_path.trim_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    /// Endpoint for subscription aliases on the given management host
    pub fn subscription_aliases(base: &str, api_version: &str) -> Result<Self> {
        Self::new(base, ALIAS_RESOURCE_PATH, api_version)
    }

    /// URL of one resource in the collection, with `api-version` attached
    pub fn resource_url(&self, resource_name: &str) -> Result<Url> {
        if resource_name.is_empty() {
            return Err(SubvendError::invalid_argument("Resource name must not be empty"));
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SubvendError::config("Management endpoint cannot hold a path"))?;
            segments.pop_if_empty();
            segments.extend(self.resource_path.split('/'));
            // push() percent-encodes, so a name can never escape its segment
            segments.push(resource_name);
        }
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);

        Ok(url)
    }
}

/// Tenant-scoped OAuth2 (v1) token endpoint
pub fn token_endpoint(authority_host: &str, tenant_id: &str) -> Result<Url> {
    let mut url = Url::parse(authority_host)
        .map_err(|e| SubvendError::config(format!("Invalid authority host '{}': {}", authority_host, e)))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| SubvendError::config("Authority host cannot hold a path"))?;
        segments.pop_if_empty();
        segments.push(tenant_id).push("oauth2").push("token");
    }
    Ok(url)
}
