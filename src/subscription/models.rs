//! Subscription alias data models
//!
//! Request and response bodies of the `Microsoft.Subscription/aliases`
//! resource, plus the provisioning state machine vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// Workload classification sent with every alias request
pub const DEFAULT_WORKLOAD: &str = "Production";

/// Provisioning state reported for an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Pending,
    Accepted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// Any other value the provider reports
    Other(String),
    /// Response carried no provisioning state
    Unknown,
}

impl ProvisioningState {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self::Unknown,
            Some(s) => match s {
                "Pending" => Self::Pending,
                "Accepted" => Self::Accepted,
                "Running" => Self::Running,
                "Succeeded" => Self::Succeeded,
                "Failed" => Self::Failed,
                "Canceled" | "Cancelled" => Self::Canceled,
                other => Self::Other(other.to_string()),
            },
        }
    }

    /// States after which the provider no longer transitions the alias
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Other(s) => write!(f, "{}", s),
            Self::Unknown => write!(f, "None"),
        }
    }
}

/// Parameters of one subscription creation
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRequest {
    /// Alias name; doubles as the operation identifier
    pub alias: String,
    pub display_name: String,
    pub billing_scope: String,
    pub tenant_id: String,
    pub management_group_id: String,
    pub workload: String,
    pub tags: Option<BTreeMap<String, String>>,
}

impl AliasRequest {
    /// Request with a freshly generated alias name
    pub fn new(
        display_name: impl Into<String>,
        billing_scope: impl Into<String>,
        tenant_id: impl Into<String>,
        management_group_id: impl Into<String>,
    ) -> Self {
        Self {
            alias: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            billing_scope: billing_scope.into(),
            tenant_id: tenant_id.into(),
            management_group_id: management_group_id.into(),
            workload: DEFAULT_WORKLOAD.to_string(),
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Option<BTreeMap<String, String>>) -> Self {
        self.tags = tags.filter(|t| !t.is_empty());
        self
    }

    pub fn with_workload(mut self, workload: impl Into<String>) -> Self {
        self.workload = workload.into();
        self
    }

    /// JSON body for the alias PUT
    pub fn to_body(&self) -> AliasCreateBody {
        AliasCreateBody {
            properties: AliasCreateProperties {
                display_name: self.display_name.clone(),
                workload: self.workload.clone(),
                billing_scope: self.billing_scope.clone(),
                additional_properties: AdditionalProperties {
                    subscription_tenant_id: self.tenant_id.clone(),
                    management_group_id: self.management_group_id.clone(),
                    tags: self.tags.clone(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasCreateBody {
    pub properties: AliasCreateProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasCreateProperties {
    pub display_name: String,
    pub workload: String,
    pub billing_scope: String,
    pub additional_properties: AdditionalProperties,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalProperties {
    pub subscription_tenant_id: String,
    pub management_group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Alias resource as returned by GET
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<AliasResponseProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasResponseProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// One observation of an alias's remote state
#[derive(Debug, Clone)]
pub struct AliasStatus {
    pub alias: String,
    pub state: ProvisioningState,
    pub subscription_id: Option<String>,
    /// Raw response body, kept for error reporting
    pub body: String,
}

impl AliasStatus {
    /// Interpret a GET body. A JSON object without properties has no state
    /// yet; a body that is not an alias resource at all is an error.
    pub fn from_body(alias: &str, body: String) -> serde_json::Result<Self> {
        let response: AliasResponse = serde_json::from_str(&body)?;
        let properties = response.properties.unwrap_or_default();

        Ok(Self {
            alias: alias.to_string(),
            state: ProvisioningState::parse(properties.provisioning_state.as_deref()),
            subscription_id: properties.subscription_id.filter(|id| !id.is_empty()),
            body,
        })
    }

    /// Subscription id, but only once the alias has succeeded
    pub fn completed_subscription(&self) -> Option<&str> {
        match self.state {
            ProvisioningState::Succeeded => self.subscription_id.as_deref(),
            _ => None,
        }
    }
}

/// Result of a completed provisioning run
#[derive(Debug, Clone, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSubscription {
    #[tabled(rename = "Subscription ID")]
    pub subscription_id: String,
    #[tabled(rename = "Display Name")]
    pub display_name: String,
    #[tabled(rename = "Alias")]
    pub alias: String,
    #[tabled(rename = "Management Group")]
    pub management_group_id: String,
    #[tabled(rename = "Completed")]
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_parsing_and_terminality() {
        assert_eq!(
            ProvisioningState::parse(Some("Succeeded")),
            ProvisioningState::Succeeded
        );
        assert_eq!(ProvisioningState::parse(None), ProvisioningState::Unknown);
        assert_eq!(
            ProvisioningState::parse(Some("Provisioning")),
            ProvisioningState::Other("Provisioning".to_string())
        );

        assert!(ProvisioningState::Failed.is_terminal());
        assert!(ProvisioningState::Canceled.is_failure());
        assert!(!ProvisioningState::Accepted.is_terminal());
        assert!(!ProvisioningState::Other("Provisioning".into()).is_terminal());
        assert!(!ProvisioningState::Succeeded.is_failure());
    }

    #[test]
    fn test_body_shape() {
        let mut tags = BTreeMap::new();
        tags.insert("owner".to_string(), "marie".to_string());
        let request = AliasRequest::new(
            "Sandbox-Marie",
            "/billingAccounts/a/billingProfiles/b/invoiceSections/c",
            "tenant-1",
            "/providers/Microsoft.Management/managementGroups/Sandboxes",
        )
        .with_tags(Some(tags));

        let body = serde_json::to_value(request.to_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "properties": {
                    "displayName": "Sandbox-Marie",
                    "workload": "Production",
                    "billingScope": "/billingAccounts/a/billingProfiles/b/invoiceSections/c",
                    "additionalProperties": {
                        "subscriptionTenantId": "tenant-1",
                        "managementGroupId": "/providers/Microsoft.Management/managementGroups/Sandboxes",
                        "tags": { "owner": "marie" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_empty_tags_are_omitted() {
        let request = AliasRequest::new("n", "s", "t", "m").with_tags(Some(BTreeMap::new()));
        let body = serde_json::to_value(request.to_body()).unwrap();
        assert!(body["properties"]["additionalProperties"]
            .get("tags")
            .is_none());
    }

    #[test]
    fn test_alias_is_fresh_uuid() {
        let a = AliasRequest::new("n", "s", "t", "m");
        let b = AliasRequest::new("n", "s", "t", "m");
        assert!(uuid::Uuid::parse_str(&a.alias).is_ok());
        assert_ne!(a.alias, b.alias);
    }

    #[test]
    fn test_status_succeeded_without_id_is_not_complete() {
        let status = AliasStatus::from_body(
            "a",
            json!({"properties": {"provisioningState": "Succeeded", "subscriptionId": ""}})
                .to_string(),
        )
        .unwrap();
        assert_eq!(status.state, ProvisioningState::Succeeded);
        assert_eq!(status.completed_subscription(), None);
    }

    #[test]
    fn test_status_from_unparseable_body_is_error() {
        assert!(AliasStatus::from_body("a", "<html>oops</html>".to_string()).is_err());
        assert!(AliasStatus::from_body("a", String::new()).is_err());
    }

    #[test]
    fn test_status_without_properties_is_unknown() {
        let status = AliasStatus::from_body("a", "{}".to_string()).unwrap();
        assert_eq!(status.state, ProvisioningState::Unknown);
        assert_eq!(status.body, "{}");
    }
}
