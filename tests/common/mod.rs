//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subvend::subscription::AzureAliasOperations;
use subvend::utils::{ArmEndpoint, BackoffPolicy, Clock};

pub const TOKEN: &str = "test-token";
pub const ALIAS: &str = "0d7c3e2a-8f3b-4a53-9b53-2a8a6bc0e9f1";

/// Virtual clock: `sleep` returns immediately and advances `now`
#[derive(Debug, Default)]
pub struct RecordingClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> Duration {
        *self.now.lock().expect("now lock")
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeps lock").push(duration);
        *self.now.lock().expect("now lock") += duration;
    }
}

pub fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}

pub fn alias_path(alias: &str) -> String {
    format!("/providers/Microsoft.Subscription/aliases/{}", alias)
}

/// Alias operations pointed at a mock server, with virtual time
pub fn alias_ops(
    base_uri: &str,
    clock: Arc<RecordingClock>,
    max_attempts: usize,
) -> AzureAliasOperations {
    let endpoint = ArmEndpoint::subscription_aliases(base_uri, "2021-10-01").expect("endpoint");
    let backoff = BackoffPolicy {
        max_attempts,
        ..Default::default()
    };
    AzureAliasOperations::new(endpoint, backoff)
        .expect("alias operations")
        .with_clock(clock)
}

pub fn alias_body(state: &str, subscription_id: Option<&str>) -> serde_json::Value {
    let mut properties = serde_json::json!({ "provisioningState": state });
    if let Some(id) = subscription_id {
        properties["subscriptionId"] = serde_json::Value::String(id.to_string());
    }
    serde_json::json!({
        "id": format!("/providers/Microsoft.Subscription/aliases/{}", ALIAS),
        "name": ALIAS,
        "properties": properties
    })
}
