mod common;

use common::*;
use std::time::Duration;
use subvend::subscription::{AliasOperations, ProvisioningState};
use subvend::utils::PollPolicy;
use subvend::SubvendError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn policy(interval: u64, timeout: u64) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(interval),
        timeout: Duration::from_secs(timeout),
    }
}

async fn mount_state(server: &MockServer, state: &str, subscription_id: Option<&str>, times: u64) {
    Mock::given(method("GET"))
        .and(path(alias_path(ALIAS)))
        .and(query_param("api-version", "2021-10-01"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alias_body(state, subscription_id)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

async fn get_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .len()
}

#[cfg(test)]
mod success_tests {
    use super::*;

    #[tokio::test]
    async fn test_running_twice_then_succeeded() {
        let server = MockServer::start().await;
        mount_state(&server, "Running", None, 2).await;
        mount_state(&server, "Succeeded", Some("sub-123"), 1).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let id = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap();

        assert_eq!(id, "sub-123");
        assert_eq!(clock.sleeps(), secs(&[10, 10]));
        assert_eq!(get_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_succeeded_without_id_keeps_polling() {
        let server = MockServer::start().await;
        mount_state(&server, "Succeeded", None, 1).await;
        mount_state(&server, "Succeeded", Some(""), 1).await;
        mount_state(&server, "Succeeded", Some("sub-456"), 1).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let id = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(5, 900))
            .await
            .unwrap();

        assert_eq!(id, "sub-456");
        assert_eq!(clock.sleeps(), secs(&[5, 5]));
    }

    #[tokio::test]
    async fn test_succeeded_without_id_until_timeout() {
        let server = MockServer::start().await;
        mount_state(&server, "Succeeded", None, 100).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 20))
            .await
            .unwrap_err();

        match err {
            SubvendError::ProvisioningTimeout { last_state, .. } => {
                assert_eq!(last_state, "Succeeded")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_states_are_not_terminal() {
        let server = MockServer::start().await;
        mount_state(&server, "Pending", None, 1).await;
        mount_state(&server, "Accepted", None, 1).await;
        mount_state(&server, "Provisioning", None, 1).await;
        mount_state(&server, "Succeeded", Some("sub-789"), 1).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let id = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(1, 900))
            .await
            .unwrap();
        assert_eq!(id, "sub-789");
        assert_eq!(clock.sleeps().len(), 3);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_on_first_poll_never_sleeps() {
        let server = MockServer::start().await;
        mount_state(&server, "Failed", None, 100).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();

        match err {
            SubvendError::ProvisioningFailed { alias, state, body } => {
                assert_eq!(alias, ALIAS);
                assert_eq!(state, "Failed");
                assert!(body.contains("\"Failed\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(clock.sleeps().is_empty());
        assert_eq!(get_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_canceled_after_running() {
        let server = MockServer::start().await;
        mount_state(&server, "Running", None, 1).await;
        mount_state(&server, "Canceled", None, 100).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();
        assert!(matches!(err, SubvendError::ProvisioningFailed { ref state, .. } if state == "Canceled"));
        assert_eq!(clock.sleeps(), secs(&[10]));
    }

    #[tokio::test]
    async fn test_failed_close_to_deadline_is_not_a_timeout() {
        let server = MockServer::start().await;
        mount_state(&server, "Running", None, 3).await;
        mount_state(&server, "Failed", None, 100).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 35))
            .await
            .unwrap_err();
        assert!(matches!(err, SubvendError::ProvisioningFailed { .. }));
    }

    #[tokio::test]
    async fn test_running_forever_times_out_after_three_polls() {
        let server = MockServer::start().await;
        mount_state(&server, "Running", None, 100).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 30))
            .await
            .unwrap_err();

        match &err {
            SubvendError::ProvisioningTimeout {
                alias,
                last_state,
                elapsed_secs,
            } => {
                assert_eq!(alias, ALIAS);
                assert_eq!(last_state, "Running");
                assert_eq!(*elapsed_secs, 30);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains(ALIAS));
        assert_eq!(get_count(&server).await, 3);
        assert_eq!(clock.sleeps(), secs(&[10, 10, 10]));
    }

    #[tokio::test]
    async fn test_poll_http_error_is_surfaced_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(alias_path(ALIAS)))
            .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
            .expect(1)
            .mount(&server)
            .await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();

        match err {
            SubvendError::PollRequestError { status, body, .. } => {
                assert_eq!(status, Some(401));
                assert_eq!(body, "InvalidAuthenticationToken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_alias() {
        let clock = RecordingClock::new();
        let ops = alias_ops("http://127.0.0.1:9", clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains(ALIAS));
        match err {
            SubvendError::PollRequestError { alias, status, body } => {
                assert_eq!(alias, ALIAS);
                assert_eq!(status, None);
                assert!(body.contains("127.0.0.1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_success_body_fails_on_first_poll() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(alias_path(ALIAS)))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy login</html>"))
            .mount(&server)
            .await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();

        match err {
            SubvendError::PollRequestError { alias, status, body } => {
                assert_eq!(alias, ALIAS);
                assert_eq!(status, Some(200));
                assert!(body.contains("<html>proxy login</html>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(clock.sleeps().is_empty());
        assert_eq!(get_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_poll_server_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_state(&server, "Running", None, 1).await;
        Mock::given(method("GET"))
            .and(path(alias_path(ALIAS)))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let err = ops
            .poll_until_terminal(TOKEN, ALIAS, &policy(10, 900))
            .await
            .unwrap_err();
        assert!(matches!(err, SubvendError::PollRequestError { status: Some(503), .. }));
        assert_eq!(get_count(&server).await, 2);
    }
}

#[cfg(test)]
mod single_read_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_alias_reports_state() {
        let server = MockServer::start().await;
        mount_state(&server, "Accepted", None, 1).await;

        let clock = RecordingClock::new();
        let ops = alias_ops(&server.uri(), clock.clone(), 6);

        let status = ops.get_alias(TOKEN, ALIAS).await.unwrap();
        assert_eq!(status.alias, ALIAS);
        assert_eq!(status.state, ProvisioningState::Accepted);
        assert_eq!(status.subscription_id, None);
        assert!(clock.sleeps().is_empty());
    }
}
