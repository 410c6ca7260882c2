use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::OnceLock;

use crate::config::current_config;
use crate::error::{GuardError, Result};
use crate::types::{not_configured, GuardConfig, GuardOutcome, GuardRequest, Metadata};

static SHARED_HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Client bound to an explicit configuration.
///
/// Use this instead of the process-wide [`configure`](crate::configure) store
/// when different parts of a program talk to different guard services.
///
/// Safe to create, use and drop from inside a Tokio runtime: the blocking
/// HTTP work is moved to a plain OS thread whenever a runtime is detected.
pub struct GuardClient {
    config: GuardConfig,
    // Only `None` while being dropped.
    http_client: Option<Client>,
}

impl GuardClient {
    /// Create a new GuardClient with the given API key and base URL.
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        Self::with_config(GuardConfig::new(api_key, api_base))
    }

    /// Create a new GuardClient with custom configuration.
    pub fn with_config(config: GuardConfig) -> Result<Self> {
        Ok(Self {
            http_client: Some(build_http_client()?),
            config,
        })
    }

    /// Configuration this client sends requests with.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Send one prompt to the named guard.
    pub fn send_guard_request(
        &self,
        prompt: impl Into<Value>,
        guard_name: &str,
        metadata: Metadata,
    ) -> Result<GuardOutcome> {
        let http_client = self
            .http_client
            .as_ref()
            .ok_or_else(|| GuardError::Configuration("HTTP client dropped".to_string()))?;
        execute(
            http_client,
            &self.config,
            prompt.into(),
            guard_name,
            metadata,
        )
    }
}

impl Drop for GuardClient {
    fn drop(&mut self) {
        if let Some(http_client) = self.http_client.take() {
            // A blocking client cannot be dropped on a runtime worker thread.
            let _ = off_runtime(move || drop(http_client));
        }
    }
}

impl std::fmt::Debug for GuardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardClient")
            .field("api_base", &self.config.api_base)
            .finish_non_exhaustive()
    }
}

/// Send one prompt to the named guard using the default configuration.
///
/// Fails with [`GuardError::Configuration`] before any network I/O when
/// [`configure`](crate::configure) has not been called or was given an
/// empty key or base URL.
pub fn send_guard_request(
    prompt: impl Into<Value>,
    guard_name: &str,
    metadata: Metadata,
) -> Result<GuardOutcome> {
    let config = current_config().ok_or_else(not_configured)?;
    config.validate()?;
    execute(
        shared_http_client()?,
        &config,
        prompt.into(),
        guard_name,
        metadata,
    )
}

/// Run `f` on a fresh OS thread when called from inside a Tokio runtime.
///
/// `reqwest::blocking` owns its own runtime; building, using or dropping it
/// from an async context panics.
fn off_runtime<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return Ok(f());
    }
    std::thread::scope(|scope| scope.spawn(f).join()).map_err(|_| {
        GuardError::Configuration("blocking HTTP worker thread panicked".to_string())
    })
}

fn build_http_client() -> Result<Client> {
    off_runtime(|| Client::builder().build())?
        .map_err(|e| GuardError::Configuration(format!("failed to build HTTP client: {}", e)))
}

fn shared_http_client() -> Result<&'static Client> {
    if let Some(client) = SHARED_HTTP_CLIENT.get() {
        return Ok(client);
    }
    let client = build_http_client()?;
    // Losing the race means `client` is dropped here, possibly on a runtime thread.
    if let Err(client) = SHARED_HTTP_CLIENT.set(client) {
        off_runtime(move || drop(client))?;
    }
    SHARED_HTTP_CLIENT
        .get()
        .ok_or_else(|| GuardError::Configuration("shared HTTP client unavailable".to_string()))
}

fn execute(
    http_client: &Client,
    config: &GuardConfig,
    prompt: Value,
    guard_name: &str,
    metadata: Metadata,
) -> Result<GuardOutcome> {
    config.validate()?;

    let url = config.process_url();
    let request = GuardRequest {
        prompt,
        guard_name: guard_name.to_string(),
        metadata,
    };

    tracing::debug!(guard_name, url = %url, "sending guard request");

    off_runtime(|| send(http_client, config, &url, &request, guard_name))?
}

fn send(
    http_client: &Client,
    config: &GuardConfig,
    url: &str,
    request: &GuardRequest,
    guard_name: &str,
) -> Result<GuardOutcome> {
    let response = http_client
        .post(url)
        .header("Content-Type", "application/json")
        .header("X-API-Key", &config.api_key)
        .json(request)
        .send()
        .map_err(|e| GuardError::connectivity(&config.api_base, e))?;

    let status = response.status();
    tracing::debug!(guard_name, status = status.as_u16(), "guard response received");

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        tracing::warn!(guard_name, status = status.as_u16(), "guard service rejected request");
        return Err(GuardError::RemoteRejection {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<GuardOutcome>()
        .map_err(|e| GuardError::connectivity(&config.api_base, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{configure, reset};
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_guard_request_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(header("X-API-Key", "test-api-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({
                "prompt": "hello",
                "guard_name": "pii-redactor",
                "metadata": {}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_valid": true,
                "processed_prompt": "HELLO",
                "validation_summaries": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = run_blocking(move || {
            let client = GuardClient::new("test-api-key", uri).unwrap();
            client.send_guard_request("hello", "pii-redactor", Metadata::new())
        })
        .await
        .unwrap();

        assert!(outcome.is_valid);
        assert_eq!(outcome.processed_str(), Some("HELLO"));
        assert_eq!(outcome.validation_summaries, json!([]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_guard_request_forwards_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(body_json(json!({
                "prompt": "hello",
                "guard_name": "jailbreak-detector",
                "metadata": {"user_id": "u-1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_valid": true})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = run_blocking(move || {
            let client = GuardClient::new("test-api-key", uri).unwrap();
            let mut metadata = Metadata::new();
            metadata.insert("user_id".to_string(), json!("u-1"));
            client.send_guard_request("hello", "jailbreak-detector", metadata)
        })
        .await
        .unwrap();

        assert!(outcome.is_valid);
        assert_eq!(outcome.processed_prompt, Value::Null);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_non_success_status_is_remote_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            let client = GuardClient::new("test-api-key", uri).unwrap();
            client.send_guard_request("hello", "pii-redactor", Metadata::new())
        })
        .await
        .unwrap_err();

        match &err {
            GuardError::RemoteRejection { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("Expected RemoteRejection, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("internal error"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            let client = GuardClient::new("bad-key", uri).unwrap();
            client.send_guard_request("hello", "pii-redactor", Metadata::new())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, GuardError::RemoteRejection { status: 401, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unparseable_success_body_is_connectivity_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let base = uri.clone();
        let err = run_blocking(move || {
            let client = GuardClient::new("test-api-key", uri).unwrap();
            client.send_guard_request("hello", "pii-redactor", Metadata::new())
        })
        .await
        .unwrap_err();

        match err {
            GuardError::Connectivity { api_base, .. } => assert_eq!(api_base, base),
            other => panic!("Expected Connectivity, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_host_is_connectivity_error() {
        let client = GuardClient::new("test-api-key", "http://127.0.0.1:1").unwrap();
        let err = client
            .send_guard_request("hello", "pii-redactor", Metadata::new())
            .unwrap_err();

        assert!(matches!(err, GuardError::Connectivity { .. }));
        assert!(err.to_string().contains("http://127.0.0.1:1"));
    }

    #[test]
    fn test_explicit_client_with_empty_key_fails_before_io() {
        let client = GuardClient::new("", "http://127.0.0.1:1").unwrap();
        let err = client
            .send_guard_request("hello", "pii-redactor", Metadata::new())
            .unwrap_err();
        assert!(matches!(err, GuardError::Configuration(_)));
    }

    #[test]
    #[serial]
    fn test_default_request_without_configure_fails() {
        reset();
        let err = send_guard_request("hello", "pii-redactor", Metadata::new()).unwrap_err();
        match err {
            GuardError::Configuration(message) => assert!(message.contains("configure")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn test_default_request_with_empty_base_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_valid": true})))
            .expect(0)
            .mount(&server)
            .await;

        configure("test-api-key", "");
        let err = run_blocking(|| {
            send_guard_request("hello", "pii-redactor", Metadata::new())
        })
        .await
        .unwrap_err();
        reset();

        assert!(matches!(err, GuardError::Configuration(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn test_default_request_uses_configured_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(header("X-API-Key", "k1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_valid": false,
                "validation_summaries": ["profanity"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        configure("k1", server.uri());
        let outcome = run_blocking(|| {
            send_guard_request("bad word", "profanity-blocker", Metadata::new())
        })
        .await
        .unwrap();
        reset();

        assert!(!outcome.is_valid);
        assert_eq!(outcome.validation_summaries, json!(["profanity"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_client_usable_directly_inside_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"is_valid": true, "processed_prompt": "hi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GuardClient::new("test-api-key", server.uri()).unwrap();
        let outcome = client
            .send_guard_request("hi", "pii-redactor", Metadata::new())
            .unwrap();
        drop(client);

        assert_eq!(outcome.processed_str(), Some("hi"));
    }

    #[tokio::test]
    async fn test_unreachable_host_inside_current_thread_runtime() {
        let client = GuardClient::new("test-api-key", "http://127.0.0.1:1").unwrap();
        let err = client
            .send_guard_request("hello", "pii-redactor", Metadata::new())
            .unwrap_err();

        assert!(matches!(err, GuardError::Connectivity { .. }));
    }
}
