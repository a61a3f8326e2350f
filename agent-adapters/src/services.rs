//! HTTP adapters for the file-fetch and browser-automation services.
//!
//! Both services speak the same shape of protocol: a JSON object POSTed to a
//! fixed endpoint, answered by a JSON object carrying a single result field.
//!
//! | Operation    | Request body           | Result field |
//! |--------------|------------------------|--------------|
//! | `fetch`      | `{"path": <string>}`   | `content`    |
//! | `run_script` | `{"script": <string>}` | `output`     |
//!
//! A missing (or `null`) result field yields an empty string. A non-2xx status
//! or a body that is not a JSON object is an error. Calls are never retried.

use std::fmt;
use std::time::Duration;

use agent_primitives::{CapabilityGrant, CapabilityId};
use hyper::Uri;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, post_json};
use crate::traits::{AdapterError, AdapterResult};

/// Default endpoint of the file-fetch service.
pub const DEFAULT_FETCH_ENDPOINT: &str = "http://localhost:7001/fetch";

/// Default endpoint of the script-execution service.
pub const DEFAULT_SCRIPT_ENDPOINT: &str = "http://localhost:7002/run";

/// Endpoints and transport settings for [`ServiceClient`].
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    fetch_endpoint: String,
    script_endpoint: String,
    timeout: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            fetch_endpoint: DEFAULT_FETCH_ENDPOINT.to_owned(),
            script_endpoint: DEFAULT_SCRIPT_ENDPOINT.to_owned(),
            timeout: None,
        }
    }
}

impl ServiceConfig {
    /// Creates a configuration for the supplied endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if either endpoint lacks an
    /// `http://`/`https://` scheme or is not a valid URI.
    pub fn new(
        fetch_endpoint: impl Into<String>,
        script_endpoint: impl Into<String>,
    ) -> AdapterResult<Self> {
        let fetch_endpoint = fetch_endpoint.into();
        let script_endpoint = script_endpoint.into();
        parse_endpoint(&fetch_endpoint, "fetch")?;
        parse_endpoint(&script_endpoint, "script")?;

        Ok(Self {
            fetch_endpoint,
            script_endpoint,
            timeout: None,
        })
    }

    /// Bounds each request by `timeout`. Without one, a call waits as long as
    /// the connection stays open.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the fetch endpoint.
    #[must_use]
    pub fn fetch_endpoint(&self) -> &str {
        &self.fetch_endpoint
    }

    /// Returns the script endpoint.
    #[must_use]
    pub fn script_endpoint(&self) -> &str {
        &self.script_endpoint
    }

    /// Returns the per-request timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Proof that the holder was granted [`CapabilityId::SCRIPT_EXECUTE`].
///
/// [`ServiceClient::run_script`] forwards arbitrary script text to a remote
/// executor, so it cannot be called without one of these.
#[derive(Clone, Debug)]
pub struct ScriptPermit {
    _private: (),
}

impl ScriptPermit {
    /// Issues a permit if `grant` holds the script-execution capability.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::PermissionDenied`] otherwise.
    pub fn from_grant(grant: &CapabilityGrant) -> AdapterResult<Self> {
        if grant.allows(&CapabilityId::script_execute()) {
            Ok(Self { _private: () })
        } else {
            Err(AdapterError::PermissionDenied {
                capability: CapabilityId::SCRIPT_EXECUTE.to_owned(),
            })
        }
    }
}

/// Client for the two tool services.
pub struct ServiceClient {
    client: HyperClient,
    fetch_endpoint: Uri,
    script_endpoint: Uri,
    timeout: Option<Duration>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("fetch_endpoint", &self.fetch_endpoint)
            .field("script_endpoint", &self.script_endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct ScriptRequest<'a> {
    script: &'a str,
}

impl ServiceClient {
    /// Constructs a client for the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if an endpoint cannot be parsed.
    pub fn new(config: &ServiceConfig) -> AdapterResult<Self> {
        Ok(Self {
            client: build_https_client()?,
            fetch_endpoint: parse_endpoint(&config.fetch_endpoint, "fetch")?,
            script_endpoint: parse_endpoint(&config.script_endpoint, "script")?,
            timeout: config.timeout,
        })
    }

    /// Reads a file through the fetch service and returns its `content`.
    ///
    /// The path is passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Transport`] when the service is unreachable,
    /// [`AdapterError::Status`] on a non-2xx answer, and
    /// [`AdapterError::Response`] when the body is not a JSON object.
    pub async fn fetch(&self, path: &str) -> AdapterResult<String> {
        debug!(path, endpoint = %self.fetch_endpoint, "fetch request");
        self.call(&self.fetch_endpoint, &FetchRequest { path }, "fetch", "content")
            .await
    }

    /// Runs `script` on the automation service and returns its `output`.
    ///
    /// The script is neither validated nor sandboxed here; isolation is the
    /// remote executor's job.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ServiceClient::fetch`].
    pub async fn run_script(&self, _permit: &ScriptPermit, script: &str) -> AdapterResult<String> {
        debug!(
            script_len = script.len(),
            endpoint = %self.script_endpoint,
            "script request"
        );
        self.call(
            &self.script_endpoint,
            &ScriptRequest { script },
            "script",
            "output",
        )
        .await
    }

    async fn call<B: Serialize>(
        &self,
        endpoint: &Uri,
        payload: &B,
        service: &str,
        field: &str,
    ) -> AdapterResult<String> {
        let body = serde_json::to_vec(payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode {service} request: {err}"))
        })?;

        let raw = post_json(&self.client, endpoint, body, None, self.timeout, service).await?;

        if !raw.status.is_success() {
            return Err(AdapterError::Status {
                service: service.to_owned(),
                status: raw.status.as_u16(),
                body: String::from_utf8_lossy(&raw.body).into_owned(),
            });
        }

        let result = extract_field(&raw.body, field).map_err(|err| {
            AdapterError::response(format!("failed to decode {service} response: {err}"))
        })?;
        debug!(service, bytes = result.len(), "service call completed");
        Ok(result)
    }
}

/// Pulls `field` out of a JSON object body.
///
/// Strings come back verbatim, absent or `null` fields as `""`, and any other
/// JSON value as its compact text.
fn extract_field(body: &[u8], field: &str) -> serde_json::Result<String> {
    let mut object: Map<String, Value> = serde_json::from_slice(body)?;
    Ok(match object.remove(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

fn parse_endpoint(endpoint: &str, service: &str) -> AdapterResult<Uri> {
    let trimmed = endpoint.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AdapterError::configuration(format!(
            "{service} endpoint must start with http:// or https://"
        )));
    }
    trimmed.parse::<Uri>().map_err(|err| {
        AdapterError::configuration(format!("invalid {service} endpoint `{trimmed}`: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use hyper::body::to_bytes;
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    type Captured = Arc<Mutex<Vec<Value>>>;

    /// Starts a one-route stub that answers every POST with `status`/`body`
    /// and records the decoded request bodies.
    fn spawn_stub(status: StatusCode, body: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&captured);

        let make_svc = make_service_fn(move |_conn| {
            let seen = Arc::clone(&seen);
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let seen = Arc::clone(&seen);
                    async move {
                        let bytes = to_bytes(req.into_body()).await?;
                        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
                            seen.lock().expect("stub poisoned").push(value);
                        }
                        Ok::<_, hyper::Error>(
                            Response::builder()
                                .status(status)
                                .body(Body::from(body))
                                .expect("stub response"),
                        )
                    }
                }))
            }
        });

        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);
        (format!("http://{addr}/"), captured)
    }

    fn client(fetch: &str, script: &str) -> ServiceClient {
        let config = ServiceConfig::new(fetch, script).expect("config");
        ServiceClient::new(&config).expect("client")
    }

    fn permit() -> ScriptPermit {
        ScriptPermit::from_grant(&CapabilityGrant::none().with(CapabilityId::script_execute()))
            .expect("permit")
    }

    #[tokio::test]
    async fn fetch_returns_content_and_posts_path() {
        let (url, seen) = spawn_stub(StatusCode::OK, r#"{"content": "hello"}"#);
        let client = client(&url, &url);

        let content = client.fetch("/data/example.txt").await.unwrap();
        assert_eq!(content, "hello");

        let bodies = seen.lock().unwrap().clone();
        assert_eq!(bodies, vec![serde_json::json!({"path": "/data/example.txt"})]);
    }

    #[tokio::test]
    async fn run_script_returns_output_and_posts_script() {
        let (url, seen) = spawn_stub(StatusCode::OK, r#"{"output": "Example Domain"}"#);
        let client = client(&url, &url);

        let output = client
            .run_script(&permit(), "nav to example.com")
            .await
            .unwrap();
        assert_eq!(output, "Example Domain");

        let bodies = seen.lock().unwrap().clone();
        assert_eq!(bodies, vec![serde_json::json!({"script": "nav to example.com"})]);
    }

    #[tokio::test]
    async fn missing_field_yields_empty_string() {
        let (url, _) = spawn_stub(StatusCode::OK, r#"{"unrelated": 1}"#);
        let client = client(&url, &url);

        assert_eq!(client.fetch("/tmp/a").await.unwrap(), "");
        assert_eq!(client.run_script(&permit(), "noop").await.unwrap(), "");
    }

    #[tokio::test]
    async fn server_error_status_fails() {
        let (url, _) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, "kaput");
        let client = client(&url, &url);

        let err = client.fetch("/tmp/a").await.expect_err("500 must fail");
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("kaput"));

        let err = client
            .run_script(&permit(), "noop")
            .await
            .expect_err("500 must fail");
        assert!(matches!(err, AdapterError::Status { ref service, .. } if service == "script"));
    }

    #[tokio::test]
    async fn non_json_body_fails() {
        let (url, _) = spawn_stub(StatusCode::OK, "<html>not json</html>");
        let client = client(&url, &url);

        let err = client.fetch("/tmp/a").await.expect_err("non-JSON must fail");
        assert!(matches!(err, AdapterError::Response { .. }));

        let err = client
            .run_script(&permit(), "noop")
            .await
            .expect_err("non-JSON must fail");
        assert!(matches!(err, AdapterError::Response { .. }));
    }

    #[tokio::test]
    async fn timeout_covers_stalled_body() {
        let make_svc = make_service_fn(|_conn| async {
            Ok::<_, Infallible>(service_fn(|_req: Request<Body>| async {
                let (mut sender, body) = Body::channel();
                tokio::spawn(async move {
                    let _ = sender.send_data(hyper::body::Bytes::from(r#"{"content":"#)).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(sender);
                });
                Ok::<_, hyper::Error>(Response::new(body))
            }))
        });
        let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
        let url = format!("http://{}/", server.local_addr());
        tokio::spawn(server);

        let config = ServiceConfig::new(&url, &url)
            .expect("config")
            .with_timeout(Duration::from_millis(300));
        let client = ServiceClient::new(&config).expect("client");

        let outcome = tokio::time::timeout(Duration::from_secs(5), client.fetch("/a"))
            .await
            .expect("configured timeout must fire first");
        let err = outcome.expect_err("stalled body");
        assert!(matches!(err, AdapterError::Transport { ref reason } if reason.contains("timed out")));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/fetch");
        let client = client(&url, &url);

        let err = client.fetch("/tmp/a").await.expect_err("refused");
        assert!(matches!(err, AdapterError::Transport { .. }));
    }

    #[test]
    fn extract_field_handles_shapes() {
        assert_eq!(extract_field(br#"{"content": "x"}"#, "content").unwrap(), "x");
        assert_eq!(extract_field(br#"{"content": null}"#, "content").unwrap(), "");
        assert_eq!(extract_field(br#"{"content": 42}"#, "content").unwrap(), "42");
        assert_eq!(
            extract_field(br#"{"output": {"h1": "Example"}}"#, "output").unwrap(),
            r#"{"h1":"Example"}"#
        );
        assert!(extract_field(br#"["content"]"#, "content").is_err());
    }

    #[test]
    fn script_permit_requires_capability() {
        let err = ScriptPermit::from_grant(&CapabilityGrant::none().with(CapabilityId::file_read()))
            .expect_err("no script capability");
        assert!(
            matches!(err, AdapterError::PermissionDenied { capability } if capability == "script.execute")
        );
    }

    #[test]
    fn config_validates_endpoints() {
        let defaults = ServiceConfig::default();
        assert_eq!(defaults.fetch_endpoint(), "http://localhost:7001/fetch");
        assert_eq!(defaults.script_endpoint(), "http://localhost:7002/run");
        assert_eq!(defaults.timeout(), None);

        let err = ServiceConfig::new("localhost:7001/fetch", DEFAULT_SCRIPT_ENDPOINT)
            .expect_err("scheme required");
        assert!(matches!(err, AdapterError::Configuration { .. }));

        let err = ServiceConfig::new(DEFAULT_FETCH_ENDPOINT, "http://bad host/run")
            .expect_err("invalid URI");
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }
}
