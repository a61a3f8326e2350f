use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use agent_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    ModelAdapter,
};
use agent_config::AgentConfig;
use agent_kernel::KernelError;
use async_trait::async_trait;
use futures::stream;
use hyper::body::to_bytes;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::{Value, json};
use toolbridge::app::{DEFAULT_TASK, assemble};

/// Replays canned completions in order and keeps every prompt it saw.
struct ScriptedModel {
    metadata: AdapterMetadata,
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            metadata: AdapterMetadata::new("test", "scripted"),
            replies: Mutex::new(replies.iter().map(|r| (*r).to_owned()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ModelAdapter for ScriptedModel {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.messages()[0].content().to_owned());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AdapterError::transport("no scripted reply left"))?;
        let chunk = InferenceChunk::new(reply, true);
        Ok(Box::pin(stream::once(async move { Ok(chunk) })))
    }
}

/// Requests received by the stub services, as `(path, body)`.
type Seen = Arc<Mutex<Vec<(String, Value)>>>;

/// Serves `/fetch` with `{"content": "hello"}` and `/run` with
/// `{"output": "Example Domain"}`, or HTTP 500 on `/run` when `fail_script`.
fn spawn_services(fail_script: bool) -> (AgentConfig, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    let make_svc = make_service_fn(move |_conn| {
        let log = Arc::clone(&log);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let log = Arc::clone(&log);
                async move {
                    let route = req.uri().path().to_owned();
                    let bytes = to_bytes(req.into_body()).await?;
                    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                    log.lock().unwrap().push((route.clone(), body));

                    let response = match route.as_str() {
                        "/fetch" => Response::new(Body::from(json!({ "content": "hello" }).to_string())),
                        "/run" if fail_script => Response::builder()
                            .status(StatusCode::INTERNAL_SERVER_ERROR)
                            .body(Body::from("browser crashed"))
                            .unwrap(),
                        _ => Response::new(Body::from(
                            json!({ "output": "Example Domain" }).to_string(),
                        )),
                    };
                    Ok::<_, hyper::Error>(response)
                }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);

    let mut config = AgentConfig::default();
    config.services.fetch_url = format!("http://{addr}/fetch");
    config.services.script_url = format!("http://{addr}/run");
    (config, seen)
}

const READ_FILE: &str = " I should read the file first.\nAction: fetch\nAction Input: /data/example.txt";
const RUN_SCRIPT: &str = " The file says hello. Now scrape the heading.\nAction: playwright\n\
Action Input: \"await page.goto('https://example.com'); return await page.textContent('h1');\"";
const ANSWER: &str =
    " I now know the final answer\nFinal Answer: File content: hello. Heading: Example Domain";

#[tokio::test]
async fn fetches_then_scrapes_then_answers() {
    let (config, seen) = spawn_services(false);
    let model = ScriptedModel::new(&[READ_FILE, RUN_SCRIPT, ANSWER]);
    let driver = assemble(&config, model.clone()).unwrap();

    let answer = driver.run(DEFAULT_TASK).await.unwrap();
    assert_eq!(answer, "File content: hello. Heading: Example Domain");

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("/fetch".to_owned(), json!({ "path": "/data/example.txt" })),
            (
                "/run".to_owned(),
                json!({ "script": "await page.goto('https://example.com'); return await page.textContent('h1');" })
            ),
        ]
    );

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("fetch: Fetch the content of a local file given its path"));
    assert!(prompts[0].contains("playwright: Run a Playwright script and return its output"));
    assert!(prompts[1].contains("Observation: hello\nThought:"));
    assert!(prompts[2].contains("Observation: Example Domain\nThought:"));
}

#[tokio::test]
async fn script_tool_hidden_without_permission() {
    let (mut config, seen) = spawn_services(false);
    config.agent.allow_script_execution = false;
    let model = ScriptedModel::new(&[
        READ_FILE,
        RUN_SCRIPT,
        " I cannot run scripts.\nFinal Answer: File content: hello",
    ]);
    let driver = assemble(&config, model.clone()).unwrap();

    let answer = driver.run(DEFAULT_TASK).await.unwrap();
    assert_eq!(answer, "File content: hello");

    let routes: Vec<String> = seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect();
    assert_eq!(routes, ["/fetch"]);

    let prompts = model.prompts.lock().unwrap();
    assert!(!prompts[0].contains("playwright: Run"));
    assert!(prompts[2].contains("playwright is not a valid tool, try one of [fetch]."));
}

#[tokio::test]
async fn service_failure_ends_the_run() {
    let (config, _seen) = spawn_services(true);
    let model = ScriptedModel::new(&[READ_FILE, RUN_SCRIPT, ANSWER]);
    let driver = assemble(&config, model).unwrap();

    let err = driver.run(DEFAULT_TASK).await.expect_err("script service fails");
    match err {
        KernelError::Tool { name, source } => {
            assert_eq!(name, "playwright");
            assert!(source.to_string().contains("HTTP 500"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
