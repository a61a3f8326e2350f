//! Zero-shot ReAct strategy.
//!
//! Each step sends the rendered prompt to the model, stopping generation at
//! the next `Observation:`. The output either names a tool (`Action:` plus
//! `Action Input:`) or ends the run (`Final Answer:`). Tool results are fed
//! back as observations in the scratchpad until the model answers or the
//! iteration budget runs out.

use std::sync::Arc;

use agent_adapters::traits::{
    AdapterError, InferenceRequest, MessageRole, ModelAdapter, PromptMessage,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{KernelError, KernelResult};
use crate::prompt;
use crate::strategy::{AgentStrategy, Toolbox};

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "Observation:";

/// Answer returned when the iteration budget is exhausted.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Tuning knobs for [`ReactStrategy`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReactConfig {
    /// Maximum model calls before giving up.
    pub max_iterations: usize,
    /// Sampling temperature sent with every step.
    pub temperature: Option<f32>,
    /// Output token budget per step.
    pub max_output_tokens: Option<u32>,
    /// Log thoughts, actions, and observations at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            temperature: Some(0.7),
            max_output_tokens: Some(256),
            verbose: false,
        }
    }
}

/// One parsed model step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReactStep {
    /// Call `tool` with `input`.
    Action {
        /// Requested tool name.
        tool: String,
        /// Tool input with leading and trailing quotes removed.
        input: String,
    },
    /// The run is over.
    Finish {
        /// Final answer text.
        answer: String,
    },
}

/// Parses one ReAct step out of raw model output.
///
/// # Errors
///
/// Returns [`KernelError::UnparseableOutput`] when the output contains both an
/// action and a final answer, or neither in a usable form.
pub fn parse_react_output(output: &str) -> KernelResult<ReactStep> {
    let has_answer = output.contains(FINAL_ANSWER);

    if let Some(action_at) = output.find(ACTION) {
        let after_action = &output[action_at + ACTION.len()..];
        if let Some(input_at) = after_action.find(ACTION_INPUT) {
            if has_answer {
                return Err(unparseable(
                    "output contains both a final answer and an action",
                    output,
                ));
            }

            let tool = after_action[..input_at].trim().to_owned();
            let mut input = &after_action[input_at + ACTION_INPUT.len()..];
            if let Some(observation_at) = input.find(OBSERVATION) {
                input = &input[..observation_at];
            }

            return Ok(ReactStep::Action {
                tool,
                input: strip_quotes(input.trim()).to_owned(),
            });
        }
    }

    if has_answer {
        let answer = output
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_owned();
        return Ok(ReactStep::Finish { answer });
    }

    if output.contains(ACTION) {
        Err(unparseable("missing 'Action Input:' after 'Action:'", output))
    } else {
        Err(unparseable("missing 'Action:' after 'Thought:'", output))
    }
}

fn strip_quotes(input: &str) -> &str {
    input.trim_matches(' ').trim_matches('"')
}

fn unparseable(reason: &str, output: &str) -> KernelError {
    KernelError::UnparseableOutput {
        reason: reason.to_owned(),
        output: output.to_owned(),
    }
}

/// Zero-shot ReAct loop driving a [`ModelAdapter`].
pub struct ReactStrategy {
    adapter: Arc<dyn ModelAdapter>,
    config: ReactConfig,
}

impl std::fmt::Debug for ReactStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("ReactStrategy")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("config", &self.config)
            .finish()
    }
}

impl ReactStrategy {
    /// Creates a strategy with default settings.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self::with_config(adapter, ReactConfig::default())
    }

    /// Creates a strategy with explicit settings.
    #[must_use]
    pub fn with_config(adapter: Arc<dyn ModelAdapter>, config: ReactConfig) -> Self {
        Self { adapter, config }
    }

    async fn complete(&self, prompt: String) -> KernelResult<String> {
        let mut request = InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, prompt)])
            .map_err(|err| self.model_error(err))?
            .with_stop(vec![format!("\n{OBSERVATION}"), format!("\n\t{OBSERVATION}")]);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(tokens) = self.config.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }

        let mut stream = self
            .adapter
            .infer(request)
            .await
            .map_err(|err| self.model_error(err))?;

        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| self.model_error(err))?;
            response.push_str(&chunk.delta);
            if chunk.done {
                break;
            }
        }
        Ok(response)
    }

    fn model_error(&self, source: AdapterError) -> KernelError {
        KernelError::Model {
            model: self.adapter.metadata().model().to_owned(),
            source,
        }
    }

    fn trace(&self, label: &str, text: &str) {
        if self.config.verbose {
            info!(step = label, "{text}");
        } else {
            debug!(step = label, "{text}");
        }
    }
}

#[async_trait]
impl AgentStrategy for ReactStrategy {
    fn name(&self) -> &str {
        "zero-shot-react-description"
    }

    async fn run(&self, task: &str, toolbox: &Toolbox) -> KernelResult<String> {
        let tools = toolbox.descriptors();
        let mut scratchpad = String::new();

        for iteration in 0..self.config.max_iterations {
            let output = self
                .complete(prompt::render(&tools, task, &scratchpad))
                .await?;
            self.trace("thought", output.trim());

            match parse_react_output(&output)? {
                ReactStep::Finish { answer } => {
                    debug!(iterations = iteration + 1, "final answer reached");
                    return Ok(answer);
                }
                ReactStep::Action { tool, input } => {
                    self.trace("action", &format!("{tool}[{input}]"));
                    let observation = if toolbox.contains(&tool) {
                        toolbox.call(&tool, &input).await?
                    } else {
                        format!(
                            "{tool} is not a valid tool, try one of [{}].",
                            prompt::tool_names(&tools)
                        )
                    };
                    self.trace("observation", &observation);

                    scratchpad.push_str(&output);
                    scratchpad.push('\n');
                    scratchpad.push_str(OBSERVATION);
                    scratchpad.push(' ');
                    scratchpad.push_str(&observation);
                    scratchpad.push_str("\nThought:");
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "iteration limit reached without a final answer"
        );
        Ok(ITERATION_LIMIT_ANSWER.to_owned())
    }
}
