//! Zero-shot ReAct prompt.

use std::fmt::Write as _;

use agent_tools::registry::ToolMetadata;

const PREFIX: &str =
    "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

const SUFFIX: &str = "Begin!

Question: {input}
Thought:";

/// Renders the full prompt for one step.
///
/// `scratchpad` holds every previous step's model output followed by its
/// observation, and is appended directly after the trailing `Thought:`.
pub(crate) fn render(tools: &[ToolMetadata], task: &str, scratchpad: &str) -> String {
    let mut tool_lines = String::new();
    for tool in tools {
        let _ = writeln!(tool_lines, "{}: {}", tool.name(), tool.description());
    }

    let names = tool_names(tools);
    format!(
        "{PREFIX}\n\n{tools}\n\n{format}\n\n{suffix}{scratchpad}",
        tools = tool_lines.trim_end(),
        format = FORMAT_INSTRUCTIONS.replace("{tool_names}", &names),
        suffix = SUFFIX.replace("{input}", task),
    )
}

/// Comma-separated tool names, as shown to the model.
pub(crate) fn tool_names(tools: &[ToolMetadata]) -> String {
    tools
        .iter()
        .map(ToolMetadata::name)
        .collect::<Vec<_>>()
        .join(", ")
}
