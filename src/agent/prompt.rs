//! Prompt templates for the agent.

use crate::tools::{ToolRegistry, FINAL_ANSWER};

/// Build the initial ReAct prompt for a question.
///
/// The prompt ends with `Thought:` so the model starts by reasoning.
pub fn build_react_prompt(question: &str, tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut actions = tools.names();
    actions.push(FINAL_ANSWER.to_string());
    let actions = actions.join(", ");

    format!(
        r#"You are an AI assistant that uses the ReAct (Reasoning + Acting) framework to answer questions.

You have access to the following tools:
{tool_descriptions}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{actions}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Action: {final_answer}
Action Input: the final answer to the original input question

Begin!

Question: {question}
Thought:"#,
        tool_descriptions = tool_descriptions,
        actions = actions,
        final_answer = FINAL_ANSWER,
        question = question
    )
}

/// Append one completed tool iteration to the running prompt.
///
/// The prompt already ends with `Thought:`, so a repeated marker at the
/// start of the model output is dropped.
pub fn append_observation(prompt: &mut String, model_output: &str, observation: &str) {
    let output = model_output.trim_start();
    let output = output.strip_prefix("Thought:").unwrap_or(output);
    prompt.push(' ');
    prompt.push_str(output.trim_start());
    prompt.push_str("\nObservation: ");
    prompt.push_str(observation);
    prompt.push_str("\nThought:");
}

/// Build the plain fallback prompt used after an unrecognized action.
///
/// Carries no ReAct markers. Earlier observations are included as context.
pub fn build_direct_answer_prompt(question: &str, context: &[&str]) -> String {
    if context.is_empty() {
        return format!(
            "Question: {}\n\nBased on the context, provide a clear and concise answer:\nAnswer:",
            question
        );
    }

    format!(
        "Context:\n{}\n\nQuestion: {}\n\nBased on the context, provide a clear and concise answer:\nAnswer:",
        context.join("\n\n"),
        question
    )
}
