//! Parsing of `Thought:` / `Action:` / `Action Input:` blocks in model output.

use std::sync::OnceLock;

use regex::Regex;

/// Fields extracted from one model completion. Missing markers leave a field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactOutput {
    pub thought: String,
    pub action: String,
    pub action_input: String,
}

fn capture(cell: &'static OnceLock<Regex>, pattern: &str, text: &str) -> String {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Extract thought, action and action input from raw model output.
///
/// Each field runs from its marker to the next marker (or end of text) and
/// may span lines. Markers are case-sensitive.
pub fn parse_react_output(text: &str) -> ReactOutput {
    static THOUGHT: OnceLock<Regex> = OnceLock::new();
    static ACTION: OnceLock<Regex> = OnceLock::new();
    static ACTION_INPUT: OnceLock<Regex> = OnceLock::new();

    ReactOutput {
        thought: capture(&THOUGHT, r"(?s)Thought:(.*?)(?:Action:|\z)", text),
        action: capture(&ACTION, r"(?s)Action:(.*?)(?:Action Input:|\z)", text),
        action_input: capture(
            &ACTION_INPUT,
            r"(?s)Action Input:(.*?)(?:Observation:|\z)",
            text,
        ),
    }
}

/// Parse a completion generated after a prompt that ends with `Thought:`.
///
/// Models usually continue the thought directly instead of repeating the
/// marker, so the marker is restored before parsing.
pub fn parse_continuation(text: &str) -> ReactOutput {
    if text.trim_start().starts_with("Thought:") {
        parse_react_output(text)
    } else {
        parse_react_output(&format!("Thought: {}", text))
    }
}
