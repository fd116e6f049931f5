//! Folding of the agent CLI's `stream-json` output into a single response.
//!
//! Lines that parse as stream events contribute assistant text and the final
//! result; anything else is kept verbatim, so agent commands that print plain
//! text work too.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::BackendError;

/// Events from the agent CLI's stream-json output format
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "assistant")]
    Assistant { message: AssistantMessage },

    #[serde(rename = "user")]
    User {},

    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
    },

    #[serde(rename = "system")]
    System {},
}

#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: Value },

    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}

/// Accumulates stdout lines from one agent invocation.
#[derive(Debug, Default)]
pub struct StreamCollector {
    text: String,
    final_result: Option<String>,
    is_error: bool,
}

impl StreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        match serde_json::from_str::<StreamEvent>(line) {
            Ok(StreamEvent::Assistant { message }) => {
                for block in message.content {
                    match block {
                        ContentBlock::Text { text } => {
                            self.text.push_str(&text);
                            self.text.push('\n');
                        }
                        ContentBlock::ToolUse { name, input } => {
                            tracing::debug!(tool = %name, "{}", describe_tool_use(&name, &input));
                        }
                        ContentBlock::Unknown => {}
                    }
                }
            }
            Ok(StreamEvent::Result { result, is_error }) => {
                self.final_result = result;
                self.is_error = is_error;
            }
            Ok(StreamEvent::User {}) | Ok(StreamEvent::System {}) => {}
            Err(_) => {
                self.text.push_str(line);
                self.text.push('\n');
            }
        }
    }

    /// Produce the response text, preferring the final `result` event.
    pub fn finish(self) -> Result<String, BackendError> {
        let response = self.final_result.unwrap_or(self.text);
        if self.is_error {
            return Err(BackendError::Reported(truncate_str(response.trim(), 200)));
        }
        if response.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(response)
    }
}

/// Extract a human-readable description from a tool use event
pub fn describe_tool_use(name: &str, input: &Value) -> String {
    let field = |key: &str| input.get(key).and_then(|v| v.as_str());
    match name {
        "Read" => format!("Reading: {}", field("file_path").unwrap_or("file")),
        "Write" => format!("Creating: {}", field("file_path").unwrap_or("file")),
        "Edit" => format!("Editing: {}", field("file_path").unwrap_or("file")),
        "Bash" => format!(
            "Running: {}",
            truncate_str(field("command").unwrap_or("command"), 40)
        ),
        _ => name.to_string(),
    }
}

/// Truncate a string with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
