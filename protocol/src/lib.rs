//! Wire-facing data types shared between the tool core and the transport
//! layer that registers and serializes tool calls. The transport itself is
//! not part of this workspace; it consumes these values as-is.

use serde::Deserialize;
use serde::Serialize;

/// A single segment of tool output. Tool results are one or more blocks so
/// that stdout and stderr can be reported separately without interleaving.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ContentBlock::Text { text } => text,
        }
    }
}

/// The value a tool call resolves to. `is_error` marks failures the caller
/// should treat as the call's own error (permission denied, missing input);
/// a command that ran but exited non-zero is reported with `is_error: false`
/// and diagnostic blocks instead, so the invoking agent still sees the
/// captured output.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }

    pub fn from_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(ContentBlock::text(text));
    }
}

/// Decision produced by the interactive approval mechanism. The gate itself
/// collapses this to a boolean; the distinction exists so a richer notifier
/// UI can report how the decision was reached.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Denied,
}
