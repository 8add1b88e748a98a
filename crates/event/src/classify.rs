use serde_json::Value;

use crate::raw::{ContentBlock, RawEvent, Role, ToolUseDelta};

const UNKNOWN_TOOL: &str = "unknown";

/// The semantic kind of a runtime event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamEvent {
    /// Incremental assistant text.
    TextFragment {
        /// The text delta.
        content: String,
        /// Whether the utterance ends with this fragment.
        is_final: bool,
    },
    /// Partial or complete input of a tool call.
    ToolInputFragment {
        /// The correlation id of the invocation.
        invocation_id: String,
        /// Name of the tool.
        tool_name: String,
        /// The full input observed so far, not a delta.
        cumulative_input_text: String,
    },
    /// The model has initiated a tool call.
    ///
    /// The event carries no invocation id, so it can only be correlated
    /// to whatever invocation is currently active.
    ToolStarted {
        /// Name of the tool.
        tool_name: String,
    },
    /// A tool call has finished.
    ToolResult {
        /// The correlation id of the invocation.
        invocation_id: String,
        /// Whether the tool reported success.
        succeeded: bool,
    },
    /// Nothing recognizable.
    Unclassified,
}

impl StreamEvent {
    /// Returns the input size in characters, for tool input fragments.
    #[inline]
    pub fn input_size(&self) -> Option<usize> {
        match self {
            StreamEvent::ToolInputFragment {
                cumulative_input_text,
                ..
            } => Some(cumulative_input_text.chars().count()),
            _ => None,
        }
    }
}

/// Classifies an event into exactly one [`StreamEvent`].
///
/// When the event carries several facts, the first one in processing
/// order wins. Use [`classify_all`] to get all of them.
#[inline]
pub fn classify(event: &RawEvent) -> StreamEvent {
    classify_all(event)
        .into_iter()
        .next()
        .unwrap_or(StreamEvent::Unclassified)
}

/// Classifies every fact an event carries.
///
/// The order is: assistant text, then streamed tool input, then the
/// blocks of the structural message in content order. An empty result
/// means the event is unclassified.
pub fn classify_all(event: &RawEvent) -> Vec<StreamEvent> {
    let mut events = vec![];

    if let Some(data) = event.data.as_deref().filter(|d| !d.is_empty()) {
        events.push(StreamEvent::TextFragment {
            content: data.to_owned(),
            is_final: event.complete.unwrap_or(false),
        });
    }

    if let Some(tool_use) = &event.current_tool_use {
        if let Some(fragment) = classify_tool_input(tool_use) {
            events.push(fragment);
        }
    }

    if let Some(message) = &event.message {
        match message.role {
            Some(Role::Assistant) => {
                events.extend(message.content.iter().filter_map(tool_started));
            }
            Some(Role::User) => {
                events.extend(message.content.iter().filter_map(tool_result));
            }
            Some(Role::Other) | None => {}
        }
    }

    if events.is_empty() {
        trace!("unclassified event: {event:?}");
    }
    events
}

fn classify_tool_input(tool_use: &ToolUseDelta) -> Option<StreamEvent> {
    let input = match tool_use.input.as_ref()? {
        Value::String(text) if !text.is_empty() => text.clone(),
        // Empty and zero values carry no input yet.
        value if is_blank(value) => return None,
        other => other.to_string(),
    };
    let Some(invocation_id) = tool_use.tool_use_id.clone() else {
        debug!("tool input without an invocation id");
        return None;
    };
    Some(StreamEvent::ToolInputFragment {
        invocation_id,
        tool_name: tool_use
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_TOOL.to_owned()),
        cumulative_input_text: input,
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn tool_started(block: &ContentBlock) -> Option<StreamEvent> {
    let tool_use = block.tool_use.as_ref()?;
    Some(StreamEvent::ToolStarted {
        tool_name: tool_use
            .name
            .clone()
            .unwrap_or_else(|| UNKNOWN_TOOL.to_owned()),
    })
}

fn tool_result(block: &ContentBlock) -> Option<StreamEvent> {
    let tool_result = block.tool_result.as_ref()?;
    let Some(invocation_id) = tool_result.tool_use_id.clone() else {
        debug!("tool result without an invocation id");
        return None;
    };
    Some(StreamEvent::ToolResult {
        invocation_id,
        succeeded: tool_result.status.as_deref() == Some("success"),
    })
}
