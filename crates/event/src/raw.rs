use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One callback payload from the agent runtime.
///
/// Every field is optional. A field that is present but has an unexpected
/// JSON type is treated as absent, so deserializing a `RawEvent` from any
/// JSON value never fails. See [`RawEvent::from_json`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawEvent {
    /// Streamed assistant text.
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<String>,
    /// Whether `data` ends the current utterance.
    #[serde(default, deserialize_with = "lenient")]
    pub complete: Option<bool>,
    /// The tool call whose input is currently being streamed.
    #[serde(default, deserialize_with = "lenient")]
    pub current_tool_use: Option<ToolUseDelta>,
    /// A structural message appended to the conversation.
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<Message>,
}

impl RawEvent {
    /// Parses an event from JSON text.
    ///
    /// Fails only when `text` is not JSON at all. Valid JSON that does
    /// not look like an event yields an empty `RawEvent`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from(value))
    }
}

impl From<Value> for RawEvent {
    #[inline]
    fn from(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A partial tool call, as accumulated by the runtime so far.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ToolUseDelta {
    /// The correlation id of the invocation.
    #[serde(rename = "toolUseId", default, deserialize_with = "lenient")]
    pub tool_use_id: Option<String>,
    /// Name of the tool being called.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// The input observed so far.
    ///
    /// Usually a partially serialized JSON string, but some runtimes hand
    /// over the parsed value once the input is complete.
    #[serde(default, deserialize_with = "lenient")]
    pub input: Option<Value>,
}

/// The role of a structural message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Produced by the model.
    Assistant,
    /// Produced on behalf of the user, including tool results.
    User,
    /// Any role this crate doesn't care about.
    #[serde(other)]
    Other,
}

/// A structural message.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Message {
    /// Who produced the message.
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<Role>,
    /// Content blocks. Blocks that are not objects are dropped.
    #[serde(default, deserialize_with = "lenient_list")]
    pub content: Vec<ContentBlock>,
}

/// A content block of a [`Message`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ContentBlock {
    /// Present when the block requests a tool call.
    #[serde(rename = "toolUse", default, deserialize_with = "lenient")]
    pub tool_use: Option<ToolUseBlock>,
    /// Present when the block reports a tool result.
    #[serde(rename = "toolResult", default, deserialize_with = "lenient")]
    pub tool_result: Option<ToolResultBlock>,
}

/// A tool call request inside a message.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ToolUseBlock {
    /// The correlation id, if the runtime provides one.
    #[serde(rename = "toolUseId", default, deserialize_with = "lenient")]
    pub tool_use_id: Option<String>,
    /// Name of the tool.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// A tool result inside a message.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ToolResultBlock {
    /// The correlation id of the finished invocation.
    #[serde(rename = "toolUseId", default, deserialize_with = "lenient")]
    pub tool_use_id: Option<String>,
    /// `"success"` or anything else for a failure.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(vec![]);
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_full_event() {
        let event = RawEvent::from_json(
            r#"{
                "data": "Hi",
                "complete": true,
                "current_tool_use": {
                    "toolUseId": "tool:1",
                    "name": "lookup",
                    "input": "{\"q\": "
                },
                "message": {
                    "role": "user",
                    "content": [
                        {"toolResult": {"toolUseId": "tool:1", "status": "success"}}
                    ]
                },
                "delta": {"ignored": true}
            }"#,
        )
        .unwrap();

        assert_eq!(event.data.as_deref(), Some("Hi"));
        assert_eq!(event.complete, Some(true));
        let tool_use = event.current_tool_use.unwrap();
        assert_eq!(tool_use.tool_use_id.as_deref(), Some("tool:1"));
        assert_eq!(tool_use.input, Some(json!("{\"q\": ")));
        let message = event.message.unwrap();
        assert_eq!(message.role, Some(Role::User));
        assert_eq!(message.content.len(), 1);
    }

    #[test]
    fn test_unexpected_shapes_are_absent() {
        let event = RawEvent::from(json!({
            "data": 42,
            "complete": "yes",
            "current_tool_use": "not an object",
            "message": {
                "role": "system",
                "content": ["text", 3, {"toolUse": {"name": "lookup"}}]
            }
        }));

        assert_eq!(event.data, None);
        assert_eq!(event.complete, None);
        assert_eq!(event.current_tool_use, None);
        let message = event.message.unwrap();
        assert_eq!(message.role, Some(Role::Other));
        assert_eq!(message.content.len(), 1);
        assert_eq!(
            message.content[0].tool_use.as_ref().unwrap().name.as_deref(),
            Some("lookup")
        );
    }

    #[test]
    fn test_non_object_json() {
        assert_eq!(RawEvent::from_json("[1, 2]").unwrap(), RawEvent::default());
        assert_eq!(RawEvent::from_json("null").unwrap(), RawEvent::default());
        assert!(RawEvent::from_json("data: {").is_err());
    }
}
