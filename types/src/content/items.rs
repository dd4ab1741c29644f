use crate::content::message::MessageItem;

/// A single entry of the conversation transcript.
///
/// The `id` is immutable once assigned; every other field mutates in place
/// as streamed events arrive.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    #[serde(rename = "message")]
    Message(MessageItem),
    #[serde(rename = "function_call")]
    FunctionCall(FunctionCallItem),
    #[serde(rename = "function_call_output")]
    FunctionCallOutput(FunctionCallOutputItem),
}

impl Item {
    pub fn id(&self) -> Option<&str> {
        match self {
            Item::Message(message) => message.id.as_deref(),
            Item::FunctionCall(call) => call.id.as_deref(),
            Item::FunctionCallOutput(output) => output.id.as_deref(),
        }
    }

    pub fn as_message(&self) -> Option<&MessageItem> {
        match self {
            Item::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut MessageItem> {
        match self {
            Item::Message(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "incomplete")]
    Incomplete,
}

/// `function_call` item. `arguments` accumulates from argument deltas until
/// the done event replaces it with the final string.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,

    /// Correlates the call with its later output item.
    pub call_id: String,

    pub name: String,

    #[serde(default)]
    pub arguments: String,
}

/// `function_call_output` item, sent back by the client once the function
/// result is available.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,

    pub call_id: String,

    pub output: String,
}

impl FunctionCallOutputItem {
    pub fn new(call_id: &str, output: &str) -> Self {
        Self {
            id: None,
            status: None,
            call_id: call_id.to_string(),
            output: output.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn function_call_item_decodes() {
        let json = serde_json::json!({
            "type": "function_call",
            "id": "item_fc1",
            "status": "in_progress",
            "call_id": "call_7",
            "name": "end_session",
            "arguments": ""
        });
        let item: Item = serde_json::from_value(json).expect("item");
        assert_eq!(item.id(), Some("item_fc1"));
        match item {
            Item::FunctionCall(call) => {
                assert_eq!(call.call_id, "call_7");
                assert_eq!(call.name, "end_session");
                assert_eq!(call.status, Some(ItemStatus::InProgress));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn function_call_output_serializes_tagged() {
        let item = Item::FunctionCallOutput(FunctionCallOutputItem::new("call_7", "{\"ok\":true}"));
        let json = serde_json::to_value(&item).expect("item");
        assert_eq!(json["type"], "function_call_output");
        assert_eq!(json["call_id"], "call_7");
        assert!(json.get("id").is_none());
    }
}
