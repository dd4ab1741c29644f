/// How the model chooses among the session's tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Tool {
    #[serde(rename = "function")]
    Function(FunctionTool),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionTool {
    name: String,
    description: String,

    /// JSON Schema for the function arguments.
    parameters: serde_json::Value,
}

impl FunctionTool {
    pub fn new(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &serde_json::Value {
        &self.parameters
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tool_choice_serializes_to_bare_string() {
        assert_eq!(
            serde_json::to_string(&ToolChoice::Auto).expect("choice"),
            "\"auto\""
        );
    }

    #[test]
    fn function_tool_is_tagged() {
        let tool = Tool::Function(FunctionTool::new(
            "end_session",
            "Ends the reflection session.",
            serde_json::json!({"type": "object", "properties": {}}),
        ));
        let json = serde_json::to_value(&tool).expect("tool");
        assert_eq!(json["type"], "function");
        assert_eq!(json["name"], "end_session");
    }
}
