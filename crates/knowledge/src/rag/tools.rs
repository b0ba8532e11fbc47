//! Tool registry and per-request dispatcher.

use crate::types::SourceCitation;
use coursewise_core::{AppError, AppResult};
use coursewise_llm::ToolDefinition;
use serde_json::Value;
use std::sync::Arc;

/// A capability the reasoning engine can invoke by name.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Name the engine uses to call the tool.
    fn name(&self) -> &str;

    /// Description and JSON parameter schema advertised to the engine.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool. Citations for retrieved material are appended to `sources`.
    async fn execute(&self, args: &Value, sources: &mut Vec<SourceCitation>) -> AppResult<String>;
}

/// Registered tools, in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Definitions of every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// A dispatcher with an empty citation buffer, for one request.
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher {
            registry: self,
            sources: Vec::new(),
        }
    }
}

/// Executes tools for a single request and collects their citations.
///
/// Each request gets its own dispatcher, so concurrent requests never share
/// a citation buffer.
pub struct Dispatcher<'a> {
    registry: &'a ToolRegistry,
    sources: Vec<SourceCitation>,
}

impl Dispatcher<'_> {
    /// Run the named tool with `args`.
    pub async fn execute(&mut self, name: &str, args: &Value) -> AppResult<String> {
        let tool = self
            .registry
            .find(name)
            .ok_or_else(|| AppError::UnknownTool(name.to_string()))?;

        validate_args(&tool.definition(), args)?;

        tracing::debug!("Executing tool '{}' with {}", name, args);
        tool.execute(args, &mut self.sources).await
    }

    /// Citations gathered since the last reset.
    pub fn last_sources(&self) -> &[SourceCitation] {
        &self.sources
    }

    pub fn reset_sources(&mut self) {
        self.sources.clear();
    }

    pub fn into_sources(self) -> Vec<SourceCitation> {
        self.sources
    }
}

/// Check that every argument named in the schema's `required` list is present.
pub fn validate_args(definition: &ToolDefinition, args: &Value) -> AppResult<()> {
    if !args.is_object() {
        return Err(AppError::InvalidToolArguments(format!(
            "{}: arguments must be a JSON object",
            definition.name
        )));
    }

    let required = definition
        .input_schema
        .get("required")
        .and_then(|r| r.as_array());

    for key in required.into_iter().flatten().filter_map(|k| k.as_str()) {
        if args.get(key).map_or(true, Value::is_null) {
            return Err(AppError::InvalidToolArguments(format!(
                "{}: missing required argument '{}'",
                definition.name, key
            )));
        }
    }

    Ok(())
}

/// Optional string argument; blank strings count as absent.
pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> AppResult<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(AppError::InvalidToolArguments(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
    }
}

/// Optional non-negative integer argument. Numeric strings are accepted
/// since some local models quote numbers.
pub(crate) fn u32_arg(args: &Value, key: &str) -> AppResult<Option<u32>> {
    let invalid = |v: &Value| {
        AppError::InvalidToolArguments(format!("'{}' must be a lesson number, got {}", key, v))
    };

    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}
