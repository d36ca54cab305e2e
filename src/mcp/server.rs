/// MCP server loop
///
/// Reads JSON-RPC requests from stdin, dispatches tool calls to the storage
/// backend on behalf of the signed-in user, and writes responses to stdout.

use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::domain::Outcome;
use crate::mcp::protocol::*;
use crate::storage::StorageError;
use crate::tools;
use crate::{QuestTrackerServer, ServerError};

/// Errors that abort a single tool call
enum ToolError {
    InvalidParams(String),
    Storage(StorageError),
    Json(serde_json::Error),
}

impl From<StorageError> for ToolError {
    fn from(e: StorageError) -> Self {
        ToolError::Storage(e)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Json(e)
    }
}

/// MCP server bound to one `QuestTrackerServer`
pub struct McpServer {
    tracker: QuestTrackerServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(tracker: QuestTrackerServer) -> Self {
        Self {
            tracker,
            initialized: false,
        }
    }

    /// Serve requests until stdin is closed
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let mut reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;
                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Handle one line of input; `None` when nothing should be written back
    pub(crate) fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }

        Some(self.handle_request(request))
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.unwrap_or(Value::Null);

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "initialized" => {
                self.initialized = true;
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => return self.handle_tools_call(id, request.params),
            method => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method '{}' not found", method),
                    None,
                );
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    fn handle_initialize(&self) -> Result<Value, serde_json::Error> {
        info!("MCP client connected");

        serde_json::to_value(InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Quest Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    fn handle_tools_list(&self) -> Result<Value, serde_json::Error> {
        let tools = vec![
            ToolDefinition {
                name: "habit_create".to_string(),
                description: "Create a new habit to track".to_string(),
                input_schema: serde_json::to_value(schema_for!(tools::CreateHabitParams))?,
            },
            ToolDefinition {
                name: "habit_list".to_string(),
                description: "List your habits, newest first, with streaks and completion rates"
                    .to_string(),
                input_schema: serde_json::to_value(schema_for!(tools::ListHabitsParams))?,
            },
            ToolDefinition {
                name: "habit_delete".to_string(),
                description: "Delete a habit and all of its check-ins".to_string(),
                input_schema: serde_json::to_value(schema_for!(tools::DeleteHabitParams))?,
            },
            ToolDefinition {
                name: "habit_check_in".to_string(),
                description: "Mark a habit as completed today (once per day)".to_string(),
                input_schema: serde_json::to_value(schema_for!(tools::CheckInParams))?,
            },
            ToolDefinition {
                name: "habit_undo_check_in".to_string(),
                description: "Remove a check-in".to_string(),
                input_schema: serde_json::to_value(schema_for!(tools::UndoCheckInParams))?,
            },
        ];

        Ok(json!({ "tools": tools }))
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let call: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(call)) => call,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        if !self.initialized {
            debug!("Tool '{}' called before the initialized notification", call.name);
        }

        let result = match self.call_tool(&call.name, call.arguments) {
            Ok(result) => result,
            Err(ToolError::InvalidParams(message)) => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message, None);
            }
            Err(ToolError::Storage(e)) => {
                error!("Storage failure in '{}': {}", call.name, e);
                return JsonRpcResponse::error(id, error_codes::STORAGE_ERROR, e.to_string(), None);
            }
            Err(ToolError::Json(e)) => {
                return JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None);
            }
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    /// Route a tool call to its handler
    fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<ToolCallResult, ToolError> {
        let storage = self.tracker.storage();
        let user = self.tracker.user();

        match name {
            "habit_create" => respond(&tools::create_habit(storage, user, parse_args(arguments)?)?),
            "habit_list" => {
                let today = self.tracker.clock().today();
                respond(&tools::list_habits(storage, user, today, parse_args(arguments)?)?)
            }
            "habit_delete" => respond(&tools::delete_habit(storage, user, parse_args(arguments)?)?),
            "habit_check_in" => respond(&tools::check_in(storage, user, parse_args(arguments)?)?),
            "habit_undo_check_in" => {
                respond(&tools::undo_check_in(storage, user, parse_args(arguments)?)?)
            }
            unknown => Ok(ToolCallResult::error(format!("Unknown tool: {}", unknown))),
        }
    }
}

/// Deserialize tool arguments; a missing object is treated as `{}`
fn parse_args<P: DeserializeOwned>(arguments: Option<Value>) -> Result<P, ToolError> {
    serde_json::from_value(arguments.unwrap_or_else(|| json!({})))
        .map_err(|e| ToolError::InvalidParams(format!("Invalid arguments: {}", e)))
}

fn respond<T: Serialize>(outcome: &Outcome<T>) -> Result<ToolCallResult, ToolError> {
    Ok(ToolCallResult::from_outcome(outcome)?)
}
