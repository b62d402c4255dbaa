use std::path::PathBuf;

use serde_json::{json, Value};

use crate::commands::build::{self, BuildOptions};
use crate::commands::create::{self, CreateOptions};
use crate::commands::device;
use crate::commands::list;
use crate::commands::simulator;
use crate::context::ToolContext;

/// One entry of the fixed tool table exposed to agent clients.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// The seven operations exposed over the agent-tool protocol.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "build",
            description: "Compile a Playdate project into a .pdx bundle and report diagnostics",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectDir": {
                        "type": "string",
                        "description": "Project directory (default: current directory)"
                    },
                    "sourceDir": {
                        "type": "string",
                        "description": "Source directory (default: first of source/, Source/, src/)"
                    },
                    "output": {
                        "type": "string",
                        "description": "Output bundle path (default: output.pdx in the project)"
                    }
                }
            }),
        },
        ToolSpec {
            name: "create",
            description: "Create a new Playdate project from a template",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Project name"
                    },
                    "template": {
                        "type": "string",
                        "description": "Template name (default: basic)"
                    },
                    "destDir": {
                        "type": "string",
                        "description": "Parent directory for the new project (default: current directory)"
                    }
                },
                "required": ["name"]
            }),
        },
        ToolSpec {
            name: "run",
            description: "Open a compiled bundle in the Playdate Simulator",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "bundle": {
                        "type": "string",
                        "description": "Bundle path (default: output.pdx in the current directory)"
                    }
                }
            }),
        },
        ToolSpec {
            name: "deploy",
            description: "Install a compiled bundle onto a connected Playdate over USB",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "bundle": {
                        "type": "string",
                        "description": "Bundle path (default: output.pdx in the current directory)"
                    }
                }
            }),
        },
        ToolSpec {
            name: "list_templates",
            description: "List the available project templates",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: "list_examples",
            description: "List the example projects and whether each is built",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: "device_info",
            description: "Query the connected Playdate for its serial number and firmware",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

/// Dispatches one tool call and always returns a structured result.
/// Operation failures become `{"success": false, "error": ...}`, never a
/// protocol-level fault.
pub async fn call_tool(ctx: &ToolContext, name: &str, args: &Value) -> Value {
    match name {
        "build" => {
            let result = build::build(
                ctx,
                BuildOptions {
                    project_dir: path_arg(args, "projectDir"),
                    source_dir: path_arg(args, "sourceDir"),
                    output: path_arg(args, "output"),
                },
            )
            .await;
            json_value(&result)
        }
        "create" => {
            let Some(name) = str_arg(args, "name") else {
                return failure("Missing required parameter: name");
            };
            match create::create_project(
                ctx,
                CreateOptions {
                    name,
                    template: str_arg(args, "template"),
                    dest_parent: path_arg(args, "destDir"),
                },
            ) {
                Ok(result) => with_success(json_value(&result)),
                Err(e) => failure(e),
            }
        }
        "run" => match simulator::run_bundle(ctx, path_arg(args, "bundle")).await {
            Ok(result) => with_success(json_value(&result)),
            Err(e) => failure(e),
        },
        "deploy" => match device::deploy(ctx, path_arg(args, "bundle")).await {
            Ok(message) => json!({ "success": true, "message": message }),
            Err(e) => failure(e),
        },
        "list_templates" => match list::list_templates(ctx) {
            Ok(templates) => json!({ "success": true, "templates": templates }),
            Err(e) => failure(e),
        },
        "list_examples" => match list::list_examples(ctx) {
            Ok(examples) => json!({ "success": true, "examples": examples }),
            Err(e) => failure(e),
        },
        "device_info" => json_value(&device::device_info(ctx).await),
        _ => failure(format!("Unknown tool: {name}")),
    }
}

fn str_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn path_arg(args: &Value, key: &str) -> Option<PathBuf> {
    str_arg(args, key).map(|s| PathBuf::from(crate::util::expand_tilde(&s)))
}

fn json_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| failure(e))
}

fn with_success(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert("success".to_string(), Value::Bool(true));
    }
    value
}

fn failure(error: impl ToString) -> Value {
    json!({ "success": false, "error": error.to_string() })
}
