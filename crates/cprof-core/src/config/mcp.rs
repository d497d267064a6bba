//! Native project MCP config (.mcp.json)
//!
//! This file is checked in, so secrets are written as `${KEY}` references
//! that Claude Code expands from the environment at launch.

use serde_json::{json, Map, Value};
use std::path::Path;

use super::document::JsonDocument;
use super::error::SettingsResult;
use crate::profile::McpServer;

const MCP_SERVERS: &str = "mcpServers";

/// Render one server as a `.mcp.json` entry
#[must_use]
pub fn server_entry(server: &McpServer) -> Value {
    let mut entry = Map::new();
    entry.insert("command".into(), json!(server.command));
    if !server.args.is_empty() {
        entry.insert("args".into(), json!(server.args));
    }
    if !server.secrets.is_empty() {
        let env: Map<String, Value> = server
            .secrets
            .keys()
            .map(|key| (key.clone(), Value::String(format!("${{{key}}}"))))
            .collect();
        entry.insert("env".into(), Value::Object(env));
    }
    Value::Object(entry)
}

/// Add or replace servers in `.mcp.json`, keeping servers not listed
pub fn write_project_mcp(path: &Path, servers: &[McpServer]) -> SettingsResult<usize> {
    let mut doc = JsonDocument::load(path)?;
    let mut entries = doc.take_object(MCP_SERVERS);
    for server in servers {
        entries.insert(server.name.clone(), server_entry(server));
    }
    doc.insert(MCP_SERVERS, Value::Object(entries));
    doc.save()?;
    Ok(servers.len())
}
