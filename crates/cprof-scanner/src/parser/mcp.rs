//! MCP configuration parser

use crate::error::{ScanError, ScanResult};
use crate::settings::{McpConfig, McpServer, McpTransport};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// `{"mcpServers": {...}}`, the shape of `.mcp.json` and of each project entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpConfig {
    #[serde(default)]
    mcp_servers: BTreeMap<String, RawMcpServer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpServer {
    #[serde(rename = "type")]
    transport_type: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    url: Option<String>,
}

/// Raw ~/.claude.json: user servers at the top, local servers per project
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaudeJson {
    #[serde(default)]
    mcp_servers: BTreeMap<String, RawMcpServer>,
    #[serde(default)]
    projects: BTreeMap<String, RawMcpConfig>,
}

/// Servers found in ~/.claude.json
#[derive(Debug, Clone, Default)]
pub struct ClaudeJsonServers {
    /// User-scope servers
    pub user: Vec<McpServer>,
    /// Local-scope servers of the requested project
    pub local: Vec<McpServer>,
}

/// Servers in name order; a missing `type` means stdio
fn convert_servers(servers: BTreeMap<String, RawMcpServer>) -> Vec<McpServer> {
    servers
        .into_iter()
        .map(|(name, server)| {
            let transport = match server.transport_type.as_deref() {
                Some("http") => McpTransport::Http,
                Some("sse") => McpTransport::Sse,
                _ => McpTransport::Stdio,
            };

            McpServer {
                name,
                transport,
                command: server.command,
                args: server.args,
                env: server.env,
                url: server.url,
            }
        })
        .collect()
}

/// Parse a project `.mcp.json`
///
/// An empty file, or one with no `mcpServers` key, declares no servers.
///
/// # Errors
/// Returns an error if the content is not a JSON object
pub fn parse_mcp_config(path: &Path, content: &str) -> ScanResult<McpConfig> {
    let servers = if content.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str::<RawMcpConfig>(content)
            .map_err(|e| ScanError::json(path, e))?
            .mcp_servers
    };

    Ok(McpConfig {
        path: path.to_path_buf(),
        servers: convert_servers(servers),
    })
}

/// Parse ~/.claude.json for user servers and the local servers of one project
///
/// # Errors
/// Returns an error if the file is not valid JSON
pub fn parse_claude_json(
    path: &Path,
    content: &str,
    project_dir: Option<&Path>,
) -> ScanResult<ClaudeJsonServers> {
    if content.trim().is_empty() {
        return Ok(ClaudeJsonServers::default());
    }

    let mut raw: RawClaudeJson =
        serde_json::from_str(content).map_err(|e| ScanError::json(path, e))?;

    let local = project_dir
        .and_then(|dir| raw.projects.remove(&dir.display().to_string()))
        .map(|project| convert_servers(project.mcp_servers))
        .unwrap_or_default();

    Ok(ClaudeJsonServers {
        user: convert_servers(raw.mcp_servers),
        local,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_mcp_config() {
        let content = r#"{
            "mcpServers": {
                "test-server": {
                    "type": "stdio",
                    "command": "/usr/bin/test",
                    "args": ["--flag"],
                    "env": { "KEY": "value" }
                }
            }
        }"#;

        let config = parse_mcp_config(&PathBuf::from(".mcp.json"), content).unwrap();
        assert_eq!(config.servers.len(), 1);
        let server = &config.servers[0];
        assert_eq!(server.name, "test-server");
        assert_eq!(server.transport, McpTransport::Stdio);
        assert_eq!(server.command, Some("/usr/bin/test".to_string()));
        assert_eq!(server.env.get("KEY"), Some(&"value".to_string()));
    }

    #[test]
    fn test_parse_mcp_config_http_and_empty() {
        let content = r#"{
            "mcpServers": {
                "supabase": { "type": "http", "url": "https://mcp.supabase.com/mcp" }
            }
        }"#;
        let config = parse_mcp_config(&PathBuf::from(".mcp.json"), content).unwrap();
        assert_eq!(config.servers[0].transport, McpTransport::Http);
        assert_eq!(config.servers[0].command, None);

        let empty = parse_mcp_config(&PathBuf::from(".mcp.json"), "{}").unwrap();
        assert!(empty.servers.is_empty());
        let blank = parse_mcp_config(&PathBuf::from(".mcp.json"), "\n").unwrap();
        assert!(blank.servers.is_empty());
    }

    #[test]
    fn test_parse_mcp_config_rejects_garbage() {
        let result = parse_mcp_config(&PathBuf::from(".mcp.json"), "not json");
        assert!(matches!(result, Err(ScanError::JsonParse { .. })));
    }

    #[test]
    fn test_parse_claude_json_user_and_local() {
        let content = r#"{
            "numStartups": 12,
            "mcpServers": {
                "github": { "command": "gh-mcp", "args": ["--stdio"] }
            },
            "projects": {
                "/work/app": {
                    "mcpServers": { "db": { "command": "pg-mcp" } }
                },
                "/work/other": {
                    "mcpServers": { "other": { "command": "x" } }
                }
            }
        }"#;

        let servers = parse_claude_json(
            &PathBuf::from(".claude.json"),
            content,
            Some(Path::new("/work/app")),
        )
        .unwrap();

        assert_eq!(servers.user.len(), 1);
        assert_eq!(servers.user[0].name, "github");
        assert_eq!(servers.local.len(), 1);
        assert_eq!(servers.local[0].name, "db");
    }
}
