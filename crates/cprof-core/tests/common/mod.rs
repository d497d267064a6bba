//! Shared fixtures for integration tests
//!
//! `FakeClaude` stands in for the claude and op binaries. It edits the same
//! JSON files the real CLI does, so a scan after an apply sees the result.

#![allow(dead_code)]

use cprof_core::exec::{ClaudeCli, ExecError, ExecResult, Executor, Invocation};
use cprof_core::secrets::{EnvResolver, SecretChain};
use cprof_core::{Applier, ClaudePaths, Scope};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// A temporary home directory plus a project directory
pub struct TestEnv {
    pub home: TempDir,
    pub project: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            project: TempDir::new().unwrap(),
        }
    }

    pub fn user_paths(&self) -> ClaudePaths {
        ClaudePaths::with_roots(self.home.path(), None)
    }

    pub fn project_paths(&self) -> ClaudePaths {
        ClaudePaths::with_roots(self.home.path(), Some(self.project.path().to_path_buf()))
    }

    pub fn fake(&self) -> FakeClaude {
        FakeClaude::new(self.project_paths())
    }

    pub fn read_json(&self, path: &Path) -> Value {
        read_json(path)
    }

    pub fn enabled_plugins(&self, scope: Scope) -> BTreeMap<String, bool> {
        let path = self.project_paths().settings_path(scope).unwrap();
        match read_json(&path).get("enabledPlugins") {
            Some(value) => serde_json::from_value(value.clone()).unwrap(),
            None => BTreeMap::new(),
        }
    }
}

/// Applier wired to a fake CLI and a fixed set of environment secrets
pub fn applier<'a>(
    paths: ClaudePaths,
    fake: &'a FakeClaude,
    env: &[(&str, &str)],
) -> Applier<'a> {
    let cli = ClaudeCli::new(paths.project_dir().map(Path::to_path_buf)).with_program("claude");
    let secrets = SecretChain::new(fake).with_env(EnvResolver::from_pairs(env));
    Applier::new(paths, fake).with_cli(cli).with_secrets(secrets)
}

pub fn read_json(path: &Path) -> Value {
    match fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content).unwrap(),
        _ => json!({}),
    }
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn write_raw(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn object<'v>(value: &'v mut Value, key: &str) -> &'v mut Map<String, Value> {
    let map = value.as_object_mut().unwrap();
    let entry = map.entry(key.to_string()).or_insert_with(|| json!({}));
    entry.as_object_mut().unwrap()
}

/// Simulated claude and op binaries
pub struct FakeClaude {
    paths: ClaudePaths,
    calls: Mutex<Vec<Invocation>>,
    failures: Mutex<Vec<(String, String)>>,
    op_secrets: Mutex<BTreeMap<String, String>>,
    corruptions: Mutex<Vec<(String, PathBuf)>>,
    files: Mutex<()>,
}

impl FakeClaude {
    pub fn new(paths: ClaudePaths) -> Self {
        Self {
            paths,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            op_secrets: Mutex::new(BTreeMap::new()),
            corruptions: Mutex::new(Vec::new()),
            files: Mutex::new(()),
        }
    }

    /// Fail any call whose argument line contains `pattern`
    pub fn fail_on(&self, pattern: &str, output: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((pattern.to_string(), output.to_string()));
    }

    /// Make `op read <reference>` return a value
    pub fn set_op_secret(&self, reference: &str, value: &str) {
        self.op_secrets
            .lock()
            .unwrap()
            .insert(reference.to_string(), value.to_string());
    }

    /// Overwrite `path` with invalid JSON after a call matching `pattern`
    pub fn corrupt_after(&self, pattern: &str, path: &Path) {
        self.corruptions
            .lock()
            .unwrap()
            .push((pattern.to_string(), path.to_path_buf()));
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Argument lines of every claude call, in order
    pub fn claude_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|inv| inv.program == "claude")
            .map(Invocation::args_line)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn failed(program: &str, output: impl Into<String>) -> ExecError {
        ExecError::Failed {
            program: program.to_string(),
            status: Some(1),
            output: output.into(),
        }
    }

    fn op(&self, invocation: &Invocation) -> ExecResult<String> {
        let reference = invocation.args.last().cloned().unwrap_or_default();
        self.op_secrets
            .lock()
            .unwrap()
            .get(&reference)
            .cloned()
            .ok_or_else(|| Self::failed("op", format!("\"{reference}\" isn't an item")))
    }

    fn claude(&self, invocation: &Invocation) -> ExecResult<String> {
        let _guard = self.files.lock().unwrap();
        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["plugin", "install", scope, key] => self.plugin_install(parse_scope(scope), key),
            ["plugin", "uninstall", scope, name] => self.plugin_uninstall(parse_scope(scope), name),
            ["plugin", "marketplace", "add", source] => Ok(self.marketplace_add(source)),
            ["plugin", "marketplace", "remove", name] => self.marketplace_remove(name),
            ["mcp", "add", name, "--scope", scope, rest @ ..] => {
                self.mcp_add(name, scope.parse().unwrap(), rest)
            }
            ["mcp", "remove", name, "--scope", scope] => self.mcp_remove(name, scope.parse().unwrap()),
            _ => Err(Self::failed("claude", format!("unknown command: {}", invocation.args_line()))),
        }
    }

    fn plugin_install(&self, scope: Scope, key: &str) -> ExecResult<String> {
        let path = self.paths.settings_path(scope).unwrap();
        let mut settings = read_json(&path);
        let plugins = object(&mut settings, "enabledPlugins");
        if plugins.get(key) == Some(&Value::Bool(true)) {
            return Err(Self::failed("claude", format!("Plugin {key} is already installed")));
        }
        plugins.insert(key.to_string(), Value::Bool(true));
        write_json(&path, &settings);
        Ok(format!("Installed {key}"))
    }

    fn plugin_uninstall(&self, scope: Scope, name: &str) -> ExecResult<String> {
        let path = self.paths.settings_path(scope).unwrap();
        let mut settings = read_json(&path);
        let plugins = object(&mut settings, "enabledPlugins");
        let keys: Vec<String> = plugins
            .keys()
            .filter(|k| k.split('@').next() == Some(name))
            .cloned()
            .collect();
        if keys.is_empty() {
            return Err(Self::failed("claude", format!("Plugin {name} is not installed")));
        }
        for key in keys {
            plugins.remove(&key);
        }
        write_json(&path, &settings);
        Ok(format!("Uninstalled {name}"))
    }

    fn marketplace_add(&self, source: &str) -> String {
        let path = self.paths.known_marketplaces_path();
        let mut registry = read_json(&path);
        let trimmed = source.trim_end_matches('/');
        let name = trimmed
            .rsplit('/')
            .next()
            .unwrap_or(trimmed)
            .trim_end_matches(".git")
            .to_string();
        let entry = if source.contains("://") {
            json!({ "source": { "source": "git", "url": source } })
        } else {
            json!({ "source": { "source": "github", "repo": source } })
        };
        registry.as_object_mut().unwrap().insert(name.clone(), entry);
        write_json(&path, &registry);
        format!("Added marketplace {name}")
    }

    fn marketplace_remove(&self, name: &str) -> ExecResult<String> {
        let path = self.paths.known_marketplaces_path();
        let mut registry = read_json(&path);
        if registry.as_object_mut().unwrap().remove(name).is_none() {
            return Err(Self::failed("claude", format!("Marketplace '{name}' not found")));
        }
        write_json(&path, &registry);
        Ok(format!("Removed marketplace {name}"))
    }

    fn mcp_file(&self, scope: Scope) -> PathBuf {
        match scope {
            Scope::Project => self.paths.project_mcp_path().unwrap(),
            Scope::User | Scope::Local => self.paths.claude_json().to_path_buf(),
        }
    }

    fn mcp_servers<'v>(&self, scope: Scope, root: &'v mut Value) -> &'v mut Map<String, Value> {
        match scope {
            Scope::User | Scope::Project => object(root, "mcpServers"),
            Scope::Local => {
                let project = self.paths.project_dir().unwrap().display().to_string();
                let projects = object(root, "projects");
                let entry = projects.entry(project).or_insert_with(|| json!({}));
                object(entry, "mcpServers")
            }
        }
    }

    fn mcp_add(&self, name: &str, scope: Scope, rest: &[&str]) -> ExecResult<String> {
        let mut env = Map::new();
        let mut iter = rest.iter();
        let mut command = Vec::new();
        while let Some(arg) = iter.next() {
            match *arg {
                "-e" => {
                    let pair = iter.next().unwrap();
                    let (key, value) = pair.split_once('=').unwrap();
                    env.insert(key.to_string(), Value::String(value.to_string()));
                }
                "--" => {
                    command = iter.by_ref().map(|s| (*s).to_string()).collect();
                }
                _ => {}
            }
        }

        let path = self.mcp_file(scope);
        let mut root = read_json(&path);
        let servers = self.mcp_servers(scope, &mut root);
        if servers.contains_key(name) {
            return Err(Self::failed(
                "claude",
                format!("MCP server {name} already exists in {scope} config"),
            ));
        }
        let mut entry = json!({ "type": "stdio", "command": command[0], "args": command[1..] });
        if !env.is_empty() {
            entry["env"] = Value::Object(env);
        }
        servers.insert(name.to_string(), entry);
        write_json(&path, &root);
        Ok(format!("Added stdio MCP server {name}"))
    }

    fn mcp_remove(&self, name: &str, scope: Scope) -> ExecResult<String> {
        let path = self.mcp_file(scope);
        let mut root = read_json(&path);
        if self.mcp_servers(scope, &mut root).remove(name).is_none() {
            return Err(Self::failed(
                "claude",
                format!("MCP server {name} not found in {scope} config"),
            ));
        }
        write_json(&path, &root);
        Ok(format!("Removed MCP server {name}"))
    }
}

fn parse_scope(flag: &str) -> Scope {
    flag.trim_start_matches("--scope=").parse().unwrap()
}

impl Executor for FakeClaude {
    fn run(&self, invocation: &Invocation) -> ExecResult<()> {
        self.run_with_output(invocation).map(|_| ())
    }

    fn run_with_output(&self, invocation: &Invocation) -> ExecResult<String> {
        self.calls.lock().unwrap().push(invocation.clone());

        let line = invocation.args_line();
        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone());
        if let Some(output) = failure {
            return Err(Self::failed(&invocation.program, output));
        }

        let result = match invocation.program.as_str() {
            "claude" => self.claude(invocation),
            "op" => self.op(invocation),
            _ => Ok(String::new()),
        };

        for (pattern, path) in self.corruptions.lock().unwrap().iter() {
            if line.contains(pattern.as_str()) {
                write_raw(path, "{ not json");
            }
        }
        result
    }
}
