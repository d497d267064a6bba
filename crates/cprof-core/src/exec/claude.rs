//! claude CLI command lines

use cprof_scanner::Scope;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::Invocation;

/// Environment variable overriding the claude binary
pub const CLAUDE_BIN_ENV: &str = "CPROF_CLAUDE_BIN";

/// Builds claude CLI invocations for one project context
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    program: String,
    project_dir: Option<PathBuf>,
}

impl Default for ClaudeCli {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ClaudeCli {
    /// Use `claude` from PATH (or `CPROF_CLAUDE_BIN`)
    #[must_use]
    pub fn new(project_dir: Option<PathBuf>) -> Self {
        let program = std::env::var(CLAUDE_BIN_ENV).unwrap_or_else(|_| "claude".to_string());
        Self {
            program,
            project_dir,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Project and local scope commands run from the project directory
    fn cwd(&self, scope: Scope) -> Option<&Path> {
        if scope.needs_project() {
            self.project_dir.as_deref()
        } else {
            None
        }
    }

    fn invocation(&self, args: Vec<String>, scope: Option<Scope>) -> Invocation {
        Invocation::new(self.program.clone(), args).in_dir(scope.and_then(|s| self.cwd(s)))
    }

    /// `plugin install --scope=<scope> <name@marketplace>`
    #[must_use]
    pub fn plugin_install(&self, plugin: &str, scope: Scope) -> Invocation {
        self.invocation(
            vec![
                "plugin".into(),
                "install".into(),
                format!("--scope={scope}"),
                plugin.into(),
            ],
            Some(scope),
        )
    }

    /// `plugin uninstall --scope=<scope> <name>`
    ///
    /// The CLI only accepts the bare plugin name here.
    #[must_use]
    pub fn plugin_uninstall(&self, plugin: &str, scope: Scope) -> Invocation {
        let name = plugin.split('@').next().unwrap_or(plugin);
        self.invocation(
            vec![
                "plugin".into(),
                "uninstall".into(),
                format!("--scope={scope}"),
                name.into(),
            ],
            Some(scope),
        )
    }

    /// `plugin marketplace add <repo-or-url>`
    #[must_use]
    pub fn marketplace_add(&self, source: &str) -> Invocation {
        self.invocation(
            vec![
                "plugin".into(),
                "marketplace".into(),
                "add".into(),
                source.into(),
            ],
            None,
        )
    }

    /// `plugin marketplace remove <registered name>`
    #[must_use]
    pub fn marketplace_remove(&self, name: &str) -> Invocation {
        self.invocation(
            vec![
                "plugin".into(),
                "marketplace".into(),
                "remove".into(),
                name.into(),
            ],
            None,
        )
    }

    /// `mcp add <name> --scope <scope> [-e K=V]... -- <command> <args>...`
    #[must_use]
    pub fn mcp_add(
        &self,
        name: &str,
        scope: Scope,
        env: &BTreeMap<String, String>,
        command: &str,
        args: &[String],
    ) -> Invocation {
        let mut argv: Vec<String> = vec![
            "mcp".into(),
            "add".into(),
            name.into(),
            "--scope".into(),
            scope.to_string(),
        ];
        for (key, value) in env {
            argv.push("-e".into());
            argv.push(format!("{key}={value}"));
        }
        argv.push("--".into());
        argv.push(command.into());
        argv.extend(args.iter().cloned());
        self.invocation(argv, Some(scope))
    }

    /// `mcp remove <name> --scope <scope>`
    #[must_use]
    pub fn mcp_remove(&self, name: &str, scope: Scope) -> Invocation {
        self.invocation(
            vec![
                "mcp".into(),
                "remove".into(),
                name.into(),
                "--scope".into(),
                scope.to_string(),
            ],
            Some(scope),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> ClaudeCli {
        ClaudeCli::new(Some(PathBuf::from("/work/app"))).with_program("claude")
    }

    #[test]
    fn test_plugin_commands() {
        let install = cli().plugin_install("a@mp", Scope::Project);
        assert_eq!(install.args_line(), "plugin install --scope=project a@mp");
        assert_eq!(install.cwd.as_deref(), Some(Path::new("/work/app")));

        let uninstall = cli().plugin_uninstall("a@mp", Scope::User);
        assert_eq!(uninstall.args_line(), "plugin uninstall --scope=user a");
        assert!(uninstall.cwd.is_none());
    }

    #[test]
    fn test_mcp_add_layout() {
        let env = BTreeMap::from([("TOKEN".to_string(), "s3cret".to_string())]);
        let inv = cli().mcp_add(
            "srv",
            Scope::Local,
            &env,
            "npx",
            &["-y".to_string(), "pkg".to_string()],
        );
        assert_eq!(
            inv.args_line(),
            "mcp add srv --scope local -e TOKEN=s3cret -- npx -y pkg"
        );
        assert_eq!(inv.cwd.as_deref(), Some(Path::new("/work/app")));
    }

    #[test]
    fn test_marketplace_commands_run_anywhere() {
        let add = cli().marketplace_add("org/market");
        assert_eq!(add.args_line(), "plugin marketplace add org/market");
        assert!(add.cwd.is_none());
        assert_eq!(
            cli().marketplace_remove("market").args_line(),
            "plugin marketplace remove market"
        );
    }
}
