//! Profile storage and format tests

use cprof_core::profile::{
    load_file, snapshot_live, HookCondition, Marketplace, McpServer, Profile, ProfileError,
    ProfileStore,
};
use cprof_core::scope::{combine_scopes, configured_scopes, extract_scope};
use cprof_core::secrets::{SecretRef, SecretSource};
use cprof_core::{ClaudePaths, Scope};
use std::fs;
use tempfile::TempDir;

const TEAM_PROFILE: &str = r#"{
    "name": "team",
    "description": "Shared backend setup",
    "marketplaces": [{"source": "github", "repo": "org/tools"}],
    "perScope": {
        "user": {"plugins": ["notes@tools"]},
        "project": {
            "plugins": ["lint@tools"],
            "mcpServers": [{"name": "db", "command": "pg-mcp", "args": ["--ro"]}],
            "localItems": {"agents": ["reviewer*"], "output-styles": ["terse.md"]}
        },
        "local": {
            "mcpServers": [{
                "name": "github",
                "command": "gh-mcp",
                "args": ["--token", "${GITHUB_TOKEN}"],
                "secrets": {
                    "GITHUB_TOKEN": {
                        "description": "Personal access token",
                        "sources": [
                            {"type": "env", "key": "GITHUB_TOKEN"},
                            {"type": "1password", "ref": "op://dev/github/token"},
                            {"type": "keychain", "service": "github"}
                        ]
                    }
                }
            }]
        }
    },
    "postApply": {"command": "make setup", "condition": "first-run"},
    "settingsHooks": {
        "SessionStart": [{"hooks": [{"type": "command", "command": "echo hi"}]}]
    }
}"#;

#[test]
fn test_parse_per_scope_profile() {
    let profile: Profile = serde_json::from_str(TEAM_PROFILE).unwrap();

    assert!(profile.per_scope.is_some());
    assert_eq!(configured_scopes(&profile), vec![Scope::User, Scope::Project, Scope::Local]);

    let project = extract_scope(&profile, Scope::Project);
    assert_eq!(project.plugins, vec!["lint@tools"]);
    assert_eq!(project.mcp_servers[0].args, vec!["--ro"]);
    assert_eq!(project.local_items.agents, vec!["reviewer*"]);
    assert_eq!(project.local_items.output_styles, vec!["terse.md"]);
    assert_eq!(project.marketplaces, vec![Marketplace::github("org/tools")]);

    let local = extract_scope(&profile, Scope::Local);
    let secret = &local.mcp_servers[0].secrets["GITHUB_TOKEN"];
    assert_eq!(secret.description, "Personal access token");
    assert_eq!(
        secret.sources,
        vec![
            SecretSource::env("GITHUB_TOKEN"),
            SecretSource::OnePassword {
                reference: "op://dev/github/token".into()
            },
            SecretSource::keychain("github"),
        ]
    );

    let hook = profile.post_apply.as_ref().unwrap();
    assert_eq!(hook.condition, HookCondition::FirstRun);
    assert_eq!(profile.settings_hooks["SessionStart"][0].hooks[0].hook_type, "command");
}

#[test]
fn test_combined_plugins_are_union_of_scopes() {
    let profile: Profile = serde_json::from_str(TEAM_PROFILE).unwrap();
    let combined = combine_scopes(&profile);

    for scope in Scope::ALL {
        for plugin in extract_scope(&profile, scope).plugins {
            assert!(combined.plugins.contains(&plugin), "{plugin} missing");
        }
    }
    assert_eq!(combined.plugins, vec!["lint@tools", "notes@tools"]);
    assert_eq!(combined.mcp_servers.len(), 2);
}

#[test]
fn test_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path());
    let profile: Profile = serde_json::from_str(TEAM_PROFILE).unwrap();

    let path = store.save(&profile).unwrap();
    assert_eq!(path, dir.path().join("team.json"));
    assert_eq!(store.load("team").unwrap(), profile);
    assert_eq!(load_file(&path).unwrap(), profile);

    // Stored JSON keeps the camelCase layout
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"perScope\""));
    assert!(raw.contains("\"postApply\""));
    assert!(raw.ends_with('\n'));
}

#[test]
fn test_clone_profile() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path());
    store.save(&serde_json::from_str(TEAM_PROFILE).unwrap()).unwrap();

    let copy = store.clone_profile("team", "team-2").unwrap();
    assert_eq!(copy.name, "team-2");
    assert_eq!(store.list().unwrap(), vec!["team", "team-2"]);
    assert!(matches!(
        store.clone_profile("team", "team-2"),
        Err(ProfileError::AlreadyExists(_))
    ));
}

#[test]
fn test_invalid_names_rejected() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path());
    for name in ["", "../escape", ".hidden", "has space"] {
        assert!(
            matches!(store.save(&Profile::new(name)), Err(ProfileError::InvalidName(_))),
            "{name:?} accepted"
        );
    }
}

#[test]
fn test_snapshot_then_preserve() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let paths = ClaudePaths::with_roots(home.path(), Some(project.path().to_path_buf()));
    fs::create_dir_all(paths.claude_dir()).unwrap();
    fs::write(
        paths.settings_path(Scope::User).unwrap(),
        r#"{"enabledPlugins": {"notes@tools": true, "off@tools": false}}"#,
    )
    .unwrap();
    fs::write(
        paths.claude_json(),
        r#"{"mcpServers": {"github": {"command": "gh-mcp", "env": {"GITHUB_TOKEN": "abc"}}}}"#,
    )
    .unwrap();

    let mut snapshot = snapshot_live(&paths, "captured").unwrap();
    let user = extract_scope(&snapshot, Scope::User);
    assert_eq!(user.plugins, vec!["notes@tools"]);
    assert_eq!(user.mcp_servers[0].scope, Some(Scope::User));
    // Secret values are never captured
    assert!(user.mcp_servers[0].secrets["GITHUB_TOKEN"].sources.is_empty());

    let mut previous = Profile::new("captured");
    previous.description = "from before".into();
    previous.mcp_servers = vec![McpServer::new("github", "gh-mcp").with_secret(
        "GITHUB_TOKEN",
        SecretRef::new(vec![SecretSource::env("GITHUB_TOKEN")]),
    )];
    snapshot.preserve_from(&previous);

    assert_eq!(snapshot.description, "from before");
    let user = extract_scope(&snapshot, Scope::User);
    assert_eq!(
        user.mcp_servers[0].secrets["GITHUB_TOKEN"].sources,
        vec![SecretSource::env("GITHUB_TOKEN")]
    );
}
