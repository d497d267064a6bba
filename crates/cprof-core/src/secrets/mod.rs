//! Secret resolution for MCP servers
//!
//! A profile never stores secret values. Each secret names an ordered list
//! of sources; the first source that yields a non-empty value wins.

mod sources;

pub use sources::{EnvResolver, KeychainResolver, OnePasswordResolver};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::exec::Executor;

/// Result type for secret resolution
pub type SecretResult<T> = Result<T, SecretError>;

/// Errors from secret resolution
#[derive(Debug, Error)]
pub enum SecretError {
    /// No source produced a value
    #[error("Secret '{name}' could not be resolved ({})", .attempts.join("; "))]
    Unresolved { name: String, attempts: Vec<String> },
}

impl SecretError {
    /// Name of the secret that failed
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unresolved { name, .. } => name,
        }
    }
}

/// A secret requirement: description plus candidate sources in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub sources: Vec<SecretSource>,
}

impl SecretRef {
    #[must_use]
    pub fn new(sources: Vec<SecretSource>) -> Self {
        Self {
            description: String::new(),
            sources,
        }
    }
}

/// One candidate origin of a secret value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretSource {
    /// Environment variable
    Env { key: String },
    /// 1Password secret reference (`op://vault/item/field`)
    #[serde(rename = "1password")]
    OnePassword {
        #[serde(rename = "ref")]
        reference: String,
    },
    /// OS keychain entry
    Keychain {
        service: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },
}

impl SecretSource {
    pub fn env(key: impl Into<String>) -> Self {
        Self::Env { key: key.into() }
    }

    pub fn keychain(service: impl Into<String>) -> Self {
        Self::Keychain {
            service: service.into(),
            account: None,
        }
    }

    /// Short label used in error messages
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Env { key } => format!("env:{key}"),
            Self::OnePassword { reference } => format!("1password:{reference}"),
            Self::Keychain {
                service,
                account: Some(account),
            } => format!("keychain:{service}:{account}"),
            Self::Keychain { service, .. } => format!("keychain:{service}"),
        }
    }
}

/// Looks up one kind of secret source
pub trait SecretResolver: Send + Sync {
    /// `Ok(None)` when the source holds no value
    fn lookup(&self, source: &SecretSource) -> Result<Option<String>, String>;
}

/// Tries a secret's sources strictly in declared order
pub struct SecretChain<'a> {
    env: Box<dyn SecretResolver + 'a>,
    onepassword: Box<dyn SecretResolver + 'a>,
    keychain: Box<dyn SecretResolver + 'a>,
}

impl<'a> SecretChain<'a> {
    /// Standard chain: process environment, `op` via the executor, OS keychain
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self {
            env: Box::new(EnvResolver::process()),
            onepassword: Box::new(OnePasswordResolver::new(executor)),
            keychain: Box::new(KeychainResolver),
        }
    }

    #[must_use]
    pub fn with_env(mut self, resolver: impl SecretResolver + 'a) -> Self {
        self.env = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn with_keychain(mut self, resolver: impl SecretResolver + 'a) -> Self {
        self.keychain = Box::new(resolver);
        self
    }

    fn resolver_for(&self, source: &SecretSource) -> &dyn SecretResolver {
        match source {
            SecretSource::Env { .. } => self.env.as_ref(),
            SecretSource::OnePassword { .. } => self.onepassword.as_ref(),
            SecretSource::Keychain { .. } => self.keychain.as_ref(),
        }
    }

    /// Resolve one secret; the first non-empty value wins
    pub fn resolve(&self, name: &str, secret: &SecretRef) -> SecretResult<String> {
        let mut attempts = Vec::new();

        for source in &secret.sources {
            match self.resolver_for(source).lookup(source) {
                Ok(Some(value)) if !value.is_empty() => {
                    tracing::debug!("Resolved secret {name} from {}", source.label());
                    return Ok(value);
                }
                Ok(_) => attempts.push(format!("{}: empty", source.label())),
                Err(e) => attempts.push(format!("{}: {e}", source.label())),
            }
        }

        if attempts.is_empty() {
            attempts.push("no sources configured".to_string());
        }
        Err(SecretError::Unresolved {
            name: name.to_string(),
            attempts,
        })
    }

    /// Resolve every secret of a map, stopping at the first failure
    pub fn resolve_all(
        &self,
        secrets: &BTreeMap<String, SecretRef>,
    ) -> SecretResult<BTreeMap<String, String>> {
        secrets
            .iter()
            .map(|(name, secret)| Ok((name.clone(), self.resolve(name, secret)?)))
            .collect()
    }
}

/// Substitute `$KEY` and `${KEY}` placeholders in arguments
///
/// A bare `$KEY` takes the longest run of `[A-Za-z0-9_]` as its name, so
/// `$TOKEN_B` never resolves through `TOKEN`. Unknown names are kept.
#[must_use]
pub fn substitute_args(args: &[String], values: &BTreeMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| map_placeholders(arg, |name| values.get(name).cloned()))
        .collect()
}

/// Rewrite placeholders for known secrets into the `${KEY}` form
#[must_use]
pub fn braced_placeholders<V>(args: &[String], secrets: &BTreeMap<String, V>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            map_placeholders(arg, |name| {
                secrets.contains_key(name).then(|| format!("${{{name}}}"))
            })
        })
        .collect()
}

/// Turn resolved secret values in arguments back into `${KEY}`
///
/// The converse of [`substitute_args`], for arguments read back from a
/// config file the claude CLI wrote. Longer values are matched first.
#[must_use]
pub fn restore_placeholders(args: &[String], values: &BTreeMap<String, String>) -> Vec<String> {
    let mut by_length: Vec<(&str, &str)> = values
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    by_length.sort_by_key(|(_, value)| std::cmp::Reverse(value.len()));

    args.iter().map(|arg| restore_arg(arg, &by_length)).collect()
}

fn restore_arg(arg: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    'scan: while let Some(c) = rest.chars().next() {
        for (key, value) in values {
            if let Some(tail) = rest.strip_prefix(value) {
                out.push_str("${");
                out.push_str(key);
                out.push('}');
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Replace each `$NAME` or `${NAME}` for which `lookup` returns a value
fn map_placeholders(arg: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = match after.strip_prefix('{') {
            Some(inner) => inner
                .find('}')
                .map_or(("", 0), |end| (&inner[..end], end + 2)),
            None => {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            }
        };

        match Some(name).filter(|n| !n.is_empty()).and_then(&lookup) {
            Some(value) => {
                out.push_str(&value);
                rest = &after[consumed..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
