//! Secret source backends

use std::collections::BTreeMap;

use super::{SecretResolver, SecretSource};
use crate::exec::{Executor, Invocation};

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Environment variable source
pub struct EnvResolver {
    lookup: Box<EnvLookup>,
}

impl EnvResolver {
    /// Read from the process environment
    #[must_use]
    pub fn process() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Read from a fixed set of variables
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            lookup: Box::new(move |key| vars.get(key).cloned()),
        }
    }
}

impl SecretResolver for EnvResolver {
    fn lookup(&self, source: &SecretSource) -> Result<Option<String>, String> {
        match source {
            SecretSource::Env { key } => Ok((self.lookup)(key)),
            _ => Ok(None),
        }
    }
}

/// 1Password source, read with `op read <ref>`
pub struct OnePasswordResolver<'a> {
    executor: &'a dyn Executor,
}

impl<'a> OnePasswordResolver<'a> {
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }
}

impl SecretResolver for OnePasswordResolver<'_> {
    fn lookup(&self, source: &SecretSource) -> Result<Option<String>, String> {
        let SecretSource::OnePassword { reference } = source else {
            return Ok(None);
        };

        let invocation = Invocation::new("op", ["read", "--no-newline", reference.as_str()]);
        self.executor
            .run_with_output(&invocation)
            .map(|out| Some(out.trim().to_string()))
            .map_err(|e| e.to_string())
    }
}

/// OS keychain source
#[derive(Debug, Clone, Copy, Default)]
pub struct KeychainResolver;

impl KeychainResolver {
    fn default_account() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "cprof".to_string())
    }
}

impl SecretResolver for KeychainResolver {
    fn lookup(&self, source: &SecretSource) -> Result<Option<String>, String> {
        let SecretSource::Keychain { service, account } = source else {
            return Ok(None);
        };

        let account = account.clone().unwrap_or_else(Self::default_account);
        let entry = keyring::Entry::new(service, &account).map_err(|e| e.to_string())?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ExecError, ExecResult};
    use std::sync::Mutex;

    struct RecordingExec {
        calls: Mutex<Vec<String>>,
        reply: Result<&'static str, &'static str>,
    }

    impl Executor for RecordingExec {
        fn run(&self, _: &Invocation) -> ExecResult<()> {
            Ok(())
        }
        fn run_with_output(&self, inv: &Invocation) -> ExecResult<String> {
            self.calls.lock().unwrap().push(inv.to_string());
            self.reply
                .map(String::from)
                .map_err(|out| ExecError::Failed {
                    program: inv.program.clone(),
                    status: Some(1),
                    output: out.to_string(),
                })
        }
    }

    #[test]
    fn test_env_ignores_other_sources() {
        let env = EnvResolver::from_pairs(&[("A", "1")]);
        assert_eq!(env.lookup(&SecretSource::env("A")).unwrap(), Some("1".into()));
        assert_eq!(env.lookup(&SecretSource::env("B")).unwrap(), None);
        assert_eq!(env.lookup(&SecretSource::keychain("svc")).unwrap(), None);
    }

    #[test]
    fn test_onepassword_uses_op_read() {
        let exec = RecordingExec {
            calls: Mutex::new(Vec::new()),
            reply: Ok("hunter2\n"),
        };
        let resolver = OnePasswordResolver::new(&exec);
        let source = SecretSource::OnePassword {
            reference: "op://dev/item/token".into(),
        };
        assert_eq!(resolver.lookup(&source).unwrap(), Some("hunter2".into()));
        assert_eq!(
            exec.calls.lock().unwrap()[0],
            "op read --no-newline op://dev/item/token"
        );
    }

    #[test]
    fn test_onepassword_failure_is_reported() {
        let exec = RecordingExec {
            calls: Mutex::new(Vec::new()),
            reply: Err("not signed in"),
        };
        let resolver = OnePasswordResolver::new(&exec);
        let source = SecretSource::OnePassword {
            reference: "op://dev/item/token".into(),
        };
        assert!(resolver.lookup(&source).unwrap_err().contains("not signed in"));
    }
}
