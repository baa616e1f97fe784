//! Command invocation representation.

use std::collections::BTreeMap;

use serde::Deserialize;

/// An external program call: program, ordered arguments and environment
/// overrides. Built per call and never mutated once handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandInvocation {
    /// Program name, resolved through `PATH`.
    pub program: String,
    /// Arguments in order.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment overrides applied on top of the inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandInvocation {
    /// Create an invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment override.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment overrides.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Human-readable command line, for logs and error messages.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build a tokio command with `fixed` overrides applied first and the
    /// invocation's own overrides on top. The parent environment is
    /// inherited.
    pub(crate) fn to_command(&self, fixed: &BTreeMap<String, String>) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).envs(fixed).envs(&self.env);
        cmd
    }
}
