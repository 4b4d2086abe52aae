//! Session state and the dispatch pipeline
//!
//! A [`Shell`] owns the command registry, the coercion registry, and the
//! environment store. [`Shell::eval_line`] runs one full cycle (split,
//! resolve, bind, invoke) and returns the [`Outcome`] for rendering; the
//! interactive loop around it lives in [`crate::repl`].

use miette::{Report, Result};
use tracing::debug;

use crate::cmd::bind::bind;
use crate::cmd::coerce::Coercions;
use crate::cmd::registry::{CmdId, Registry};
use crate::cmd::{Command, Options, ParamType, Signature};
use crate::data::Value;
use crate::error::ShellError;

pub mod env;

use env::EnvStore;

/// Startup configuration for a [`Shell`]
pub struct ShellBuilder {
    title: String,
    marker: String,
    ignore_case: bool,
    coercions: Coercions,
    env: Vec<(String, Value)>,
}

impl ShellBuilder {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            marker: "> ".to_string(),
            ignore_case: false,
            coercions: Coercions::with_defaults(),
            env: Vec::new(),
        }
    }

    /// The prompt marker printed after the session title
    pub fn prompt(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Match aliases, verbs, and nouns case-insensitively
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Override or extend the token parser for a type (last registration wins)
    pub fn parser(
        mut self,
        ty: ParamType,
        parser: impl Fn(&str) -> Result<Value, String> + 'static,
    ) -> Self {
        self.coercions.register(ty, parser);
        self
    }

    /// Seed one environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Shell {
        Shell {
            title: self.title,
            marker: self.marker,
            registry: Registry::new(self.ignore_case),
            coercions: self.coercions,
            env: EnvStore::seeded(self.env),
            stopped: false,
        }
    }
}

/// The outcome of one non-empty input line, routed to exactly one renderer
pub enum Outcome {
    /// The handler ran and returned a value (or nothing)
    Value {
        command: CmdId,
        value: Option<Value>,
    },
    /// Resolution, binding, or the handler itself failed
    Failure {
        command: Option<CmdId>,
        error: Report,
    },
}

/// An interactive command session
pub struct Shell {
    title: String,
    marker: String,
    registry: Registry,
    coercions: Coercions,
    env: EnvStore,
    stopped: bool,
}

impl Shell {
    pub fn builder(title: impl Into<String>) -> ShellBuilder {
        ShellBuilder::new(title)
    }

    /// Register a flat command; fatal at startup on any validation failure
    pub fn register(&mut self, command: Command) -> Result<CmdId, ShellError> {
        self.registry.register(command, &self.coercions)
    }

    /// Register a verb namespace
    pub fn register_verb(&mut self, name: &str) -> Result<(), ShellError> {
        self.registry.register_verb(name)
    }

    /// Register a noun under a verb, forming the two-token command
    pub fn register_noun(&mut self, verb: &str, command: Command) -> Result<CmdId, ShellError> {
        self.registry.register_noun(verb, command, &self.coercions)
    }

    /// Remove a verb and every command registered under it
    pub fn remove_verb(&mut self, name: &str) -> bool {
        self.registry.remove_verb(name)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether a handler has issued the stop directive
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn env(&self) -> &EnvStore {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut EnvStore {
        &mut self.env
    }

    /// Metadata of a registered command
    pub fn signature(&self, id: CmdId) -> Option<&Signature> {
        self.registry.signature(id)
    }

    /// All registered commands, in registration order
    pub fn commands(&self) -> impl Iterator<Item = &Signature> {
        self.registry.commands()
    }

    /// Run one cycle: split the line, resolve, bind, invoke.
    ///
    /// Returns `None` for an empty (all-whitespace) line. Failures at any
    /// stage are captured in the returned [`Outcome`], never propagated, so
    /// the session survives every per-invocation error.
    pub fn eval_line(&mut self, line: &str) -> Option<Outcome> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let (id, rest) = match self.registry.resolve(&tokens) {
            Ok(hit) => hit,
            Err(err) => {
                debug!(%err, "resolution failed");
                return Some(Outcome::Failure {
                    command: None,
                    error: err.into(),
                });
            }
        };

        let args = match self.registry.signature(id) {
            Some(sig) => {
                debug!(command = %sig.name(), args = rest.len(), "resolved");
                match bind(&sig.params, rest, &self.coercions) {
                    Ok(args) => args,
                    Err(err) => {
                        return Some(Outcome::Failure {
                            command: Some(id),
                            error: err.into(),
                        })
                    }
                }
            }
            None => {
                return Some(Outcome::Failure {
                    command: None,
                    error: ShellError::UnknownCommand {
                        name: tokens[0].to_string(),
                    }
                    .into(),
                })
            }
        };

        Some(match self.invoke(id, args) {
            Ok(value) => Outcome::Value { command: id, value },
            Err(error) => Outcome::Failure {
                command: Some(id),
                error,
            },
        })
    }

    /// Call the handler with bound arguments and an explicit context
    fn invoke(&mut self, id: CmdId, args: crate::cmd::Args) -> Result<Option<Value>> {
        let ignore_case = self.registry.ignore_case();
        let (sigs, handlers) = self.registry.parts();
        let Some(handler) = handlers.get_mut(id.0).and_then(Option::as_mut) else {
            miette::bail!("command slot {} has no handler", id.0);
        };

        let mut ctx = Context {
            env: &mut self.env,
            sigs,
            current: id,
            ignore_case,
            title: &mut self.title,
            stopped: &mut self.stopped,
        };
        handler(args, &mut ctx)
    }
}

/// Explicit per-invocation context handed to every handler.
///
/// Grants access to the shared environment store, the invoked command's own
/// options map, the full command table (read-only), the session title, and
/// the stop directive.
pub struct Context<'a> {
    /// The shared environment store
    pub env: &'a mut EnvStore,
    sigs: &'a mut [Option<Signature>],
    current: CmdId,
    ignore_case: bool,
    title: &'a mut String,
    stopped: &'a mut bool,
}

impl Context<'_> {
    /// Metadata of the command being invoked
    pub fn signature(&self) -> &Signature {
        self.sigs[self.current.0]
            .as_ref()
            .expect("invoked command has a signature")
    }

    /// The invoked command's options map, mutable for this invocation and after
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.sigs[self.current.0]
            .as_mut()
            .expect("invoked command has a signature")
            .options
    }

    /// Every registered command, in registration order
    pub fn commands(&self) -> impl Iterator<Item = &Signature> {
        self.sigs.iter().filter_map(Option::as_ref)
    }

    /// Find a command by one of its display aliases
    pub fn find(&self, name: &str) -> Option<&Signature> {
        let wanted = self.fold(name);
        self.commands()
            .find(|sig| sig.aliases.iter().any(|alias| self.fold(alias) == wanted))
    }

    fn fold(&self, alias: &str) -> String {
        if self.ignore_case {
            alias.to_lowercase()
        } else {
            alias.to_string()
        }
    }

    pub fn title(&self) -> &str {
        self.title
    }

    /// Replace the session title shown in the prompt
    pub fn set_title(&mut self, title: impl Into<String>) {
        *self.title = title.into();
    }

    /// Issue the stop directive: the loop exits after rendering this outcome
    pub fn stop(&mut self) {
        *self.stopped = true;
    }
}
