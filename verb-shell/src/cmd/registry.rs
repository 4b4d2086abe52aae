//! Command registry
//!
//! Holds flat commands (one or more aliases each) and grouped verb/noun
//! commands (two-token aliases). Registration validates eagerly so a
//! malformed command set is rejected before the session starts; resolution
//! consumes the minimum leading tokens that identify exactly one command.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::cmd::coerce::Coercions;
use crate::cmd::{Command, Handler, ParamKind, Signature};
use crate::error::ShellError;

/// Stable identifier of a registered command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdId(pub(crate) usize);

struct VerbEntry {
    /// Display name as registered (alias matching uses the folded key)
    name: String,
    nouns: IndexMap<String, CmdId>,
}

/// The command table: flat aliases plus verb/noun groups
pub struct Registry {
    sigs: Vec<Option<Signature>>,
    handlers: Vec<Option<Handler>>,
    aliases: HashMap<String, CmdId>,
    verbs: IndexMap<String, VerbEntry>,
    ignore_case: bool,
}

impl Registry {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            sigs: Vec::new(),
            handlers: Vec::new(),
            aliases: HashMap::new(),
            verbs: IndexMap::new(),
            ignore_case,
        }
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    fn fold(&self, alias: &str) -> String {
        if self.ignore_case {
            alias.to_lowercase()
        } else {
            alias.to_string()
        }
    }

    /// Register a flat command
    pub fn register(&mut self, command: Command, coercions: &Coercions) -> Result<CmdId, ShellError> {
        let (sig, handler) = self.check(command, coercions)?;

        let mut folded = Vec::with_capacity(sig.aliases.len());
        for alias in &sig.aliases {
            let key = self.fold(alias);
            if self.aliases.contains_key(&key)
                || self.verbs.contains_key(&key)
                || folded.contains(&key)
            {
                return Err(ShellError::DuplicateAlias {
                    alias: alias.clone(),
                });
            }
            folded.push(key);
        }

        let id = CmdId(self.sigs.len());
        for key in folded {
            self.aliases.insert(key, id);
        }
        debug!(command = %sig.name(), "registered command");
        self.sigs.push(Some(sig));
        self.handlers.push(Some(handler));
        Ok(id)
    }

    /// Register a verb namespace
    pub fn register_verb(&mut self, name: &str) -> Result<(), ShellError> {
        let key = self.fold(name);
        if self.aliases.contains_key(&key) || self.verbs.contains_key(&key) {
            return Err(ShellError::DuplicateAlias {
                alias: name.to_string(),
            });
        }
        self.verbs.insert(
            key,
            VerbEntry {
                name: name.to_string(),
                nouns: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Register a noun under a verb, composing the two-token alias
    pub fn register_noun(
        &mut self,
        verb: &str,
        command: Command,
        coercions: &Coercions,
    ) -> Result<CmdId, ShellError> {
        let (mut sig, handler) = self.check(command, coercions)?;

        let verb_key = self.fold(verb);
        if !self.verbs.contains_key(&verb_key) {
            return Err(ShellError::InvalidSignature {
                command: sig.name().to_string(),
                reason: format!("verb `{}` is not registered", verb),
            });
        }

        let mut folded = Vec::with_capacity(sig.aliases.len());
        for alias in &sig.aliases {
            let key = self.fold(alias);
            let entry = &self.verbs[&verb_key];
            if entry.nouns.contains_key(&key) || folded.contains(&key) {
                return Err(ShellError::DuplicateAlias {
                    alias: format!("{} {}", entry.name, alias),
                });
            }
            folded.push(key);
        }

        // Display aliases become the composite form
        let verb_name = self.verbs[&verb_key].name.clone();
        sig.aliases = sig
            .aliases
            .iter()
            .map(|alias| format!("{} {}", verb_name, alias))
            .collect();

        let id = CmdId(self.sigs.len());
        let entry = &mut self.verbs[&verb_key];
        for key in folded {
            entry.nouns.insert(key, id);
        }
        debug!(command = %sig.name(), "registered command");
        self.sigs.push(Some(sig));
        self.handlers.push(Some(handler));
        Ok(id)
    }

    /// Remove a verb and every noun command registered under it
    pub fn remove_verb(&mut self, name: &str) -> bool {
        let key = self.fold(name);
        match self.verbs.shift_remove(&key) {
            Some(entry) => {
                for (_, id) in entry.nouns {
                    self.sigs[id.0] = None;
                    self.handlers[id.0] = None;
                }
                true
            }
            None => false,
        }
    }

    /// Resolve the leading tokens to a command, returning the remainder
    pub fn resolve<'t>(&self, tokens: &'t [&'t str]) -> Result<(CmdId, &'t [&'t str]), ShellError> {
        let Some(first) = tokens.first() else {
            return Err(ShellError::UnknownCommand {
                name: String::new(),
            });
        };

        let head = self.fold(first);
        if let Some(&id) = self.aliases.get(&head) {
            return Ok((id, &tokens[1..]));
        }

        if let Some(entry) = self.verbs.get(&head) {
            if let Some(second) = tokens.get(1) {
                if let Some(&id) = entry.nouns.get(&self.fold(second)) {
                    return Ok((id, &tokens[2..]));
                }
                return Err(ShellError::UnknownCommand {
                    name: format!("{} {}", first, second),
                });
            }
            return Err(ShellError::UnknownCommand {
                name: first.to_string(),
            });
        }

        Err(ShellError::UnknownCommand {
            name: first.to_string(),
        })
    }

    /// Metadata of a registered command
    pub fn signature(&self, id: CmdId) -> Option<&Signature> {
        self.sigs.get(id.0).and_then(Option::as_ref)
    }

    /// All registered commands, in registration order
    pub fn commands(&self) -> impl Iterator<Item = &Signature> {
        self.sigs.iter().filter_map(Option::as_ref)
    }

    /// Split borrows for dispatch: metadata table and handler table
    pub(crate) fn parts(&mut self) -> (&mut [Option<Signature>], &mut [Option<Handler>]) {
        (&mut self.sigs, &mut self.handlers)
    }

    /// Validate a command before any table is touched
    fn check(
        &self,
        command: Command,
        coercions: &Coercions,
    ) -> Result<(Signature, Handler), ShellError> {
        let Command { sig, handler } = command;

        let handler = handler.ok_or_else(|| ShellError::InvalidSignature {
            command: sig.name().to_string(),
            reason: "no handler attached".to_string(),
        })?;

        let invalid = |reason: &str| ShellError::InvalidSignature {
            command: sig.name().to_string(),
            reason: reason.to_string(),
        };

        let mut seen_optional = false;
        let mut seen_variadic = false;
        let mut seen_keywords = false;
        for param in &sig.params {
            if seen_keywords {
                return Err(invalid("keyword capture must be the last parameter"));
            }
            match &param.kind {
                ParamKind::Required => {
                    if seen_optional || seen_variadic {
                        return Err(invalid(
                            "required parameters must precede optional and trailing ones",
                        ));
                    }
                }
                ParamKind::Optional(_) => {
                    if seen_variadic {
                        return Err(invalid("optional parameters must precede variadic capture"));
                    }
                    seen_optional = true;
                }
                ParamKind::Variadic => {
                    if seen_variadic {
                        return Err(invalid("at most one variadic parameter is allowed"));
                    }
                    seen_variadic = true;
                }
                ParamKind::Keywords => seen_keywords = true,
            }

            // Trailing capture takes bare strings; only consumed tokens need a parser
            let needs_parser =
                matches!(param.kind, ParamKind::Required | ParamKind::Optional(_));
            if needs_parser && !coercions.resolves(&param.ty) {
                return Err(ShellError::UnresolvedType {
                    command: sig.name().to_string(),
                    ty: param.ty.clone(),
                });
            }
        }

        Ok((sig, handler))
    }
}
