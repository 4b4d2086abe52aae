//! The shell's failure taxonomy.
//!
//! Registration-time kinds (`DuplicateAlias`, `UnresolvedType`, `InvalidSignature`)
//! are fatal at startup; every other kind is caught by the loop and rendered.

use miette::Diagnostic;
use thiserror::Error;

use crate::cmd::ParamType;

/// Every failure the dispatch pipeline can produce or recognize
#[derive(Debug, Error, Diagnostic)]
pub enum ShellError {
    /// The leading input token (or verb/noun pair) matched no command
    #[error("unknown command `{name}`")]
    UnknownCommand { name: String },

    /// A registered alias, verb, or noun was reused
    #[error("duplicate command alias `{alias}`")]
    DuplicateAlias { alias: String },

    /// A parameter declares a type with no registered parser
    #[error("command `{command}`: no parser registered for type `{ty}`")]
    UnresolvedType { command: String, ty: ParamType },

    /// A parameter signature violates the declaration rules
    #[error("command `{command}`: invalid signature: {reason}")]
    InvalidSignature { command: String, reason: String },

    /// Input ran out before a required parameter was bound
    #[error("missing required argument `{param}`")]
    MissingArgument { param: String },

    /// A token remained that no parameter could claim
    #[error("unexpected argument `{token}`")]
    UnexpectedArgument { token: String },

    /// A token could not be coerced to its parameter's declared type
    #[error("argument `{param}`: cannot parse `{token}` as `{ty}`: {reason}")]
    ArgumentType {
        param: String,
        token: String,
        ty: ParamType,
        reason: String,
    },

    /// A failure raised inside a handler body, optionally chaining its cause
    #[error("{message}")]
    Handler {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ShellError {
    /// A handler failure with a descriptive message
    pub fn handler(message: impl Into<String>) -> Self {
        ShellError::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// A handler failure chaining an underlying cause
    pub fn handler_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ShellError::Handler {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }
}
