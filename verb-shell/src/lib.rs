//! Verb Shell - an embeddable interactive command shell engine
//!
//! This library provides the command registry (flat aliases and two-level
//! verb/noun commands), typed argument binding with pluggable token
//! coercion, and the read-dispatch-render loop that drives a session.

pub mod cmd;
pub mod data;
pub mod error;
pub mod render;
pub mod repl;
pub mod shell;
pub mod term;

pub use cmd::registry::CmdId;
pub use cmd::{Args, Command, Param, ParamKind, ParamType, Signature};
pub use data::Value;
pub use error::ShellError;
pub use repl::Repl;
pub use shell::{Context, Outcome, Shell};
