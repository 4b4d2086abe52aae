//! Command model
//!
//! A [`Command`] couples one or more aliases with a typed parameter signature,
//! a display options map, and a handler. Registration and resolution live in
//! [`registry`], token-to-value binding in [`bind`], and text-to-value
//! parsing in [`coerce`].

use indexmap::IndexMap;
use miette::Result;

use crate::data::Value;
use crate::shell::Context;

pub mod bind;
pub mod coerce;
pub mod registry;

/// Per-command display options, consulted only by renderers.
///
/// Recognized keys are `title`, `delimiter`, and `ignore-value`; handlers may
/// store arbitrary keys of their own.
pub type Options = IndexMap<String, Value>;

/// A command handler: bound arguments in, optional result value out
pub type Handler = Box<dyn FnMut(Args, &mut Context) -> Result<Option<Value>>>;

/// Declared type of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    /// A caller-defined type; a parser must be registered for it
    Custom(&'static str),
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Str => write!(f, "str"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Arity class of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Consumes exactly one token
    Required,
    /// Consumes one token if available, else binds the default verbatim
    Optional(Value),
    /// Trailing; collects all otherwise-unclaimed tokens as bare strings
    Variadic,
    /// Trailing; collects remaining `key=value` tokens into an object
    Keywords,
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub kind: ParamKind,
}

impl Param {
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::Required,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ParamType, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::Optional(default.into()),
        }
    }

    /// Variadic parameters take bare strings, so their type is fixed to `Str`
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Str,
            kind: ParamKind::Variadic,
        }
    }

    /// Keyword-capture parameters take bare strings, so their type is fixed to `Str`
    pub fn keywords(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Str,
            kind: ParamKind::Keywords,
        }
    }
}

/// Command metadata visible to renderers and to other handlers (via help)
#[derive(Debug, Clone)]
pub struct Signature {
    /// Invocation aliases; the first is the canonical display name
    pub aliases: Vec<String>,
    /// One-line description
    pub description: String,
    /// Declared parameters, in binding order
    pub params: Vec<Param>,
    /// Display options; handlers may mutate their own during an invocation
    pub options: Options,
}

impl Signature {
    /// The canonical display name (first alias)
    pub fn name(&self) -> &str {
        &self.aliases[0]
    }

    /// One-line usage: canonical name followed by its parameter shapes
    pub fn detail(&self) -> String {
        let mut out = self.name().to_string();
        for param in &self.params {
            out.push(' ');
            match &param.kind {
                ParamKind::Required => {
                    out.push_str(&format!("<{}:{}>", param.name, param.ty));
                }
                ParamKind::Optional(_) => {
                    out.push_str(&format!("[{}:{}]", param.name, param.ty));
                }
                ParamKind::Variadic => {
                    out.push_str(&format!("[{}...]", param.name));
                }
                ParamKind::Keywords => {
                    out.push_str("[key=value...]");
                }
            }
        }
        out
    }
}

/// A registrable command: metadata plus handler, assembled with a builder
///
/// ```
/// use verb_shell::Command;
///
/// let quit = Command::new("quit", "Exit the program")
///     .alias("exit")
///     .alias("q")
///     .option("ignore-value", true)
///     .handler(|_args, ctx| {
///         ctx.stop();
///         Ok(None)
///     });
/// ```
pub struct Command {
    pub(crate) sig: Signature,
    pub(crate) handler: Option<Handler>,
}

impl Command {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            sig: Signature {
                aliases: vec![name.into()],
                description: description.into(),
                params: Vec::new(),
                options: Options::new(),
            },
            handler: None,
        }
    }

    /// Add an invocation alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.sig.aliases.push(alias.into());
        self
    }

    /// Declare a required parameter
    pub fn required(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.sig.params.push(Param::required(name, ty));
        self
    }

    /// Declare an optional parameter with a default bound when no token remains
    pub fn optional(
        mut self,
        name: impl Into<String>,
        ty: ParamType,
        default: impl Into<Value>,
    ) -> Self {
        self.sig.params.push(Param::optional(name, ty, default));
        self
    }

    /// Declare a trailing variadic parameter
    pub fn variadic(mut self, name: impl Into<String>) -> Self {
        self.sig.params.push(Param::variadic(name));
        self
    }

    /// Declare a trailing keyword-capture parameter
    pub fn keywords(mut self, name: impl Into<String>) -> Self {
        self.sig.params.push(Param::keywords(name));
        self
    }

    /// Preset a display option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sig.options.insert(key.into(), value.into());
        self
    }

    /// Attach the handler invoked with the bound arguments
    pub fn handler(
        mut self,
        handler: impl FnMut(Args, &mut Context) -> Result<Option<Value>> + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }
}

/// The fully-bound argument list handed to a handler, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub(crate) fn new(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }

    /// Look up a bound value by parameter name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// A required string parameter's contents
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.get(name).and_then(Value::as_str) {
            Some(s) => Ok(s),
            None => miette::bail!("argument `{}` is not bound to a string", name),
        }
    }

    /// A required integer parameter's contents
    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.get(name).and_then(Value::as_int) {
            Some(n) => Ok(n),
            None => miette::bail!("argument `{}` is not bound to an integer", name),
        }
    }

    /// A required boolean parameter's contents
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get(name).and_then(Value::as_bool) {
            Some(b) => Ok(b),
            None => miette::bail!("argument `{}` is not bound to a boolean", name),
        }
    }

    /// A variadic parameter's captured values, empty when none were given
    pub fn rest(&self, name: &str) -> &[Value] {
        match self.get(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// A keyword-capture parameter's mapping, in encounter order
    pub fn keywords(&self, name: &str) -> Option<&IndexMap<String, Value>> {
        self.get(name).and_then(Value::as_obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_collects_aliases_and_options() {
        let cmd = Command::new("quit", "Exit the program")
            .alias("exit")
            .alias("q")
            .option("ignore-value", true);
        assert_eq!(cmd.sig.aliases, vec!["quit", "exit", "q"]);
        assert_eq!(cmd.sig.name(), "quit");
        assert_eq!(
            cmd.sig.options.get("ignore-value"),
            Some(&Value::Bool(true))
        );
        assert!(cmd.handler.is_none());
    }

    #[test]
    fn test_detail_renders_parameter_shapes() {
        let cmd = Command::new("echo", "Echo arguments")
            .required("string", ParamType::Str)
            .optional("second", ParamType::Str, Value::Nil)
            .optional("flat", ParamType::Bool, false)
            .variadic("args")
            .keywords("kwargs");
        assert_eq!(
            cmd.sig.detail(),
            "echo <string:str> [second:str] [flat:bool] [args...] [key=value...]"
        );
    }

    #[test]
    fn test_args_typed_accessors() {
        let args = Args::new(vec![
            ("name".to_string(), Value::from("ada")),
            ("age".to_string(), Value::Int(36)),
            ("flat".to_string(), Value::Bool(false)),
        ]);
        assert_eq!(args.get_str("name").unwrap(), "ada");
        assert_eq!(args.get_int("age").unwrap(), 36);
        assert!(!args.get_bool("flat").unwrap());
        assert!(args.get_str("age").is_err());
        assert!(args.get("missing").is_none());
    }

    #[test]
    fn test_args_rest_defaults_to_empty() {
        let args = Args::new(vec![("args".to_string(), Value::Nil)]);
        assert!(args.rest("args").is_empty());
        assert!(args.rest("other").is_empty());
    }
}
