//! Type coercion registry
//!
//! Maps a declared parameter type to a parser from raw text to a typed
//! [`Value`]. Seeded with defaults for the primitive types; caller
//! registration overwrites, which is how a custom parser replaces a builtin.
//! The registry is never mutated once the session starts.

use std::collections::HashMap;

use crate::cmd::ParamType;
use crate::data::Value;

/// A parser from a raw token to a typed value, or a failure message
pub type Parser = Box<dyn Fn(&str) -> Result<Value, String>>;

/// Registry of per-type token parsers
pub struct Coercions {
    parsers: HashMap<ParamType, Parser>,
}

impl Coercions {
    /// A registry seeded with parsers for `Str`, `Int`, `Float`, and `Bool`
    pub fn with_defaults() -> Self {
        let mut coercions = Self {
            parsers: HashMap::new(),
        };
        coercions.register(ParamType::Str, |text| Ok(Value::Str(text.to_string())));
        coercions.register(ParamType::Int, |text| {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|e| e.to_string())
        });
        coercions.register(ParamType::Float, |text| {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|e| e.to_string())
        });
        coercions.register(ParamType::Bool, |text| {
            text.parse::<bool>()
                .map(Value::Bool)
                .map_err(|e| e.to_string())
        });
        coercions
    }

    /// Register a parser for a type; the last registration wins
    pub fn register(
        &mut self,
        ty: ParamType,
        parser: impl Fn(&str) -> Result<Value, String> + 'static,
    ) {
        self.parsers.insert(ty, Box::new(parser));
    }

    /// Whether a parser is registered for the type
    pub fn resolves(&self, ty: &ParamType) -> bool {
        self.parsers.contains_key(ty)
    }

    /// Run the registered parser for the type on the text
    pub fn coerce(&self, ty: &ParamType, text: &str) -> Result<Value, String> {
        match self.parsers.get(ty) {
            Some(parser) => parser(text),
            None => Err(format!("no parser registered for type `{}`", ty)),
        }
    }
}

impl Default for Coercions {
    fn default() -> Self {
        Self::with_defaults()
    }
}
