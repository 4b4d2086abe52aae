//! Argument binding
//!
//! Walks a command's declared parameters against the tokens left after
//! resolution and produces the typed argument list. Pure: no I/O and no
//! effects besides constructing the result.

use indexmap::IndexMap;

use crate::cmd::coerce::Coercions;
use crate::cmd::{Args, Param, ParamKind};
use crate::data::Value;
use crate::error::ShellError;

/// Bind `tokens` to `params`, coercing each consumed token to its
/// parameter's declared type.
///
/// Required parameters consume one token each; optional parameters consume a
/// token when one remains and otherwise bind their default verbatim. Surplus
/// tokens are split between a trailing keyword-capture parameter (tokens of
/// the form `key=value`, in encounter order) and a trailing variadic
/// parameter (everything else, as bare strings). Tokens left over with
/// neither trailing kind declared are an error.
pub fn bind(params: &[Param], tokens: &[&str], coercions: &Coercions) -> Result<Args, ShellError> {
    let mut entries = Vec::with_capacity(params.len());
    let mut cursor = 0usize;

    let mut variadic: Option<&Param> = None;
    let mut keywords: Option<&Param> = None;

    for param in params {
        match &param.kind {
            ParamKind::Required => {
                let token = tokens.get(cursor).ok_or_else(|| ShellError::MissingArgument {
                    param: param.name.clone(),
                })?;
                cursor += 1;
                entries.push((param.name.clone(), coerce(param, token, coercions)?));
            }
            ParamKind::Optional(default) => {
                let value = match tokens.get(cursor) {
                    Some(token) => {
                        cursor += 1;
                        coerce(param, token, coercions)?
                    }
                    None => default.clone(),
                };
                entries.push((param.name.clone(), value));
            }
            ParamKind::Variadic => variadic = Some(param),
            ParamKind::Keywords => keywords = Some(param),
        }
    }

    let mut rest = Vec::new();
    let mut pairs = IndexMap::new();

    for token in &tokens[cursor..] {
        match (keywords.is_some(), split_pair(token)) {
            (true, Some((key, value))) => {
                pairs.insert(key.to_string(), Value::Str(value.to_string()));
            }
            _ if variadic.is_some() => rest.push(Value::Str(token.to_string())),
            _ => {
                return Err(ShellError::UnexpectedArgument {
                    token: token.to_string(),
                })
            }
        }
    }

    if let Some(param) = variadic {
        entries.push((param.name.clone(), Value::Array(rest)));
    }
    if let Some(param) = keywords {
        entries.push((param.name.clone(), Value::Obj(pairs)));
    }

    Ok(Args::new(entries))
}

fn coerce(param: &Param, token: &str, coercions: &Coercions) -> Result<Value, ShellError> {
    coercions
        .coerce(&param.ty, token)
        .map_err(|reason| ShellError::ArgumentType {
            param: param.name.clone(),
            token: token.to_string(),
            ty: param.ty.clone(),
            reason,
        })
}

/// Split a `key=value` token; the key must be non-empty
fn split_pair(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}
