//! Low-level JSON node readers for mapping files.
//!
//! Every reader names what it expected and fails closed; the combinators
//! wrap failures into [`MappingError`]s carrying the running context chain,
//! so a failure deep inside a nested group is traceable to its exact spot
//! in the document.

use conduit_engine::ident::Identifier;
use serde_json::Value;
use thiserror::Error;

/// A structured mapping-file failure: the *task* that was being performed,
/// what went wrong, and the context chain (innermost first) locating the
/// offending node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("error while {task}: {message}{}", context_suffix(.context))]
pub struct MappingError {
    pub task: String,
    pub message: String,
    /// Innermost first.
    pub context: Vec<String>,
}

impl MappingError {
    pub fn new(task: impl Into<String>, message: impl Into<String>, context: &[String]) -> Self {
        Self {
            task: task.into(),
            message: message.into(),
            context: context.to_vec(),
        }
    }
}

fn context_suffix(context: &[String]) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" (at {})", context.join("; "))
    }
}

/// Extend a context chain inward: the new element is the innermost.
pub(crate) fn push_context(inner: impl Into<String>, outer: &[String]) -> Vec<String> {
    let mut chain = vec![inner.into()];
    chain.extend_from_slice(outer);
    chain
}

// ── Scalar readers ───────────────────────────────────────────────────────────
//
// Plain value -> Result<T, message>; the combinators below attach task and
// context. Numeric strings are accepted wherever hand-edited mapping files
// have historically used them.

pub(crate) fn int(node: &Value) -> Result<i64, String> {
    match node {
        Value::Number(n) => n.as_i64().ok_or_else(|| "expected node to be an integer".into()),
        Value::String(s) => s
            .parse()
            .map_err(|_| "expected node to be an integer".into()),
        _ => Err("expected node to be an integer".into()),
    }
}

pub(crate) fn int32(node: &Value) -> Result<i32, String> {
    i32::try_from(int(node)?).map_err(|_| "integer does not fit in 32 bits".into())
}

pub(crate) fn unsigned_int32(node: &Value) -> Result<u32, String> {
    u32::try_from(int(node)?).map_err(|_| "expected a non-negative 32-bit integer".into())
}

pub(crate) fn non_negative_int(node: &Value) -> Result<i64, String> {
    let value = int(node)?;
    if value < 0 {
        return Err("integer must be non-negative".into());
    }
    Ok(value)
}

/// A non-negative integer used as a list index.
pub(crate) fn index(node: &Value) -> Result<usize, String> {
    Ok(non_negative_int(node)? as usize)
}

pub(crate) fn double(node: &Value) -> Result<f64, String> {
    match node {
        Value::Number(n) => n.as_f64().ok_or_else(|| "expected node to be a number".into()),
        Value::String(s) => s.parse().map_err(|_| "expected node to be a number".into()),
        _ => Err("expected node to be a number".into()),
    }
}

pub(crate) fn boolean(node: &Value) -> Result<bool, String> {
    match node {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err("expected node to be a boolean".into()),
    }
}

pub(crate) fn string(node: &Value) -> Result<String, String> {
    match node {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err("expected node to be a string".into()),
    }
}

pub(crate) fn non_empty_string(node: &Value) -> Result<String, String> {
    let s = string(node)?;
    if s.is_empty() {
        return Err("string must not be empty".into());
    }
    Ok(s)
}

pub(crate) fn identifier(node: &Value) -> Result<Identifier, String> {
    let s = non_empty_string(node)?;
    Identifier::parse(&s).map_err(|e| e.to_string())
}

// ── Combinators ──────────────────────────────────────────────────────────────

/// Look up a key on an object node. `Ok(None)` when absent; an error when
/// the node is not an object at all.
pub(crate) fn field<'a>(
    node: &'a Value,
    key: &str,
    task: &str,
    context: &[String],
) -> Result<Option<&'a Value>, MappingError> {
    match node {
        Value::Object(map) => Ok(map.get(key)),
        _ => Err(MappingError::new(
            task,
            format!("expected an object (node was {node})"),
            context,
        )),
    }
}

/// Read a required key.
pub(crate) fn read_or_throw<T>(
    node: &Value,
    key: &str,
    reader: impl FnOnce(&Value) -> Result<T, String>,
    task: &str,
    context: &[String],
) -> Result<T, MappingError> {
    let Some(value) = field(node, key, task, context)? else {
        return Err(MappingError::new(task, format!("missing {key} key"), context));
    };
    reader(value)
        .map_err(|message| MappingError::new(task, format!("{message} (node was {value})"), context))
}

/// Read an optional key; absence yields `default`, a present-but-invalid
/// value is still an error.
pub(crate) fn read_or_default<T>(
    node: &Value,
    key: &str,
    reader: impl FnOnce(&Value) -> Result<T, String>,
    default: T,
    task: &str,
    context: &[String],
) -> Result<T, MappingError> {
    match read_if_present(node, key, reader, task, context)? {
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

/// Read an optional key as `Option`.
pub(crate) fn read_if_present<T>(
    node: &Value,
    key: &str,
    reader: impl FnOnce(&Value) -> Result<T, String>,
    task: &str,
    context: &[String],
) -> Result<Option<T>, MappingError> {
    let Some(value) = field(node, key, task, context)? else {
        return Ok(None);
    };
    reader(value)
        .map(Some)
        .map_err(|message| MappingError::new(task, format!("{message} (node was {value})"), context))
}

/// Read an optional array key, applying `reader` to every element.
pub(crate) fn read_array_if_present<T>(
    node: &Value,
    key: &str,
    reader: impl Fn(&Value) -> Result<T, String>,
    task: &str,
    context: &[String],
) -> Result<Option<Vec<T>>, MappingError> {
    let Some(value) = field(node, key, task, context)? else {
        return Ok(None);
    };
    let Value::Array(elements) = value else {
        return Err(MappingError::new(
            task,
            format!("expected {key} key to be an array (node was {value})"),
            context,
        ));
    };
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        out.push(reader(element).map_err(|message| {
            MappingError::new(task, format!("{message} (node was {element})"), context)
        })?);
    }
    Ok(Some(out))
}
