//! Small helpers over `serde_json::Value` shared by every asset compiler.
//!
//! Source documents are loosely typed (numbers are often written as strings, booleans as
//! `"TRUE"`/`"FALSE"`), so compilers walk `Value` trees instead of deriving everything.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::foundation::error::{ForgeError, ForgeResult};

/// Read and parse a JSON file, reporting the line/column of syntax errors.
pub(crate) fn read_json(path: &Path) -> ForgeResult<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read json '{}'", path.display()))?;
    parse_json_str(&text, path)
}

pub(crate) fn parse_json_str(text: &str, path: &Path) -> ForgeResult<Value> {
    serde_json::from_str(text).map_err(|e| json_error(path, &e))
}

/// Read a JSON file straight into a typed model.
pub(crate) fn read_json_as<T: DeserializeOwned>(path: &Path) -> ForgeResult<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read json '{}'", path.display()))?;
    serde_json::from_str(&text).map_err(|e| json_error(path, &e))
}

fn json_error(path: &Path, e: &serde_json::Error) -> ForgeError {
    ForgeError::malformed(format!(
        "{}:{}:{}: {e}",
        path.display(),
        e.line(),
        e.column()
    ))
}

/// Validate the `{"Format": {"Type", "Version"}}` header every source document carries.
pub(crate) fn check_format(doc: &Value, format_type: &str, format_version: u32) -> ForgeResult<()> {
    let format = mandatory(doc, "Format", "document")?;
    let ty = mandatory_str(format, "Type", "Format")?;
    if ty != format_type {
        return Err(ForgeError::malformed(format!(
            "invalid format type '{ty}', expected '{format_type}'"
        )));
    }
    let version = mandatory_u32(format, "Version", "Format")?;
    if version != format_version {
        return Err(ForgeError::malformed(format!(
            "invalid format version {version} for '{format_type}', expected {format_version}"
        )));
    }
    Ok(())
}

pub(crate) fn mandatory<'a>(obj: &'a Value, key: &str, ctx: &str) -> ForgeResult<&'a Value> {
    obj.get(key)
        .ok_or_else(|| ForgeError::malformed(format!("missing mandatory member '{key}' in {ctx}")))
}

pub(crate) fn optional_object<'a>(
    obj: &'a Value,
    key: &str,
    ctx: &str,
) -> ForgeResult<Option<&'a Map<String, Value>>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v.as_object().map(Some).ok_or_else(|| {
            ForgeError::malformed(format!("member '{key}' in {ctx} must be an object"))
        }),
    }
}

pub(crate) fn mandatory_str<'a>(obj: &'a Value, key: &str, ctx: &str) -> ForgeResult<&'a str> {
    mandatory(obj, key, ctx)?
        .as_str()
        .ok_or_else(|| ForgeError::malformed(format!("member '{key}' in {ctx} must be a string")))
}

pub(crate) fn optional_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Integers may be written as JSON numbers or decimal strings.
pub(crate) fn as_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn mandatory_u32(obj: &Value, key: &str, ctx: &str) -> ForgeResult<u32> {
    let v = mandatory(obj, key, ctx)?;
    as_u32(v).ok_or_else(|| {
        ForgeError::malformed(format!("member '{key}' in {ctx} must be an unsigned integer"))
    })
}

pub(crate) fn optional_u32(obj: &Value, key: &str, ctx: &str) -> ForgeResult<Option<u32>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => as_u32(v).map(Some).ok_or_else(|| {
            ForgeError::malformed(format!("member '{key}' in {ctx} must be an unsigned integer"))
        }),
    }
}

pub(crate) fn optional_f32(obj: &Value, key: &str, ctx: &str) -> ForgeResult<Option<f32>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64().map(|f| f as f32)),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| {
            ForgeError::malformed(format!("member '{key}' in {ctx} must be a float"))
        }),
        Some(_) => Err(ForgeError::malformed(format!(
            "member '{key}' in {ctx} must be a float"
        ))),
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "TRUE" | "true" => Some(true),
        "FALSE" | "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn optional_bool(obj: &Value, key: &str, ctx: &str) -> ForgeResult<Option<bool>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => parse_bool(s).map(Some).ok_or_else(|| {
            ForgeError::malformed(format!(
                "member '{key}' in {ctx} must be TRUE or FALSE, got '{s}'"
            ))
        }),
        Some(_) => Err(ForgeError::malformed(format!(
            "member '{key}' in {ctx} must be a boolean"
        ))),
    }
}

/// Parse `n` whitespace-separated float components (`"1.0 0.5 0.25"`).
pub(crate) fn float_components<const N: usize>(s: &str, ctx: &str) -> ForgeResult<[f32; N]> {
    let mut out = [0.0f32; N];
    let mut it = s.split_whitespace();
    for slot in &mut out {
        let part = it.next().ok_or_else(|| {
            ForgeError::malformed(format!("{ctx}: expected {N} components in '{s}'"))
        })?;
        *slot = part
            .parse()
            .map_err(|_| ForgeError::malformed(format!("{ctx}: invalid float '{part}'")))?;
    }
    if it.next().is_some() {
        return Err(ForgeError::malformed(format!(
            "{ctx}: expected {N} components in '{s}'"
        )));
    }
    Ok(out)
}

pub(crate) fn int_components<const N: usize>(s: &str, ctx: &str) -> ForgeResult<[i32; N]> {
    let mut out = [0i32; N];
    let mut it = s.split_whitespace();
    for slot in &mut out {
        let part = it.next().ok_or_else(|| {
            ForgeError::malformed(format!("{ctx}: expected {N} components in '{s}'"))
        })?;
        *slot = part
            .parse()
            .map_err(|_| ForgeError::malformed(format!("{ctx}: invalid integer '{part}'")))?;
    }
    if it.next().is_some() {
        return Err(ForgeError::malformed(format!(
            "{ctx}: expected {N} components in '{s}'"
        )));
    }
    Ok(out)
}

/// Read an optional float vector given either as a JSON array or a component string.
pub(crate) fn optional_floats<const N: usize>(
    obj: &Value,
    key: &str,
    ctx: &str,
) -> ForgeResult<Option<[f32; N]>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => float_components::<N>(s, &format!("{ctx}.{key}")).map(Some),
        Some(Value::Array(items)) if items.len() == N => {
            let mut out = [0.0f32; N];
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = item.as_f64().ok_or_else(|| {
                    ForgeError::malformed(format!("{ctx}.{key}: array items must be numbers"))
                })? as f32;
            }
            Ok(Some(out))
        }
        Some(_) => Err(ForgeError::malformed(format!(
            "{ctx}.{key}: expected {N} float components"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/json.rs"]
mod tests;
