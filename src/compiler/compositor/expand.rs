//! `@foreach(<count>, <var>)` unrolling.
//!
//! The block under a `@foreach` key is copied `<count>` times with `${<var>}` replaced by
//! the iteration index in every key and string value, then expanded again so nested
//! loops unroll too. The result is one flat, ordered list of entries.

use serde_json::{Map, Value};

use crate::foundation::error::{ForgeError, ForgeResult};

const FOREACH_PREFIX: &str = "@foreach(";

/// Upper bound on one loop; keeps a typo from unrolling into millions of passes.
pub(crate) const MAXIMUM_FOREACH_COUNT: u32 = 1024;

/// Parse `@foreach(<count>, <var>)`; `None` when `key` is an ordinary key.
pub(crate) fn parse_foreach(key: &str) -> ForgeResult<Option<(u32, &str)>> {
    let Some(rest) = key.strip_prefix(FOREACH_PREFIX) else {
        return Ok(None);
    };
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| ForgeError::malformed(format!("'{key}': missing closing parenthesis")))?;
    let (count, var) = inner
        .split_once(',')
        .ok_or_else(|| ForgeError::malformed(format!("'{key}': expected @foreach(<count>, <var>)")))?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| ForgeError::malformed(format!("'{key}': invalid loop count '{}'", count.trim())))?;
    if count > MAXIMUM_FOREACH_COUNT {
        return Err(ForgeError::policy(format!(
            "'{key}': loop count {count} exceeds {MAXIMUM_FOREACH_COUNT}"
        )));
    }
    let var = var.trim();
    if var.is_empty() {
        return Err(ForgeError::malformed(format!("'{key}': empty loop variable")));
    }
    Ok(Some((count, var)))
}

fn substitute(value: &Value, pattern: &str, index: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(pattern, index)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute(v, pattern, index))
                .collect(),
        ),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.replace(pattern, index), substitute(v, pattern, index)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn expand_into(obj: &Map<String, Value>, out: &mut Vec<(String, Value)>) -> ForgeResult<()> {
    for (key, value) in obj {
        let Some((count, var)) = parse_foreach(key)? else {
            out.push((key.clone(), value.clone()));
            continue;
        };
        let block = value
            .as_object()
            .ok_or_else(|| ForgeError::malformed(format!("'{key}': loop body must be an object")))?;
        let pattern = format!("${{{var}}}");
        for i in 0..count {
            let index = i.to_string();
            let block = block
                .iter()
                .map(|(k, v)| (k.replace(&pattern, &index), substitute(v, &pattern, &index)))
                .collect::<Map<_, _>>();
            expand_into(&block, out)?;
        }
    }
    Ok(())
}

/// Unroll every `@foreach` in `obj`, keeping declaration order.
pub(crate) fn expand_entries(obj: &Map<String, Value>) -> ForgeResult<Vec<(String, Value)>> {
    let mut out = Vec::with_capacity(obj.len());
    expand_into(obj, &mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../../tests/unit/compiler/compositor/expand.rs"]
mod tests;
