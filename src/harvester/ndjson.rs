use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Serialize records as newline-delimited JSON: one object per line, no
/// enclosing array. Every record passes through a single null-normalization
/// step before writing, so the emitted text never contains `NaN`/`Infinity`
/// tokens regardless of what upstream columns held.
pub fn to_ndjson<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        let mut value = serde_json::to_value(record)?;
        normalize_nulls(&mut value);
        out.push_str(&serde_json::to_string(&value)?);
        out.push('\n');
    }
    Ok(out)
}

// Replace non-finite numbers with explicit nulls across the whole record.
fn normalize_nulls(value: &mut Value) {
    match value {
        Value::Number(number) => {
            if number.as_f64().is_some_and(|float| !float.is_finite()) {
                *value = Value::Null;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_nulls),
        Value::Object(fields) => fields.values_mut().for_each(normalize_nulls),
        _ => {}
    }
}
