// Loose spreadsheet rows - the single untyped boundary of the domain
use serde_json::{Map, Value};

/// One row exactly as the sheet proxy delivered it
pub type Row = Map<String, Value>;

/// Whether a raw value counts as "present" for alias resolution.
/// Blank strings, zero, false and null are treated as absent.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present value among `aliases`, in priority order
pub fn first_present<'a>(row: &'a Row, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| is_present(value))
}

/// Render a scalar as display text. Integral numbers drop the trailing ".0".
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        other => other.to_string(),
    }
}

/// Text of the first present alias, or `default` when none is present
pub fn text_field(row: &Row, aliases: &[&str], default: &str) -> String {
    first_present(row, aliases)
        .map(value_to_text)
        .unwrap_or_else(|| default.to_string())
}

/// Permissive numeric coercion. Total over arbitrary JSON: anything that
/// is not a finite number ends up as 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Some(Value::Bool(true)) => Some(1.0),
        _ => None,
    };

    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Coerce the first alias that exists in the row (present or not)
pub fn number_field(row: &Row, aliases: &[&str]) -> f64 {
    let value = aliases.iter().find_map(|alias| row.get(*alias));
    coerce_number(value)
}
