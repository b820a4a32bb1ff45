//! Scalar coercion contract and the standard rule set.

use crate::coerce::ScalarCoercionError;
use crate::model::descriptor::PrimitiveKind;
use crate::model::value::{format_float, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d+$").expect("valid integer regex"));
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?$").expect("valid numeric regex")
});

const TRUE_STRINGS: &[&str] = &["1", "on", "t", "true", "y", "yes"];
const FALSE_STRINGS: &[&str] = &["0", "off", "f", "false", "n", "no"];

/// Converts one raw scalar into a primitive kind.
///
/// Implementations must be pure: the same input always yields the same
/// result, and they are shared across threads.
pub trait ScalarCoercer: Send + Sync {
    fn coerce_scalar(&self, raw: &Value, kind: PrimitiveKind) -> Result<Value, ScalarCoercionError>;
}

/// Default rules for string/number/boolean conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScalarCoercer;

impl ScalarCoercer for StandardScalarCoercer {
    fn coerce_scalar(&self, raw: &Value, kind: PrimitiveKind) -> Result<Value, ScalarCoercionError> {
        let coerced = match kind {
            PrimitiveKind::Object => Some(raw.clone()),
            PrimitiveKind::String => to_string(raw),
            PrimitiveKind::Symbol => raw.as_name().map(Value::symbol),
            PrimitiveKind::Integer => to_integer(raw),
            PrimitiveKind::Float => to_float(raw),
            PrimitiveKind::Boolean => to_boolean(raw),
        };
        coerced.ok_or_else(|| ScalarCoercionError::new(raw.clone(), kind))
    }
}

fn to_string(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(value) | Value::Symbol(value) => Some(Value::string(value.as_str())),
        Value::Integer(value) => Some(Value::string(value.to_string())),
        Value::Float(value) => Some(Value::string(format_float(*value))),
        Value::Boolean(value) => Some(Value::string(value.to_string())),
        _ => None,
    }
}

fn to_integer(raw: &Value) -> Option<Value> {
    match raw {
        Value::Integer(value) => Some(Value::Integer(*value)),
        Value::Float(value) => truncate(*value).map(Value::Integer),
        Value::String(value) => {
            let text = value.trim();
            if INTEGER_RE.is_match(text) {
                text.parse::<i64>().ok().map(Value::Integer)
            } else if NUMERIC_RE.is_match(text) {
                text.parse::<f64>().ok().and_then(truncate).map(Value::Integer)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_float(raw: &Value) -> Option<Value> {
    match raw {
        Value::Float(value) => Some(Value::Float(*value)),
        Value::Integer(value) => Some(Value::Float(*value as f64)),
        Value::String(value) => {
            let text = value.trim();
            if NUMERIC_RE.is_match(text) {
                text.parse::<f64>().ok().map(Value::Float)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_boolean(raw: &Value) -> Option<Value> {
    match raw {
        Value::Boolean(value) => Some(Value::Boolean(*value)),
        Value::Integer(1) => Some(Value::Boolean(true)),
        Value::Integer(0) => Some(Value::Boolean(false)),
        Value::String(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            if TRUE_STRINGS.contains(&normalized.as_str()) {
                Some(Value::Boolean(true))
            } else if FALSE_STRINGS.contains(&normalized.as_str()) {
                Some(Value::Boolean(false))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn truncate(value: f64) -> Option<i64> {
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{ScalarCoercer, StandardScalarCoercer};
    use crate::model::descriptor::PrimitiveKind;
    use crate::model::value::Value;

    fn coerce(raw: Value, kind: PrimitiveKind) -> Option<Value> {
        StandardScalarCoercer.coerce_scalar(&raw, kind).ok()
    }

    #[test]
    fn integer_accepts_integral_and_numeric_strings() {
        assert_eq!(coerce(Value::from("42"), PrimitiveKind::Integer), Some(Value::Integer(42)));
        assert_eq!(coerce(Value::from(" -7 "), PrimitiveKind::Integer), Some(Value::Integer(-7)));
        assert_eq!(coerce(Value::from("2.9"), PrimitiveKind::Integer), Some(Value::Integer(2)));
        assert_eq!(coerce(Value::Float(-3.5), PrimitiveKind::Integer), Some(Value::Integer(-3)));
        assert_eq!(coerce(Value::from("bad"), PrimitiveKind::Integer), None);
        assert_eq!(coerce(Value::Boolean(true), PrimitiveKind::Integer), None);
    }

    #[test]
    fn integer_rejects_overflowing_strings() {
        assert_eq!(
            coerce(Value::from("99999999999999999999"), PrimitiveKind::Integer),
            None
        );
    }

    #[test]
    fn float_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce(Value::Integer(2), PrimitiveKind::Float), Some(Value::Float(2.0)));
        assert_eq!(coerce(Value::from(".5"), PrimitiveKind::Float), Some(Value::Float(0.5)));
        assert_eq!(coerce(Value::from("1e3"), PrimitiveKind::Float), Some(Value::Float(1000.0)));
        assert_eq!(coerce(Value::from("1,5"), PrimitiveKind::Float), None);
    }

    #[test]
    fn boolean_accepts_known_spellings() {
        assert_eq!(coerce(Value::from("YES"), PrimitiveKind::Boolean), Some(Value::Boolean(true)));
        assert_eq!(coerce(Value::from("off"), PrimitiveKind::Boolean), Some(Value::Boolean(false)));
        assert_eq!(coerce(Value::Integer(1), PrimitiveKind::Boolean), Some(Value::Boolean(true)));
        assert_eq!(coerce(Value::Integer(2), PrimitiveKind::Boolean), None);
        assert_eq!(coerce(Value::from("maybe"), PrimitiveKind::Boolean), None);
    }

    #[test]
    fn string_and_symbol_conversions() {
        assert_eq!(coerce(Value::symbol("one"), PrimitiveKind::String), Some(Value::from("one")));
        assert_eq!(coerce(Value::Float(1.0), PrimitiveKind::String), Some(Value::from("1.0")));
        assert_eq!(coerce(Value::from("one"), PrimitiveKind::Symbol), Some(Value::symbol("one")));
        assert_eq!(coerce(Value::Integer(1), PrimitiveKind::Symbol), None);
        assert_eq!(coerce(Value::array([]), PrimitiveKind::String), None);
    }

    #[test]
    fn object_is_identity() {
        let raw = Value::array([Value::Integer(1)]);
        assert_eq!(coerce(raw.clone(), PrimitiveKind::Object), Some(raw));
    }
}
