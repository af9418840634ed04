//! Total extractors over loosely-typed JSON argument values.
//!
//! None of these fail: a value of the wrong shape yields the documented
//! default. Required fields are checked by the callers.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

pub fn as_string(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

pub fn as_bool(v: Option<&Value>) -> bool {
    matches!(v, Some(Value::Bool(true)))
}

/// Object contents, or an empty map for anything that is not an object.
pub fn as_mapping(v: Option<&Value>) -> HashMap<String, Value> {
    match v {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => HashMap::new(),
    }
}

/// Numeric value truncated toward zero; `default` otherwise.
pub fn as_int(v: Option<&Value>, default: i64) -> i64 {
    match v {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(default),
        _ => default,
    }
}

/// Numeric value read as whole milliseconds. Negative values clamp to zero.
pub fn as_int_milliseconds(v: Option<&Value>, default: Duration) -> Duration {
    match v {
        Some(Value::Number(_)) => {
            let ms = as_int(v, 0).max(0);
            Duration::from_millis(ms as u64)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shapes() -> Vec<Value> {
        vec![
            Value::Null,
            json!(0),
            json!(-3.5),
            json!("text"),
            json!(true),
            json!([1, "two"]),
            json!({"nested": {"deep": [null]}}),
        ]
    }

    #[test]
    fn string_coercion_is_total() {
        for v in shapes() {
            let out = as_string(Some(&v));
            if v.is_string() {
                assert_eq!(out, "text");
            } else {
                assert!(out.is_empty(), "{v} should coerce to empty string");
            }
        }
        assert_eq!(as_string(None), "");
    }

    #[test]
    fn bool_coercion_is_total() {
        for v in shapes() {
            assert_eq!(as_bool(Some(&v)), v == json!(true));
        }
        assert!(!as_bool(Some(&json!("true"))));
        assert!(!as_bool(None));
    }

    #[test]
    fn mapping_coercion_is_total() {
        for v in shapes() {
            let out = as_mapping(Some(&v));
            if v.is_object() {
                assert_eq!(out.get("nested"), Some(&json!({"deep": [null]})));
            } else {
                assert!(out.is_empty());
            }
        }
        assert!(as_mapping(None).is_empty());
    }

    #[test]
    fn milliseconds_truncate_toward_zero() {
        let default = Duration::from_millis(30_000);
        assert_eq!(as_int_milliseconds(None, default), default);
        assert_eq!(as_int_milliseconds(Some(&json!(5000)), default), Duration::from_millis(5000));
        assert_eq!(as_int_milliseconds(Some(&json!(5000.7)), default), Duration::from_millis(5000));
        assert_eq!(as_int_milliseconds(Some(&json!("5000")), default), default);
        assert_eq!(as_int_milliseconds(Some(&json!(-10)), default), Duration::ZERO);
    }

    #[test]
    fn int_coercion_truncates_floats() {
        assert_eq!(as_int(Some(&json!(7.9)), 10), 7);
        assert_eq!(as_int(Some(&json!(-7.9)), 10), -7);
        assert_eq!(as_int(Some(&Value::Null), 10), 10);
    }
}
