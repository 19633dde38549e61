//! Deserializers tolerant of loosely typed remote data.
//!
//! The store is schemaless: a balance written by one client as `"100"` may be
//! written by another as `100`. These helpers accept both.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, number or boolean and render it as a string. `null` or a
/// missing field become the empty string.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}

/// Accept a number or a numeric string; anything else is treated as absent.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::string")]
        s: String,
        #[serde(default, deserialize_with = "super::number")]
        n: Option<f64>,
    }

    #[test]
    fn numbers_become_strings() {
        let p: Probe = serde_json::from_value(json!({ "s": 100, "n": "16" })).unwrap();
        assert_eq!(p.s, "100");
        assert_eq!(p.n, Some(16.0));
    }

    #[test]
    fn missing_and_null_fields() {
        let p: Probe = serde_json::from_value(json!({ "s": null })).unwrap();
        assert_eq!(p.s, "");
        assert_eq!(p.n, None);
    }

    #[test]
    fn garbage_number_is_absent() {
        let p: Probe = serde_json::from_value(json!({ "n": "wide" })).unwrap();
        assert_eq!(p.n, None);
    }
}
