/*!
 * Serde utilities for loosely typed upstream payloads.
 *
 * The enrollment API is not consistent about scalar representations:
 * identifiers arrive as strings or integers, scores as numbers or numeric
 * strings, and batch memberships as either a single string or a list. These
 * helpers fold every variant into one Rust type at deserialization time.
 */

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize a required identifier that may be a string or a number.
///
/// # Usage with serde
///
/// ```rust
/// use serde::Deserialize;
/// use enrollment_core::utils::serde::deserialize_flexible_id;
///
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(deserialize_with = "deserialize_flexible_id")]
///     id: String,
/// }
///
/// let row: Row = serde_json::from_str(r#"{"id": 42}"#).unwrap();
/// assert_eq!(row.id, "42");
/// ```
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Value::deserialize(deserializer)?;
    let repr = format!("{value}");
    value_to_id(value)
        .ok_or_else(|| D::Error::custom(format!("Expected string or numeric id, found: {repr}")))
}

/// Deserialize an optional identifier that may be a string, a number, or null.
///
/// Empty strings are treated as missing.
pub fn deserialize_optional_flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(value_to_id))
}

/// Deserialize an optional score that may be represented as a number or string.
///
/// ```json
/// "score": 85        // Direct number
/// "score": "85.5"    // String that parses to a number
/// "score": null      // Returns None
/// ```
pub fn deserialize_optional_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("Invalid numeric value: {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("Cannot parse '{s}' as numeric"))),
        Some(other) => Err(D::Error::custom(format!(
            "Expected numeric value, found: {other:?}"
        ))),
    }
}

/// Deserialize an optional boolean that may arrive as `true`, `"true"`, `1`, or `"yes"`.
pub fn deserialize_optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            "" => Ok(None),
            other => Err(D::Error::custom(format!("Cannot parse '{other}' as boolean"))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "Expected boolean value, found: {other:?}"
        ))),
    }
}

/// Deserialize a list of strings that may also arrive as a single string or null.
///
/// Numeric entries are stringified; blank entries are dropped.
pub fn deserialize_string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().filter_map(value_to_id).collect(),
        Some(other) => value_to_id(other).into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "deserialize_flexible_id")]
        id: String,
        #[serde(default, deserialize_with = "deserialize_optional_score")]
        score: Option<f64>,
        #[serde(default, deserialize_with = "deserialize_optional_flag")]
        passed: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_string_or_seq")]
        batches: Vec<String>,
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let probe: Probe = serde_json::from_str(r#"{"id": 17}"#).unwrap();
        assert_eq!(probe.id, "17");
        assert_eq!(probe.score, None);
        assert_eq!(probe.passed, None);
        assert!(probe.batches.is_empty());
    }

    #[test]
    fn test_score_accepts_strings_and_numbers() {
        let probe: Probe = serde_json::from_str(r#"{"id": "a", "score": "72.5"}"#).unwrap();
        assert_eq!(probe.score, Some(72.5));

        let probe: Probe = serde_json::from_str(r#"{"id": "a", "score": 90}"#).unwrap();
        assert_eq!(probe.score, Some(90.0));

        assert!(serde_json::from_str::<Probe>(r#"{"id": "a", "score": "abc"}"#).is_err());
    }

    #[test]
    fn test_flag_variants() {
        let probe: Probe = serde_json::from_str(r#"{"id": "a", "passed": "yes"}"#).unwrap();
        assert_eq!(probe.passed, Some(true));

        let probe: Probe = serde_json::from_str(r#"{"id": "a", "passed": 0}"#).unwrap();
        assert_eq!(probe.passed, Some(false));
    }

    #[test]
    fn test_batches_single_string_or_list() {
        let probe: Probe = serde_json::from_str(r#"{"id": "a", "batches": "B-2024"}"#).unwrap();
        assert_eq!(probe.batches, vec!["B-2024"]);

        let probe: Probe =
            serde_json::from_str(r#"{"id": "a", "batches": ["B-1", "", 2025]}"#).unwrap();
        assert_eq!(probe.batches, vec!["B-1", "2025"]);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": null}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"id": "  "}"#).is_err());
    }
}
