//! The `{count, value}` wrapper returned by collection endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Keys accepted for the total count, compared case-insensitively.
const COUNT_KEYS: &[&str] = &["count", "@odata.count", "odata.count"];

/// Keys accepted for the row array, compared case-insensitively.
const VALUE_KEYS: &[&str] = &["value", "items"];

/// One page of a collection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope<T> {
    /// Total matching rows before paging, when the server reported it.
    #[serde(default)]
    pub count: Option<i64>,

    /// Rows of this page in server order.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

impl<T> QueryEnvelope<T> {
    /// Creates an envelope from parts.
    pub fn new(count: Option<i64>, value: Vec<T>) -> Self {
        Self { count, value }
    }

    /// Number of rows in this page.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns true when the page has no rows.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Maps every row, keeping the count.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryEnvelope<U> {
        QueryEnvelope {
            count: self.count,
            value: self.value.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for QueryEnvelope<T> {
    fn default() -> Self {
        Self {
            count: None,
            value: Vec::new(),
        }
    }
}

/// Decodes a response body into a typed envelope.
///
/// Keys are matched case-insensitively so both `{"Count":..,"Value":[..]}` and
/// `{"@odata.count":..,"value":[..]}` decode.
///
/// # Errors
///
/// Returns [`Error::DataParse`] with the raw body when the text is not JSON,
/// is not an object, has no row array, or a row does not match `T`.
/// Returns [`Error::DataReadEmpty`] when the count is missing or null.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<QueryEnvelope<T>> {
    let parse_error = |message: String| Error::DataParse {
        body: body.to_string(),
        message,
    };

    let root: Value = serde_json::from_str(body).map_err(|e| parse_error(e.to_string()))?;
    let Value::Object(mut object) = root else {
        return Err(parse_error("expected a JSON object".to_string()));
    };

    let count = match take_key(&mut object, COUNT_KEYS) {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let count = read_count(&raw);
            Some(count.ok_or_else(|| parse_error(format!("invalid count: {raw}")))?)
        }
    };

    let rows = take_key(&mut object, VALUE_KEYS)
        .ok_or_else(|| parse_error("missing value array".to_string()))?;
    let value: Vec<T> = match rows {
        Value::Null => Vec::new(),
        rows => serde_json::from_value(rows).map_err(|e| parse_error(e.to_string()))?,
    };

    match count {
        Some(count) => Ok(QueryEnvelope {
            count: Some(count),
            value,
        }),
        None => Err(Error::DataReadEmpty),
    }
}

/// Removes the first entry whose key matches one of `names`, ignoring case.
fn take_key(object: &mut Map<String, Value>, names: &[&str]) -> Option<Value> {
    let key = names.iter().find_map(|name| {
        object
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    })?;
    object.remove(&key)
}

/// Counts may arrive as numbers or (for 64-bit safety) as numeric strings.
fn read_count(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn test_decode_pascal_case_envelope() {
        let body = r#"{"Count":2,"Value":[{"Name":"Ann","Age":30},{"Name":"Bob","Age":41}]}"#;
        let envelope: QueryEnvelope<User> = decode_envelope(body).unwrap();
        assert_eq!(envelope.count, Some(2));
        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.value[1].name, "Bob");
    }

    #[test]
    fn test_decode_web_casing_and_odata_count() {
        let body = r#"{"@odata.context":"$metadata#Users","@odata.count":7,"value":[]}"#;
        let envelope: QueryEnvelope<User> = decode_envelope(body).unwrap();
        assert_eq!(envelope.count, Some(7));
        assert!(envelope.is_empty());
    }

    #[test]
    fn test_string_count_is_accepted() {
        let body = r#"{"count":"12","value":[]}"#;
        let envelope: QueryEnvelope<User> = decode_envelope(body).unwrap();
        assert_eq!(envelope.count, Some(12));
    }

    #[test]
    fn test_missing_count_is_empty_error() {
        let body = r#"{"value":[]}"#;
        let result: Result<QueryEnvelope<User>> = decode_envelope(body);
        assert!(matches!(result, Err(Error::DataReadEmpty)));
    }

    #[test]
    fn test_null_count_is_empty_error() {
        let body = r#"{"Count":null,"Value":[]}"#;
        let result: Result<QueryEnvelope<User>> = decode_envelope(body);
        assert!(matches!(result, Err(Error::DataReadEmpty)));
    }

    #[test]
    fn test_missing_count_with_rows_is_empty_error() {
        let body = r#"{"value":[{"Name":"Ann","Age":30}]}"#;
        let result: Result<QueryEnvelope<User>> = decode_envelope(body);
        assert!(matches!(result, Err(Error::DataReadEmpty)));
    }

    #[test]
    fn test_invalid_json_carries_body() {
        let body = "<html>Gateway Timeout</html>";
        match decode_envelope::<User>(body) {
            Err(Error::DataParse { body: raw, .. }) => assert_eq!(raw, body),
            other => panic!("expected DataParse, got {other:?}"),
        }
    }

    #[test]
    fn test_row_shape_mismatch_is_parse_error() {
        let body = r#"{"Count":1,"Value":[{"Name":"Ann","Age":"old"}]}"#;
        assert!(matches!(
            decode_envelope::<User>(body),
            Err(Error::DataParse { .. })
        ));
    }

    #[test]
    fn test_non_object_root_is_parse_error() {
        assert!(matches!(
            decode_envelope::<User>("[1,2,3]"),
            Err(Error::DataParse { .. })
        ));
    }

    #[test]
    fn test_map_keeps_count() {
        let envelope = QueryEnvelope::new(Some(3), vec![1, 2, 3]).map(|n| n * 10);
        assert_eq!(envelope.count, Some(3));
        assert_eq!(envelope.value, vec![10, 20, 30]);
    }
}
