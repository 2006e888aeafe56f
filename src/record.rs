/*!
 * Row models for the shared objects table.
 *
 * The `value` column stores an arbitrary caller-defined JSON document as
 * text; its shape is never validated here. A SQL NULL round-trips as an
 * absent value.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::ClientResult;

/// A full row of the objects table. `id` and `created_at` are assigned by
/// the backend on first insert and survive later upserts of the same
/// `(project_id, key)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub project_id: String,
    pub key: String,
    pub value: Option<Value>,
}

impl ObjectRecord {
    pub fn from_row(row: &SqliteRow) -> ClientResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            project_id: row.try_get("project_id")?,
            key: row.try_get("key")?,
            value: decode_document(row.try_get::<Option<String>, _>("value")?)?,
        })
    }
}

/// A `{key, value}` pair as returned by prefix scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValueEntry {
    pub key: String,
    pub value: Option<Value>,
}

impl KeyValueEntry {
    pub fn from_row(row: &SqliteRow) -> ClientResult<Self> {
        Ok(Self {
            key: row.try_get("key")?,
            value: decode_document(row.try_get::<Option<String>, _>("value")?)?,
        })
    }
}

/// Decode the JSON text stored in the value column.
pub(crate) fn decode_document(text: Option<String>) -> ClientResult<Option<Value>> {
    match text {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encode a caller document for storage. A null payload becomes a SQL NULL
/// rather than the JSON text `null`.
pub(crate) fn encode_document(value: &Value) -> ClientResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        other => Ok(Value::String(serde_json::to_string(other)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_round_trip_through_text() {
        let cases = vec![
            json!({"name": "A", "age": 1}),
            json!([1, 2, 3]),
            json!("plain string"),
            json!(42),
            json!(true),
        ];

        for value in cases {
            let encoded = encode_document(&value).unwrap();
            let text = match encoded {
                Value::String(s) => Some(s),
                other => panic!("expected text encoding, got {other:?}"),
            };
            assert_eq!(decode_document(text).unwrap(), Some(value));
        }
    }

    #[test]
    fn null_document_becomes_sql_null() {
        assert_eq!(encode_document(&Value::Null).unwrap(), Value::Null);
        assert_eq!(decode_document(None).unwrap(), None);
    }
}
