//! DynamoDB table scans.
//!
//! Items are written as typed JSON, one object per line, in the same shape the
//! DynamoDB API uses: `{"id": {"S": "42"}, "total": {"N": "9.5"}}`. Binary
//! values are base64 encoded.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_smithy_types::{Blob, base64};
use cs_error::SourceError;
use cs_traits::{PageSource, SourceResult, TableCatalog};
use cs_types::{Page, PageCursor, Record};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

use super::error::classify_sdk_error;

/// Tables of one account and region.
#[derive(Clone)]
pub struct DynamoCatalog {
    client: Client,
}

impl DynamoCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl TableCatalog for DynamoCatalog {
    type Scan = TableScan;

    fn scan(&self, table: &str) -> TableScan {
        TableScan {
            client: self.client.clone(),
            table: table.to_string(),
        }
    }
}

/// Full scan of one table, paged by `LastEvaluatedKey`.
pub struct TableScan {
    client: Client,
    table: String,
}

#[async_trait]
impl PageSource for TableScan {
    type Item = Record;

    async fn fetch(&self, cursor: Option<&PageCursor>) -> SourceResult<Page<Record>> {
        let start_key = cursor.map(decode_key).transpose()?;

        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| classify_sdk_error("Scan", e))?;

        let items = output
            .items
            .unwrap_or_default()
            .iter()
            .map(|item| Record::structured(self.table.clone(), item_to_json(item)))
            .collect();

        let next = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(|key| encode_key(&key))
            .transpose()?;

        Ok(Page { items, next })
    }

    fn describe(&self) -> String {
        format!("table {}", self.table)
    }
}

fn item_to_json(item: &HashMap<String, AttributeValue>) -> Value {
    Value::Object(
        item.iter()
            .map(|(name, value)| (name.clone(), attribute_to_json(value)))
            .collect(),
    )
}

fn encode_key(key: &HashMap<String, AttributeValue>) -> SourceResult<PageCursor> {
    serde_json::to_string(&item_to_json(key))
        .map(PageCursor::new)
        .map_err(|e| SourceError::MalformedResponse(format!("cannot encode LastEvaluatedKey: {e}")))
}

fn decode_key(cursor: &PageCursor) -> SourceResult<HashMap<String, AttributeValue>> {
    let malformed = |reason: String| SourceError::MalformedResponse(format!("bad scan cursor: {reason}"));

    let value: Value = serde_json::from_str(cursor.as_str()).map_err(|e| malformed(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(malformed("expected an object".to_string()));
    };

    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), attribute_from_json(value).map_err(malformed)?)))
        .collect()
}

/// Convert an attribute value into its typed JSON form.
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => json!({ "S": s }),
        AttributeValue::N(n) => json!({ "N": n }),
        AttributeValue::B(b) => json!({ "B": base64::encode(b.as_ref()) }),
        AttributeValue::Bool(b) => json!({ "BOOL": b }),
        AttributeValue::Null(b) => json!({ "NULL": b }),
        AttributeValue::Ss(values) => json!({ "SS": values }),
        AttributeValue::Ns(values) => json!({ "NS": values }),
        AttributeValue::Bs(values) => {
            let encoded: Vec<String> = values.iter().map(|b| base64::encode(b.as_ref())).collect();
            json!({ "BS": encoded })
        }
        AttributeValue::L(values) => {
            let list: Vec<Value> = values.iter().map(attribute_to_json).collect();
            json!({ "L": list })
        }
        AttributeValue::M(map) => json!({ "M": item_to_json(map) }),
        _ => Value::Null,
    }
}

/// Convert typed JSON back into an attribute value.
pub fn attribute_from_json(value: &Value) -> Result<AttributeValue, String> {
    let Some((tag, inner)) = value.as_object().and_then(single_entry) else {
        return Err(format!("expected a single-key object, got {value}"));
    };

    let attribute = match (tag, inner) {
        ("S", Value::String(s)) => AttributeValue::S(s.clone()),
        ("N", Value::String(n)) => AttributeValue::N(n.clone()),
        ("B", Value::String(b)) => AttributeValue::B(decode_blob(b)?),
        ("BOOL", Value::Bool(b)) => AttributeValue::Bool(*b),
        ("NULL", Value::Bool(b)) => AttributeValue::Null(*b),
        ("SS", Value::Array(values)) => AttributeValue::Ss(strings(values)?),
        ("NS", Value::Array(values)) => AttributeValue::Ns(strings(values)?),
        ("BS", Value::Array(values)) => AttributeValue::Bs(
            strings(values)?
                .iter()
                .map(|b| decode_blob(b))
                .collect::<Result<_, _>>()?,
        ),
        ("L", Value::Array(values)) => AttributeValue::L(
            values
                .iter()
                .map(attribute_from_json)
                .collect::<Result<_, _>>()?,
        ),
        ("M", Value::Object(fields)) => AttributeValue::M(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), attribute_from_json(value)?)))
                .collect::<Result<_, String>>()?,
        ),
        (tag, inner) => return Err(format!("unsupported attribute {tag}: {inner}")),
    };

    Ok(attribute)
}

fn single_entry(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((tag, inner)), None) => Some((tag.as_str(), inner)),
        _ => None,
    }
}

fn strings(values: &[Value]) -> Result<Vec<String>, String> {
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("expected a string, got {v}"))
        })
        .collect()
}

fn decode_blob(encoded: &str) -> Result<Blob, String> {
    base64::decode(encoded)
        .map(Blob::new)
        .map_err(|e| format!("invalid base64: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_to_typed_json() {
        let item = HashMap::from([
            ("id".to_string(), AttributeValue::S("42".to_string())),
            ("total".to_string(), AttributeValue::N("9.5".to_string())),
            ("paid".to_string(), AttributeValue::Bool(true)),
            (
                "tags".to_string(),
                AttributeValue::L(vec![AttributeValue::S("rush".to_string())]),
            ),
        ]);

        let value = item_to_json(&item);

        assert_eq!(value["id"], json!({ "S": "42" }));
        assert_eq!(value["total"], json!({ "N": "9.5" }));
        assert_eq!(value["paid"], json!({ "BOOL": true }));
        assert_eq!(value["tags"], json!({ "L": [{ "S": "rush" }] }));
    }

    #[test]
    fn test_binary_is_base64() {
        let value = attribute_to_json(&AttributeValue::B(Blob::new(b"hi".to_vec())));
        assert_eq!(value, json!({ "B": "aGk=" }));
    }

    #[test]
    fn test_scan_cursor_survives_encoding() {
        let key = HashMap::from([
            ("pk".to_string(), AttributeValue::S("customer#7".to_string())),
            ("sk".to_string(), AttributeValue::N("1700000000".to_string())),
        ]);

        let cursor = encode_key(&key).unwrap();
        let decoded = decode_key(&cursor).unwrap();

        assert_eq!(decoded, key);
    }

    #[test]
    fn test_bad_cursor_is_malformed() {
        let result = decode_key(&PageCursor::new("[1, 2]"));
        assert!(matches!(result, Err(SourceError::MalformedResponse(_))));

        let result = decode_key(&PageCursor::new(r#"{"pk": {"X": "1"}}"#));
        assert!(matches!(result, Err(SourceError::MalformedResponse(_))));
    }

    #[test]
    fn test_attribute_from_json_rejects_ambiguous_object() {
        let result = attribute_from_json(&json!({ "S": "a", "N": "1" }));
        assert!(result.is_err());
    }
}
