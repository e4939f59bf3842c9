//! Response envelope normalization
//!
//! The backend wraps collections in several envelopes depending on the
//! endpoint and version:
//!
//! - a bare array: `[...]`
//! - `{"data": [...]}`
//! - `{"data": {"<key>": [...]}}`
//! - `{"<key>": [...]}`
//!
//! [`unwrap_collection`] accepts all of them, checked in that order, and
//! returns [`Error::UnrecognizedShape`] for anything else so a new envelope
//! shows up as an error instead of an empty table.

use mailreach_common::types::Pagination;
use mailreach_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One page of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::new(page, limit, 0),
        }
    }
}

/// Locate the collection array inside a response envelope
pub fn find_collection<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = value {
        return Some(items);
    }

    let data = value.get("data");
    if let Some(Value::Array(items)) = data {
        return Some(items);
    }
    if let Some(Value::Array(items)) = data.and_then(|d| d.get(key)) {
        return Some(items);
    }
    if let Some(Value::Array(items)) = value.get(key) {
        return Some(items);
    }

    None
}

/// Flatten a response envelope into a typed collection
pub fn unwrap_collection<T: DeserializeOwned>(value: &Value, key: &str) -> Result<Vec<T>> {
    let items = find_collection(value, key).ok_or_else(|| Error::UnrecognizedShape {
        key: key.to_string(),
        shape: describe_shape(value),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::deserialize(item)
                .map_err(|e| Error::Decode(format!("{}[{}]: {}", key, index, e)))
        })
        .collect()
}

/// Locate a single entity in `{data:{key:..}}`, `{data:..}`, `{key:..}` or the bare object
pub fn find_entity<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let data = value.get("data").filter(|d| d.is_object());

    data.and_then(|d| d.get(key))
        .filter(|v| v.is_object())
        .or(data)
        .or_else(|| value.get(key).filter(|v| v.is_object()))
        .or_else(|| value.is_object().then_some(value))
}

/// Unwrap a single typed entity
pub fn unwrap_entity<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T> {
    let candidate = find_entity(value, key).ok_or_else(|| Error::UnrecognizedShape {
        key: key.to_string(),
        shape: describe_shape(value),
    })?;

    T::deserialize(candidate).map_err(|e| Error::Decode(format!("{}: {}", key, e)))
}

/// Unwrap a single entity as its raw field map, for shallow merges
pub fn unwrap_entity_fields(value: &Value, key: &str) -> Result<Map<String, Value>> {
    match find_entity(value, key) {
        Some(Value::Object(fields)) => Ok(fields.clone()),
        _ => Err(Error::UnrecognizedShape {
            key: key.to_string(),
            shape: describe_shape(value),
        }),
    }
}

/// Unwrap an entity only if the response carries one (it has an `id`).
/// Action endpoints answer either with the entity or with a bare message.
pub fn maybe_entity<T: DeserializeOwned>(value: &Value, key: &str) -> Result<Option<T>> {
    match find_entity(value, key) {
        Some(candidate) if candidate.get("id").is_some() => T::deserialize(candidate)
            .map(Some)
            .map_err(|e| Error::Decode(format!("{}: {}", key, e))),
        _ => Ok(None),
    }
}

/// Read pagination from `pagination`, `data.pagination`, the envelope or `data`.
/// Falls back to a single page holding `fallback_len` rows.
pub fn unwrap_pagination(value: &Value, page: u32, limit: u32, fallback_len: usize) -> Pagination {
    let data = value.get("data");
    let sources = [
        value.get("pagination"),
        data.and_then(|d| d.get("pagination")),
        Some(value),
        data,
    ];

    for source in sources.into_iter().flatten() {
        let Some(obj) = source.as_object() else {
            continue;
        };
        let total = read_u64(obj, &["total", "total_count", "count"]);
        let Some(total) = total else {
            continue;
        };
        let page = read_u64(obj, &["page", "current_page"])
            .map(saturate_u32)
            .unwrap_or(page);
        let limit = read_u64(obj, &["limit", "per_page", "page_size"])
            .map(saturate_u32)
            .unwrap_or(limit);
        let mut pagination = Pagination::new(page, limit, total);
        if let Some(pages) = read_u64(obj, &["pages", "total_pages"]) {
            pagination.pages = saturate_u32(pages).max(1);
        }
        return pagination;
    }

    Pagination::new(page, limit, fallback_len as u64)
}

/// Backend counters above `u32::MAX` are clamped rather than wrapped
fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Unwrap a collection together with its pagination
pub fn unwrap_page<T: DeserializeOwned>(
    value: &Value,
    key: &str,
    page: u32,
    limit: u32,
) -> Result<Page<T>> {
    let items = unwrap_collection(value, key)?;
    let pagination = unwrap_pagination(value, page, limit, items.len());
    Ok(Page { items, pagination })
}

fn read_u64(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| {
        let v = obj.get(*k)?;
        v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    })
}

/// Short description of a value's shape for error messages
fn describe_shape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(map) => {
            let keys: Vec<String> = map
                .iter()
                .map(|(k, v)| match v {
                    Value::Object(inner) => {
                        let inner_keys: Vec<&str> = inner.keys().map(String::as_str).collect();
                        format!("{}{{{}}}", k, inner_keys.join(","))
                    }
                    _ => k.clone(),
                })
                .collect();
            format!("object{{{}}}", keys.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Row {
        id: i64,
        name: String,
    }

    fn rows() -> Value {
        json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}])
    }

    #[test]
    fn test_all_envelopes_yield_same_collection() {
        let shapes = [
            rows(),
            json!({"data": rows()}),
            json!({"data": {"accounts": rows()}}),
            json!({"accounts": rows()}),
        ];

        let expected = vec![
            Row { id: 1, name: "A".to_string() },
            Row { id: 2, name: "B".to_string() },
        ];
        for shape in &shapes {
            let items: Vec<Row> = unwrap_collection(shape, "accounts").unwrap();
            assert_eq!(items, expected);
        }
    }

    #[test]
    fn test_unrecognized_shape_is_an_error() {
        let value = json!({"data": {"items": rows()}, "ok": true});
        let err = unwrap_collection::<Row>(&value, "accounts").unwrap_err();
        match err {
            Error::UnrecognizedShape { key, shape } => {
                assert_eq!(key, "accounts");
                assert_eq!(shape, "object{data{items},ok}");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(matches!(
            unwrap_collection::<Row>(&Value::Null, "lists"),
            Err(Error::UnrecognizedShape { .. })
        ));
    }

    #[test]
    fn test_bad_element_is_decode_error() {
        let value = json!({"data": [{"id": 1, "name": "A"}, {"name": "no id"}]});
        let err = unwrap_collection::<Row>(&value, "accounts").unwrap_err();
        assert!(matches!(err, Error::Decode(ref m) if m.starts_with("accounts[1]")));
    }

    #[test]
    fn test_unwrap_entity_shapes() {
        let shapes = [
            json!({"data": {"campaign": {"id": 9, "name": "X"}}}),
            json!({"data": {"id": 9, "name": "X"}}),
            json!({"campaign": {"id": 9, "name": "X"}}),
            json!({"id": 9, "name": "X"}),
        ];
        for shape in &shapes {
            let row: Row = unwrap_entity(shape, "campaign").unwrap();
            assert_eq!(row, Row { id: 9, name: "X".to_string() });
        }
        assert!(unwrap_entity::<Row>(&json!([1, 2]), "campaign").is_err());
    }

    #[test]
    fn test_entity_fields_and_optional_entity() {
        let value = json!({"data": {"account": {"id": 3, "is_active": false}}});
        let fields = unwrap_entity_fields(&value, "account").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["is_active"], json!(false));

        let message = json!({"message": "Campaign paused"});
        assert_eq!(maybe_entity::<Row>(&message, "campaign").unwrap(), None);
        assert_eq!(maybe_entity::<Row>(&Value::Null, "campaign").unwrap(), None);

        let entity = json!({"message": "ok", "campaign": {"id": 4, "name": "Y"}});
        assert_eq!(
            maybe_entity::<Row>(&entity, "campaign").unwrap(),
            Some(Row { id: 4, name: "Y".to_string() })
        );
    }

    #[test]
    fn test_pagination_sources() {
        let nested = json!({"data": {"lists": [], "pagination": {"total": 42, "page": 3, "pages": 5}}});
        let p = unwrap_pagination(&nested, 1, 10, 0);
        assert_eq!((p.page, p.total, p.pages), (3, 42, 5));

        let flat = json!({"data": [], "total": "25", "per_page": 10});
        let p = unwrap_pagination(&flat, 2, 20, 0);
        assert_eq!((p.page, p.limit, p.total, p.pages), (2, 10, 25, 3));

        let bare = rows();
        let p = unwrap_pagination(&bare, 1, 10, 2);
        assert_eq!((p.total, p.pages), (2, 1));
    }

    #[test]
    fn test_oversized_pagination_is_clamped() {
        let huge = json!({"total": 10, "page": 4_294_967_301u64, "limit": 4_294_967_296u64, "pages": 8_589_934_592u64});
        let p = unwrap_pagination(&huge, 1, 10, 0);
        assert_eq!((p.page, p.limit, p.pages), (u32::MAX, u32::MAX, u32::MAX));
    }
}
