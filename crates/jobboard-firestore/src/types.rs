//! Firestore REST API types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FirestoreError, FirestoreResult};

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Create a named document, as required inside commit writes.
    pub fn named(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(fields)
        }
    }

    /// Last path segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    /// Raw field value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|f| f.get(key))
    }

    /// Typed field value.
    pub fn get<T: FromFirestoreValue>(&self, key: &str) -> Option<T> {
        self.field(key).and_then(T::from_firestore_value)
    }

    /// Typed field value that must be present.
    pub fn require<T: FromFirestoreValue>(&self, key: &str) -> FirestoreResult<T> {
        self.get(key).ok_or_else(|| {
            FirestoreError::InvalidResponse(format!(
                "Document {} is missing field '{}'",
                self.name.as_deref().unwrap_or("<unnamed>"),
                key
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetDocumentsRequest {
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetDocumentsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

// ============================================================================
// Commit Types (atomic multi-document writes)
// ============================================================================

/// A single write operation in a commit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Field mask for partial updates. An empty mask leaves fields untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Server-side transforms applied after the update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_transforms: Option<Vec<FieldTransform>>,

    /// Precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    /// Create a document that must not exist yet.
    pub fn create(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        Self {
            update: Some(Document::named(name, fields)),
            current_document: Some(Precondition::exists(false)),
            ..Default::default()
        }
    }

    /// Apply transforms to an existing document without touching other fields.
    pub fn transform(name: impl Into<String>, transforms: Vec<FieldTransform>) -> Self {
        Self {
            update: Some(Document::named(name, HashMap::new())),
            update_mask: Some(DocumentMask {
                field_paths: Vec::new(),
            }),
            update_transforms: Some(transforms),
            current_document: Some(Precondition::exists(true)),
        }
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

/// Precondition for a write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Precondition {
    pub fn exists(exists: bool) -> Self {
        Self {
            exists: Some(exists),
            update_time: None,
        }
    }
}

/// Server-side field transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_missing_elements: Option<ArrayValue>,
}

impl FieldTransform {
    /// Append values to an array field, skipping ones already present.
    pub fn append_missing(field_path: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field_path: field_path.into(),
            append_missing_elements: Some(ArrayValue {
                values: Some(values),
            }),
        }
    }
}

/// Commit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub update_time: Option<String>,
}

/// Commit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub write_results: Option<Vec<WriteResult>>,
    pub commit_time: Option<String>,
}

// ============================================================================
// Query Types
// ============================================================================

/// Structured query for runQuery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Filter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl StructuredQuery {
    /// Query every document of a collection.
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
                all_descendants: None,
            }],
            r#where: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.r#where = Some(filter);
        self
    }

    pub fn order_by(mut self, field_path: impl Into<String>, direction: &str) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(Order {
            field: FieldReference {
                field_path: field_path.into(),
            },
            direction: direction.to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_filter: Option<CompositeFilter>,
}

impl Filter {
    /// `field == value`
    pub fn equal(field_path: impl Into<String>, value: Value) -> Self {
        Self {
            field_filter: Some(FieldFilter {
                field: FieldReference {
                    field_path: field_path.into(),
                },
                op: "EQUAL".to_string(),
                value,
            }),
            composite_filter: None,
        }
    }

    /// Conjunction of filters.
    pub fn and(filters: Vec<Filter>) -> Self {
        Self {
            field_filter: None,
            composite_filter: Some(CompositeFilter {
                op: "AND".to_string(),
                filters,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    pub op: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Vec<T> {
    fn to_firestore_value(&self) -> Value {
        Value::ArrayValue(ArrayValue {
            values: Some(self.iter().map(|v| v.to_firestore_value()).collect()),
        })
    }
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for i64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for f64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleValue(f) => Some(*f),
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromFirestoreValue for bool {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

impl<T: FromFirestoreValue> FromFirestoreValue for Vec<T> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::ArrayValue(arr) => Some(
                arr.values
                    .iter()
                    .flatten()
                    .filter_map(T::from_firestore_value)
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_wire_format() {
        assert_eq!(
            serde_json::to_value(Value::IntegerValue("3".into())).unwrap(),
            json!({"integerValue": "3"})
        );
        assert_eq!(
            serde_json::to_value(Value::NullValue(())).unwrap(),
            json!({"nullValue": null})
        );
    }

    #[test]
    fn test_document_id_from_name() {
        let mut doc = Document::new(HashMap::new());
        assert_eq!(doc.id(), None);
        doc.name = Some("projects/p/databases/(default)/documents/jobs/abc".to_string());
        assert_eq!(doc.id(), Some("abc"));
    }

    #[test]
    fn test_create_write_sets_precondition() {
        let write = Write::create("projects/p/databases/d/documents/a/b", HashMap::new());
        let json = serde_json::to_value(&write).unwrap();
        assert_eq!(json["currentDocument"], json!({"exists": false}));
        assert!(json.get("updateMask").is_none());
    }

    #[test]
    fn test_transform_write_serializes_empty_mask() {
        let write = Write::transform(
            "projects/p/databases/d/documents/jobs/j",
            vec![FieldTransform::append_missing(
                "applications",
                vec![Value::StringValue("a1".into())],
            )],
        );
        let json = serde_json::to_value(&write).unwrap();
        assert_eq!(json["updateMask"], json!({"fieldPaths": []}));
        assert_eq!(
            json["updateTransforms"][0]["appendMissingElements"],
            json!({"values": [{"stringValue": "a1"}]})
        );
        assert_eq!(json["currentDocument"], json!({"exists": true}));
    }

    #[test]
    fn test_structured_query_uses_where_key() {
        let query = StructuredQuery::collection("jobs")
            .filter(Filter::equal("createdBy", Value::StringValue("u1".into())))
            .limit(10);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(json["from"][0]["collectionId"], "jobs");
        assert_eq!(json["limit"], 10);
    }

    #[test]
    fn test_vec_from_array_skips_foreign_values() {
        let value = Value::ArrayValue(ArrayValue {
            values: Some(vec![
                Value::StringValue("a".into()),
                Value::IntegerValue("1".into()),
            ]),
        });
        let parsed: Vec<String> = Vec::from_firestore_value(&value).unwrap();
        assert_eq!(parsed, vec!["a"]);
    }
}
