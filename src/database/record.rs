use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Columns managed by the data layer itself. API input may never carry them;
/// they are stamped internally before a write reaches the database.
pub const SYSTEM_FIELDS: &[&str] = &["id", "tenant_id", "created_at", "updated_at", "archived_at"];

/// The owning-tenant column present on every tenant-owned table.
pub const TENANT_FIELD: &str = "tenant_id";

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("system field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(&'static str),
    #[error("invalid record payload: {0}")]
    InvalidJson(String),
    #[error("missing required field: {0}")]
    MissingRequiredField(String),
}

/// A write payload: the field map for one row about to be inserted or
/// updated. Fields are kept sorted so generated SQL is stable.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: BTreeMap::new() }
    }

    /// Builds a record from API input, rejecting system fields outright.
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        let mut record = Self::new();

        match json {
            Value::Object(map) => {
                for (key, value) in map {
                    if let Some(field) = SYSTEM_FIELDS.iter().find(|&&f| f == key) {
                        return Err(RecordError::SystemFieldNotAllowed(field));
                    }
                    record.fields.insert(key, value);
                }
                Ok(record)
            }
            _ => Err(RecordError::InvalidJson("expected a JSON object".to_string())),
        }
    }

    pub fn from_json_array(json: Value) -> Result<Vec<Self>, RecordError> {
        match json {
            Value::Array(array) => {
                let mut records = Vec::with_capacity(array.len());
                for (index, item) in array.into_iter().enumerate() {
                    let record = Self::from_json(item)
                        .map_err(|e| RecordError::InvalidJson(format!("item {}: {}", index, e)))?;
                    records.push(record);
                }
                Ok(records)
            }
            _ => Err(RecordError::InvalidJson("expected a JSON array".to_string())),
        }
    }

    /// Accepts either a single object or an array of objects.
    pub fn from_json_flexible(json: Value) -> Result<Vec<Self>, RecordError> {
        match json {
            Value::Array(_) => Self::from_json_array(json),
            Value::Object(_) => Ok(vec![Self::from_json(json)?]),
            _ => Err(RecordError::InvalidJson("expected a JSON object or array".to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a caller-controlled field. System fields are ignored with a
    /// warning; internal code uses [`Record::set_system_field`] for those.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            tracing::warn!(field = %key, "attempted to set system field through Record::set - ignoring");
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// Sets a system-managed field (owner stamp, id, timestamps).
    pub fn set_system_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.get("id").and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn set_id(&mut self, id: Uuid) -> &mut Self {
        self.set_system_field("id", Value::String(id.to_string()))
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.get(TENANT_FIELD).and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Field name/value pairs in column order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    pub fn validate_required_fields(&self, fields: &[&str]) -> Result<(), RecordError> {
        for &field in fields {
            match self.get(field) {
                None | Some(Value::Null) => {
                    return Err(RecordError::MissingRequiredField(field.to_string()))
                }
                Some(_) => continue,
            }
        }
        Ok(())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self { fields: map.into_iter().collect() }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.to_json()
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Record(id: {:?}, fields: {})", self.id(), self.fields.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_input_cannot_carry_system_fields() {
        for field in SYSTEM_FIELDS {
            let err = Record::from_json(json!({ *field: "x" })).unwrap_err();
            assert!(matches!(err, RecordError::SystemFieldNotAllowed(f) if f == *field));
        }
    }

    #[test]
    fn set_ignores_system_fields() {
        let mut record = Record::new();
        record.set(TENANT_FIELD, "6f2b9f3e-58b2-4b2f-9c3a-3a8f6f0f8d11");
        assert!(record.get(TENANT_FIELD).is_none());

        record.set_system_field(TENANT_FIELD, "6f2b9f3e-58b2-4b2f-9c3a-3a8f6f0f8d11");
        assert!(record.tenant_id().is_some());
    }

    #[test]
    fn flexible_input_accepts_object_or_array() {
        let one = Record::from_json_flexible(json!({ "name": "Acme Plumbing" })).unwrap();
        assert_eq!(one.len(), 1);

        let many =
            Record::from_json_flexible(json!([{ "name": "a" }, { "name": "b" }])).unwrap();
        assert_eq!(many.len(), 2);

        assert!(Record::from_json_flexible(json!("nope")).is_err());
    }

    #[test]
    fn required_field_validation() {
        let record = Record::from_json(json!({ "name": "Acme", "email": null })).unwrap();
        assert!(record.validate_required_fields(&["name"]).is_ok());
        assert!(matches!(
            record.validate_required_fields(&["email"]),
            Err(RecordError::MissingRequiredField(f)) if f == "email"
        ));
        assert!(record.validate_required_fields(&["phone"]).is_err());
    }

    #[test]
    fn fields_iterate_in_column_order() {
        let record = Record::from_json(json!({ "zeta": 1, "alpha": 2, "mid": 3 })).unwrap();
        let names: Vec<&str> = record.fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
