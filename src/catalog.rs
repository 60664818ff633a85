//! Schema Catalog
//!
//! Reads a collection's live schema through a [`SchemaEngine`] and parses it
//! into a [`SchemaSnapshot`]. Nothing is cached: every call goes back to the
//! engine, because other clients may change the schema between operations.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Endpoint;
use crate::error::{Result, SchemaError};
use crate::schema::{CopyFieldRule, DynamicField, Field, FieldType, SchemaSnapshot};

/// Schema introspection resources exposed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaResource {
    Fields,
    DynamicFields,
    FieldTypes,
    CopyFields,
}

impl SchemaResource {
    pub const ALL: [SchemaResource; 4] = [
        SchemaResource::Fields,
        SchemaResource::DynamicFields,
        SchemaResource::FieldTypes,
        SchemaResource::CopyFields,
    ];

    /// Path segment under `{collection}/schema/`
    pub fn path(&self) -> &'static str {
        match self {
            SchemaResource::Fields => "fields",
            SchemaResource::DynamicFields => "dynamicfields",
            SchemaResource::FieldTypes => "fieldtypes",
            SchemaResource::CopyFields => "copyfields",
        }
    }

    /// Key holding the list in the response body
    pub fn response_key(&self) -> &'static str {
        match self {
            SchemaResource::Fields => "fields",
            SchemaResource::DynamicFields => "dynamicFields",
            SchemaResource::FieldTypes => "fieldTypes",
            SchemaResource::CopyFields => "copyFields",
        }
    }
}

/// Transport to a search engine instance
///
/// Implementations own timeouts and connection handling; callers never retry.
pub trait SchemaEngine {
    /// Raw response of the core admin STATUS action
    fn core_status(&self, endpoint: &Endpoint) -> Result<serde_json::Value>;

    /// Raw response of one schema introspection resource
    fn fetch_schema(
        &self,
        endpoint: &Endpoint,
        collection: &str,
        resource: SchemaResource,
    ) -> Result<serde_json::Value>;

    /// Submit a schema API request body
    fn post_schema(&self, endpoint: &Endpoint, collection: &str, body: &serde_json::Value) -> Result<()>;
}

impl<E: SchemaEngine + ?Sized> SchemaEngine for &E {
    fn core_status(&self, endpoint: &Endpoint) -> Result<serde_json::Value> {
        (**self).core_status(endpoint)
    }

    fn fetch_schema(
        &self,
        endpoint: &Endpoint,
        collection: &str,
        resource: SchemaResource,
    ) -> Result<serde_json::Value> {
        (**self).fetch_schema(endpoint, collection, resource)
    }

    fn post_schema(&self, endpoint: &Endpoint, collection: &str, body: &serde_json::Value) -> Result<()> {
        (**self).post_schema(endpoint, collection, body)
    }
}

/// Schema reader bound to one engine endpoint
pub struct SchemaCatalog<'a, E: SchemaEngine + ?Sized> {
    engine: &'a E,
    endpoint: &'a Endpoint,
}

impl<'a, E: SchemaEngine + ?Sized> SchemaCatalog<'a, E> {
    pub fn new(engine: &'a E, endpoint: &'a Endpoint) -> Self {
        Self { engine, endpoint }
    }

    /// Names of all collections hosted by the endpoint
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let status = self.engine.core_status(self.endpoint)?;
        parse_core_names(&status)
    }

    /// Check that a collection exists on the endpoint
    pub fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.collection_names()?.iter().any(|name| name == collection))
    }

    /// Load the full schema snapshot of a collection
    pub fn load(&self, collection: &str) -> Result<SchemaSnapshot> {
        Ok(SchemaSnapshot {
            collection: collection.to_string(),
            fields: self.load_fields(collection)?,
            dynamic_fields: self.load_dynamic_fields(collection)?,
            field_types: self.load_field_types(collection)?,
            copy_fields: self.load_copy_fields(collection)?,
        })
    }

    pub fn load_fields(&self, collection: &str) -> Result<Vec<Field>> {
        self.load_resource(collection, SchemaResource::Fields)
    }

    pub fn load_dynamic_fields(&self, collection: &str) -> Result<Vec<DynamicField>> {
        self.load_resource(collection, SchemaResource::DynamicFields)
    }

    pub fn load_field_types(&self, collection: &str) -> Result<Vec<FieldType>> {
        self.load_resource(collection, SchemaResource::FieldTypes)
    }

    pub fn load_copy_fields(&self, collection: &str) -> Result<Vec<CopyFieldRule>> {
        self.load_resource(collection, SchemaResource::CopyFields)
    }

    fn load_resource<T: DeserializeOwned>(&self, collection: &str, resource: SchemaResource) -> Result<Vec<T>> {
        let body = self.engine.fetch_schema(self.endpoint, collection, resource)?;
        let items = parse_resource(collection, resource, &body)?;
        debug!(collection, resource = resource.path(), count = items.len(), "Loaded schema resource");
        Ok(items)
    }
}

/// Parse the list held under a resource's response key
///
/// Entries missing `name`/`type` (or `source`/`dest` for copy fields) are
/// rejected rather than defaulted.
pub fn parse_resource<T: DeserializeOwned>(
    collection: &str,
    resource: SchemaResource,
    body: &serde_json::Value,
) -> Result<Vec<T>> {
    let malformed = |detail: String| SchemaError::MalformedSchema {
        collection: collection.to_string(),
        detail,
    };

    let entries = body
        .get(resource.response_key())
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed(format!("response has no '{}' array", resource.response_key())))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            T::deserialize(entry)
                .map_err(|e| malformed(format!("{} entry {}: {}", resource.path(), i, e)))
        })
        .collect()
}

/// Collection names listed under `status` in a core admin STATUS response
pub fn parse_core_names(status: &serde_json::Value) -> Result<Vec<String>> {
    let cores = status
        .get("status")
        .and_then(|s| s.as_object())
        .ok_or_else(|| SchemaError::MalformedSchema {
            collection: "admin/cores".to_string(),
            detail: "STATUS response has no 'status' object".to_string(),
        })?;
    Ok(cores.keys().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fields() {
        let body = json!({
            "responseHeader": {"status": 0, "QTime": 1},
            "fields": [
                {"name": "id", "type": "string", "multiValued": false, "indexed": true, "required": true, "stored": true},
                {"name": "tags", "type": "strings"}
            ]
        });
        let fields: Vec<Field> = parse_resource("products", SchemaResource::Fields, &body).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].multi_valued, Some(false));
        assert_eq!(fields[1].multi_valued, None);
        assert_eq!(fields[1].field_type, "strings");
    }

    #[test]
    fn test_parse_missing_type_is_malformed() {
        let body = json!({"fields": [{"name": "id"}]});
        let err = parse_resource::<Field>("products", SchemaResource::Fields, &body).unwrap_err();
        match err {
            SchemaError::MalformedSchema { collection, detail } => {
                assert_eq!(collection, "products");
                assert!(detail.contains("fields entry 0"), "{detail}");
            }
            other => panic!("Expected MalformedSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_list_is_malformed() {
        let body = json!({"responseHeader": {"status": 0}});
        let result = parse_resource::<CopyFieldRule>("products", SchemaResource::CopyFields, &body);
        assert!(matches!(result, Err(SchemaError::MalformedSchema { .. })));
    }

    #[test]
    fn test_parse_copy_fields_with_max_chars() {
        let body = json!({"copyFields": [
            {"source": "title", "dest": "title_txt", "maxChars": 256},
            {"source": "*", "dest": "_text_"}
        ]});
        let rules: Vec<CopyFieldRule> = parse_resource("products", SchemaResource::CopyFields, &body).unwrap();
        assert_eq!(rules[0].max_chars, Some(256));
        assert_eq!(rules[1].max_chars, None);
    }

    #[test]
    fn test_parse_core_names() {
        let status = json!({
            "responseHeader": {"status": 0},
            "initFailures": {},
            "status": {"products": {"name": "products"}, "orders": {"name": "orders"}}
        });
        let names = parse_core_names(&status).unwrap();
        assert_eq!(names, vec!["products".to_string(), "orders".to_string()]);
        assert!(parse_core_names(&json!({"status": "OK"})).is_err());
    }

    #[test]
    fn test_resource_paths() {
        let paths: Vec<&str> = SchemaResource::ALL.iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec!["fields", "dynamicfields", "fieldtypes", "copyfields"]);
        assert_eq!(SchemaResource::DynamicFields.response_key(), "dynamicFields");
    }
}
