//! In-memory engine shared by the integration tests
//!
//! Serves schemas loaded from `tests/fixtures/` and applies posted schema
//! batches to its own state, so a plan can be applied and planned again.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::{json, Value};
use solr_schema_sync::catalog::{parse_resource, SchemaResource};
use solr_schema_sync::config::CopyFieldConfig;
use solr_schema_sync::{
    ClientRegistry, CopyFieldRule, Endpoint, Field, Result, SchemaEngine, SchemaError, SchemaGateway,
    SchemaSnapshot,
};

pub const CLIENT: &str = "acme";

pub fn fixture(name: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{name}.json"));
    let content = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Parse a schema dump holding all four resource lists
pub fn snapshot_from(collection: &str, body: &Value) -> SchemaSnapshot {
    SchemaSnapshot {
        collection: collection.to_string(),
        fields: parse_resource(collection, SchemaResource::Fields, body).unwrap(),
        dynamic_fields: parse_resource(collection, SchemaResource::DynamicFields, body).unwrap(),
        field_types: parse_resource(collection, SchemaResource::FieldTypes, body).unwrap(),
        copy_fields: parse_resource(collection, SchemaResource::CopyFields, body).unwrap(),
    }
}

#[derive(Default)]
pub struct FakeSolr {
    collections: RefCell<BTreeMap<String, SchemaSnapshot>>,
    posts: RefCell<Vec<(String, Value)>>,
}

impl FakeSolr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host a collection whose schema is the named fixture
    pub fn with_fixture(self, collection: &str, fixture_name: &str) -> Self {
        self.with_schema(collection, &fixture(fixture_name))
    }

    /// Host a collection whose schema is the given dump
    pub fn with_schema(self, collection: &str, body: &Value) -> Self {
        self.collections
            .borrow_mut()
            .insert(collection.to_string(), snapshot_from(collection, body));
        self
    }

    pub fn snapshot(&self, collection: &str) -> SchemaSnapshot {
        self.collections.borrow()[collection].clone()
    }

    /// Every posted body with its collection, oldest first
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.borrow().clone()
    }

    fn rejected(collection: &str, detail: String) -> SchemaError {
        SchemaError::MutationRejected {
            collection: collection.to_string(),
            detail,
        }
    }
}

impl SchemaEngine for FakeSolr {
    fn core_status(&self, _endpoint: &Endpoint) -> Result<Value> {
        let status: serde_json::Map<String, Value> = self
            .collections
            .borrow()
            .keys()
            .map(|name| (name.clone(), json!({"name": name, "instanceDir": name})))
            .collect();
        Ok(json!({"responseHeader": {"status": 0}, "initFailures": {}, "status": status}))
    }

    fn fetch_schema(&self, _endpoint: &Endpoint, collection: &str, resource: SchemaResource) -> Result<Value> {
        let collections = self.collections.borrow();
        let snapshot = collections
            .get(collection)
            .ok_or_else(|| SchemaError::CollectionNotFound {
                collection: collection.to_string(),
            })?;

        let entries = match resource {
            SchemaResource::Fields => serde_json::to_value(&snapshot.fields)?,
            SchemaResource::DynamicFields => serde_json::to_value(&snapshot.dynamic_fields)?,
            SchemaResource::FieldTypes => serde_json::to_value(&snapshot.field_types)?,
            SchemaResource::CopyFields => serde_json::to_value(&snapshot.copy_fields)?,
        };
        let mut body = serde_json::Map::new();
        body.insert("responseHeader".to_string(), json!({"status": 0}));
        body.insert(resource.response_key().to_string(), entries);
        Ok(Value::Object(body))
    }

    /// Applies the whole batch or nothing, like the engine does
    fn post_schema(&self, _endpoint: &Endpoint, collection: &str, body: &Value) -> Result<()> {
        self.posts.borrow_mut().push((collection.to_string(), body.clone()));

        let mut collections = self.collections.borrow_mut();
        let snapshot = collections
            .get_mut(collection)
            .ok_or_else(|| SchemaError::CollectionNotFound {
                collection: collection.to_string(),
            })?;
        let mut updated = snapshot.clone();

        let fields: Vec<Field> = match body.get("add-field") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => Vec::new(),
        };
        for field in fields {
            if updated.has_field(&field.name) {
                return Err(Self::rejected(collection, format!("Field '{}' already exists.", field.name)));
            }
            updated.fields.push(field);
        }

        let rules: Vec<CopyFieldRule> = match body.get("add-copy-field") {
            Some(v) => serde_json::from_value(v.clone())?,
            None => Vec::new(),
        };
        for rule in rules {
            if updated.has_copy_field(&rule.source, &rule.dest) {
                return Err(Self::rejected(
                    collection,
                    format!("Copy field {} -> {} already exists.", rule.source, rule.dest),
                ));
            }
            updated.copy_fields.push(rule);
        }

        *snapshot = updated;
        Ok(())
    }
}

/// Gateway with a single registered client pointing at the fake
pub fn gateway(engine: FakeSolr) -> SchemaGateway<FakeSolr> {
    let mut registry = ClientRegistry::default();
    registry.insert(CLIENT, Endpoint::new("localhost", 8983));
    SchemaGateway::new(registry, engine, CopyFieldConfig::default())
}
