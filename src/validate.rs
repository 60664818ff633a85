//! Document validation against a target schema
//!
//! Checks documents before they are indexed. Validation stops at the first
//! value that does not fit its field's declared type.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::compatibility::{value_matches_class, TypeClass};
use crate::error::{Result, SchemaError};
use crate::schema::SchemaSnapshot;

/// A document as sent by the caller: field name to value
pub type Document = Map<String, Value>;

/// Validates documents against one collection's declared fields
///
/// Field types are classified once up front. Fields the schema does not
/// declare are passed through; the engine decides what to do with them.
pub struct DocumentTypeValidator {
    collection: String,
    classes: HashMap<String, (String, TypeClass)>,
}

impl DocumentTypeValidator {
    pub fn new(snapshot: &SchemaSnapshot) -> Self {
        let classes = snapshot
            .fields
            .iter()
            .map(|f| {
                (
                    f.name.clone(),
                    (f.field_type.clone(), TypeClass::classify(&f.field_type)),
                )
            })
            .collect();
        Self {
            collection: snapshot.collection.clone(),
            classes,
        }
    }

    /// Validate documents in order, failing on the first mismatch
    ///
    /// `doc_index` in the error is the 0-based position in `documents`.
    pub fn validate(&self, documents: &[Document]) -> Result<()> {
        for (doc_index, document) in documents.iter().enumerate() {
            self.validate_one(doc_index, document)?;
        }
        debug!(collection = %self.collection, count = documents.len(), "Documents validated");
        Ok(())
    }

    fn validate_one(&self, doc_index: usize, document: &Document) -> Result<()> {
        for (field, value) in document {
            let Some((declared, class)) = self.classes.get(field) else {
                continue;
            };
            if !value_matches_class(value, class) {
                return Err(SchemaError::TypeMismatch {
                    doc_index,
                    field: field.clone(),
                    value: value.clone(),
                    expected_type: declared.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Validate documents against a snapshot
pub fn validate_documents(documents: &[Document], snapshot: &SchemaSnapshot) -> Result<()> {
    DocumentTypeValidator::new(snapshot).validate(documents)
}

/// Turn arbitrary JSON into a document list
///
/// Accepts a single object or an array of objects.
pub fn documents_from_value(value: Value) -> Result<Vec<Document>> {
    let not_object = |i: usize| {
        SchemaError::MissingRequiredField(format!("docs[{i}] must be a JSON object"))
    };
    match value {
        Value::Object(doc) => Ok(vec![doc]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(doc) => Ok(doc),
                _ => Err(not_object(i)),
            })
            .collect(),
        _ => Err(SchemaError::MissingRequiredField(
            "docs must be an object or an array of objects".to_string(),
        )),
    }
}
