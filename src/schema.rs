//! Schema types and structures
//!
//! Mirrors the JSON shapes returned by the engine's schema introspection
//! endpoints. Flags the engine leaves out stay `None` so callers can fall back
//! to the field type's defaults instead of assuming `false`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A declared field of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field name, unique within a collection
    pub name: String,
    /// Name of the field type this field references
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

impl Field {
    /// Create a field with only its name and type set
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            multi_valued: None,
            stored: None,
            indexed: None,
        }
    }

    pub fn with_multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = Some(multi_valued);
        self
    }

    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = Some(stored);
        self
    }

    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = Some(indexed);
        self
    }
}

/// A wildcard field declaration such as `*_txt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicField {
    /// The declared pattern (e.g., "*_txt")
    #[serde(rename = "name")]
    pub pattern: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
}

impl DynamicField {
    pub fn new(pattern: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            field_type: field_type.into(),
            multi_valued: None,
        }
    }

    pub fn with_multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = Some(multi_valued);
        self
    }

    /// Lookup key for `*_<suffix>` patterns; other patterns have none
    pub fn suffix(&self) -> Option<&str> {
        self.pattern.strip_prefix("*_")
    }
}

/// A named field type and the defaults it hands down to fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
}

impl FieldType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multi_valued: None,
        }
    }

    pub fn with_multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = Some(multi_valued);
        self
    }
}

/// An index-time copy directive; identity is the (source, dest) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFieldRule {
    pub source: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u32>,
}

impl CopyFieldRule {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            max_chars: None,
        }
    }

    pub fn with_max_chars(mut self, max_chars: u32) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Whether this rule has the given (source, dest) identity
    pub fn is(&self, source: &str, dest: &str) -> bool {
        self.source == source && self.dest == dest
    }
}

/// Point-in-time view of one collection's schema
///
/// Loaded once per operation and passed by reference into every decision, so
/// all checks within an operation agree on what the schema looked like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub collection: String,
    pub fields: Vec<Field>,
    pub dynamic_fields: Vec<DynamicField>,
    pub field_types: Vec<FieldType>,
    pub copy_fields: Vec<CopyFieldRule>,
}

impl SchemaSnapshot {
    /// Create an empty snapshot for a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Get a field type definition by name
    pub fn get_field_type(&self, name: &str) -> Option<&FieldType> {
        self.field_types.iter().find(|t| t.name == name)
    }

    /// Get the `*_<suffix>` dynamic field
    pub fn get_dynamic_field(&self, suffix: &str) -> Option<&DynamicField> {
        self.dynamic_fields
            .iter()
            .find(|d| d.suffix() == Some(suffix))
    }

    /// Map of dynamic-field suffix to type, for `*_<suffix>` patterns only
    pub fn dynamic_suffixes(&self) -> HashMap<&str, &str> {
        self.dynamic_fields
            .iter()
            .filter_map(|d| d.suffix().map(|s| (s, d.field_type.as_str())))
            .collect()
    }

    /// Map of field name to field type name
    pub fn field_type_map(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.field_type.as_str()))
            .collect()
    }

    pub fn has_copy_field(&self, source: &str, dest: &str) -> bool {
        self.copy_fields.iter().any(|c| c.is(source, dest))
    }
}

/// A schema change to be executed by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "body", rename_all = "kebab-case")]
pub enum MutationCommand {
    AddField(Field),
    AddCopyField(CopyFieldRule),
}

impl MutationCommand {
    /// Short human-readable description of the command
    pub fn describe(&self) -> String {
        match self {
            MutationCommand::AddField(f) => format!("add field '{}' ({})", f.name, f.field_type),
            MutationCommand::AddCopyField(c) => match c.max_chars {
                Some(max) => format!("add copy field {} -> {} (maxChars {})", c.source, c.dest, max),
                None => format!("add copy field {} -> {}", c.source, c.dest),
            },
        }
    }
}

/// A planned set of schema changes for one collection
pub trait MutationPlan {
    /// Collection the commands were planned against
    fn collection(&self) -> &str;

    /// Commands to submit, empty when there is nothing to change
    fn commands(&self) -> &[MutationCommand];

    /// One-line description for logs and CLI output
    fn summary(&self) -> String;

    fn is_empty(&self) -> bool {
        self.commands().is_empty()
    }

    fn batch(&self) -> SchemaBatch {
        SchemaBatch::from_commands(self.commands())
    }
}

/// Commands grouped into a single schema API request body
///
/// Field additions are serialized before copy-field additions so a copy rule
/// may target a field created in the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaBatch {
    #[serde(rename = "add-field", skip_serializing_if = "Vec::is_empty")]
    pub add_field: Vec<Field>,
    #[serde(rename = "add-copy-field", skip_serializing_if = "Vec::is_empty")]
    pub add_copy_field: Vec<CopyFieldRule>,
}

impl SchemaBatch {
    /// Group commands by kind, keeping their relative order within each kind
    pub fn from_commands(commands: &[MutationCommand]) -> Self {
        let mut batch = Self::default();
        for command in commands {
            match command {
                MutationCommand::AddField(f) => batch.add_field.push(f.clone()),
                MutationCommand::AddCopyField(c) => batch.add_copy_field.push(c.clone()),
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.add_field.is_empty() && self.add_copy_field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.add_field.len() + self.add_copy_field.len()
    }

    /// JSON body for the schema API
    pub fn to_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_flags_left_unspecified() {
        let field: Field = serde_json::from_value(json!({
            "name": "title",
            "type": "string",
            "required": true
        }))
        .unwrap();
        assert_eq!(field.multi_valued, None);
        assert_eq!(field.stored, None);
        assert_eq!(field.indexed, None);
    }

    #[test]
    fn test_field_serializes_only_present_flags() {
        let field = Field::new("b", "string").with_stored(true);
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"name": "b", "type": "string", "stored": true})
        );
    }

    #[test]
    fn test_dynamic_field_suffix() {
        assert_eq!(DynamicField::new("*_txt", "text_general").suffix(), Some("txt"));
        assert_eq!(DynamicField::new("attr_*", "text_general").suffix(), None);
        assert_eq!(DynamicField::new("*txt", "text_general").suffix(), None);
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = SchemaSnapshot {
            collection: "products".into(),
            fields: vec![Field::new("id", "string"), Field::new("price", "pdouble")],
            dynamic_fields: vec![
                DynamicField::new("*_txt", "text_general"),
                DynamicField::new("random_*", "random"),
            ],
            field_types: vec![FieldType::new("string")],
            copy_fields: vec![CopyFieldRule::new("*", "_text_")],
        };

        assert!(snapshot.has_field("price"));
        assert!(!snapshot.has_field("name"));
        assert_eq!(snapshot.get_dynamic_field("txt").unwrap().field_type, "text_general");
        assert_eq!(snapshot.dynamic_suffixes().len(), 1);
        assert_eq!(snapshot.field_type_map().get("price"), Some(&"pdouble"));
        assert!(snapshot.has_copy_field("*", "_text_"));
        assert!(!snapshot.has_copy_field("_text_", "*"));
    }

    #[test]
    fn test_batch_groups_fields_first() {
        let commands = vec![
            MutationCommand::AddCopyField(CopyFieldRule::new("*", "_text_")),
            MutationCommand::AddField(Field::new("_text_", "text_general")),
            MutationCommand::AddCopyField(CopyFieldRule::new("price", "price_d")),
        ];
        let batch = SchemaBatch::from_commands(&commands);
        assert_eq!(batch.len(), 3);

        let body = batch.to_body().unwrap();
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["add-field", "add-copy-field"]);
        assert_eq!(body["add-copy-field"][1], json!({"source": "price", "dest": "price_d"}));
    }

    #[test]
    fn test_empty_batch_serializes_to_empty_object() {
        let batch = SchemaBatch::from_commands(&[]);
        assert!(batch.is_empty());
        assert_eq!(batch.to_body().unwrap(), json!({}));
    }
}
