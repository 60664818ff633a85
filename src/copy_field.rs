//! Copy-field planning
//!
//! Two modes:
//! - **Explicit**: one rule from a source field to either a dynamic-field
//!   suffix (`title` + `txt` -> `title_txt`) or an existing field.
//! - **Auto text**: bootstraps a collection for free-text search with a
//!   catch-all text field, a `* -> <catch-all>` rule and one typed suffix copy
//!   per field.
//!
//! Plans are checked against the snapshot they were built from and never
//! contain a rule or field that snapshot already has.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compatibility::{
    classes_are_copy_compatible, effective_dynamic_multi_valued, effective_multi_valued,
    multi_valued_allows_copy, TypeClass,
};
use crate::config::CopyFieldConfig;
use crate::error::{Result, SchemaError};
use crate::schema::{CopyFieldRule, Field, MutationCommand, MutationPlan, SchemaSnapshot};

/// Where a copy rule should write to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyDestination {
    /// A dynamic field suffix; the destination is `<source>_<suffix>`
    ByDynamicSuffix(String),
    /// An existing field
    ByExplicitField(String),
}

/// A validated request for one copy-field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFieldRequest {
    pub collection: String,
    pub source_field: String,
    pub destination: CopyDestination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u32>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl CopyFieldRequest {
    pub fn new(
        collection: impl Into<String>,
        source_field: impl Into<String>,
        destination: CopyDestination,
    ) -> Self {
        Self {
            collection: collection.into(),
            source_field: source_field.into(),
            destination,
            max_chars: None,
        }
    }

    pub fn with_max_chars(mut self, max_chars: u32) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Build a request from loose caller parameters
    ///
    /// Exactly one of `type_copy_field` and `field_to_copy` must be non-blank.
    /// `max_chars`, when given, must be a positive integer.
    pub fn from_parts(
        collection: &str,
        field: &str,
        type_copy_field: Option<&str>,
        field_to_copy: Option<&str>,
        max_chars: Option<i64>,
    ) -> Result<Self> {
        let collection = non_blank(Some(collection))
            .ok_or_else(|| SchemaError::MissingRequiredField("collection".to_string()))?;
        let field = non_blank(Some(field))
            .ok_or_else(|| SchemaError::MissingRequiredField("field".to_string()))?;

        let destination = match (non_blank(type_copy_field), non_blank(field_to_copy)) {
            (Some(suffix), None) => CopyDestination::ByDynamicSuffix(suffix.to_string()),
            (None, Some(dest)) => CopyDestination::ByExplicitField(dest.to_string()),
            (None, None) => {
                return Err(SchemaError::MissingRequiredField(
                    "one of 'typeCopyField' or 'fieldToCopy'".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(SchemaError::MissingRequiredField(
                    "exactly one of 'typeCopyField' or 'fieldToCopy', not both".to_string(),
                ))
            }
        };

        let max_chars = match max_chars {
            None => None,
            Some(n) => Some(
                u32::try_from(n)
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(SchemaError::InvalidMaxChars(n))?,
            ),
        };

        Ok(Self {
            collection: collection.to_string(),
            source_field: field.to_string(),
            destination,
            max_chars,
        })
    }
}

/// A single planned copy-field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFieldPlan {
    pub collection: String,
    pub rule: CopyFieldRule,
    pub source_type: String,
    pub dest_type: String,
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan for CopyFieldPlan {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn commands(&self) -> &[MutationCommand] {
        &self.commands
    }

    fn summary(&self) -> String {
        let mut line = format!("copy field {} -> {}", self.rule.source, self.rule.dest);
        if let Some(max) = self.rule.max_chars {
            line.push_str(&format!(" (maxChars {max})"));
        }
        format!(
            "{} [{} -> {}] in '{}'",
            line,
            self.source_type,
            self.dest_type,
            self.collection
        )
    }
}

/// Result of bootstrapping a collection for free-text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoTextPlan {
    pub collection: String,
    pub catch_all_field: String,
    pub text_field_created: bool,
    pub global_rule: CopyFieldRule,
    pub global_rule_created: bool,
    /// Per-field suffix rules, excluding the global rule
    pub created_copy_fields: Vec<CopyFieldRule>,
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan for AutoTextPlan {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn commands(&self) -> &[MutationCommand] {
        &self.commands
    }

    fn summary(&self) -> String {
        if self.commands.is_empty() {
            return format!("'{}' is already set up for free-text search", self.collection);
        }
        let mut parts = Vec::new();
        if self.text_field_created {
            parts.push(format!("create field '{}'", self.catch_all_field));
        }
        if self.global_rule_created {
            parts.push(format!("copy * -> {}", self.catch_all_field));
        }
        if !self.created_copy_fields.is_empty() {
            parts.push(format!("{} typed copy field(s)", self.created_copy_fields.len()));
        }
        format!("'{}': {}", self.collection, parts.join(", "))
    }
}

/// Suffix of the typed copy generated for a field type, if any
///
/// Checked in order against the lowercased name, so `text_general_rev` maps
/// like `text_general`, `pdates` like `pdate` and `point` like `int`.
pub fn auto_copy_suffix(type_name: &str) -> Option<&'static str> {
    const SUFFIXES: [(&str, &str); 6] = [
        ("text_general", "_str"),
        ("date", "_dt"),
        ("double", "_d"),
        ("float", "_f"),
        ("long", "_l"),
        ("int", "_i"),
    ];

    let name = type_name.to_lowercase();
    SUFFIXES
        .iter()
        .find(|(marker, _)| name.contains(marker))
        .map(|(_, suffix)| *suffix)
}

/// Plans copy-field rules against a schema snapshot
#[derive(Debug, Clone, Default)]
pub struct CopyFieldPlanner {
    config: CopyFieldConfig,
}

impl CopyFieldPlanner {
    pub fn new(config: CopyFieldConfig) -> Self {
        Self { config }
    }

    /// Plan one explicit copy-field rule
    pub fn plan(&self, snapshot: &SchemaSnapshot, request: &CopyFieldRequest) -> Result<CopyFieldPlan> {
        let not_found = |field: String| SchemaError::FieldNotFound {
            collection: snapshot.collection.clone(),
            field,
        };

        let source = snapshot
            .get_field(&request.source_field)
            .ok_or_else(|| not_found(request.source_field.clone()))?;

        let (dest_name, dest_type, dest_multi) = match &request.destination {
            CopyDestination::ByDynamicSuffix(suffix) => {
                let dynamic = snapshot
                    .get_dynamic_field(suffix)
                    .ok_or_else(|| not_found(format!("*_{suffix}")))?;
                (
                    format!("{}_{}", source.name, suffix),
                    dynamic.field_type.as_str(),
                    effective_dynamic_multi_valued(dynamic, snapshot),
                )
            }
            CopyDestination::ByExplicitField(dest) => {
                let field = snapshot.get_field(dest).ok_or_else(|| not_found(dest.clone()))?;
                (
                    field.name.clone(),
                    field.field_type.as_str(),
                    effective_multi_valued(field, snapshot),
                )
            }
        };

        let source_multi = effective_multi_valued(source, snapshot);
        if !multi_valued_allows_copy(source_multi, dest_multi) {
            return Err(SchemaError::MultiValuedMismatch {
                source_field: source.name.clone(),
                dest_field: dest_name,
            });
        }

        let source_class = TypeClass::classify(&source.field_type);
        let dest_class = TypeClass::classify(dest_type);
        if !classes_are_copy_compatible(&source_class, &dest_class) {
            return Err(SchemaError::TypeIncompatible {
                source_type: source.field_type.clone(),
                dest_type: dest_type.to_string(),
            });
        }

        if snapshot.has_copy_field(&source.name, &dest_name) {
            return Err(SchemaError::DuplicateCopyFieldRule {
                source_field: source.name.clone(),
                dest_field: dest_name,
            });
        }

        let mut rule = CopyFieldRule::new(source.name.clone(), dest_name);
        if dest_class.is_text() {
            rule.max_chars = Some(request.max_chars.unwrap_or(self.config.default_max_chars));
        }

        Ok(CopyFieldPlan {
            collection: snapshot.collection.clone(),
            commands: vec![MutationCommand::AddCopyField(rule.clone())],
            rule,
            source_type: source.field_type.clone(),
            dest_type: dest_type.to_string(),
        })
    }

    /// Plan the catch-all text field, its global rule and per-field typed copies
    pub fn plan_auto_text(&self, snapshot: &SchemaSnapshot) -> AutoTextPlan {
        let catch_all = self.config.catch_all_field.as_str();
        let mut commands = Vec::new();

        let text_field_created = !snapshot.has_field(catch_all);
        if text_field_created {
            commands.push(MutationCommand::AddField(
                Field::new(catch_all, self.config.catch_all_type.clone())
                    .with_multi_valued(true)
                    .with_indexed(true)
                    .with_stored(false),
            ));
        }

        let global_rule = CopyFieldRule::new("*", catch_all);
        let global_rule_created = !snapshot.has_copy_field("*", catch_all);
        if global_rule_created {
            commands.push(MutationCommand::AddCopyField(global_rule.clone()));
        }

        let mut created_copy_fields = Vec::new();
        for field in &snapshot.fields {
            let internal = !self.config.internal_prefix.is_empty()
                && field.name.starts_with(&self.config.internal_prefix);
            if internal || field.name == catch_all {
                continue;
            }

            let dest_prefix = format!("{}_", field.name);
            let already_copied = snapshot
                .copy_fields
                .iter()
                .any(|c| c.source == field.name && c.dest.starts_with(&dest_prefix));
            if already_copied {
                debug!(field = %field.name, "Typed copy already present");
                continue;
            }

            let Some(suffix) = auto_copy_suffix(&field.field_type) else {
                debug!(field = %field.name, field_type = %field.field_type, "No typed copy for field type");
                continue;
            };

            let rule = CopyFieldRule::new(field.name.clone(), format!("{}{}", field.name, suffix));
            commands.push(MutationCommand::AddCopyField(rule.clone()));
            created_copy_fields.push(rule);
        }

        AutoTextPlan {
            collection: snapshot.collection.clone(),
            catch_all_field: catch_all.to_string(),
            text_field_created,
            global_rule,
            global_rule_created,
            created_copy_fields,
            commands,
        }
    }
}
