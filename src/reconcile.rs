//! Field reconciliation between collections
//!
//! Makes a target collection's field set a superset of a source collection's.
//! Existing target fields are never altered or removed.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::schema::{Field, MutationCommand, MutationPlan, SchemaSnapshot};

/// Commands needed to bring a target up to a source's field set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub source_collection: String,
    pub target_collection: String,
    /// Names of the fields to add, in source schema order
    pub added_fields: Vec<String>,
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan for ReconcilePlan {
    fn collection(&self) -> &str {
        &self.target_collection
    }

    fn commands(&self) -> &[MutationCommand] {
        &self.commands
    }

    fn summary(&self) -> String {
        if self.added_fields.is_empty() {
            format!(
                "'{}' already has every field of '{}'",
                self.target_collection, self.source_collection
            )
        } else {
            format!(
                "{} field(s) added to '{}' from '{}': {}",
                self.added_fields.len(),
                self.target_collection,
                self.source_collection,
                self.added_fields.join(", ")
            )
        }
    }
}

/// Diffs two snapshots by field name
#[derive(Debug, Default)]
pub struct SchemaReconciler;

impl SchemaReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Plan an `AddField` for every source field missing from the target
    ///
    /// Only flags the source declares explicitly are carried over; the rest
    /// are inherited from the field type on the target.
    pub fn reconcile(&self, source: &SchemaSnapshot, target: &SchemaSnapshot) -> ReconcilePlan {
        let existing: HashSet<&str> = target.fields.iter().map(|f| f.name.as_str()).collect();
        let mut plan = ReconcilePlan {
            source_collection: source.collection.clone(),
            target_collection: target.collection.clone(),
            ..Default::default()
        };

        for field in &source.fields {
            if existing.contains(field.name.as_str()) {
                continue;
            }
            debug!(field = %field.name, target = %target.collection, "Field missing from target");
            plan.added_fields.push(field.name.clone());
            plan.commands.push(MutationCommand::AddField(Field {
                name: field.name.clone(),
                field_type: field.field_type.clone(),
                multi_valued: field.multi_valued,
                stored: field.stored,
                indexed: field.indexed,
            }));
        }

        plan
    }
}
