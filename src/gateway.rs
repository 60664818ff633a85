//! Schema gateway
//!
//! The operations exposed to callers. Each one resolves the client, checks the
//! collections exist, loads fresh snapshots and hands them to the planners.
//! Planning never mutates anything; [`SchemaGateway::apply`] submits a plan.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{SchemaCatalog, SchemaEngine};
use crate::config::{CopyFieldConfig, GatewayConfig};
use crate::copy_field::{AutoTextPlan, CopyFieldPlan, CopyFieldPlanner, CopyFieldRequest};
use crate::engine::{ClientRegistry, SolrHttpEngine};
use crate::error::{Result, SchemaError};
use crate::reconcile::{ReconcilePlan, SchemaReconciler};
use crate::schema::{Field, MutationPlan, SchemaSnapshot};
use crate::validate::{Document, DocumentTypeValidator};

/// Outcome of submitting a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPlan {
    pub collection: String,
    pub summary: String,
    /// Number of commands sent; zero when the plan was empty
    pub submitted: usize,
    /// The collection's fields as read back after the mutation, `None` when
    /// the batch went through but the read-back failed
    pub all_fields: Option<Vec<Field>>,
}

fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SchemaError::MissingRequiredField(name.to_string()));
    }
    Ok(value)
}

/// Entry point for schema checks, planning and mutation
pub struct SchemaGateway<E: SchemaEngine> {
    registry: ClientRegistry,
    engine: E,
    planner: CopyFieldPlanner,
}

impl SchemaGateway<SolrHttpEngine> {
    /// Gateway over HTTP with the configured clients
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let engine = SolrHttpEngine::new(&config.engine)?;
        Ok(Self::new(
            config.client_registry(),
            engine,
            config.copy_fields.clone(),
        ))
    }
}

impl<E: SchemaEngine> SchemaGateway<E> {
    pub fn new(registry: ClientRegistry, engine: E, copy_fields: CopyFieldConfig) -> Self {
        Self {
            registry,
            engine,
            planner: CopyFieldPlanner::new(copy_fields),
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn catalog(&self, client: &str) -> Result<SchemaCatalog<'_, E>> {
        let endpoint = self.registry.resolve(require("client", client)?)?;
        Ok(SchemaCatalog::new(&self.engine, endpoint))
    }

    /// Fail with `CollectionNotFound` for the first collection the client lacks
    pub fn check_collections_exist(&self, client: &str, collections: &[&str]) -> Result<()> {
        let catalog = self.catalog(client)?;
        let wanted = collections
            .iter()
            .map(|c| require("collection", c))
            .collect::<Result<Vec<_>>>()?;

        let existing = catalog.collection_names()?;
        for collection in wanted {
            if !existing.iter().any(|name| name == collection) {
                warn!(client, collection, "Collection not found");
                return Err(SchemaError::CollectionNotFound {
                    collection: collection.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Load a snapshot after checking the collection exists
    pub fn load_schema(&self, client: &str, collection: &str) -> Result<SchemaSnapshot> {
        self.check_collections_exist(client, &[collection])?;
        self.catalog(client)?.load(collection.trim())
    }

    /// Plan the fields `target` needs to become a superset of `source`
    pub fn reconcile_fields(&self, client: &str, source: &str, target: &str) -> Result<ReconcilePlan> {
        self.check_collections_exist(client, &[source, target])?;
        let catalog = self.catalog(client)?;
        let source = catalog.load(source.trim())?;
        let target = catalog.load(target.trim())?;

        let plan = SchemaReconciler::new().reconcile(&source, &target);
        info!(client, "{}", plan.summary());
        Ok(plan)
    }

    /// Plan one explicit copy-field rule
    pub fn plan_copy_field(&self, client: &str, request: &CopyFieldRequest) -> Result<CopyFieldPlan> {
        let snapshot = self.load_schema(client, &request.collection)?;
        let plan = self.planner.plan(&snapshot, request)?;
        info!(client, "{}", plan.summary());
        Ok(plan)
    }

    /// Plan the catch-all text field and per-field typed copies
    pub fn plan_auto_text_fields(&self, client: &str, collection: &str) -> Result<AutoTextPlan> {
        let snapshot = self.load_schema(client, collection)?;
        let plan = self.planner.plan_auto_text(&snapshot);
        info!(client, "{}", plan.summary());
        Ok(plan)
    }

    /// Check documents against the collection's declared field types
    pub fn validate_documents(&self, client: &str, collection: &str, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Err(SchemaError::MissingRequiredField("docs".to_string()));
        }
        let snapshot = self.load_schema(client, collection)?;
        DocumentTypeValidator::new(&snapshot).validate(documents)?;
        info!(client, collection, count = documents.len(), "Documents match schema");
        Ok(())
    }

    /// Submit a plan to the collection it was planned against and read back
    /// the fields
    ///
    /// A failed read-back after a successful submit is logged and reported as
    /// missing fields, since the schema change has already happened.
    pub fn apply<P: MutationPlan + ?Sized>(&self, client: &str, plan: &P) -> Result<AppliedPlan> {
        let collection = require("collection", plan.collection())?;
        let endpoint = self.registry.resolve(require("client", client)?)?;
        let catalog = SchemaCatalog::new(&self.engine, endpoint);

        let batch = plan.batch();
        if !batch.is_empty() {
            info!(client, collection, commands = batch.len(), "Submitting schema batch");
            self.engine.post_schema(endpoint, collection, &batch.to_body()?)?;
        }

        let all_fields = match catalog.load_fields(collection) {
            Ok(fields) => Some(fields),
            Err(e) if !batch.is_empty() => {
                warn!(client, collection, error = %e, "Schema batch applied but fields could not be read back");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(AppliedPlan {
            collection: collection.to_string(),
            summary: plan.summary(),
            submitted: batch.len(),
            all_fields,
        })
    }
}
