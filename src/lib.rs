//! Solr Schema Sync
//!
//! Schema-aware validation and cross-collection synchronization for collections
//! hosted on a Solr-compatible search engine.
//!
//! ## Features
//!
//! - **Live Schemas**: Fields, dynamic fields, field types and copy fields are read
//!   fresh from the engine for every operation
//! - **Type Compatibility**: Checks document values and copy-field type pairs
//! - **Reconciliation**: Makes a target collection's fields a superset of a source's
//! - **Copy Fields**: Plans explicit rules and bootstraps a catch-all text field
//! - **Batched Mutations**: Every plan is submitted as one schema request
//!
//! ## Architecture
//!
//! ```text
//! SchemaGateway
//! ├── ClientRegistry        client name -> host/port
//! ├── SchemaEngine          HTTP transport (SolrHttpEngine)
//! │   └── SchemaCatalog     -> SchemaSnapshot
//! ├── SchemaReconciler      -> ReconcilePlan
//! ├── CopyFieldPlanner      -> CopyFieldPlan / AutoTextPlan
//! └── DocumentTypeValidator
//! ```

pub mod catalog;
pub mod compatibility;
pub mod config;
pub mod copy_field;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod schema;
pub mod validate;

pub use catalog::{SchemaCatalog, SchemaEngine, SchemaResource};
pub use compatibility::{types_are_copy_compatible, value_matches_type, TypeClass, TypeFamily};
pub use config::GatewayConfig;
pub use copy_field::{AutoTextPlan, CopyDestination, CopyFieldPlan, CopyFieldPlanner, CopyFieldRequest};
pub use engine::{ClientRegistry, Endpoint, SolrHttpEngine};
pub use error::{Result, SchemaError};
pub use gateway::{AppliedPlan, SchemaGateway};
pub use reconcile::{ReconcilePlan, SchemaReconciler};
pub use schema::{
    CopyFieldRule, DynamicField, Field, FieldType, MutationCommand, MutationPlan, SchemaBatch,
    SchemaSnapshot,
};
pub use validate::{Document, DocumentTypeValidator};
