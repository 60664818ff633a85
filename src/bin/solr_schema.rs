//! Solr Schema CLI
//!
//! Checks collections, plans schema changes and validates documents against a
//! collection's live schema. Plans are only submitted with `--apply`.
//!
//! Usage:
//!   solr-schema reconcile --client acme --source products --target products_v2
//!   solr-schema copy-field --client acme --collection products --field title --suffix txt --apply
//!   solr-schema --help

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use solr_schema_sync::validate::documents_from_value;
use solr_schema_sync::{
    CopyFieldRequest, GatewayConfig, MutationPlan, SchemaEngine, SchemaGateway,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solr-schema")]
#[command(about = "Validate documents and synchronize Solr collection schemas")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that collections exist for a client
    Check {
        #[arg(long)]
        client: String,
        /// Collection names
        #[arg(required = true)]
        collections: Vec<String>,
    },

    /// Add the fields of one collection that another is missing
    Reconcile {
        #[arg(long)]
        client: String,
        /// Collection to copy field definitions from
        #[arg(long)]
        source: String,
        /// Collection that receives missing fields
        #[arg(long)]
        target: String,
        /// Submit the plan instead of only printing it
        #[arg(long)]
        apply: bool,
    },

    /// Add one copy-field rule
    CopyField {
        #[arg(long)]
        client: String,
        #[arg(long)]
        collection: String,
        /// Source field
        #[arg(long)]
        field: String,
        /// Dynamic field suffix, e.g. "txt" for *_txt
        #[arg(long)]
        suffix: Option<String>,
        /// Existing destination field
        #[arg(long)]
        dest: Option<String>,
        /// maxChars for text destinations
        #[arg(long, allow_negative_numbers = true)]
        max_chars: Option<i64>,
        #[arg(long)]
        apply: bool,
    },

    /// Set up the catch-all text field and typed copies
    AutoText {
        #[arg(long)]
        client: String,
        #[arg(long)]
        collection: String,
        #[arg(long)]
        apply: bool,
    },

    /// Validate documents from a JSON file
    Validate {
        #[arg(long)]
        client: String,
        #[arg(long)]
        collection: String,
        /// JSON file holding one document or an array of documents
        #[arg(long)]
        docs: PathBuf,
    },

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        #[arg(default_value = "solr-schema.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = GatewayConfig::load_from(cli.config.as_deref().and_then(Path::to_str))
        .context("loading configuration")?;
    let format = cli.format;

    let connect = || SchemaGateway::from_config(&config);

    match cli.command {
        Commands::Config { action } => run_config(&config, action, format)?,

        Commands::Check { client, collections } => {
            let gateway = connect()?;
            let names: Vec<&str> = collections.iter().map(String::as_str).collect();
            gateway.check_collections_exist(&client, &names)?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "client": client,
                    "collections": collections,
                    "exist": true,
                }))?,
                OutputFormat::Text => {
                    for name in &collections {
                        println!("✅ {} exists for client {}", name, client);
                    }
                }
            }
        }

        Commands::Reconcile { client, source, target, apply } => {
            let gateway = connect()?;
            let plan = gateway.reconcile_fields(&client, &source, &target)?;
            emit_plan(&gateway, &client, &plan, apply, format)?;
        }

        Commands::CopyField {
            client,
            collection,
            field,
            suffix,
            dest,
            max_chars,
            apply,
        } => {
            let request = CopyFieldRequest::from_parts(
                &collection,
                &field,
                suffix.as_deref(),
                dest.as_deref(),
                max_chars,
            )?;
            let gateway = connect()?;
            let plan = gateway.plan_copy_field(&client, &request)?;
            emit_plan(&gateway, &client, &plan, apply, format)?;
        }

        Commands::AutoText { client, collection, apply } => {
            let gateway = connect()?;
            let plan = gateway.plan_auto_text_fields(&client, &collection)?;
            emit_plan(&gateway, &client, &plan, apply, format)?;
        }

        Commands::Validate { client, collection, docs } => {
            let content = std::fs::read_to_string(&docs)
                .with_context(|| format!("reading {}", docs.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", docs.display()))?;
            let documents = documents_from_value(value)?;
            let gateway = connect()?;

            gateway.validate_documents(&client, &collection, &documents)?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "collection": collection,
                    "documents": documents.len(),
                    "valid": true,
                }))?,
                OutputFormat::Text => println!(
                    "✅ {} document(s) match the schema of {}",
                    documents.len(),
                    collection
                ),
            }
        }
    }

    Ok(())
}

fn run_config(config: &GatewayConfig, action: ConfigAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => match format {
            OutputFormat::Json => print_json(config)?,
            OutputFormat::Text => print!("{}", toml::to_string_pretty(config)?),
        },
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path_str = path
                .to_str()
                .with_context(|| format!("non UTF-8 path {}", path.display()))?;
            GatewayConfig::default().save(path_str)?;
            println!("📝 Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}

fn emit_plan<E, P>(
    gateway: &SchemaGateway<E>,
    client: &str,
    plan: &P,
    apply: bool,
    format: OutputFormat,
) -> anyhow::Result<()>
where
    E: SchemaEngine,
    P: MutationPlan + Serialize,
{
    let applied = if apply {
        Some(gateway.apply(client, plan)?)
    } else {
        None
    };

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "plan": plan,
            "applied": applied,
        }));
    }

    println!("📋 {}", plan.summary());
    for command in plan.commands() {
        println!("   └─ {}", command.describe());
    }

    match applied {
        Some(applied) if applied.submitted > 0 => match applied.all_fields {
            Some(fields) => println!(
                "✅ Submitted {} command(s) to {}; it now has {} field(s)",
                applied.submitted,
                applied.collection,
                fields.len()
            ),
            None => println!(
                "⚠️  Submitted {} command(s) to {} but could not read its fields back",
                applied.submitted, applied.collection
            ),
        },
        Some(_) => println!("✅ Nothing to submit"),
        None if !plan.is_empty() => println!("\n💡 Run again with --apply to submit these changes"),
        None => {}
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
