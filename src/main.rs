//! D365 CRM proxy CLI
//!
//! Command line front end over the library. Connection settings come from
//! `D365_*` environment variables (a `.env` file is honored) or a TOML file
//! passed with `--config`; records are printed as JSON on stdout.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use d365_crm_proxy::{Config, CrmClient, Filter, OrderBy, QueryOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "d365-crm", version, about = "Query and modify Dynamics 365 CRM records")]
struct Cli {
    /// Read connection settings from a TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List records of a collection
    List {
        /// Entity set name, e.g. contacts
        collection: String,

        /// Comma-separated attributes for $select
        #[arg(long)]
        select: Option<String>,

        /// Raw OData $filter expression
        #[arg(long)]
        filter: Option<String>,

        /// Attribute to order by; append " desc" for descending
        #[arg(long)]
        orderby: Option<String>,

        /// Maximum number of records to return
        #[arg(long)]
        top: Option<usize>,

        /// Number of records to skip
        #[arg(long)]
        skip: Option<usize>,
    },

    /// Retrieve a single record by id
    Get {
        collection: String,
        id: String,

        /// Comma-separated attributes for $select
        #[arg(long)]
        select: Option<String>,
    },

    /// Create a record from a JSON payload, printing the new id
    Create {
        collection: String,

        /// JSON object using CRM attribute names
        #[arg(long)]
        data: String,
    },

    /// Apply a partial update from a JSON payload
    Update {
        collection: String,
        id: String,

        /// JSON object with the attributes to change
        #[arg(long)]
        data: String,
    },

    /// Delete a record
    Delete { collection: String, id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Log to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("failed to load config from environment")?,
    };

    tracing::info!("Connecting to {}", config.base_url);
    let client = CrmClient::from_config(&config);

    match cli.command {
        Command::List {
            collection,
            select,
            filter,
            orderby,
            top,
            skip,
        } => {
            let mut options = QueryOptions::new();
            if let Some(select) = select {
                options = options.select(split_fields(&select));
            }
            if let Some(filter) = filter {
                options = options.filter(Filter::raw(filter));
            }
            if let Some(orderby) = orderby {
                options = options.order_by(parse_orderby(&orderby));
            }
            if let Some(top) = top {
                options = options.top(top);
            }
            if let Some(skip) = skip {
                options = options.skip(skip);
            }

            let page = client.list_raw(&collection, &options).await?;
            println!("{}", serde_json::to_string_pretty(&page.value)?);
            if let Some(link) = page.next_link {
                tracing::info!("More records available: {}", link);
            }
        }

        Command::Get {
            collection,
            id,
            select,
        } => {
            let mut options = QueryOptions::new();
            if let Some(select) = select {
                options = options.select(split_fields(&select));
            }

            let record = client.retrieve_raw(&collection, &id, &options).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Create { collection, data } => {
            let body: serde_json::Value =
                serde_json::from_str(&data).context("--data must be a JSON object")?;
            let id = client.create_raw(&collection, &body).await?;
            println!("{}", id);
        }

        Command::Update {
            collection,
            id,
            data,
        } => {
            let body: serde_json::Value =
                serde_json::from_str(&data).context("--data must be a JSON object")?;
            client.update_raw(&collection, &id, &body).await?;
            tracing::info!("Updated {}({})", collection, id);
        }

        Command::Delete { collection, id } => {
            client.delete_raw(&collection, &id).await?;
            tracing::info!("Deleted {}({})", collection, id);
        }
    }

    Ok(())
}

fn split_fields(list: &str) -> Vec<String> {
    list.split(',')
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}

fn parse_orderby(raw: &str) -> OrderBy {
    match raw.strip_suffix(" desc") {
        Some(field) => OrderBy::desc(field.trim()),
        None => OrderBy::asc(raw.trim_end_matches(" asc").trim()),
    }
}
