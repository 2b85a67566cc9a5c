//! AtlasDoc CLI Client
//!
//! Command-line interface for interacting with AtlasDoc.

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use atlasdoc::{AtlasError, Client, Filter, Result};

/// AtlasDoc CLI
#[derive(Parser, Debug)]
#[command(name = "atlasdoc-cli")]
#[command(about = "CLI for the AtlasDoc document store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// List all collections
    ListCollections,

    /// Create a new collection
    CreateCollection {
        /// Collection name
        collection: String,
    },

    /// Delete a collection and all its documents
    DeleteCollection {
        /// Collection name
        collection: String,
    },

    /// List all documents in a collection
    ListDocuments {
        /// Collection name
        collection: String,
    },

    /// Print a document
    GetDocument {
        collection: String,
        document: String,
    },

    /// Create a document in a collection
    CreateDocument {
        collection: String,
        document: String,
        /// JSON object, e.g. '{"name":"alice"}'
        json: String,
    },

    /// Merge fields into an existing document
    UpdateDocument {
        collection: String,
        document: String,
        /// JSON object with the fields to overwrite
        json: String,
    },

    /// Delete a document
    DeleteDocument {
        collection: String,
        document: String,
    },

    /// Print documents whose fields equal the given values
    Filter {
        collection: String,
        /// Conditions as field=value (value parsed as JSON, else a string)
        conditions: Vec<String>,
    },
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    tracing::debug!("Connecting to {}", args.server);
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
        Commands::ListCollections => {
            for name in client.list_collections()? {
                println!("{}", name);
            }
        }
        Commands::CreateCollection { collection } => {
            client.create_collection(&collection)?;
            println!("Collection {} created", collection);
        }
        Commands::DeleteCollection { collection } => {
            client.delete_collection(&collection)?;
            println!("Collection {} deleted", collection);
        }
        Commands::ListDocuments { collection } => {
            for name in client.list_documents(&collection)? {
                println!("{}", name);
            }
        }
        Commands::GetDocument {
            collection,
            document,
        } => {
            let doc = client.get_document(&collection, &document)?;
            print_json(&Value::Object(doc));
        }
        Commands::CreateDocument {
            collection,
            document,
            json,
        }
        | Commands::UpdateDocument {
            collection,
            document,
            json,
        } => {
            let payload = parse_payload(&json)?;
            let doc = client.put_document(&collection, &document, payload)?;
            print_json(&Value::Object(doc));
        }
        Commands::DeleteDocument {
            collection,
            document,
        } => {
            client.delete_document(&collection, &document)?;
            println!("Document {} deleted from {}", document, collection);
        }
        Commands::Filter {
            collection,
            conditions,
        } => {
            let filter = parse_filter(&conditions)?;
            for doc in client.filter_documents(&collection, filter)? {
                print_json(&Value::Object(doc));
            }
        }
    }

    Ok(())
}

fn parse_payload(json: &str) -> Result<Value> {
    serde_json::from_str(json).map_err(|e| AtlasError::InvalidPayload(e.to_string()))
}

/// `age=30 name=bob active=true` → {"age": 30, "name": "bob", "active": true}
fn parse_filter(conditions: &[String]) -> Result<Filter> {
    conditions.iter().try_fold(Filter::new(), |filter, condition| {
        let (field, raw) = condition.split_once('=').ok_or_else(|| {
            AtlasError::InvalidPayload(format!("expected field=value, got {:?}", condition))
        })?;
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v) if !v.is_array() && !v.is_object() => v,
            _ => Value::String(raw.to_string()),
        };
        filter.with(field, value)
    })
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
