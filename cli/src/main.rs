//! couchrest CLI: run adapter calls against a document store from the terminal.
//!
//! Usage:
//! ```bash
//! # Read the default view of a collection
//! couchrest find --collection users
//!
//! # Look up one document
//! couchrest find --collection users --where '{"id":"u1"}'
//!
//! # Create, update, destroy
//! couchrest create  --collection users --values '{"name":"ann"}'
//! couchrest update  --collection users --where '{"id":"u1"}' --values '{"name":"bo"}'
//! couchrest destroy --collection users --where '{"id":"u1"}'
//! ```

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use couchrest_core::{Adapter, CollectionDescriptor, CollectionOptions, Criteria, FanOut};
use couchrest_http::HttpTransport;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "find" => cmd_find(&args[2..]).await,
        "create" => cmd_create(&args[2..]).await,
        "update" => cmd_update(&args[2..]).await,
        "destroy" => cmd_destroy(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("couchrest {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("couchrest {}", env!("CARGO_PKG_VERSION"));
    println!("Run CRUD calls against a CouchDB-style document store\n");
    println!("USAGE:");
    println!("    couchrest <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    find       Find documents (default view when no --where)");
    println!("    create     Create a document from --values");
    println!("    update     Update matching documents with --values");
    println!("    destroy    Delete matching documents");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --collection <NAME>  Collection name            [required]");
    println!("    --config <FILE>      JSON file of collection options");
    println!("    --host <HOST>        Store hostname             [default: localhost]");
    println!("    --port <PORT>        Store port                 [default: 5984]");
    println!("    --protocol <PROTO>   http or https              [default: http]");
    println!("    --database <NAME>    Database name              [default: sails]");
    println!("    --user <USER>        Basic-auth user");
    println!("    --password <PASS>    Basic-auth password");
    println!("    --where <JSON>       Criteria where clause");
    println!("    --values <JSON>      Document payload\n");
    println!("Set RUST_LOG=debug to see outbound requests.");
}

async fn cmd_find(args: &[String]) -> anyhow::Result<()> {
    let (adapter, collection) = connect(args).await?;
    let records = adapter.find(&collection, criteria(args)?).await?;
    print_json(&Value::Array(records))
}

async fn cmd_create(args: &[String]) -> anyhow::Result<()> {
    let (adapter, collection) = connect(args).await?;
    let values = values(args)?.ok_or_else(|| anyhow!("--values is required"))?;
    let out = adapter.create(&collection, values).await?;
    print_json(&Value::Array(out.into_records()))
}

async fn cmd_update(args: &[String]) -> anyhow::Result<()> {
    let (adapter, collection) = connect(args).await?;
    let values = values(args)?.ok_or_else(|| anyhow!("--values is required"))?;
    let out = adapter.update(&collection, criteria(args)?, values).await?;
    print_fan_out(out)
}

async fn cmd_destroy(args: &[String]) -> anyhow::Result<()> {
    let (adapter, collection) = connect(args).await?;
    let criteria = criteria(args)?.ok_or_else(|| anyhow!("--where is required"))?;
    let out = adapter.destroy(&collection, Some(criteria)).await?;
    print_fan_out(out)
}

/// Build the adapter and register the collection named by `--collection`.
async fn connect(args: &[String]) -> anyhow::Result<(Adapter, String)> {
    let collection = parse_flag(args, "--collection").ok_or_else(|| anyhow!("--collection is required"))?;

    let mut options = match parse_flag(args, "--config") {
        Some(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<CollectionOptions>(&text).with_context(|| format!("parsing {path}"))?
        }
        None => CollectionOptions::default(),
    };
    if let Some(host) = parse_flag(args, "--host") {
        options.hostname = Some(host);
    }
    if let Some(port) = parse_flag(args, "--port") {
        options.port = Some(port.parse().with_context(|| format!("invalid --port {port}"))?);
    }
    if let Some(protocol) = parse_flag(args, "--protocol") {
        options.protocol = Some(protocol);
    }
    if let Some(database) = parse_flag(args, "--database") {
        options.database = Some(database);
    }
    if let Some(user) = parse_flag(args, "--user") {
        options.user = Some(user);
    }
    if let Some(password) = parse_flag(args, "--password") {
        options.password = Some(password);
    }

    let adapter = Adapter::new(Arc::new(HttpTransport::with_defaults()?));
    adapter.register_collection(CollectionDescriptor::new(&collection).with_options(options))?;
    Ok((adapter, collection))
}

fn criteria(args: &[String]) -> anyhow::Result<Option<Criteria>> {
    let Some(raw) = parse_flag(args, "--where") else {
        return Ok(None);
    };
    Ok(Some(Criteria::matching(json_object(&raw, "--where")?)))
}

fn values(args: &[String]) -> anyhow::Result<Option<Map<String, Value>>> {
    parse_flag(args, "--values")
        .map(|raw| json_object(&raw, "--values"))
        .transpose()
}

fn json_object(raw: &str, flag: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("{flag} is not valid JSON"))? {
        Value::Object(map) => Ok(map),
        _ => bail!("{flag} must be a JSON object"),
    }
}

fn print_fan_out(out: FanOut) -> anyhow::Result<()> {
    for failure in &out.failures {
        eprintln!(
            "failed: {} ({})",
            failure.id.as_deref().unwrap_or("<no id>"),
            failure.error
        );
    }
    let complete = out.is_complete();
    print_json(&Value::Array(out.records))?;
    if !complete {
        bail!("some documents could not be processed");
    }
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
