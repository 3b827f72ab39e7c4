use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use nodm_store::{BackendRegistry, Filter, StorageBackend, StoreConfig};
use serde_json::{json, Value};
use tracing::warn;

use crate::cli::*;

pub fn run_command(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let backend = open_store(&cli.stores, cli.config.as_deref())?;
    let store: &dyn StorageBackend = &*backend;
    match cli.command {
        Command::Names(args) => cmd_names(store, args, cli.format, out),
        Command::Get(args) => cmd_get(store, args, cli.format, out),
        Command::Put(args) => cmd_put(store, args, cli.format, out),
    }
}

/// `--store` URIs win over `--config`; with neither, the default config.
fn open_store(stores: &[String], config: Option<&Path>) -> anyhow::Result<Box<dyn StorageBackend>> {
    let registry = BackendRegistry::default();
    if !stores.is_empty() {
        return registry
            .open_all(stores)
            .with_context(|| format!("cannot open store {}", stores.join(", ")));
    }
    let config = match config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => {
            warn!("no --store or --config given; using a throwaway in-memory store");
            StoreConfig::default()
        }
    };
    config
        .open(&registry)
        .with_context(|| format!("cannot open store {}", config.backends.join(", ")))
}

/// `PATH=VALUE`, with VALUE parsed as JSON and falling back to a string.
fn parse_condition(raw: &str) -> anyhow::Result<(String, Value)> {
    let Some((path, value)) = raw.split_once('=') else {
        bail!("condition {raw:?} is not of the form PATH=VALUE");
    };
    if path.is_empty() {
        bail!("condition {raw:?} has an empty path");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((path.to_string(), value))
}

fn cmd_names(
    store: &dyn StorageBackend,
    args: NamesArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let filter = args
        .conditions
        .iter()
        .map(|c| parse_condition(c))
        .try_fold(Filter::new(), |f, c| c.map(|(path, value)| f.eq(path, value)))?;
    let filter = (!filter.is_empty()).then_some(filter);
    let names = store
        .query_names(&args.section, filter.as_ref())
        .with_context(|| format!("cannot list section {}", args.section))?;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&names)?)?,
        OutputFormat::Text if names.is_empty() => {
            writeln!(out, "No names in {}.", args.section.bold())?
        }
        OutputFormat::Text => {
            for name in &names {
                writeln!(out, "{name}")?;
            }
        }
    }
    Ok(())
}

fn cmd_get(
    store: &dyn StorageBackend,
    args: GetArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let record = store
        .get_item(&args.section, &args.name)
        .with_context(|| format!("cannot read {}/{}", args.section, args.name))?;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&record)?)?,
        OutputFormat::Text => {
            writeln!(out, "{}/{}", args.section.cyan(), args.name.yellow().bold())?;
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
        }
    }
    Ok(())
}

fn cmd_put(
    store: &dyn StorageBackend,
    args: PutArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(&args.record).context("record is not valid JSON")?;
    let Value::Object(record) = value else {
        bail!("record must be a JSON object");
    };
    store
        .set_item(&args.section, &args.name, &record)
        .with_context(|| format!("cannot write {}/{}", args.section, args.name))?;

    match format {
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({"section": args.section, "name": args.name, "stored": true})
        )?,
        OutputFormat::Text => writeln!(
            out,
            "{} Stored {}/{}",
            "✓".green().bold(),
            args.section.cyan(),
            args.name.yellow()
        )?,
    }
    Ok(())
}
