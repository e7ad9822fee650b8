use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stowage_collection::{Collection, Document, FindOptions, Reference};
use stowage_config::{CollectionOptions, ConfigFile, Environment};
use stowage_store::{LocalBackend, ObjectMetadata};

use crate::cli::*;

/// A schemaless JSON document whose id lives in its `"id"` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(pub Value);

impl Document for RawDocument {
    const COLLECTION: &'static str = "documents";

    fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    fn set_id(&mut self, id: String) {
        if let Value::Object(ref mut map) = self.0 {
            map.insert("id".into(), Value::String(id));
        }
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let collection = open_collection(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Put(args) => cmd_put(&collection, args, format).await,
        Command::Get(args) => cmd_get(&collection, args).await,
        Command::Head(args) => cmd_head(&collection, args, format).await,
        Command::Exists(args) => cmd_exists(&collection, args, format).await,
        Command::Rm(args) => cmd_rm(&collection, args, format).await,
        Command::Ls(args) => cmd_ls(&collection, args, format).await,
        Command::Bucket => {
            cmd_bucket(&collection, format);
            Ok(())
        }
    }
}

fn load_environment(cli: &Cli) -> anyhow::Result<Environment> {
    let env = match cli.config {
        Some(ref path) => ConfigFile::load(path)
            .with_context(|| format!("reading {}", path.display()))?
            .into_environment(),
        None => Environment::default(),
    };
    env.update_settings(|settings| settings.apply_env());
    Ok(env)
}

/// Build the collection named on the command line over the local store.
pub fn open_collection(cli: &Cli) -> anyhow::Result<Collection<RawDocument>> {
    let env = load_environment(cli)?;
    // Unregistered names still need a collection name to render the bucket.
    let overrides = if env.registry().resolve(&cli.collection).is_some() {
        CollectionOptions::default()
    } else {
        CollectionOptions::named(cli.collection.to_lowercase())
    };

    let backend = Arc::new(LocalBackend::new(&cli.root));
    let collection = Collection::builder(backend)
        .named(&cli.collection)
        .options(overrides)
        .prefix(cli.prefix.clone().unwrap_or_default())
        .build(&env)?;
    Ok(collection)
}

/// Parse a document argument: inline JSON, or `@path` to read a file.
pub fn read_document(arg: &str) -> anyhow::Result<Value> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => arg.to_string(),
    };
    let value: Value = serde_json::from_str(&raw).context("document is not valid JSON")?;
    if !value.is_object() {
        bail!("document must be a JSON object");
    }
    Ok(value)
}

async fn cmd_put(
    collection: &Collection<RawDocument>,
    args: PutArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut document = RawDocument(read_document(&args.document)?);
    document.set_id(args.id);
    let saved = collection.save(document).await?;
    let id = saved.id().unwrap_or_default();
    match format {
        OutputFormat::Json => println!("{}", json!({ "id": id, "key": collection.key_for(id) })),
        OutputFormat::Text => println!(
            "{} Stored {} in {}",
            "✓".green().bold(),
            id.yellow(),
            collection.bucket_name().bold()
        ),
    }
    Ok(())
}

async fn cmd_get(collection: &Collection<RawDocument>, args: IdArgs) -> anyhow::Result<()> {
    let document = collection.load(&args.id).await?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

async fn cmd_head(
    collection: &Collection<RawDocument>,
    args: IdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let Some(meta) = collection.head(&args.id).await? else {
        bail!("{} not found in {}", args.id, collection.bucket_name());
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&meta)?),
        OutputFormat::Text => print_metadata(&collection.key_for(&args.id), &meta),
    }
    Ok(())
}

fn print_metadata(key: &str, meta: &ObjectMetadata) {
    println!("{}", key.yellow().bold());
    println!("  Size: {} bytes", meta.size);
    println!("  Modified: {}", meta.last_modified.to_rfc3339());
    println!("  ETag: {}", meta.etag.dimmed());
    for (k, v) in &meta.tags {
        println!("  Tag: {}={}", k.cyan(), v);
    }
}

async fn cmd_exists(
    collection: &Collection<RawDocument>,
    args: IdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let exists = collection.exists(&args.id).await?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "id": args.id, "exists": exists })),
        OutputFormat::Text if exists => println!("{} {}", "✓".green().bold(), args.id.yellow()),
        OutputFormat::Text => println!("{} {} not found", "✗".red().bold(), args.id.yellow()),
    }
    Ok(())
}

async fn cmd_rm(
    collection: &Collection<RawDocument>,
    args: IdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let deleted = collection.delete(&args.id).await?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "id": args.id, "deleted": deleted })),
        OutputFormat::Text if deleted => println!("Deleted {}", args.id.yellow()),
        OutputFormat::Text => println!("Nothing to delete at {}", args.id.yellow()),
    }
    Ok(())
}

async fn cmd_ls(
    collection: &Collection<RawDocument>,
    args: LsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if args.all {
        let references = collection.find_all(&args.prefix).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&references)?),
            OutputFormat::Text => print_references(&references),
        }
        return Ok(());
    }

    let options = FindOptions {
        page_size: args.page_size,
        continuation_token: args.token,
    };
    let page = collection.find(&args.prefix, &options).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            print_references(&page.references);
            if let Some(ref token) = page.continuation_token {
                println!("\nMore results: --token {}", token.cyan());
            }
        }
    }
    Ok(())
}

fn print_references(references: &[Reference]) {
    if references.is_empty() {
        println!("No documents.");
        return;
    }
    for reference in references {
        println!(
            "{}  {}  {}",
            reference.id.yellow(),
            format!("{}B", reference.metadata.size).dimmed(),
            reference.metadata.last_modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn cmd_bucket(collection: &Collection<RawDocument>, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "collection": collection.config().name,
                "bucket": collection.bucket_name(),
                "prefix": collection.prefix(),
            })
        ),
        OutputFormat::Text => println!("{}", collection.bucket_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(root: &std::path::Path, args: &[&str]) -> Cli {
        let root = root.to_str().unwrap();
        let mut argv = vec!["stowage", "--root", root];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn raw_document_id_field() {
        let mut doc = RawDocument(json!({ "name": "x" }));
        assert_eq!(doc.id(), None);
        doc.set_id("7".into());
        assert_eq!(doc.id(), Some("7"));
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"id":"7","name":"x"}"#);
    }

    #[test]
    fn read_document_inline_and_file() {
        assert_eq!(read_document(r#"{"a":1}"#).unwrap(), json!({ "a": 1 }));
        assert!(read_document("[1,2]").is_err());
        assert!(read_document("{oops").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"b":true}"#).unwrap();
        let arg = format!("@{}", path.display());
        assert_eq!(read_document(&arg).unwrap(), json!({ "b": true }));
    }

    #[test]
    fn unregistered_collection_uses_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(dir.path(), &["-c", "Invoices", "--prefix", "2024/", "bucket"]);
        let collection = open_collection(&cli).unwrap();
        assert!(collection.bucket_name().ends_with("-invoices"));
        assert_eq!(collection.prefix(), "2024/");
    }

    #[test]
    fn registered_collection_keeps_configured_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("stowage.toml");
        std::fs::write(
            &config,
            "base_name = \"shop\"\nstage = \"qa\"\n[collections.orders]\nname = \"orders-v2\"\n",
        )
        .unwrap();
        let config = config.to_str().unwrap().to_string();
        let cli = cli(dir.path(), &["--config", &config, "-c", "orders", "bucket"]);
        let collection = open_collection(&cli).unwrap();
        assert_eq!(collection.config().name, "orders-v2");
        assert!(collection.bucket_name().ends_with("-orders-v2"));
    }

    #[tokio::test]
    async fn put_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        run_command(cli(dir.path(), &["put", "u1", r#"{"email":"a@b.c"}"#]))
            .await
            .unwrap();

        let collection = open_collection(&cli(dir.path(), &["bucket"])).unwrap();
        let doc = collection.load("u1").await.unwrap();
        assert_eq!(doc.0, json!({ "id": "u1", "email": "a@b.c" }));

        run_command(cli(dir.path(), &["put", "u2", r#"{"email":"c@d.e"}"#]))
            .await
            .unwrap();
        run_command(cli(dir.path(), &["ls", "--all"])).await.unwrap();
        let listed = collection.find_all("").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2"]);

        run_command(cli(dir.path(), &["rm", "u1"])).await.unwrap();
        assert!(!collection.exists("u1").await.unwrap());
        let remaining = collection.find_all("").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "u2");
    }

    #[tokio::test]
    async fn head_of_missing_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command(cli(dir.path(), &["head", "ghost"])).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
