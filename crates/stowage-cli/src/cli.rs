use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stowage",
    about = "Inspect and edit document collections in a local object store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Root directory of the local object store
    #[arg(long, global = true, default_value = ".stowage")]
    pub root: PathBuf,

    /// TOML configuration file (settings and registered collections)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logical collection name
    #[arg(short, long, global = true, default_value = "documents")]
    pub collection: String,

    /// Key prefix to scope the collection under
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a JSON document (inline, or @path to read a file)
    Put(PutArgs),
    /// Print a stored document
    Get(IdArgs),
    /// Show a document's metadata
    Head(IdArgs),
    /// Check whether a document exists
    Exists(IdArgs),
    /// Delete a document
    Rm(IdArgs),
    /// List document references
    Ls(LsArgs),
    /// Print the resolved bucket name
    Bucket,
}

#[derive(Args)]
pub struct PutArgs {
    pub id: String,
    pub document: String,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = "")]
    pub prefix: String,
    #[arg(short = 'n', long)]
    pub page_size: Option<usize>,
    /// Continuation token from a previous listing
    #[arg(long, conflicts_with = "all")]
    pub token: Option<String>,
    /// Follow continuation tokens until the listing is exhausted
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stowage", "ls", "a/", "-n", "2", "--root", "/tmp/store", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/store"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.collection, "documents");
        match cli.command {
            Command::Ls(args) => {
                assert_eq!(args.prefix, "a/");
                assert_eq!(args.page_size, Some(2));
                assert!(!args.all);
            }
            _ => panic!("expected ls"),
        }
    }

    #[test]
    fn token_conflicts_with_all() {
        assert!(Cli::try_parse_from(["stowage", "ls", "--all", "--token", "ab"]).is_err());
    }

    #[test]
    fn put_takes_id_and_document() {
        let cli = Cli::try_parse_from(["stowage", "-c", "users", "put", "42", "{}"]).unwrap();
        assert_eq!(cli.collection, "users");
        assert!(matches!(cli.command, Command::Put(ref a) if a.id == "42" && a.document == "{}"));
    }
}
