//! # doctree CLI
//!
//! ```bash
//! doctree --config ./doctree.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `doctree map` | Connector-drawn content map in reading order |
//! | `doctree list` | Documents in reading order with weights |
//! | `doctree show <path>` | Everything known about one node |
//! | `doctree siblings <path>` | Documents next to a document |
//! | `doctree resolve <ref> --from <path>` | Resolve a link as written in a document |
//! | `doctree validate` | Lint, link, and image checks |
//! | `doctree status --target <lang>` | Translation staleness |
//!
//! Without `--config`, `./doctree.toml` is used when present; otherwise
//! the current directory is the content root with default settings.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::debug;

use doctree::commands::{self, ValidateArgs};
use doctree::config::{self, Config};
use doctree::logging;
use doctree::validate::{Category, Severity};

const DEFAULT_CONFIG: &str = "./doctree.toml";

/// doctree: a language-aware content tree for markdown documentation.
#[derive(Parser)]
#[command(
    name = "doctree",
    about = "Language-aware content tree for markdown docs: ordering, link resolution, validation",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults to `./doctree.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content root, overriding `[content].root`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Language of the tree, overriding `[content].language`.
    #[arg(long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the content map.
    Map {
        /// List each document's images beneath it.
        #[arg(long)]
        images: bool,
    },

    /// List documents in reading order as `path<TAB>weight<TAB>title`.
    List {
        /// Only the subtree at this logical path.
        #[arg(long)]
        from: Option<String>,
    },

    /// Show one node: source path, language, weight, hash, frontmatter,
    /// and extracted references.
    Show {
        /// Logical path (e.g. `docs/guide`).
        path: String,
    },

    /// List the documents sharing a parent with PATH.
    Siblings { path: String },

    /// Resolve a reference as written in a document.
    ///
    /// Exits non-zero when the reference does not resolve in the tree.
    Resolve {
        reference: String,

        /// Logical path of the referring document.
        #[arg(long)]
        from: String,
    },

    /// Validate documents (all of them when no PATH is given).
    ///
    /// Exits non-zero when any error-severity issue remains after
    /// filtering.
    Validate {
        /// Logical paths to validate.
        paths: Vec<String>,

        #[arg(long, value_enum)]
        min_severity: Option<Severity>,

        /// Only report these categories (repeatable).
        #[arg(long = "category", value_enum)]
        categories: Vec<Category>,

        /// Skip remote link and image checks.
        #[arg(long)]
        no_remote: bool,

        /// Skip references matching this regex (repeatable).
        #[arg(long)]
        ignore: Vec<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare every document with its translation in LANG.
    Status {
        #[arg(long)]
        target: String,
    },
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))?
        }
        None => Config::minimal("."),
    };
    if let Some(root) = &cli.root {
        cfg.content.root = root.clone();
    }
    if let Some(language) = &cli.language {
        // Untagged files keep the configured language.
        cfg.content.default_language = Some(cfg.content.default_language().to_string());
        cfg.content.language = language.clone();
    }
    config::validate_config(&cfg)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    logging::init_logging(&cfg.logging)?;
    debug!(
        root = %cfg.content.root.display(),
        language = %cfg.content.language,
        default_language = %cfg.content.default_language(),
        "configuration loaded"
    );

    let tree = commands::open_tree(&cfg, &cfg.content.language).await?;

    match cli.command {
        Commands::Map { images } => commands::run_map(&tree, images),
        Commands::List { from } => commands::run_list(&tree, from.as_deref())?,
        Commands::Show { path } => commands::run_show(&tree, &path)?,
        Commands::Siblings { path } => commands::run_siblings(&tree, &path)?,
        Commands::Resolve { reference, from } => commands::run_resolve(&tree, &reference, &from)?,
        Commands::Validate {
            paths,
            min_severity,
            categories,
            no_remote,
            ignore,
            json,
        } => {
            let args = ValidateArgs {
                paths,
                min_severity,
                categories,
                no_remote,
                ignore,
                json,
            };
            if commands::run_validate(&tree, &cfg, &args).await? {
                std::process::exit(1);
            }
        }
        Commands::Status { target } => commands::run_status(&cfg, &tree, &target).await?,
    }

    Ok(())
}
