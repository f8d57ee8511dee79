//! boxcat CLI
//!
//! Entry point for the `boxcat` command-line tool.

use std::path::{Path, PathBuf};
use std::process;

use boxcat::catalog;
use boxcat::{upload_box, Config, Overrides};
use boxcat_store::FsStore;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boxcat")]
#[command(about = "Box catalog maintenance for object-store releases", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args)]
struct StoreArgs {
    /// Path to config file (default: boxcat.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Root directory of the filesystem store
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// URL prefix for resolved object URLs
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the published catalog with the boxes in the store
    Sync {
        #[command(flatten)]
        store: StoreArgs,

        /// Output the run summary in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the published catalog
    Show {
        #[command(flatten)]
        store: StoreArgs,

        /// Output the raw manifest JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload a box with the metadata the catalog requires
    Upload {
        #[command(flatten)]
        store: StoreArgs,

        /// Path to the box file
        file: PathBuf,

        /// Release version to stamp on the box
        #[arg(long)]
        version: String,

        /// Provider name to stamp on the box (e.g. virtualbox)
        #[arg(long)]
        provider: String,

        /// Output the upload record in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { store, json } => run_sync(store, json),
        Commands::Show { store, json } => run_show(store, json),
        Commands::Upload {
            store,
            file,
            version,
            provider,
            json,
        } => run_upload(store, &file, &version, &provider, json),
    }
}

/// Resolve the effective config and open the store, exiting on failure.
fn open_store(args: StoreArgs) -> (Config, FsStore) {
    let overrides = Overrides {
        store_root: args.store_root,
        base_url: args.base_url,
    };
    let config = match Config::load(args.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    let store = match FsStore::new(&config.store_root, config.base_url.clone()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening store at {}: {}", config.store_root.display(), e);
            process::exit(1);
        }
    };

    (config, store)
}

fn run_sync(args: StoreArgs, json_output: bool) {
    let (config, store) = open_store(args);

    let summary = match boxcat::reconcile::run(
        &store,
        &config.catalog_name,
        &config.prefix,
        &config.manifest_key,
    ) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Sync failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", summary.to_human());
    }
}

fn run_show(args: StoreArgs, json_output: bool) {
    let (config, store) = open_store(args);

    let catalog = match catalog::load_or_bootstrap(&store, &config.manifest_key, &config.catalog_name)
    {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&catalog) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if catalog.is_empty() {
        println!("catalog '{}' has no versions.", catalog.name);
        return;
    }

    println!("catalog '{}' ({} boxes):\n", catalog.name, catalog.box_count());
    for version in &catalog.versions {
        println!("  {}", version.version);
        for provider in &version.providers {
            println!("    {} ({})", provider.name, provider.url);
            println!("      {}: {}", provider.checksum_type, provider.checksum);
        }
        println!();
    }
}

fn run_upload(args: StoreArgs, file: &Path, version: &str, provider: &str, json_output: bool) {
    let (config, store) = open_store(args);

    let uploaded = match upload_box(&store, &config.prefix, file, version, provider) {
        Ok(uploaded) => uploaded,
        Err(e) => {
            eprintln!("Upload failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&uploaded) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("uploaded {}", uploaded.key);
        println!("  url:    {}", uploaded.url);
        println!("  sha256: {}", uploaded.checksum);
        println!("  size:   {} bytes", uploaded.size);
        println!();
        println!("Run 'boxcat sync' to admit it to the catalog.");
    }
}
