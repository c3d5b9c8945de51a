//! Vistazo CLI - build image indexes and query them locally.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use vistazo_core::DominantColorStrategy;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid preset, strategy or option)
  65  Data error (undecodable image, corrupt index)
  66  Input missing (file not found, index not built)
  69  Vector search unavailable
  74  I/O error (cannot write output)";

#[derive(Parser)]
#[command(name = "vistazo")]
#[command(author, version, about = "Visual similarity search for product images", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that extract signatures.
#[derive(Args, Clone)]
struct SignatureArgs {
    /// Dominant color strategy: bins or central
    #[arg(long, default_value = "bins")]
    color_strategy: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index snapshot from a directory of images
    Index {
        /// Root directory to scan recursively
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Where to write the snapshot
        #[arg(short, long, default_value = "index.json")]
        output: PathBuf,

        /// Catalog JSON used to infer product ids from folder names
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        signature: SignatureArgs,
    },

    /// Find catalog images similar to a query image
    Search {
        /// Query image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Index snapshot to search
        #[arg(short, long, default_value = "index.json")]
        index: PathBuf,

        /// Scoring preset: strict, permissive or vertex-fallback
        #[arg(short, long, default_value = "strict")]
        preset: String,

        /// Override the preset's acceptance threshold
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Maximum number of products to return
        #[arg(short, long, default_value_t = vistazo_core::DEFAULT_LIMIT)]
        limit: usize,

        /// Catalog JSON used to show product names
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        signature: SignatureArgs,
    },

    /// Print the signature of an image
    Hash {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Print the signature as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        signature: SignatureArgs,
    },

    /// Score two images against each other
    Compare {
        #[arg(value_name = "QUERY")]
        query: PathBuf,

        #[arg(value_name = "CANDIDATE")]
        candidate: PathBuf,

        /// Scoring preset: strict, permissive or vertex-fallback
        #[arg(short, long, default_value = "strict")]
        preset: String,

        #[command(flatten)]
        signature: SignatureArgs,
    },

    /// Query the external vector search service with an embedding file
    Vector {
        /// JSON embedding (array, {embedding}, {imageEmbedding} or {predictions})
        #[arg(value_name = "EMBEDDING")]
        embedding: PathBuf,

        /// Number of neighbors to request
        #[arg(short = 'n', long)]
        neighbors: Option<usize>,

        /// Query color; neighbors with another color are ranked lower
        #[arg(long)]
        color: Option<String>,

        /// Query image for the local fallback
        #[arg(long)]
        image: Option<PathBuf>,

        /// Index snapshot for the local fallback
        #[arg(short, long, default_value = "index.json")]
        index: PathBuf,

        /// L2-normalize the embedding before querying
        #[arg(long)]
        normalize: bool,

        /// Seconds to wait for the service
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

impl SignatureArgs {
    fn strategy(&self) -> Result<DominantColorStrategy> {
        Ok(self.color_strategy.parse()?)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose);

    if let Err(err) = run(cli.command).await {
        let exit = ExitCode::from_anyhow(&err);
        eprintln!("Error: {}", exit.message);
        std::process::exit(exit.code);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Index {
            root,
            output,
            catalog,
            signature,
        } => commands::index::execute(root, output, catalog, signature.strategy()?),
        Commands::Search {
            image,
            index,
            preset,
            threshold,
            limit,
            catalog,
            json,
            signature,
        } => commands::search::execute(commands::search::SearchArgs {
            image,
            index,
            preset: preset.parse()?,
            threshold,
            limit,
            catalog,
            json,
            strategy: signature.strategy()?,
        }),
        Commands::Hash {
            image,
            json,
            signature,
        } => commands::hash::execute(image, json, signature.strategy()?),
        Commands::Compare {
            query,
            candidate,
            preset,
            signature,
        } => commands::compare::execute(query, candidate, preset.parse()?, signature.strategy()?),
        Commands::Vector {
            embedding,
            neighbors,
            color,
            image,
            index,
            normalize,
            timeout,
        } => {
            commands::vector::execute(commands::vector::VectorArgs {
                embedding,
                neighbors,
                color,
                image,
                index,
                normalize,
                timeout_secs: timeout,
            })
            .await
        }
    }
}
