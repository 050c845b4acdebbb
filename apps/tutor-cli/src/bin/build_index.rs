//! Build the LanceDB table searched under `retrieval.policy = "global_post_filter"`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tutor_core::config::Config;
use tutor_core::corpus::CorpusStore;
use tutor_core::traits::{Embedder, VectorIndex};
use tutor_embed::get_default_embedder;
use tutor_vector::LanceIndex;

#[derive(Parser)]
#[command(name = "tutor-build-index")]
#[command(about = "Embed the curriculum corpus into a LanceDB table")]
struct Args {
    /// Directory that relative data paths resolve against
    #[arg(long, env = "TUTOR_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let base = match args.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let corpus = CorpusStore::load_json(&settings.data.metadata_path(&base))?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let db_path = settings.data.index_dir(&base);
    info!(chunks = corpus.len(), dim = embedder.dim(), db = %db_path.display(), "building index");

    let index = LanceIndex::build(&db_path, &settings.data.index_table, &corpus, embedder.as_ref()).await?;
    info!(rows = index.len(), table = %settings.data.index_table, "index complete");
    Ok(())
}
