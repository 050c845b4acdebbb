//! Curriculum tutor command line.
//!
//! ```bash
//! tutor areas
//! tutor retrieve --area Science --level "Year 2" "how do plants grow"
//! tutor check --subject Science CPU
//! tutor lesson --activity custom --area Science --level "Year 2" --query "plant growth" --out lesson.md
//! tutor lesson --activity maths --level Foundation
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tutor_core::config::Config;
use tutor_core::corpus::CorpusStore;
use tutor_core::levels::YearLevel;
use tutor_core::traits::Classifier;
use tutor_generate::OllamaGenerator;
use tutor_hybrid::{ActivityKind, ActivityRequest, KeywordClassifier, Resources};

#[derive(Parser)]
#[command(name = "tutor")]
#[command(about = "Curriculum-grounded lesson generator")]
#[command(version)]
struct Cli {
    /// Directory that relative data paths resolve against
    #[arg(long, global = true, env = "TUTOR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the learning areas present in the corpus
    Areas,

    /// List year levels and their internal tags
    Levels,

    /// Retrieve curriculum excerpts for a query
    Retrieve {
        query: String,

        #[arg(short, long)]
        area: String,

        #[arg(short, long, default_value = "Year 2")]
        level: YearLevel,

        /// Overrides retrieval.top_k
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Run the relevance gate on a query
    Check {
        query: String,

        #[arg(short, long)]
        subject: String,
    },

    /// Print the prompt that would be sent to the model
    Prompt {
        #[command(flatten)]
        activity: ActivityArgs,
    },

    /// Generate a lesson
    Lesson {
        #[command(flatten)]
        activity: ActivityArgs,

        /// Overrides generation.model
        #[arg(short, long)]
        model: Option<String>,

        /// Write the lesson as markdown instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List models available on the generation service
    Models,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivityChoice {
    Custom,
    Story,
    Maths,
    Science,
}

#[derive(clap::Args)]
struct ActivityArgs {
    #[arg(long, value_enum, default_value = "custom")]
    activity: ActivityChoice,

    #[arg(short, long, default_value = "Year 2")]
    level: YearLevel,

    /// Subject for custom activities
    #[arg(short, long, default_value = "Science")]
    area: String,

    /// Question for custom activities
    #[arg(short, long, default_value = "")]
    query: String,
}

impl ActivityArgs {
    fn request(&self) -> ActivityRequest {
        match self.activity {
            ActivityChoice::Custom => ActivityRequest::custom(self.query.clone(), self.area.clone()),
            ActivityChoice::Story => ActivityRequest::fixed(ActivityKind::Story),
            ActivityChoice::Maths => ActivityRequest::fixed(ActivityKind::Maths),
            ActivityChoice::Science => ActivityRequest::fixed(ActivityKind::Science),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let base = match cli.data_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Areas => {
            let corpus = CorpusStore::load_json(&settings.data.metadata_path(&base))?;
            for area in corpus.learning_areas() {
                println!("{area}");
            }
        }

        Commands::Levels => {
            for level in YearLevel::all() {
                println!("{:<12} {}", level.label(), level.internal_tag());
            }
        }

        Commands::Retrieve { query, area, level, top_k } => {
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let resources = Resources::load(settings, &base).await?;
            let retrieval = resources.retriever.retrieve(&query, &area, level, top_k).await;
            if let Some(e) = &retrieval.diagnostic {
                eprintln!("{e}");
            }
            println!("{} excerpt(s) for '{}' in {} at {}:\n", retrieval.excerpts.len(), query, area, level);
            for (i, excerpt) in retrieval.excerpts.iter().enumerate() {
                println!("{}. [{}] {}\n", i + 1, excerpt.chunk_id, excerpt.text);
            }
        }

        Commands::Check { query, subject } => {
            let classifier = KeywordClassifier::from_settings(&settings.relevance);
            let relevant = classifier.is_relevant(&query, &subject);
            println!("'{}' is {} to {}", query, if relevant { "relevant" } else { "not relevant" }, subject);
        }

        Commands::Prompt { activity } => {
            let resources = Resources::load(settings, &base).await?;
            let prepared = resources.pipeline().prepare(&activity.request(), activity.level).await?;
            for d in &prepared.diagnostics {
                eprintln!("{d}");
            }
            println!("{}", prepared.prompt);
        }

        Commands::Lesson { activity, model, out } => {
            let generator = OllamaGenerator::for_model(&settings.generation, model).await?;
            let resources = Resources::load(settings, &base).await?;
            let lesson = resources.pipeline().run(&activity.request(), activity.level, &generator).await?;
            for d in &lesson.diagnostics {
                eprintln!("{d}");
            }
            match out {
                Some(path) => {
                    std::fs::write(&path, lesson.to_markdown())?;
                    println!("Wrote '{}' to {}", lesson.title, path.display());
                }
                None => println!("{}", lesson.to_markdown()),
            }
        }

        Commands::Models => {
            let generator = OllamaGenerator::new(
                &settings.generation.host,
                settings.generation.model.clone(),
                std::time::Duration::from_secs(settings.generation.timeout_secs),
            )?;
            for model in generator.list_models().await {
                println!("{model}");
            }
        }
    }

    Ok(())
}

