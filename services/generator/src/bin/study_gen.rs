//! services/generator/src/bin/study_gen.rs

use clap::{Parser, Subcommand};
use generator_lib::{
    adapters::{GeminiAdapter, JsonFileResultStore, MemoryCredentialStore, PlainTextExtractor},
    config::Config,
    error::ServiceError,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use study_assistant_core::{
    decode::encode,
    domain::{
        DefinitionParameters, Difficulty, FlashcardParameters, GenerationParameters,
        GenerationRequest, QuizParameters, SummaryLength, SummaryParameters,
    },
    ports::{GenerationError, ResultStore, TextExtractionService},
    service::StudyGenerator,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Generate study material from a plain-text document.
#[derive(Parser, Debug)]
#[command(name = "study-gen", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Language the generated material is written in.
    #[arg(long, global = true, default_value = "English")]
    language: String,

    /// Also persist the result as JSON under RESULTS_DIR.
    #[arg(long, global = true)]
    save: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Multiple-choice quiz.
    Quiz {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// easy, medium, hard, mixed, or any free-form instruction.
        #[arg(long, default_value = "medium")]
        difficulty: String,
    },
    /// Flashcard set.
    Flashcards {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 10)]
        count: usize,
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
    },
    /// Summary with key points.
    Summary {
        #[arg(long)]
        input: PathBuf,
        /// brief, standard or detailed.
        #[arg(long, default_value = "standard")]
        length: String,
        #[arg(long, value_delimiter = ',')]
        focus: Vec<String>,
        /// Free-form style instruction, e.g. "Socratic".
        #[arg(long)]
        style: Option<String>,
    },
    /// Glossary of term definitions.
    Definitions {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_delimiter = ',')]
        terms: Vec<String>,
        #[arg(long, default_value_t = DefinitionParameters::DEFAULT_MAX_TERMS)]
        max_terms: usize,
    },
}

impl Command {
    fn input(&self) -> &PathBuf {
        match self {
            Command::Quiz { input, .. }
            | Command::Flashcards { input, .. }
            | Command::Summary { input, .. }
            | Command::Definitions { input, .. } => input,
        }
    }

    fn parameters(self, language: String) -> Result<GenerationParameters, GenerationError> {
        Ok(match self {
            Command::Quiz {
                count, difficulty, ..
            } => GenerationParameters::Quiz(QuizParameters {
                question_count: count,
                difficulty: difficulty.parse::<Difficulty>().unwrap_or_default(),
                language,
            }),
            Command::Flashcards {
                count, categories, ..
            } => GenerationParameters::Flashcards(FlashcardParameters {
                card_count: count,
                categories,
                language,
            }),
            Command::Summary {
                length,
                focus,
                style,
                ..
            } => GenerationParameters::Summary(SummaryParameters {
                length: length
                    .parse::<SummaryLength>()
                    .map_err(GenerationError::InvalidRequest)?,
                focus_terms: focus,
                language,
                style,
            }),
            Command::Definitions {
                terms, max_terms, ..
            } => GenerationParameters::Glossary(DefinitionParameters {
                terms,
                language,
                max_terms,
            }),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // --- 1. Parse Arguments, Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(model = %config.gemini.model, "Configuration loaded.");

    // --- 2. Initialize Adapters ---
    let credentials = Arc::new(MemoryCredentialStore::new(config.gemini_api_key.clone()));
    let backend = Arc::new(GeminiAdapter::new(
        credentials,
        config.gemini.clone(),
        config.retry.clone(),
    )?);
    let store = JsonFileResultStore::new(config.results_dir.clone());
    let generator = StudyGenerator::new(backend);

    // --- 3. Build the Request ---
    let source_text = PlainTextExtractor.extract(cli.command.input()).await?;
    let request = GenerationRequest::new(source_text, cli.command.parameters(cli.language)?);

    // --- 4. Report Progress and Honour Ctrl-C ---
    let mut status = generator.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            if current.processing {
                info!("{}", current.message);
            }
        }
    });

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the request.");
            ctrl_c.cancel();
        }
    });

    // --- 5. Generate, Persist & Print ---
    let result = generator.generate_with_cancel(&request, &cancel).await?;
    if cli.save {
        store.save(&result).await?;
    }

    let output = json!({
        "kind": result.kind().to_string(),
        "content": encode(&result),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
