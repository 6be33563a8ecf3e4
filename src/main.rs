//! silabo-rag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use silabo_rag::{
    cli::{display, Args, ChatInput, Commands, InputHandler, Verbosity},
    config::Config,
    doctor::Doctor,
    index::{PassageIndex, QdrantSearch},
    ingest::{self, IngestReport, StructuredChunker},
    logging,
    rag::{HybridRetriever, RagPipeline, SpecificTermVocabulary},
    streaming::OllamaClient,
};

/// Clients and settings shared by every command
struct App {
    config: Config,
    verbosity: Verbosity,
    ollama: Arc<OllamaClient>,
    index: Arc<PassageIndex>,
}

impl App {
    fn connect(config: Config, verbosity: Verbosity) -> Result<Self> {
        let ollama = OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;
        let index = PassageIndex::connect(&config.index.qdrant_url, &config.index.collection)?;

        Ok(Self {
            config,
            verbosity,
            ollama: Arc::new(ollama),
            index: Arc::new(index),
        })
    }

    fn pipeline(&self) -> RagPipeline {
        let search = QdrantSearch::new(
            self.index.clone(),
            self.ollama.clone(),
            self.config.retrieval.candidate_count,
        );
        let vocabulary = SpecificTermVocabulary::new(&self.config.retrieval.specific_terms);
        let retriever = HybridRetriever::with_vocabulary(Arc::new(search), vocabulary);

        RagPipeline::new(retriever, self.ollama.clone(), self.config.retrieval.top_k)
    }

    async fn ingest(&self, dir: &Path, reset: bool) -> Result<IngestReport> {
        if reset {
            self.index.reset().await?;
        }

        let chunker = StructuredChunker::from_config(&self.config.ingest);
        let pb = if self.verbosity.show_progress() {
            display::ingest_progress(0)
        } else {
            ProgressBar::hidden()
        };

        let report = ingest::ingest_dir(
            dir,
            &chunker,
            &self.index,
            self.ollama.as_ref(),
            self.config.ingest.batch_size,
            |stored, total| {
                pb.set_length(total as u64);
                pb.set_position(stored as u64);
            },
        )
        .await;
        pb.finish_and_clear();

        let report = report?;
        info!(
            documents = report.documents,
            passages = report.passages,
            collection = self.index.collection(),
            "ingestion complete"
        );
        Ok(report)
    }

    /// Index the syllabus directory when the collection is still empty
    async fn ensure_indexed(&self) -> Result<u64> {
        let count = self.index.count().await?;
        if count > 0 {
            return Ok(count);
        }

        let dir = self.config.ingest.syllabus_dir.clone();
        println!(
            "{}",
            format!("📥 Índice vacío, procesando sílabos de {}...", dir.display()).yellow()
        );
        let report = self.ingest(&dir, false).await?;
        display::show_success(&format!(
            "{} sílabos, {} fragmentos indexados",
            report.documents, report.passages
        ));
        Ok(report.passages as u64)
    }

    /// Retrieve, optionally show the chunks, then stream the answer to stdout
    async fn answer(&self, pipeline: &RagPipeline, question: &str, show_chunks: bool) -> Result<()> {
        let passages = pipeline.retrieve(question).await?;
        if show_chunks {
            display::show_chunks(&passages);
        }

        display::show_answer_header();
        let answer = pipeline
            .answer_from(question, passages, &mut |token| {
                print!("{}", token);
                let _ = io::stdout().flush();
            })
            .await?;
        println!();

        if self.config.context.show_sources {
            display::show_sources(&answer.context.sources);
        }
        Ok(())
    }
}

async fn run_ingest(app: &App, dir: Option<&Path>, reset: bool) -> Result<()> {
    let dir = dir.unwrap_or(&app.config.ingest.syllabus_dir);
    let report = app.ingest(dir, reset).await?;
    display::show_success(&format!(
        "{} sílabos, {} fragmentos indexados en '{}'",
        report.documents,
        report.passages,
        app.index.collection()
    ));
    Ok(())
}

async fn run_search(app: &App, query: &str, k: Option<usize>) -> Result<()> {
    let pipeline = app.pipeline();
    let k = k.unwrap_or(pipeline.top_k());
    let ranked = pipeline.retriever().retrieve_ranked(query, k).await?;
    display::show_ranked(&ranked);
    Ok(())
}

async fn run_ask(app: &App, question: &str, show_chunks: bool) -> Result<()> {
    app.ensure_indexed().await?;
    let pipeline = app.pipeline();
    app.answer(&pipeline, question, show_chunks || app.verbosity == Verbosity::VeryVerbose)
        .await
}

async fn run_chat(app: &App) -> Result<()> {
    let passages = app.ensure_indexed().await?;
    let pipeline = app.pipeline();
    let show_chunks = !matches!(app.verbosity, Verbosity::Quiet);

    let mut input = match InputHandler::default_history_path() {
        Some(path) => InputHandler::with_history(path)?,
        None => InputHandler::new()?,
    };

    display::show_banner(env!("CARGO_PKG_VERSION"), app.ollama.model(), passages);

    loop {
        match input.read()? {
            ChatInput::Exit => break,
            ChatInput::Empty => continue,
            ChatInput::Question(question) => {
                if let Err(e) = app.answer(&pipeline, &question, show_chunks).await {
                    display::show_error(&format!("{:#}", e));
                }
                println!();
            }
        }
    }

    if let Err(e) = input.save_history() {
        warn!("Failed to save history: {}", e);
    }
    println!("{}", "👋 ¡Hasta luego!".cyan());
    Ok(())
}

async fn run_doctor(app: &App) -> Result<()> {
    let doctor = Doctor::new(&app.ollama, &app.index, &app.config.ingest.syllabus_dir);
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(model) = &args.model {
        config.ollama.model = model.clone();
    }
    if let Some(url) = &args.ollama_url {
        config.ollama.url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    let config = load_config(&args)?;
    logging::init(&config.logging, verbosity.log_level())?;

    let command = args.command();
    if command == Commands::Config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let app = App::connect(config, verbosity)?;
    let result = match command {
        Commands::Ingest { dir, reset } => run_ingest(&app, dir.as_deref(), reset).await,
        Commands::Search { query, k } => run_search(&app, &query, k).await,
        Commands::Ask { question, show_chunks } => run_ask(&app, &question, show_chunks).await,
        Commands::Chat => run_chat(&app).await,
        Commands::Doctor => run_doctor(&app).await,
        Commands::Config => Ok(()),
    };

    if let Err(e) = &result {
        display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
