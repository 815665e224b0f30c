use chrono::Utc;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use portfolio_rag_core::{
    ingest_folder, sse, ChatEvent, ChatPipeline, HttpEmbedder, HttpGenerator, IngestionOptions,
    PostgrestStore, PromptAssembler, RagConfig, Retriever, SourceKind, TruncationPolicy,
};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "portfolio-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a folder of PDFs into the embeddings store.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: String,
        /// Source type recorded on every embedding row.
        #[arg(long, default_value = "document")]
        source_type: SourceKind,
    },
    /// Ask a question over the ingested knowledge base and stream the answer.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Restrict retrieval to one source type.
        #[arg(long)]
        source_type: Option<SourceKind>,
        /// Restrict retrieval to one source id.
        #[arg(long)]
        source_id: Option<Uuid>,
        /// Emit raw server-sent-event frames instead of plain text.
        #[arg(long, default_value_t = false)]
        sse: bool,
    },
    /// Produce a structured summary of one source's stored content.
    Summarize {
        /// Title shown to the model.
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "paper")]
        source_type: SourceKind,
        #[arg(long)]
        source_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    // Fails fast with the offending variable named, before any network call.
    let config = RagConfig::from_env()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let embedder = HttpEmbedder::new(client.clone(), config.embedding.clone(), config.max_retries);
    let store = PostgrestStore::new(client.clone(), &config.store);
    let generator = HttpGenerator::new(client, config.generation.clone(), config.max_retries);
    let assembler = PromptAssembler::new(
        config.persona.clone(),
        TruncationPolicy {
            max_context_chars: config.max_context_chars,
        },
    );

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "portfolio-rag boot"
    );

    match cli.command {
        Command::Ingest {
            folder,
            source_type,
        } => {
            let options = IngestionOptions {
                chunking: config.chunking,
                embed_concurrency: config.embed_concurrency,
            };

            let report =
                ingest_folder(&embedder, &store, Path::new(&folder), source_type, options).await?;

            if !report.skipped_files.is_empty() {
                warn!(
                    "skipped_files={} for folder={}",
                    report.skipped_files.len(),
                    folder
                );
                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
                }
            }

            for file_report in &report.reports {
                println!(
                    "{}: {}/{} chunks embedded ({} skipped)",
                    file_report.file_name,
                    file_report.embedded_count,
                    file_report.total_chunks,
                    file_report.skipped.len()
                );
                for chunk in &file_report.skipped {
                    warn!(
                        file = %file_report.file_name,
                        chunk_index = chunk.index,
                        reason = %chunk.reason,
                        "skipped chunk"
                    );
                }
            }

            println!(
                "{} file(s) ingested at {}",
                report.reports.len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask {
            question,
            source_type,
            source_id,
            sse: as_sse,
        } => {
            let pipeline = ChatPipeline::new(
                Retriever::new(embedder, store, config.retrieval),
                generator,
                assembler,
            );

            let mut events = pipeline.answer(&question, source_type, source_id).await?;

            while let Some(event) = events.next().await {
                let event = event?;

                if as_sse {
                    print!("{}", sse::frame(&event)?);
                    std::io::stdout().flush()?;
                    continue;
                }

                match event {
                    ChatEvent::Content(piece) => {
                        print!("{piece}");
                        std::io::stdout().flush()?;
                    }
                    ChatEvent::Sources(sources) => {
                        if !sources.is_empty() {
                            println!("\n\nsources: {}", sources.join(", "));
                        }
                    }
                    ChatEvent::Done => {
                        println!();
                        break;
                    }
                }
            }
        }
        Command::Summarize {
            title,
            source_type,
            source_id,
        } => {
            let pipeline = ChatPipeline::new(
                Retriever::new(embedder, store, config.retrieval),
                generator,
                assembler,
            );

            let summary = pipeline
                .summarize_source(&title, source_type, source_id)
                .await?;
            println!("{summary}");
        }
    }

    Ok(())
}
