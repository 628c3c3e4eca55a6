use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use techbook::config::AppConfig;
use techbook::db::{self, queries};
use techbook::handlers;
use techbook::services::ai::ollama::OllamaProvider;
use techbook::services::ai::openai::OpenAiProvider;
use techbook::services::ai::LlmProvider;
use techbook::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "techbook", version, about = "Chat-driven technician booking service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },

    /// Chat with the booking assistant from the terminal
    Console,
}

fn build_llm(config: &AppConfig) -> anyhow::Result<Box<dyn LlmProvider>> {
    match config.llm_provider.as_str() {
        "openai" => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI-compatible LLM provider (model: {})", config.openai_model);
            Ok(Box::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                config.openai_base_url.clone(),
            )))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Ok(Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            )))
        }
        other => anyhow::bail!("unknown LLM_PROVIDER '{other}' (expected openai or ollama)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let seeded = queries::seed_bookings(&conn)?;
    if seeded > 0 {
        tracing::info!(count = seeded, "seeded sample bookings");
    }

    let llm = build_llm(&config)?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            let state = Arc::new(AppState {
                db: Arc::new(Mutex::new(conn)),
                config: config.clone(),
                llm,
            });

            let app = handlers::build_router(state);

            let addr = format!("0.0.0.0:{}", config.port);
            tracing::info!("starting server on {addr}");

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Console => {
            let state = Arc::new(AppState {
                db: Arc::new(Mutex::new(conn)),
                config,
                llm,
            });
            techbook::console::run(state).await?;
        }
    }

    Ok(())
}
