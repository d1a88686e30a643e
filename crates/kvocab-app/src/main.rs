use clap::Parser;
use kvocab_config::Service;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub mod cli;
pub mod commands;
pub mod state;

use self::cli::{Cli, Commands};
use self::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = state::load_config(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }

    let state = AppState::new(config, required_services(&cli.command))?;

    let result = match cli.command {
        Commands::Ingest { file } => commands::ingest(&state, &file).await,
        Commands::Lemmatize => commands::lemmatize(&state).await,
        Commands::Define => commands::define(&state).await,
        Commands::Audit => commands::audit(&state).await,
        Commands::Correct => commands::correct(&state).await,
        Commands::Translate => commands::translate(&state).await,
        Commands::Rollback { request_ids } => commands::rollback(&state, request_ids).await,
        Commands::Coverage { output } => commands::coverage(&state, output.as_deref()).await,
        Commands::Status => commands::status(&state).await,
    };

    if let Err(e) = &result {
        tracing::error!("kvocab failed: {e:#}");
    }
    result
}

fn required_services(command: &Commands) -> &'static [Service] {
    match command {
        Commands::Lemmatize | Commands::Coverage { .. } => &[Service::Nlp],
        Commands::Define | Commands::Audit | Commands::Correct | Commands::Translate => {
            &[Service::Llm]
        }
        Commands::Ingest { .. } | Commands::Rollback { .. } | Commands::Status => &[],
    }
}

/// Human-readable logs on a terminal, JSON lines otherwise
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if atty::is(atty::Stream::Stderr) {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    }
}
