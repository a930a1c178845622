use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use gmail_labeler::agent::create_agent;
use gmail_labeler::client::{ComposioApi, HttpClient};
use gmail_labeler::config::Config;
use gmail_labeler::events::Dispatcher;
use gmail_labeler::setup;
use gmail_labeler::triggers::GMAIL_NEW_MESSAGE_TRIGGER;

/// Label incoming Gmail messages with an LLM-backed agent.
#[derive(Debug, Parser)]
#[command(name = "gmail-labeler", version)]
struct Args {
    /// User identifier the agent acts on behalf of.
    #[arg(long)]
    user_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Configuration (API keys etc.) comes from the environment; pull in .env
    // before anything reads it.
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("📬 Gmail Labeler v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   User: {}", args.user_id);
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Service: {}\n", config.base_url);

    let api: Arc<dyn ComposioApi> = Arc::new(
        HttpClient::new(&config.base_url, config.api_key.clone())
            .context("failed to build service client")?,
    );

    // Connected account, then trigger — both check-then-create.
    let setup = setup::prepare(api.as_ref(), &config, &args.user_id).await?;

    let agent = create_agent(&args.user_id, Arc::clone(&api), &config.llm)
        .context("failed to build labeling agent")?;

    let events = api
        .subscribe()
        .await
        .context("failed to open trigger subscription")?;

    println!("Waiting for events...");
    let dispatcher = Dispatcher::new(GMAIL_NEW_MESSAGE_TRIGGER, &setup.trigger_id);
    dispatcher.run(events, agent).await?;

    Ok(())
}
