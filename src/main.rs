use std::sync::Arc;

use mi_guide::config::GuideConfig;
use mi_guide::credentials::CredentialStore;
use mi_guide::interview::InterviewSession;
use mi_guide::llm::create_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = GuideConfig::from_env()?;

    eprintln!("🧭 MI Guide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Exports: {}", config.export_dir.display());
    eprintln!("   Type a message and press Enter. /help for commands, /quit to exit.\n");

    let llm = create_provider(&config.llm)?;

    let credentials = Arc::new(match config.api_key.clone() {
        Some(key) => CredentialStore::with_key(key),
        None => CredentialStore::new(),
    });

    let session = InterviewSession::new(llm, credentials);
    mi_guide::cli::run(&session, config.export_dir).await?;

    tracing::info!("Goodbye");
    Ok(())
}
