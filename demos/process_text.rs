//! Single-shot processing of free text.
//!
//! Uses the hosted provider when `OPENAI_API_KEY` is set, otherwise the local
//! Ollama server at `OLLAMA_BASE_URL`.
//!
//! ```bash
//! export OPENAI_API_KEY=your_api_key_here
//! cargo run --example process_text
//! ```

use platformed_gateway::{Error, Gateway, ProcessingRequest, ProviderKind};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let gateway = Gateway::from_env()?;

    let health = gateway.catalog().health().await;
    println!(
        "OpenAI configured: {}, Ollama available: {} ({})",
        health.openai.configured, health.ollama.available, health.ollama.base_url
    );

    let provider = if health.openai.configured {
        ProviderKind::OpenAI
    } else {
        ProviderKind::Ollama
    };

    let request = ProcessingRequest::from_text(
        "Name: Ada Lovelace\nBorn: 1815\nKnown for: first published algorithm",
    )
    .provider(provider);

    println!("Processing text with {}...", provider.display_name());
    match gateway.process(&request).await {
        Ok(envelope) => {
            println!("Model: {}", envelope.model_used);
            println!("Time: {:.2}s", envelope.processing_time);
            println!("Result:\n{}", envelope.result);
        }
        Err(e) => {
            println!("Request failed ({}): {e}", e.status_code());
        }
    }

    Ok(())
}
