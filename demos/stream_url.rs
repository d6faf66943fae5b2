//! Streaming processing of a web page, printed as wire frames.
//!
//! ```bash
//! cargo run --example stream_url -- https://www.rust-lang.org
//! ```

use futures_util::StreamExt;
use platformed_gateway::{Error, Gateway, ProcessingRequest, ProviderKind};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());
    let provider = match std::env::var("GATEWAY_PROVIDER").as_deref() {
        Ok("ollama") => ProviderKind::Ollama,
        _ => ProviderKind::OpenAI,
    };

    let gateway = Gateway::from_env()?;
    let request = ProcessingRequest::from_url(url).provider(provider);

    let stream = match gateway.process_stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            println!("Request failed ({}): {e}", e.status_code());
            return Ok(());
        }
    };

    let mut frames = stream.into_frames();
    while let Some(frame) = frames.next().await {
        print!("{frame}");
    }

    Ok(())
}
