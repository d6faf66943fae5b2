pub mod ollama;
pub mod openai;

use platformed_gateway::{GatewayConfig, ProviderKind};
use wiremock::MockServer;

/// Load test fixture from file
pub fn load_fixture(filename: &str) -> String {
    std::fs::read_to_string(filename)
        .unwrap_or_else(|_| panic!("Failed to load test fixture: {filename}"))
}

/// Provider configuration for cross-provider testing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub kind: ProviderKind,
    /// Expected `model_used` for a request that names no model.
    pub model_used: &'static str,
}

/// Trait for provider-specific test setup
#[async_trait::async_trait]
pub trait ProviderTestSetup {
    /// Get the provider configuration
    fn get_config() -> ProviderConfig;

    /// Gateway configuration pointing this provider at the mock server
    fn gateway_config(base_url: &str) -> GatewayConfig;

    /// Mount a single-shot backend that answers "Hi there" padded with whitespace
    async fn mount_single_shot_mocks(mock_server: &MockServer);

    /// Mount a streaming backend that emits "Hi" then " there" then completes
    async fn mount_streaming_mocks(mock_server: &MockServer);
}
