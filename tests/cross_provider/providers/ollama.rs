use super::{load_fixture, ProviderConfig, ProviderTestSetup};
use platformed_gateway::{GatewayConfig, ProviderKind};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct OllamaTestSetup;

#[async_trait::async_trait]
impl ProviderTestSetup for OllamaTestSetup {
    fn get_config() -> ProviderConfig {
        ProviderConfig {
            name: "Ollama",
            kind: ProviderKind::Ollama,
            model_used: "ollama:llama2",
        }
    }

    fn gateway_config(base_url: &str) -> GatewayConfig {
        GatewayConfig::new().ollama_base_url(base_url)
    }

    async fn mount_single_shot_mocks(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama2",
                "stream": false,
                "options": {"temperature": 0.7, "num_predict": 1000}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(load_fixture(
                        "tests/cross_provider/fixtures/ollama/generate.json",
                    ))
                    .insert_header("content-type", "application/json"),
            )
            .expect(1)
            .mount(mock_server)
            .await;
    }

    async fn mount_streaming_mocks(mock_server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama2",
                "stream": true
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(load_fixture(
                        "tests/cross_provider/fixtures/ollama/stream.ndjson",
                    ))
                    .insert_header("content-type", "application/x-ndjson"),
            )
            .expect(1)
            .mount(mock_server)
            .await;
    }
}
