use futures_util::StreamExt;
use platformed_gateway::{Gateway, ProcessingRequest, SourceKind, StreamEvent};
use wiremock::MockServer;

use super::providers::{
    ollama::OllamaTestSetup, openai::OpenAITestSetup, ProviderTestSetup,
};

/// Run the single-shot flow for a specific provider
async fn run_single_shot_test<T: ProviderTestSetup>() {
    let config = T::get_config();
    let mock_server = MockServer::start().await;
    T::mount_single_shot_mocks(&mock_server).await;

    let gateway = Gateway::new(T::gateway_config(&mock_server.uri())).unwrap();
    let request = ProcessingRequest::from_text("Hello").provider(config.kind);

    let envelope = gateway.process(&request).await.unwrap();

    assert!(envelope.success, "{} envelope not successful", config.name);
    assert_eq!(envelope.result, "Hi there");
    assert_eq!(envelope.model_used, config.model_used);
    assert_eq!(envelope.source_type, SourceKind::Text);
    assert_eq!(envelope.source, "Hello");
    assert!(envelope.processing_time >= 0.0);
}

/// Run the streaming flow for a specific provider
async fn run_streaming_test<T: ProviderTestSetup>() {
    let config = T::get_config();
    let mock_server = MockServer::start().await;
    T::mount_streaming_mocks(&mock_server).await;

    let gateway = Gateway::new(T::gateway_config(&mock_server.uri())).unwrap();
    let request = ProcessingRequest::from_text("Hello").provider(config.kind);

    let events: Vec<StreamEvent> = gateway
        .process_stream(&request)
        .await
        .unwrap()
        .collect()
        .await;

    println!("{} events: {events:?}", config.name);
    assert_eq!(events.len(), 3, "{} produced {events:?}", config.name);
    assert_eq!(events[0], StreamEvent::Chunk { text: "Hi".to_string() });
    assert_eq!(events[1], StreamEvent::Chunk { text: " there".to_string() });

    match &events[2] {
        StreamEvent::Done {
            elapsed_seconds,
            model_used,
            source_kind,
            source_label,
        } => {
            assert!(*elapsed_seconds >= 0.0);
            assert_eq!(model_used, config.model_used);
            assert_eq!(*source_kind, SourceKind::Text);
            assert_eq!(source_label, "Hello");
        }
        other => panic!("{}: expected Done, got {other:?}", config.name),
    }
}

#[tokio::test]
async fn test_openai_single_shot() {
    run_single_shot_test::<OpenAITestSetup>().await;
}

#[tokio::test]
async fn test_ollama_single_shot() {
    run_single_shot_test::<OllamaTestSetup>().await;
}

#[tokio::test]
async fn test_openai_streaming() {
    run_streaming_test::<OpenAITestSetup>().await;
}

#[tokio::test]
async fn test_ollama_streaming() {
    run_streaming_test::<OllamaTestSetup>().await;
}

#[tokio::test]
async fn test_streamed_text_matches_single_shot() {
    async fn streamed<T: ProviderTestSetup>() -> String {
        let mock_server = MockServer::start().await;
        T::mount_streaming_mocks(&mock_server).await;
        let gateway = Gateway::new(T::gateway_config(&mock_server.uri())).unwrap();

        gateway
            .process_stream(&ProcessingRequest::from_text("Hello").provider(T::get_config().kind))
            .await
            .unwrap()
            .filter_map(|event| async move {
                match event {
                    StreamEvent::Chunk { text } => Some(text),
                    _ => None,
                }
            })
            .collect::<String>()
            .await
    }

    assert_eq!(streamed::<OpenAITestSetup>().await, "Hi there");
    assert_eq!(streamed::<OllamaTestSetup>().await, "Hi there");
}
