use mockito::Matcher;
use newscast::llm::remote::RemoteLlmProvider;
use newscast::llm::summarizer::summarize;
use newscast::llm::{LlmProvider, LlmRequest};
use newscast::UpstreamError;

fn completion(content: &str) -> String {
    serde_json::json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
    .to_string()
}

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("This is a test response"))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let request = LlmRequest::new("Test prompt")
        .with_max_tokens(100)
        .with_temperature(0.7);

    let response = provider.generate(request).await.expect("generate");

    assert_eq!(response.content, "This is a test response");
    assert_eq!(response.usage.prompt_tokens, 10);
    assert_eq!(response.usage.completion_tokens, 5);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-4o-mini");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_system_message_precedes_prompt() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "Headlines" }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("  A short script.  "))
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let summary = summarize(&provider, "Headlines", "Be brief.", 200)
        .await
        .expect("summary");

    assert_eq!(summary, "A short script.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_status_is_overloaded() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();

    assert!(matches!(err, UpstreamError::Overloaded(_)));
    assert!(err.to_string().contains("429"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_overloaded_error_body_is_overloaded() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Overloaded(_)));
}

#[tokio::test]
async fn test_other_errors_are_model_failures() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(401)
        .with_body(r#"{"error": {"type": "authentication_error", "message": "bad key"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Model(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");

    let request = LlmRequest {
        timeout_seconds: Some(1),
        ..LlmRequest::new("Test")
    };

    let err = provider.generate(request).await.unwrap_err();
    assert!(err.to_string().contains("timed out"));
}
