use mockito::Matcher;
use newscast::narrator::{Narrator, RemoteNarrator};
use newscast::UpstreamError;

#[tokio::test]
async fn test_generate_then_download_audio() {
    let mut server = mockito::Server::new_async().await;

    let audio = server
        .mock("GET", "/files/briefing.mp3")
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body(b"ID3fake-mp3".to_vec())
        .create_async()
        .await;

    let generate = server
        .mock("POST", "/v1/speech/generate")
        .match_header("api-key", "tts-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "text": "Good evening.",
            "voiceId": "wayne",
            "format": "MP3",
            "sampleRate": 44100.0,
            "channelType": "STEREO",
            "pitch": 0,
            "rate": 1.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::json!({ "audioFile": format!("{}/files/briefing.mp3", server.url()) }).to_string())
        .create_async()
        .await;

    let narrator = RemoteNarrator::new(format!("{}/v1/speech/generate", server.url()), "tts-key");

    let bytes = narrator
        .synthesize("Good evening.", "wayne", "en-US")
        .await
        .expect("audio");

    assert_eq!(bytes, b"ID3fake-mp3");
    generate.assert_async().await;
    audio.assert_async().await;
}

#[tokio::test]
async fn test_style_is_sent_when_configured() {
    let mut server = mockito::Server::new_async().await;

    let _audio = server
        .mock("GET", "/a.mp3")
        .with_status(200)
        .with_body("x")
        .create_async()
        .await;
    let generate = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(serde_json::json!({ "style": "Newscast" })))
        .with_status(200)
        .with_body(serde_json::json!({ "audioFile": format!("{}/a.mp3", server.url()) }).to_string())
        .create_async()
        .await;

    let narrator = RemoteNarrator::new(server.url(), "k").with_style("Newscast");
    narrator.synthesize("Hi.", "wayne", "en-US").await.expect("audio");

    generate.assert_async().await;
}

#[tokio::test]
async fn test_missing_audio_url_is_synthesis_error() {
    let mut server = mockito::Server::new_async().await;

    let _generate = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"encodedAudio": null}"#)
        .create_async()
        .await;

    let narrator = RemoteNarrator::new(server.url(), "k");
    let err = narrator.synthesize("Hi.", "wayne", "en-US").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Synthesis(_)));
    assert!(err.to_string().contains("missing audio URL"));
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mut server = mockito::Server::new_async().await;

    let _generate = server
        .mock("POST", "/")
        .with_status(400)
        .with_body(r#"{"errorMessage": "invalid voice"}"#)
        .create_async()
        .await;

    let narrator = RemoteNarrator::new(server.url(), "k");
    let err = narrator.synthesize("Hi.", "nobody", "en-US").await.unwrap_err();

    assert!(matches!(err, UpstreamError::Synthesis(_)));
    assert!(err.to_string().contains("invalid voice"));
}
