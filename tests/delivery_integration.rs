//! Delivery Integration Tests
//!
//! Completed utterances flow from the upstream through synthesis into the
//! raw-media or bot-audio sink, with ElevenLabs, Recall.ai and the media
//! player all served by wiremock.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{MockUpstream, connect_client, next_message, start_bridge, test_config, wait_for_requests};
use voice_bridge::ServerConfig;
use voice_bridge::config::DefaultRoute;
use voice_bridge::core::delivery::MAX_CHUNK_BYTES;

const TTS_PATH: &str = "/v1/text-to-speech/";

fn delivery_config(upstream_url: &str, providers: &MockServer) -> ServerConfig {
    let mut config = test_config(upstream_url);
    config.default_route = DefaultRoute::BotAudio;
    config.elevenlabs_api_key = Some("eleven-key".to_string());
    config.elevenlabs_base_url = providers.uri();
    config.recall_api_key = Some("Token recall-key".to_string());
    config.recall_base_url = providers.uri();
    config.allow_private_media_urls = true;
    config
}

fn speak(upstream: &MockUpstream, text: &str) {
    upstream.send(&json!({"type": "response.text.delta", "response_id": "r1", "delta": text}).to_string());
    upstream.send(r#"{"type":"response.text.done","response_id":"r1"}"#);
}

#[tokio::test]
async fn test_media_url_receives_chunked_pcm() {
    let providers = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1/text-to-speech/[^/]+/stream$"))
        .and(query_param("output_format", "pcm_16000"))
        .and(header("xi-api-key", "eleven-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; MAX_CHUNK_BYTES + 100]))
        .expect(1)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/player/push"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/bot/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&providers)
        .await;

    let mut upstream = MockUpstream::start(Duration::ZERO).await;
    let addr = start_bridge(delivery_config(&upstream.url, &providers)).await;
    let media_url = format!("{}/player/push", providers.uri());
    let _client = connect_client(addr, &format!("?media_url={media_url}&bot_id=bot-1")).await;
    upstream.next().await;

    speak(&upstream, "Hello there");

    let pushes = wait_for_requests(&providers, "/player/push", 2).await;
    let first: serde_json::Value = serde_json::from_slice(&pushes[0].body).unwrap();
    assert_eq!(first["encoding"], "pcm16");
    assert_eq!(first["sample_rate_hz"], 16000);

    let tts = wait_for_requests(&providers, TTS_PATH, 1).await;
    let body: serde_json::Value = serde_json::from_slice(&tts[0].body).unwrap();
    assert_eq!(body["text"], "Hello there");
    assert_eq!(body["voice_settings"]["stability"], 0.15);
}

#[tokio::test]
async fn test_bot_audio_receives_mp3() {
    let providers = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1/text-to-speech/[^/]+/stream$"))
        .and(query_param("output_format", "mp3_44100_128"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3mp3".to_vec()))
        .expect(1)
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/bot/bot-7/output_audio/"))
        .and(header("authorization", "Token recall-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&providers)
        .await;

    let mut upstream = MockUpstream::start(Duration::ZERO).await;
    let addr = start_bridge(delivery_config(&upstream.url, &providers)).await;
    let _client = connect_client(addr, "?bot_id=bot-7").await;
    upstream.next().await;

    speak(&upstream, "Joining now");

    let injected = wait_for_requests(&providers, "/api/v1/bot/bot-7/output_audio/", 1).await;
    let body: serde_json::Value = serde_json::from_slice(&injected[0].body).unwrap();
    assert_eq!(body["kind"], "mp3");
    assert_eq!(body["b64_data"], "SUQzbXAz");
}

#[tokio::test]
async fn test_configured_bot_id_is_used_without_query() {
    let providers = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1/text-to-speech/[^/]+/stream$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3".to_vec()))
        .mount(&providers)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/bot/configured-bot/output_audio/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&providers)
        .await;

    let mut upstream = MockUpstream::start(Duration::ZERO).await;
    let mut config = delivery_config(&upstream.url, &providers);
    config.recall_bot_id = Some("configured-bot".to_string());
    let addr = start_bridge(config).await;
    let _client = connect_client(addr, "").await;
    upstream.next().await;

    speak(&upstream, "Default bot");

    wait_for_requests(&providers, "/api/v1/bot/configured-bot/output_audio/", 1).await;
}

#[tokio::test]
async fn test_synthesis_failure_still_broadcasts_and_keeps_relaying() {
    let providers = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1/text-to-speech/[^/]+/stream$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .mount(&providers)
        .await;

    let mut upstream = MockUpstream::start(Duration::ZERO).await;
    let addr = start_bridge(delivery_config(&upstream.url, &providers)).await;
    let mut listener = connect_client(addr, "listen").await;
    let mut client = connect_client(addr, "?bot_id=bot-1").await;
    upstream.next().await;

    speak(&upstream, "Still heard");

    match next_message(&mut listener).await {
        Some(Message::Text(text)) => assert!(text.as_str().contains("Still heard")),
        other => panic!("unexpected {other:?}"),
    }
    wait_for_requests(&providers, TTS_PATH, 1).await;

    upstream.send(r#"{"type":"response.created"}"#);
    let mut seen = Vec::new();
    for _ in 0..3 {
        if let Some(Message::Text(text)) = next_message(&mut client).await {
            seen.push(text.to_string());
        }
    }
    assert!(seen.last().unwrap().contains("response.created"));
}
