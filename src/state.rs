use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::bridge::SessionNegotiator;
use crate::core::delivery::{ListenerRegistry, MediaPushClient, RecallClient};
use crate::core::tts::ElevenLabsTTS;

/// Application state shared by all handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Shared HTTP client for outbound REST calls that read whole bodies
    pub http: reqwest::Client,
    /// Local `/listen` subscribers
    pub listeners: Arc<ListenerRegistry>,
    /// `None` when ELEVENLABS_API_KEY is not configured
    pub tts: Option<Arc<ElevenLabsTTS>>,
    /// ElevenLabs client for `/tts`, bounded per read instead of in total
    /// so long streams are not cut off
    pub tts_stream: Option<Arc<ElevenLabsTTS>>,
    /// `None` when RECALL_API_KEY is not configured
    pub recall: Option<Arc<RecallClient>>,
    pub media: MediaPushClient,
    pub negotiator: SessionNegotiator,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let timeout = Duration::from_secs(config.http_timeout_seconds);
        let http = build_client(reqwest::Client::builder().timeout(timeout));
        let streaming = build_client(
            reqwest::Client::builder()
                .connect_timeout(timeout)
                .read_timeout(timeout),
        );

        let (tts, tts_stream) = match ElevenLabsTTS::from_config(&config, http.clone()) {
            Ok(tts) => {
                let stream = tts.with_http(streaming);
                (Some(Arc::new(tts)), Some(Arc::new(stream)))
            }
            Err(e) => {
                warn!(error = %e, "ElevenLabs disabled: synthesis and /tts are unavailable");
                (None, None)
            }
        };

        let recall = match RecallClient::from_config(&config, http.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "Recall.ai disabled: bot audio is unavailable");
                None
            }
        };

        info!(
            default_route = %config.default_route,
            broadcast = config.broadcast_enabled,
            voice_swap = config.voice_swap,
            persona = config.persona.is_some(),
            "Application state initialized"
        );

        Arc::new(Self {
            negotiator: SessionNegotiator::from_config(&config),
            media: MediaPushClient::new(http.clone()),
            listeners: Arc::new(ListenerRegistry::new()),
            http,
            tts,
            tts_stream,
            recall,
            config,
        })
    }
}

fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build HTTP client with timeouts, using defaults");
            reqwest::Client::new()
        }
    }
}
