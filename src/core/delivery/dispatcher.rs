//! Routing of completed utterances to the delivery sinks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use url::Url;

use super::broadcast::ListenerRegistry;
use super::media::MediaPushClient;
use super::recall::RecallClient;
use super::DeliveryError;
use crate::config::{DefaultRoute, ServerConfig};
use crate::core::tts::{MP3_44100_128, PCM_16000, SpeechSynthesizer};
use crate::utils::validate_media_url;

/// Synthesis sink chosen for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// PCM pushed to the client's `media_url`
    RawMedia { url: Url },
    /// MP3 injected into a Recall bot
    BotAudio { bot_id: Option<String> },
    /// No synthesis
    Disabled,
}

impl DeliveryRoute {
    /// Pick the route for a session.
    ///
    /// A `media_url` always wins. A rejected `media_url` disables synthesis
    /// for the session instead of falling back to the bot. Without one, the
    /// configured default applies; `raw_media` as a default has no URL to
    /// push to and is treated as disabled.
    pub async fn resolve(
        media_url: Option<&str>,
        bot_id: Option<&str>,
        config: &ServerConfig,
    ) -> Self {
        if let Some(raw) = media_url {
            return match validate_media_url(raw, config.allow_private_media_urls).await {
                Ok(url) => Self::RawMedia { url },
                Err(e) => {
                    tracing::warn!(media_url = raw, error = %e, "Rejected media_url, synthesis disabled for session");
                    Self::Disabled
                }
            };
        }

        match config.default_route {
            DefaultRoute::BotAudio => Self::BotAudio {
                bot_id: bot_id
                    .map(str::to_string)
                    .or_else(|| config.recall_bot_id.clone()),
            },
            DefaultRoute::RawMedia => {
                tracing::warn!("Default route is raw_media but no media_url was given");
                Self::Disabled
            }
            DefaultRoute::Disabled => Self::Disabled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RawMedia { .. } => "raw_media",
            Self::BotAudio { .. } => "bot_audio",
            Self::Disabled => "none",
        }
    }
}

/// Delivers completed utterances for one bridge session.
///
/// The local broadcast runs inline; the synthesis sink runs in a detached
/// task so a slow TTS call never holds up the relay.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    session_id: Arc<str>,
    route: DeliveryRoute,
    listeners: Option<Arc<ListenerRegistry>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    recall: Option<Arc<RecallClient>>,
    media: MediaPushClient,
}

impl DeliveryDispatcher {
    pub fn new(
        session_id: impl Into<Arc<str>>,
        route: DeliveryRoute,
        listeners: Option<Arc<ListenerRegistry>>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        recall: Option<Arc<RecallClient>>,
        media: MediaPushClient,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            route,
            listeners,
            synthesizer,
            recall,
            media,
        }
    }

    pub fn route(&self) -> &DeliveryRoute {
        &self.route
    }

    /// Deliver one utterance to every configured sink.
    ///
    /// Returns the handle of the synthesis task, if one was started.
    pub fn dispatch(&self, text: String) -> Option<JoinHandle<()>> {
        if let Some(listeners) = &self.listeners {
            listeners.broadcast_say(&text);
        }

        if self.route == DeliveryRoute::Disabled {
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move {
            let route = this.route.name();
            match this.synthesize_and_deliver(&text).await {
                Ok(()) => {}
                Err(e @ DeliveryError::MissingCredential(_)) | Err(e @ DeliveryError::MissingBotId) => {
                    tracing::warn!(session_id = %this.session_id, route, error = %e, "Delivery skipped");
                }
                Err(e) => {
                    tracing::error!(session_id = %this.session_id, route, error = %e, "Delivery failed");
                }
            }
        }))
    }

    async fn synthesize_and_deliver(&self, text: &str) -> Result<(), DeliveryError> {
        match &self.route {
            DeliveryRoute::Disabled => Ok(()),
            DeliveryRoute::BotAudio { bot_id } => {
                let bot_id = bot_id.as_deref().ok_or(DeliveryError::MissingBotId)?;
                let recall = self
                    .recall
                    .as_ref()
                    .ok_or(DeliveryError::MissingCredential("RECALL_API_KEY"))?;
                let audio = self.synthesizer()?.synthesize(text, MP3_44100_128).await?;
                recall.output_audio(bot_id, &audio).await
            }
            DeliveryRoute::RawMedia { url } => {
                let audio = self.synthesizer()?.synthesize(text, PCM_16000).await?;
                self.media.push_pcm(url, &audio).await.map(|_| ())
            }
        }
    }

    fn synthesizer(&self) -> Result<&Arc<dyn SpeechSynthesizer>, DeliveryError> {
        self.synthesizer
            .as_ref()
            .ok_or(DeliveryError::MissingCredential("ELEVENLABS_API_KEY"))
    }
}
