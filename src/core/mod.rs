pub mod bridge;
pub mod delivery;
pub mod realtime;
pub mod tts;

// Re-export commonly used types for convenience
pub use bridge::{BridgeError, BridgeSession, ConnectionParams, SessionNegotiator};
pub use delivery::{DeliveryDispatcher, DeliveryError, DeliveryRoute, ListenerRegistry};
pub use realtime::RealtimeError;
pub use tts::{ElevenLabsTTS, SpeechSynthesizer, TTSError, TTSResult};
