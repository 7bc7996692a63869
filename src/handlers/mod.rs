//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `bridge` - Client WebSocket bridged to the upstream realtime session
//! - `listen` - Local broadcast of completed utterances
//! - `tts` - Text-to-speech streaming helper

pub mod api;
pub mod bridge;
pub mod listen;
pub mod tts;

// Re-export commonly used handlers for convenient access
pub use bridge::bridge_handler;
pub use listen::listen_handler;
