//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `telephony` - Twilio voice webhook and media stream socket

pub mod api;
pub mod telephony;

pub use telephony::{incoming_call_handler, media_stream_handler};
