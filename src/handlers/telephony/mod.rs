//! Twilio telephony handlers
//!
//! - `call` - voice webhook answering incoming calls with TwiML
//! - `media_stream` - WebSocket carrying the call's audio in both directions

pub mod call;
pub mod media_stream;
pub mod messages;
pub mod twiml;

pub use call::incoming_call_handler;
pub use media_stream::media_stream_handler;
