//! Telephony route configuration
//!
//! Point the Twilio phone number's voice webhook at `/incoming-call`. The
//! TwiML it returns makes Twilio open the media stream socket at
//! `/telephone/handler` on the same host.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::telephony::twiml::MEDIA_STREAM_PATH;
use crate::handlers::telephony::{incoming_call_handler, media_stream_handler};
use crate::state::AppState;
use std::sync::Arc;

/// Create the telephony router
///
/// # Endpoints
///
/// - `GET|POST /incoming-call` - TwiML answering the call
/// - `GET /telephone/handler` - WebSocket upgrade for the Twilio media stream
pub fn create_telephony_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/incoming-call",
            get(incoming_call_handler).post(incoming_call_handler),
        )
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
