use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use super::twiml::{connect_stream_twiml, media_stream_url};
use crate::state::AppState;

/// Twilio voice webhook for an incoming call.
///
/// Answers with TwiML that bridges the call to the media stream socket on
/// this server. Twilio may call it with GET or POST; the form body is not used.
pub async fn incoming_call_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let host = state
        .config
        .public_host
        .clone()
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        })
        .unwrap_or_else(|| "localhost".to_string());

    let stream_url = media_stream_url(&host);
    info!(stream_url = %stream_url, "Incoming call, connecting media stream");

    (
        [(header::CONTENT_TYPE, "application/xml")],
        connect_stream_twiml(&stream_url),
    )
        .into_response()
}
