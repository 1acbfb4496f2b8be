//! TwiML documents returned to Twilio's voice webhook.

pub const GREETING: &str = "Connecting to the AI assistant.";
pub const GOODBYE: &str = "The call has been disconnected.";

/// Path of the media stream socket, relative to the public host.
pub const MEDIA_STREAM_PATH: &str = "/telephone/handler";

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// WebSocket URL Twilio should stream the call to.
pub fn media_stream_url(host: &str) -> String {
    format!("wss://{host}{MEDIA_STREAM_PATH}")
}

/// Say a greeting, bridge the call to `stream_url`, and say goodbye once the stream ends.
pub fn connect_stream_twiml(stream_url: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Response>\
         <Say>{}</Say>\
         <Connect><Stream url=\"{}\"/></Connect>\
         <Say>{}</Say>\
         </Response>",
        escape_xml(GREETING),
        escape_xml(stream_url),
        escape_xml(GOODBYE)
    )
}
