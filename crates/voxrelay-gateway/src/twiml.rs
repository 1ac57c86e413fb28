// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-control markup returned to the phone network.
//!
//! Answering an incoming call means telling the phone network to (optionally)
//! read an intro, pause for a second and then open a bidirectional media
//! stream back to `/media-stream/{tenant}`.

use std::fmt::Write as _;

/// Content type of [`connect_stream`] output.
pub const CONTENT_TYPE: &str = "application/xml";

/// Builds the `<Response>` document that bridges a call into a media stream.
pub fn connect_stream(intro: &str, stream_url: &str) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
    if !intro.trim().is_empty() {
        let _ = write!(xml, "<Say>{}</Say>", escape(intro));
    }
    let _ = write!(
        xml,
        r#"<Pause length="1"/><Connect><Stream url="{}"/></Connect></Response>"#,
        escape(stream_url)
    );
    xml
}

/// Websocket URL the phone network should stream `tenant`'s audio to.
///
/// `public_url` wins when configured (`https://` maps to `wss://`, `http://`
/// to `ws://`). Otherwise the request's `Host` is used over `wss://`.
pub fn media_stream_url(public_url: Option<&str>, host: &str, tenant: &str) -> String {
    let base = match public_url {
        Some(url) => {
            let url = url.trim_end_matches('/');
            if let Some(rest) = url.strip_prefix("https://") {
                format!("wss://{rest}")
            } else if let Some(rest) = url.strip_prefix("http://") {
                format!("ws://{rest}")
            } else {
                format!("wss://{url}")
            }
        }
        None => format!("wss://{host}"),
    };
    format!("{base}/media-stream/{tenant}")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
