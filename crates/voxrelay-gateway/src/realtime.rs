// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound connection to the realtime AI voice gateway.
//!
//! Every accepted call opens its own gateway websocket. The connection is
//! handed to the relay as a text-frame stream plus a [`Link`] whose writer
//! task owns the socket's sink.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{future, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, Instrument};
use voxrelay_core::{RelayError, TransportKind};
use voxrelay_relay::Link;

const BETA_HEADER: &str = "openai-beta";

/// An open gateway connection, ready to hand to a call session.
pub struct GatewayConnection {
    /// Write side. Closing it closes the websocket once queued frames flush.
    pub link: Link,
    /// Text frames from the gateway. Ends when the websocket closes.
    pub events: BoxStream<'static, String>,
}

impl std::fmt::Debug for GatewayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConnection")
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

/// Opens one gateway connection per call.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self) -> Result<GatewayConnection, RelayError>;
}

/// Connects to the realtime endpoint over websocket (rustls).
#[derive(Debug)]
pub struct RealtimeConnector {
    url: String,
    api_key: SecretString,
    beta_header: Option<String>,
    connect_timeout: Duration,
}

impl RealtimeConnector {
    pub fn new(url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            url: url.into(),
            api_key,
            beta_header: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sends `OpenAI-Beta: <value>` on the handshake. Blank disables it.
    pub fn with_beta_header(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.beta_header = (!value.trim().is_empty()).then_some(value);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builds the handshake request with credential and beta headers.
    pub fn request(&self) -> Result<Request, RelayError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| transport_error(format!("invalid gateway url `{}`", self.url), e))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| transport_error("gateway credential is not a valid header value", e))?;
        auth.set_sensitive(true);
        request.headers_mut().insert(header::AUTHORIZATION, auth);

        if let Some(beta) = &self.beta_header {
            let value = HeaderValue::from_str(beta)
                .map_err(|e| transport_error("invalid beta header value", e))?;
            request.headers_mut().insert(BETA_HEADER, value);
        }
        Ok(request)
    }
}

#[async_trait]
impl GatewayConnector for RealtimeConnector {
    async fn connect(&self) -> Result<GatewayConnection, RelayError> {
        let request = self.request()?;
        let (socket, response) =
            tokio::time::timeout(self.connect_timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| RelayError::Timeout {
                    duration: self.connect_timeout,
                })?
                .map_err(|e| transport_error("failed to connect to AI gateway", e))?;
        info!(status = response.status().as_u16(), "connected to AI gateway");

        let (sink, source) = socket.split();
        let (link, outbox) = Link::new(TransportKind::Gateway);
        tokio::spawn(
            outbox
                .drain_into(sink, |frame| Message::Text(frame.into()))
                .in_current_span(),
        );

        let events = source
            .take_while(|message| {
                future::ready(match message {
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "gateway sent close");
                        false
                    }
                    Ok(_) => true,
                    Err(e) => {
                        debug!(error = %e, "gateway read failed");
                        false
                    }
                })
            })
            .filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                    _ => None,
                })
            })
            .boxed();

        Ok(GatewayConnection { link, events })
    }
}

fn transport_error<E>(message: impl Into<String>, source: E) -> RelayError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = message.into();
    RelayError::Transport {
        transport: TransportKind::Gateway,
        message: format!("{message}: {source}"),
        source: Some(Box::new(source)),
    }
}
