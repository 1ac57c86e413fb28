// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telephony -> gateway direction.

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};
use voxrelay_core::RelayError;

use crate::link::Link;
use crate::protocol::{ClientEvent, TelephonyEvent};
use crate::state::StateHandle;

/// Forwards caller audio to the gateway and keeps the stream clock.
#[derive(Debug, Clone)]
pub struct AudioFrameRelay {
    state: StateHandle,
    gateway: Link,
}

impl AudioFrameRelay {
    pub fn new(state: StateHandle, gateway: Link) -> Self {
        Self { state, gateway }
    }

    /// Handles one telephony frame. Malformed frames are logged and dropped.
    pub async fn handle_frame(&self, frame: &str) {
        let event = match serde_json::from_str::<TelephonyEvent>(frame) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping malformed telephony frame");
                return;
            }
        };

        match event {
            TelephonyEvent::Media { media } => {
                self.state.lock().record_media(media.timestamp);
                if !self.gateway.is_open() {
                    return;
                }
                match self
                    .gateway
                    .send_json(&ClientEvent::append_audio(media.payload))
                    .await
                {
                    Ok(()) | Err(RelayError::Closed(_)) => {}
                    Err(e) => warn!(error = %e, "failed to forward caller audio"),
                }
            }
            TelephonyEvent::Start { start } => {
                info!(stream_sid = start.stream_sid.as_str(), "media stream started");
                self.state.lock().start(start.stream_sid);
            }
            TelephonyEvent::Mark { .. } => {
                self.state.lock().pop_mark();
            }
            TelephonyEvent::Stop => info!("media stream stopped"),
            TelephonyEvent::Connected | TelephonyEvent::Other => {}
        }
    }

    /// Reads telephony frames until the stream ends or the telephony link
    /// closes, then closes the gateway link.
    pub async fn run<S>(self, mut frames: S, telephony: Link)
    where
        S: Stream<Item = String> + Unpin,
    {
        loop {
            tokio::select! {
                biased;
                _ = telephony.closed() => {
                    debug!("telephony link closed");
                    break;
                }
                frame = frames.next() => match frame {
                    Some(frame) => self.handle_frame(&frame).await,
                    None => {
                        info!("telephony disconnected");
                        break;
                    }
                },
            }
        }
        self.gateway.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxrelay_core::TransportKind;

    fn relay() -> (AudioFrameRelay, StateHandle, crate::link::Outbox) {
        let state = StateHandle::new();
        let (gateway, outbox) = Link::new(TransportKind::Gateway);
        (AudioFrameRelay::new(state.clone(), gateway), state, outbox)
    }

    #[tokio::test]
    async fn media_payload_is_forwarded_verbatim() {
        let (relay, state, mut outbox) = relay();
        relay
            .handle_frame(r#"{"event":"media","media":{"timestamp":"320","payload":"AAEC"}}"#)
            .await;

        assert_eq!(
            outbox.recv().await.as_deref(),
            Some(r#"{"type":"input_audio_buffer.append","audio":"AAEC"}"#)
        );
        assert_eq!(state.snapshot().latest_media_timestamp_ms, 320);
    }

    #[tokio::test]
    async fn media_is_dropped_once_gateway_closes() {
        let (relay, state, mut outbox) = relay();
        relay.gateway.close();
        relay
            .handle_frame(r#"{"event":"media","media":{"timestamp":"40","payload":"AAEC"}}"#)
            .await;

        assert_eq!(outbox.recv().await, None);
        assert_eq!(state.snapshot().latest_media_timestamp_ms, 40);
    }

    #[tokio::test]
    async fn start_resets_and_mark_pops() {
        let (relay, state, _outbox) = relay();
        {
            let mut s = state.lock();
            s.record_media(999);
            s.stream_sid = Some("old".into());
            s.push_mark("responsePart");
            s.push_mark("responsePart");
        }
        relay
            .handle_frame(r#"{"event":"mark","mark":{"name":"responsePart"}}"#)
            .await;
        assert_eq!(state.snapshot().pending_marks.len(), 1);

        relay
            .handle_frame(r#"{"event":"start","start":{"streamSid":"MZ2"}}"#)
            .await;
        let snapshot = state.snapshot();
        assert_eq!(snapshot.stream_sid.as_deref(), Some("MZ2"));
        assert_eq!(snapshot.latest_media_timestamp_ms, 0);
        assert!(snapshot.pending_marks.is_empty());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn malformed_frames_are_dropped() {
        let (relay, state, _outbox) = relay();
        relay.handle_frame("not json").await;
        relay.handle_frame(r#"{"event":"media"}"#).await;
        assert_eq!(state.snapshot(), Default::default());
        assert!(logs_contain("dropping malformed telephony frame"));
    }

    #[tokio::test]
    async fn end_of_stream_closes_gateway() {
        let (relay, _state, _outbox) = relay();
        let gateway = relay.gateway.clone();
        let (telephony, _telephony_outbox) = Link::new(TransportKind::Telephony);

        relay.run(futures::stream::empty::<String>(), telephony).await;
        assert!(!gateway.is_open());
    }
}
