// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One relay session per accepted call.
//!
//! [`CallSession::run`] bootstraps the gateway, then runs the two directional
//! loops as separate tasks until either transport goes away. Whichever side
//! drops first closes the other's link; teardown closes both and cancels any
//! tool call still in flight.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use voxrelay_core::{RelayError, SessionProfile};
use voxrelay_tools::ToolRegistry;

use crate::bootstrap::bootstrap;
use crate::conversation::Conversation;
use crate::inbound::AudioFrameRelay;
use crate::interruption::InterruptionController;
use crate::ledger::LedgerHandle;
use crate::link::Link;
use crate::orchestrator::{ToolCall, ToolOrchestrator};
use crate::outbound::ResponseRelay;
use crate::protocol::realtime::{parse_server_event, LOGGED_EVENT_TYPES};
use crate::protocol::ServerEvent;
use crate::settings::RelaySettings;
use crate::state::StateHandle;

/// Everything a call needs besides its transports.
#[derive(Debug, Clone)]
pub struct CallSession {
    profile: Arc<SessionProfile>,
    tools: Arc<ToolRegistry>,
    settings: Arc<RelaySettings>,
    state: StateHandle,
    ledger: LedgerHandle,
}

impl CallSession {
    pub fn new(
        profile: Arc<SessionProfile>,
        tools: Arc<ToolRegistry>,
        settings: Arc<RelaySettings>,
    ) -> Self {
        Self {
            profile,
            tools,
            settings,
            state: StateHandle::new(),
            ledger: LedgerHandle::new(),
        }
    }

    /// Handle to this call's stream state.
    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    /// Handle to this call's response ledger.
    pub fn ledger(&self) -> LedgerHandle {
        self.ledger.clone()
    }

    /// Relays the call until either side disconnects.
    ///
    /// `telephony_frames` and `gateway_events` yield inbound text frames and
    /// end when their connection closes. Outbound frames are written through
    /// the two links. Both links are closed when this returns.
    pub async fn run<T, G>(
        self,
        telephony_frames: T,
        telephony: Link,
        gateway_events: G,
        gateway: Link,
    ) -> Result<(), RelayError>
    where
        T: Stream<Item = String> + Unpin + Send + 'static,
        G: Stream<Item = String> + Unpin + Send + 'static,
    {
        let tool_cancel = CancellationToken::new();
        let conversation = Conversation::new(gateway.clone(), self.ledger.clone());

        if let Err(e) = bootstrap(&self.profile, &conversation).await {
            warn!(error = %e, "session bootstrap failed");
            telephony.close();
            gateway.close();
            return Err(e);
        }

        let inbound = AudioFrameRelay::new(self.state.clone(), gateway.clone());
        let router = GatewayEventRouter {
            ledger: self.ledger.clone(),
            responses: ResponseRelay::new(
                self.state.clone(),
                telephony.clone(),
                self.settings.mark_name.as_str(),
            ),
            interruption: InterruptionController::new(
                self.state.clone(),
                gateway.clone(),
                telephony.clone(),
                self.settings.show_timing_math,
            ),
            orchestrator: ToolOrchestrator::new(
                conversation,
                Arc::clone(&self.tools),
                Arc::clone(&self.settings),
                self.profile.settings.modalities_or_default(),
                tool_cancel.clone(),
            ),
        };

        let inbound_task = tokio::spawn(
            inbound
                .run(telephony_frames, telephony.clone())
                .in_current_span(),
        );
        let outbound_task = tokio::spawn(
            router
                .run(gateway_events, gateway.clone(), telephony.clone())
                .in_current_span(),
        );

        let (inbound_result, outbound_result) = tokio::join!(inbound_task, outbound_task);
        for (direction, result) in [("inbound", inbound_result), ("outbound", outbound_result)] {
            if let Err(e) = result {
                warn!(direction, error = %e, "relay loop ended abnormally");
            }
        }

        tool_cancel.cancel();
        telephony.close();
        gateway.close();
        info!("call session ended");
        Ok(())
    }
}

/// Dispatches gateway events to the components that own them.
#[derive(Debug, Clone)]
struct GatewayEventRouter {
    ledger: LedgerHandle,
    responses: ResponseRelay,
    interruption: InterruptionController,
    orchestrator: ToolOrchestrator,
}

impl GatewayEventRouter {
    async fn run<G>(self, mut events: G, gateway: Link, telephony: Link)
    where
        G: Stream<Item = String> + Unpin,
    {
        loop {
            tokio::select! {
                biased;
                _ = gateway.closed() => {
                    debug!("gateway link closed");
                    break;
                }
                event = events.next() => match event {
                    Some(frame) => self.handle(&frame).await,
                    None => {
                        info!("gateway disconnected");
                        break;
                    }
                },
            }
        }
        telephony.close();
    }

    async fn handle(&self, frame: &str) {
        let (event_type, event) = match parse_server_event(frame) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "dropping malformed gateway event");
                return;
            }
        };
        if LOGGED_EVENT_TYPES.contains(&event_type.as_str()) {
            debug!(event_type = event_type.as_str(), "gateway event");
        }

        let result = match event {
            ServerEvent::SessionCreated => {
                info!("gateway session created");
                Ok(())
            }
            ServerEvent::ResponseCreated { response } | ServerEvent::ResponseDone { response } => {
                self.ledger.upsert(&response.id, response.status);
                Ok(())
            }
            ServerEvent::AudioDelta { delta, item_id } => {
                self.responses.forward_delta(delta, item_id.as_deref()).await
            }
            ServerEvent::SpeechStarted => self.interruption.on_speech_started().await.map(|_| ()),
            ServerEvent::FunctionCallArgumentsDone {
                call_id,
                name,
                arguments,
            } => {
                info!(call_id = call_id.as_str(), tool = name.as_str(), "function call requested");
                self.orchestrator.dispatch(ToolCall {
                    call_id,
                    name,
                    arguments,
                });
                Ok(())
            }
            ServerEvent::Error { error } => {
                warn!(
                    message = error.message.as_str(),
                    code = error.code.as_deref().unwrap_or_default(),
                    "gateway reported an error"
                );
                Ok(())
            }
            ServerEvent::Other => Ok(()),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => debug!(error = %e, "peer went away mid-event"),
            Err(e) => warn!(error = %e, event_type = event_type.as_str(), "failed to handle gateway event"),
        }
    }
}
