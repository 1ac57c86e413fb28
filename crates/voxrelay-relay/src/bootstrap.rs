// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opening moves on a fresh gateway connection.

use tracing::{debug, info};
use voxrelay_core::{RelayError, SessionProfile};

use crate::conversation::Conversation;
use crate::protocol::realtime::SessionConfig;
use crate::protocol::ClientEvent;

/// Builds the `session.update` payload for `profile`, filling in defaults.
pub fn session_config(profile: &SessionProfile) -> SessionConfig {
    let settings = &profile.settings;
    SessionConfig {
        turn_detection: settings.turn_detection_or_default(),
        input_audio_format: settings.input_audio_format_or_default(),
        output_audio_format: settings.output_audio_format_or_default(),
        voice: profile.voice.clone(),
        instructions: profile.instructions.clone(),
        modalities: settings.modalities_or_default(),
        temperature: settings.temperature_or_default(),
        tools: profile.tools_schema.clone(),
        tool_choice: "auto".to_string(),
    }
}

/// Configures the session and, when the profile has a greeting, lets the
/// AI speak first.
pub async fn bootstrap(profile: &SessionProfile, conversation: &Conversation) -> Result<(), RelayError> {
    let session = session_config(profile);
    debug!(
        voice = session.voice.as_str(),
        tools = session.tools.len(),
        "sending session update"
    );
    conversation
        .gateway()
        .send_json(&ClientEvent::SessionUpdate { session })
        .await?;

    if let Some(greeting) = profile.greeting.as_deref().filter(|g| !g.trim().is_empty()) {
        info!("AI speaks first");
        conversation.inject(greeting).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::{json, Value};
    use voxrelay_core::{SessionSettings, TransportKind};

    use crate::ledger::LedgerHandle;
    use crate::link::Link;

    fn profile() -> SessionProfile {
        SessionProfile {
            voice: "coral".into(),
            instructions: "You sell cars.".into(),
            greeting: None,
            settings: SessionSettings::default(),
            tools_schema: vec![json!({"type": "function", "name": "check_inventory"})],
        }
    }

    async fn run(profile: &SessionProfile) -> Vec<Value> {
        let (gateway, mut outbox) = Link::new(TransportKind::Gateway);
        bootstrap(profile, &Conversation::new(gateway, LedgerHandle::new()))
            .await
            .unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = outbox.recv().now_or_never().flatten() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn session_update_fills_defaults() {
        let frames = run(&profile()).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0],
            json!({
                "type": "session.update",
                "session": {
                    "turn_detection": {"type": "server_vad"},
                    "input_audio_format": "g711_ulaw",
                    "output_audio_format": "g711_ulaw",
                    "voice": "coral",
                    "instructions": "You sell cars.",
                    "modalities": ["text", "audio"],
                    "temperature": 0.8,
                    "tools": [{"type": "function", "name": "check_inventory"}],
                    "tool_choice": "auto"
                }
            })
        );
    }

    #[tokio::test]
    async fn explicit_settings_override_defaults() {
        let mut profile = profile();
        profile.settings.temperature = Some(1.0);
        profile.settings.modalities = Some(vec!["audio".into()]);
        let config = session_config(&profile);
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.modalities, vec!["audio"]);
    }

    #[tokio::test]
    async fn greeting_follows_session_update() {
        let mut profile = profile();
        profile.greeting = Some("Greet the caller warmly.".into());
        let frames = run(&profile).await;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1]["item"]["content"][0]["text"], "Greet the caller warmly.");
        assert_eq!(frames[2], json!({"type": "response.create"}));
    }

    #[tokio::test]
    async fn blank_greeting_is_ignored() {
        let mut profile = profile();
        profile.greeting = Some("  ".into());
        assert_eq!(run(&profile).await.len(), 1);
    }
}
