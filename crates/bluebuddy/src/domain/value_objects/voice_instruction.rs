//! Voice Instructions
//!
//! Provider-neutral description of what the telephony provider should do
//! next on a live call. Adapters render a `VoiceScript` into the
//! provider's markup (TwiML for Twilio).

use serde::{Deserialize, Serialize};

/// One voice-response step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum VoiceInstruction {
    /// Synthesize `text` with `voice`
    Say { text: String, voice: Option<String> },
    /// Collect one utterance of speech and post it to `action_url`
    GatherSpeech {
        timeout_secs: u32,
        action_url: String,
    },
    /// Continue the call at `url`
    Redirect { url: String },
    /// End the call
    Hangup,
}

/// Ordered list of voice instructions returned for one callback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceScript {
    pub instructions: Vec<VoiceInstruction>,
}

impl VoiceScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>, voice: Option<&str>) -> Self {
        self.instructions.push(VoiceInstruction::Say {
            text: text.into(),
            voice: voice.map(str::to_string),
        });
        self
    }

    pub fn gather_speech(mut self, timeout_secs: u32, action_url: impl Into<String>) -> Self {
        self.instructions.push(VoiceInstruction::GatherSpeech {
            timeout_secs,
            action_url: action_url.into(),
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.instructions.push(VoiceInstruction::Redirect { url: url.into() });
        self
    }

    pub fn hangup(mut self) -> Self {
        self.instructions.push(VoiceInstruction::Hangup);
        self
    }

    /// Texts of every `Say` step, in order
    pub fn spoken(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                VoiceInstruction::Say { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn gathers(&self) -> bool {
        self.instructions
            .iter()
            .any(|i| matches!(i, VoiceInstruction::GatherSpeech { .. }))
    }

    pub fn hangs_up(&self) -> bool {
        self.instructions
            .iter()
            .any(|i| matches!(i, VoiceInstruction::Hangup))
    }
}
