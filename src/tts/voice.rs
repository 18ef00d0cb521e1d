use super::engine::SynthesisEngine;
use super::language::accent_voice;

/// Speaker chosen for a request, and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    /// The accent mapped to a voice the engine knows.
    Accent { voice: &'static str, speaker: i64 },
    /// The accent could not be resolved; the request's `speaker_id` is used.
    Fallback { speaker: i64 },
}

impl VoiceSelection {
    pub fn speaker(&self) -> i64 {
        match self {
            Self::Accent { speaker, .. } | Self::Fallback { speaker } => *speaker,
        }
    }

    pub fn voice(&self) -> Option<&'static str> {
        match self {
            Self::Accent { voice, .. } => Some(voice),
            Self::Fallback { .. } => None,
        }
    }
}

/// Pick the speaker index for `accent`, falling back to `speaker_id`.
///
/// Never fails: an unknown accent, a voice missing from the engine, or an
/// engine without a registry all degrade to the fallback with a warning.
pub fn resolve(engine: &dyn SynthesisEngine, accent: &str, speaker_id: i64) -> VoiceSelection {
    let Some(speakers) = engine.speakers() else {
        tracing::warn!(
            "Could not get speaker registry for {}, using default speaker {}",
            accent,
            speaker_id
        );
        return VoiceSelection::Fallback { speaker: speaker_id };
    };

    let Some(voice) = accent_voice(accent) else {
        tracing::warn!("Unknown accent {}, using default speaker {}", accent, speaker_id);
        return VoiceSelection::Fallback { speaker: speaker_id };
    };

    match speakers.get(voice) {
        Some(&speaker) => {
            tracing::info!("Using accent {} with speaker ID {}", voice, speaker);
            VoiceSelection::Accent { voice, speaker }
        }
        None => {
            tracing::warn!("Accent {} not found, using default speaker {}", voice, speaker_id);
            VoiceSelection::Fallback { speaker: speaker_id }
        }
    }
}
