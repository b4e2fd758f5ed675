mod elevenlabs;
mod mock;
mod provider;
mod synthesizer;

pub use elevenlabs::{
    ElevenLabsProvider, DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_URL, DEFAULT_OUTPUT_FORMAT,
};
pub use mock::SilentVoiceProvider;
pub use provider::{SynthesisError, SynthesizedAudio, VoiceProvider};
pub use synthesizer::SpeechSynthesizer;
