use super::provider::{SynthesisError, SynthesizedAudio, VoiceProvider};
use async_trait::async_trait;

const SAMPLE_RATE: u32 = 16_000;

/// Builds a mono 16-bit PCM WAV file of silence.
fn silent_wav(duration_ms: u32) -> Vec<u8> {
    let data_len = SAMPLE_RATE * duration_ms / 1000 * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// Voice provider for local mode: returns half a second of silence.
#[derive(Default)]
pub struct SilentVoiceProvider;

#[async_trait]
impl VoiceProvider for SilentVoiceProvider {
    fn name(&self) -> &str {
        "silent"
    }

    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: &str,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        Ok(SynthesizedAudio {
            bytes: silent_wav(500),
            mime_type: "audio/wav".to_string(),
        })
    }
}
