use super::provider::{SynthesisError, SynthesizedAudio, VoiceProvider};
use crate::server::metrics;
use crate::timeout::{call_with_timeout, CallError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Voice synthesis with a deadline. Failures are logged and reported as
/// `None`; callers decide what a missing voice means.
pub struct SpeechSynthesizer {
    provider: Arc<dyn VoiceProvider>,
    default_voice_id: String,
    timeout: Duration,
}

impl SpeechSynthesizer {
    pub fn new(
        provider: Arc<dyn VoiceProvider>,
        default_voice_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SynthesisError> {
        let default_voice_id = default_voice_id.into();
        if default_voice_id.trim().is_empty() {
            return Err(SynthesisError::Configuration(
                "default voice id is not configured".to_string(),
            ));
        }
        Ok(Self {
            provider,
            default_voice_id,
            timeout,
        })
    }

    pub async fn synthesize(&self, text: &str) -> Option<SynthesizedAudio> {
        self.synthesize_with_voice(text, &self.default_voice_id)
            .await
    }

    pub async fn synthesize_with_voice(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Option<SynthesizedAudio> {
        if text.trim().is_empty() {
            return None;
        }
        let start = Instant::now();
        let service = format!("voice_{}", self.provider.name());
        let call = self.provider.synthesize(text, voice_id);

        match call_with_timeout(self.timeout, call).await {
            Ok(audio) => {
                metrics::record_external_call(&service, "ok", start.elapsed());
                info!(
                    "Synthesized {} bytes of {} in {:?}",
                    audio.bytes.len(),
                    audio.mime_type,
                    start.elapsed()
                );
                Some(audio)
            }
            Err(CallError::TimedOut(after)) => {
                metrics::record_external_call(&service, "timeout", start.elapsed());
                warn!("Voice synthesis timed out after {:?}", after);
                None
            }
            Err(CallError::Failed(SynthesisError::Api { status, message })) => {
                metrics::record_external_call(&service, "error", start.elapsed());
                warn!(status, body = %message, "Voice synthesis rejected");
                None
            }
            Err(CallError::Failed(err)) => {
                metrics::record_external_call(&service, "error", start.elapsed());
                warn!("Voice synthesis failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeVoice {
        result: fn() -> Result<SynthesizedAudio, SynthesisError>,
        delay: Duration,
        voices: Mutex<Vec<String>>,
    }

    impl FakeVoice {
        fn new(result: fn() -> Result<SynthesizedAudio, SynthesisError>) -> Self {
            Self {
                result,
                delay: Duration::ZERO,
                voices: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VoiceProvider for FakeVoice {
        fn name(&self) -> &str {
            "fake"
        }

        async fn synthesize(
            &self,
            _text: &str,
            voice_id: &str,
        ) -> Result<SynthesizedAudio, SynthesisError> {
            self.voices.lock().unwrap().push(voice_id.to_string());
            tokio::time::sleep(self.delay).await;
            (self.result)()
        }
    }

    fn ok_audio() -> Result<SynthesizedAudio, SynthesisError> {
        Ok(SynthesizedAudio {
            bytes: vec![1, 2],
            mime_type: "audio/mpeg".to_string(),
        })
    }

    fn rejected() -> Result<SynthesizedAudio, SynthesisError> {
        Err(SynthesisError::Api {
            status: 401,
            message: "bad key".to_string(),
        })
    }

    #[test]
    fn blank_default_voice_is_rejected() {
        let result =
            SpeechSynthesizer::new(Arc::new(FakeVoice::new(ok_audio)), " ", Duration::from_secs(1));
        assert!(matches!(result, Err(SynthesisError::Configuration(_))));
    }

    #[tokio::test]
    async fn uses_default_voice() {
        let voice = Arc::new(FakeVoice::new(ok_audio));
        let synthesizer =
            SpeechSynthesizer::new(voice.clone(), "rachel", Duration::from_secs(1)).unwrap();

        assert!(synthesizer.synthesize("hello").await.is_some());
        assert_eq!(voice.voices.lock().unwrap().as_slice(), ["rachel".to_string()]);
    }

    #[tokio::test]
    async fn provider_error_is_none() {
        let synthesizer = SpeechSynthesizer::new(
            Arc::new(FakeVoice::new(rejected)),
            "rachel",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(synthesizer.synthesize("hello").await.is_none());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut voice = FakeVoice::new(ok_audio);
        voice.delay = Duration::from_secs(5);
        let synthesizer =
            SpeechSynthesizer::new(Arc::new(voice), "rachel", Duration::from_millis(50)).unwrap();
        assert!(synthesizer.synthesize("hello").await.is_none());
    }

    #[tokio::test]
    async fn blank_text_is_not_sent() {
        let voice = Arc::new(FakeVoice::new(ok_audio));
        let synthesizer =
            SpeechSynthesizer::new(voice.clone(), "rachel", Duration::from_secs(1)).unwrap();
        assert!(synthesizer.synthesize("  ").await.is_none());
        assert!(voice.voices.lock().unwrap().is_empty());
    }
}
