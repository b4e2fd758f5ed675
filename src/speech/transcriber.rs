use super::audio_ref::AudioRef;
use super::encoding::AudioEncoding;
use super::recognizer::{
    RecognitionConfig, RecognitionProvider, RecognitionRequest, RecognitionSegment, SpeechError,
};
use crate::server::metrics;
use crate::timeout::{call_with_timeout, CallError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Turns audio into text. `None` means "could not understand", whatever the
/// reason; details go to the logs.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioRef) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriberSettings {
    pub language_code: String,
    pub alternative_language_codes: Vec<String>,
    pub model: String,
    pub use_enhanced: bool,
    /// Covers download and recognition together.
    pub timeout: Duration,
    pub max_audio_bytes: usize,
}

impl Default for TranscriberSettings {
    fn default() -> Self {
        Self {
            language_code: "ko-KR".to_string(),
            alternative_language_codes: vec!["en-US".to_string()],
            model: "latest_long".to_string(),
            use_enhanced: true,
            timeout: Duration::from_secs(30),
            max_audio_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Joins the top alternative of each segment with single spaces.
/// Returns `None` when nothing but whitespace was recognized.
pub fn join_segments(segments: &[RecognitionSegment]) -> Option<String> {
    let joined = segments
        .iter()
        .map(|s| s.transcript.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

pub struct SpeechTranscriber {
    provider: Arc<dyn RecognitionProvider>,
    client: Client,
    settings: TranscriberSettings,
}

struct LoadedAudio {
    bytes: Vec<u8>,
    encoding: AudioEncoding,
}

impl SpeechTranscriber {
    pub fn new(
        provider: Arc<dyn RecognitionProvider>,
        client: Client,
        settings: TranscriberSettings,
    ) -> Self {
        Self {
            provider,
            client,
            settings,
        }
    }

    /// Reads a download body, giving up as soon as it exceeds the audio cap.
    async fn read_capped(&self, mut response: reqwest::Response) -> Result<Vec<u8>, SpeechError> {
        let max = self.settings.max_audio_bytes;
        if let Some(declared) = response.content_length() {
            if declared > max as u64 {
                return Err(SpeechError::TooLarge(declared as usize));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SpeechError::Download(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max {
                return Err(SpeechError::TooLarge(bytes.len() + chunk.len()));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn load_audio(&self, audio: &AudioRef) -> Result<LoadedAudio, SpeechError> {
        match audio {
            AudioRef::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| SpeechError::Download(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(SpeechError::Download(format!(
                        "status {} for {}",
                        response.status(),
                        url
                    )));
                }
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = self.read_capped(response).await?;
                let encoding =
                    AudioEncoding::detect(Some(url), content_type.as_deref(), None, &bytes);
                Ok(LoadedAudio { bytes, encoding })
            }
            AudioRef::Inline { mime_type, data } => Ok(LoadedAudio {
                encoding: AudioEncoding::detect(None, None, mime_type.as_deref(), data),
                bytes: data.clone(),
            }),
        }
    }

    async fn run(&self, audio: &AudioRef) -> Result<Option<String>, SpeechError> {
        let loaded = self.load_audio(audio).await?;
        if loaded.bytes.len() > self.settings.max_audio_bytes {
            return Err(SpeechError::TooLarge(loaded.bytes.len()));
        }
        debug!(
            "Recognizing {} bytes as {}",
            loaded.bytes.len(),
            loaded.encoding.api_name()
        );

        let request = RecognitionRequest {
            config: RecognitionConfig {
                encoding: loaded.encoding,
                sample_rate_hz: loaded.encoding.sample_rate_hz(),
                language_code: self.settings.language_code.clone(),
                alternative_language_codes: self.settings.alternative_language_codes.clone(),
                enable_automatic_punctuation: true,
                model: self.settings.model.clone(),
                use_enhanced: self.settings.use_enhanced,
            },
            audio: loaded.bytes,
        };
        let segments = self.provider.recognize(&request).await?;
        Ok(join_segments(&segments))
    }
}

#[async_trait]
impl Transcriber for SpeechTranscriber {
    async fn transcribe(&self, audio: &AudioRef) -> Option<String> {
        let start = Instant::now();
        let service = format!("speech_{}", self.provider.name());
        match call_with_timeout(self.settings.timeout, self.run(audio)).await {
            Ok(Some(text)) => {
                metrics::record_external_call(&service, "ok", start.elapsed());
                info!("Transcribed audio in {:?}", start.elapsed());
                Some(text)
            }
            Ok(None) => {
                metrics::record_external_call(&service, "ok", start.elapsed());
                warn!("Recognition returned no transcript");
                None
            }
            Err(CallError::TimedOut(after)) => {
                metrics::record_external_call(&service, "timeout", start.elapsed());
                warn!("Transcription timed out after {:?}", after);
                None
            }
            Err(CallError::Failed(err)) => {
                metrics::record_external_call(&service, "error", start.elapsed());
                warn!("Transcription failed: {}", err);
                None
            }
        }
    }
}
