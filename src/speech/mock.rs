use super::recognizer::{
    RecognitionProvider, RecognitionRequest, RecognitionSegment, SpeechError,
};
use async_trait::async_trait;

/// Recognizer for local mode: every clip "says" the same sentence.
pub struct MockRecognizer {
    transcript: String,
}

impl MockRecognizer {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }
}

#[async_trait]
impl RecognitionProvider for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recognize(
        &self,
        _request: &RecognitionRequest,
    ) -> Result<Vec<RecognitionSegment>, SpeechError> {
        Ok(vec![RecognitionSegment {
            transcript: self.transcript.clone(),
            confidence: Some(1.0),
        }])
    }
}
