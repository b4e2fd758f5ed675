mod audio_ref;
mod encoding;
mod google;
mod mock;
mod recognizer;
mod transcriber;

pub use audio_ref::{AudioRef, AudioRefError};
pub use encoding::AudioEncoding;
pub use google::{GoogleSpeechRecognizer, DEFAULT_SPEECH_ENDPOINT};
pub use mock::MockRecognizer;
pub use recognizer::{
    RecognitionConfig, RecognitionProvider, RecognitionRequest, RecognitionSegment, SpeechError,
};
pub use transcriber::{join_segments, SpeechTranscriber, Transcriber, TranscriberSettings};
