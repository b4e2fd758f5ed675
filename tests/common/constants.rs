//! Shared constants for end-to-end tests
//!
//! Upstream replies, credentials and coordinates used across the suite.

use std::time::Duration;

// ============================================================================
// Places
// ============================================================================

/// Seoul City Hall, where the test listener stands.
pub const LISTENER_LAT: f64 = 37.5663;
pub const LISTENER_LNG: f64 = 126.9779;

/// A drop roughly 400 m from the listener.
pub const NEAR_LAT: f64 = 37.5700;
pub const NEAR_LNG: f64 = 126.9769;

/// Busan, far outside any search radius.
pub const FAR_LAT: f64 = 35.1796;
pub const FAR_LNG: f64 = 129.0756;

// ============================================================================
// Upstream services
// ============================================================================

pub const MODEL_API_KEY: &str = "sk-e2e";
pub const SPEECH_TOKEN: &str = "speech-e2e";
pub const VOICE_API_KEY: &str = "xi-e2e";
pub const VOICE_ID: &str = "dj-voice";
pub const STORY_VOICE_ID: &str = "story-voice";

/// What the model answers with unless a test overrides it.
pub const MODEL_ANSWER: &str = "Try Ditto by NewJeans, someone left it right around the corner.";

/// What the recognizer hears in every uploaded clip.
pub const SPOKEN_QUERY: &str = "비 오는 날 듣기 좋은 노래 추천해줘";

/// Bytes returned by the voice service.
pub const VOICE_AUDIO: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0x00];

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
