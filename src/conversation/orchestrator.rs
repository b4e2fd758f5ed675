use super::error::ConversationError;
use super::models::{ConversationRequest, ConversationResponse, TrackView};
use crate::dj::{AnswerComposer, AnswerSource, ComposedStory, QueryResolver, StoryRequest};
use crate::nearby::{NearbyLocator, NearbyQuery};
use crate::server::metrics;
use crate::voice::{SpeechSynthesizer, SynthesizedAudio};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    pub radius_km: f64,
    /// Store fetch cap for the locator.
    pub candidate_limit: usize,
    /// Tracks returned to the client.
    pub max_tracks: usize,
    /// Voice used for storytelling; the synthesizer default when unset.
    pub story_voice_id: Option<String>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            candidate_limit: 20,
            max_tracks: 5,
            story_voice_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validating,
    Resolving,
    Composing,
    Synthesizing,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct NarratedStory {
    pub story: ComposedStory,
    pub audio: SynthesizedAudio,
}

/// Runs one ask from a validated request to the final response.
pub struct ConversationService {
    locator: NearbyLocator,
    resolver: QueryResolver,
    composer: AnswerComposer,
    synthesizer: SpeechSynthesizer,
    settings: ConversationSettings,
}

impl ConversationService {
    pub fn new(
        locator: NearbyLocator,
        resolver: QueryResolver,
        composer: AnswerComposer,
        synthesizer: SpeechSynthesizer,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            locator,
            resolver,
            composer,
            synthesizer,
            settings,
        }
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    pub fn locator(&self) -> &NearbyLocator {
        &self.locator
    }

    pub async fn ask(
        &self,
        request: ConversationRequest,
    ) -> Result<ConversationResponse, ConversationError> {
        let request_id = Uuid::new_v4();
        let start = Instant::now();
        debug!(
            %request_id,
            stage = %Stage::Validating,
            has_text = request.text.is_some(),
            has_audio = request.audio.is_some(),
            "Ask accepted"
        );

        debug!(%request_id, stage = %Stage::Resolving, "Locating drops and resolving query");
        let query = NearbyQuery {
            center: request.location,
            radius_km: self.settings.radius_km,
            mood: None,
            limit: self.settings.candidate_limit,
        };
        let (nearby, resolved) = tokio::join!(
            self.locator.find_nearby(&query),
            self.resolver
                .resolve(request.text.as_deref(), request.audio.as_ref())
        );
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                info!(%request_id, "Ask rejected while resolving: {}", err);
                return Err(err.into());
            }
        };

        debug!(
            %request_id,
            stage = %Stage::Composing,
            origin = ?resolved.origin,
            nearby = nearby.len(),
            "Composing answer"
        );
        let answer = self.composer.compose(&resolved.text, &nearby).await;

        debug!(%request_id, stage = %Stage::Synthesizing, "Synthesizing answer");
        let tts_audio_url = match self.synthesizer.synthesize(&answer.text).await {
            Some(audio) => Some(audio.to_data_uri()),
            None => {
                warn!(%request_id, "Answer will be returned without audio");
                metrics::record_degraded("synthesizer");
                None
            }
        };

        let tracks: Vec<TrackView> = nearby
            .into_iter()
            .take(self.settings.max_tracks)
            .map(TrackView::from)
            .collect();

        info!(
            %request_id,
            stage = %Stage::Done,
            tracks = tracks.len(),
            model_answer = answer.source == AnswerSource::Model,
            with_audio = tts_audio_url.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ask completed"
        );

        Ok(ConversationResponse {
            answer_text: answer.text,
            tracks,
            tts_audio_url,
        })
    }

    /// Introduces a drop and reads its memory aloud. Without audio there is
    /// nothing to return, so synthesis failure is an error here.
    pub async fn narrate(&self, request: StoryRequest) -> Result<NarratedStory, ConversationError> {
        let request_id = Uuid::new_v4();
        let story = self.composer.compose_story(&request).await;

        let audio = match &self.settings.story_voice_id {
            Some(voice_id) => {
                self.synthesizer
                    .synthesize_with_voice(&story.narration, voice_id)
                    .await
            }
            None => self.synthesizer.synthesize(&story.narration).await,
        };
        let audio = audio.ok_or_else(|| {
            warn!(%request_id, "Story narration could not be synthesized");
            ConversationError::SynthesisUnavailable
        })?;

        info!(
            %request_id,
            model_intro = story.source == AnswerSource::Model,
            bytes = audio.bytes.len(),
            "Story narrated"
        );
        Ok(NarratedStory { story, audio })
    }
}
