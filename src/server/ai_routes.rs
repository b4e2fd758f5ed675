//! AI DJ endpoints: spoken or typed questions, and drop storytelling.

use super::state::{GuardedConversationService, ServerState};
use crate::conversation::{
    parse_location, AskBody, ConversationError, ConversationRequest, ConversationResponse,
    NarratedStory, ValidationError,
};
use crate::dj::{StoryBody, StoryRequest};
use crate::speech::AudioRef;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::debug;

const ASK_ENDPOINT: &str = "/v1/ai/ask";
const STORYTELLING_ENDPOINT: &str = "/v1/ai/storytelling";

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

fn malformed(err: impl std::fmt::Display) -> ConversationError {
    ValidationError::Malformed(err.to_string()).into()
}

/// Multipart asks carry the recording as `audio`, the location as a JSON
/// string and an optional `text`.
async fn read_multipart(mut multipart: Multipart) -> Result<ConversationRequest, ConversationError> {
    let mut body = AskBody::default();
    let mut upload: Option<AudioRef> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| malformed(e.body_text()))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let mime_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| malformed(e.body_text()))?;
                debug!("Received {} bytes of uploaded audio ({:?})", data.len(), mime_type);
                upload = Some(
                    AudioRef::from_upload(mime_type, data.to_vec())
                        .map_err(ValidationError::from)?,
                );
            }
            "location" => {
                let text = field.text().await.map_err(|e| malformed(e.body_text()))?;
                body.location = Some(serde_json::Value::String(text));
            }
            "text" => {
                body.text = Some(field.text().await.map_err(|e| malformed(e.body_text()))?);
            }
            "audioUrl" | "audioRef" => {
                body.audio_url = Some(field.text().await.map_err(|e| malformed(e.body_text()))?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    match upload {
        Some(audio) => {
            let location = parse_location(body.location.as_ref())?;
            Ok(ConversationRequest::new(body.text, Some(audio), location)?)
        }
        None => Ok(ConversationRequest::from_body(body)?),
    }
}

async fn read_ask(request: Request) -> Result<ConversationRequest, ConversationError> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| malformed(e.body_text()))?;
        return read_multipart(multipart).await;
    }
    let body: Result<Json<AskBody>, JsonRejection> = Json::from_request(request, &()).await;
    let Json(body) = body.map_err(|e| malformed(e.body_text()))?;
    Ok(ConversationRequest::from_body(body)?)
}

async fn ask(
    State(conversation): State<GuardedConversationService>,
    request: Request,
) -> Result<Json<ConversationResponse>, ConversationError> {
    let conversation_request = read_ask(request)
        .await
        .map_err(|e| e.recorded(ASK_ENDPOINT))?;
    let response = conversation
        .ask(conversation_request)
        .await
        .map_err(|e| e.recorded(ASK_ENDPOINT))?;
    Ok(Json(response))
}

async fn narrate_story(
    conversation: &GuardedConversationService,
    body: Result<Json<StoryBody>, JsonRejection>,
) -> Result<NarratedStory, ConversationError> {
    let Json(body) = body.map_err(|e| malformed(e.body_text()))?;
    let request = StoryRequest::from_body(body)?;
    conversation.narrate(request).await
}

/// Responds with the narration audio itself.
async fn storytelling(
    State(conversation): State<GuardedConversationService>,
    body: Result<Json<StoryBody>, JsonRejection>,
) -> Result<Response, ConversationError> {
    let narrated = narrate_story(&conversation, body)
        .await
        .map_err(|e| e.recorded(STORYTELLING_ENDPOINT))?;
    Ok((
        [(header::CONTENT_TYPE, narrated.audio.mime_type)],
        narrated.audio.bytes,
    )
        .into_response())
}

pub fn make_ai_routes(state: ServerState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/storytelling", post(storytelling))
        .with_state(state)
}
