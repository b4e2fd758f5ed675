mod error;
mod models;
mod orchestrator;

pub use error::ConversationError;
pub use models::{
    parse_location, AskBody, ConversationRequest, ConversationResponse, TrackView,
    ValidationError,
};
pub use orchestrator::{ConversationService, ConversationSettings, NarratedStory};
