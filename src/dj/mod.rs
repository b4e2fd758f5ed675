mod composer;
mod context;
mod fallback;
mod prompts;
mod resolver;
mod storytelling;

pub use composer::{AnswerComposer, AnswerSource, ComposedAnswer};
pub use context::{build_grounded_prompt, MAX_CONTEXT_DROPS};
pub use fallback::{classify_query, fallback_answer, QueryCategory};
pub use prompts::{DJ_PERSONA, STORYTELLER_PERSONA};
pub use resolver::{QueryOrigin, QueryResolver, ResolveError, ResolvedQuery};
pub use storytelling::{
    format_drop_date, ComposedStory, StoryBody, StoryRequest, StoryRequestError,
};
