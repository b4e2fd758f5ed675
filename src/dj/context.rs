use crate::nearby::NearbyDrop;
use serde::Serialize;

/// Drops beyond this many are left out of the prompt.
pub const MAX_CONTEXT_DROPS: usize = 10;

pub const NO_DROPS_NOTICE: &str = "There are no music drops near the listener right now. \
Let them know gently and encourage them to drop a song of their own at this spot.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextDrop<'a> {
    track_name: &'a str,
    artist_name: &'a str,
    mood: &'a str,
    user_text: &'a str,
    distance_km: f64,
    like_count: i64,
}

impl<'a> From<&'a NearbyDrop> for ContextDrop<'a> {
    fn from(drop: &'a NearbyDrop) -> Self {
        Self {
            track_name: &drop.track_name,
            artist_name: &drop.artist_name,
            mood: &drop.mood,
            user_text: &drop.user_text,
            distance_km: drop.distance_km,
            like_count: drop.like_count,
        }
    }
}

/// The user turn sent to the model: the question followed by the grounding
/// context.
pub fn build_grounded_prompt(query: &str, nearby: &[NearbyDrop]) -> String {
    if nearby.is_empty() {
        return format!("Listener: {}\n\n{}", query, NO_DROPS_NOTICE);
    }

    let drops: Vec<ContextDrop<'_>> = nearby
        .iter()
        .take(MAX_CONTEXT_DROPS)
        .map(ContextDrop::from)
        .collect();
    // Serializing borrowed strings and numbers cannot fail.
    let json = serde_json::to_string_pretty(&drops).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Listener: {}\n\nMusic drops near the listener, closest first:\n{}",
        query, json
    )
}
