//! Deterministic answers used when the model is unavailable.

use crate::nearby::NearbyDrop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    Sad,
    Joy,
    Recommendation,
    Generic,
}

const SAD_KEYWORDS: &[&str] = &[
    "sad", "lonely", "cry", "tears", "depress", "heartbreak", "blue", "miss", "tired", "슬퍼",
    "슬픈", "슬프", "우울", "외로", "눈물", "힘들", "지쳐", "그리워",
];

const JOY_KEYWORDS: &[&str] = &[
    "happy", "joy", "excited", "celebrate", "fun", "great day", "party", "기뻐", "기쁜", "신나",
    "신난", "행복", "좋은 일", "설레",
];

const RECOMMENDATION_KEYWORDS: &[&str] = &[
    "recommend", "suggest", "what should i", "song for", "play", "listen", "추천", "들을",
    "들려", "틀어", "노래 좀",
];

/// First matching category wins, in the order sad, joy, recommendation.
pub fn classify_query(query: &str) -> QueryCategory {
    let lowered = query.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if contains_any(SAD_KEYWORDS) {
        QueryCategory::Sad
    } else if contains_any(JOY_KEYWORDS) {
        QueryCategory::Joy
    } else if contains_any(RECOMMENDATION_KEYWORDS) {
        QueryCategory::Recommendation
    } else {
        QueryCategory::Generic
    }
}

fn is_korean(text: &str) -> bool {
    text.chars()
        .any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c) || ('\u{3131}'..='\u{318E}').contains(&c))
}

fn closest_line(nearby: &[NearbyDrop], korean: bool) -> String {
    match nearby.first() {
        Some(drop) if korean => format!(
            "지금 가장 가까이에 남겨진 곡은 {}의 \"{}\"이에요.",
            drop.artist_name, drop.track_name
        ),
        Some(drop) => format!(
            "The closest song dropped near you is \"{}\" by {}.",
            drop.track_name, drop.artist_name
        ),
        None if korean => {
            "아직 이 근처엔 남겨진 노래가 없어요. 첫 번째 곡을 남겨보는 건 어때요?".to_string()
        }
        None => "Nobody has dropped a song around here yet. Why not be the first?".to_string(),
    }
}

/// Templated answer picked by keyword category. Never empty.
pub fn fallback_answer(query: &str, nearby: &[NearbyDrop]) -> String {
    let korean = is_korean(query);
    let opener = match (classify_query(query), korean) {
        (QueryCategory::Sad, false) => {
            "It sounds like a heavy moment. Let the music keep you company for a while."
        }
        (QueryCategory::Joy, false) => "I love that energy! Let's keep the good mood going.",
        (QueryCategory::Recommendation, false) => {
            "Looking for something to listen to? Let me point you to what people left nearby."
        }
        (QueryCategory::Generic, false) => "Thanks for tuning in to the Music Map DJ.",
        (QueryCategory::Sad, true) => "마음이 무거운 순간이네요. 잠시 음악에 기대어 보세요.",
        (QueryCategory::Joy, true) => "좋은 기분이 느껴져요! 그 기분 그대로 이어가 봐요.",
        (QueryCategory::Recommendation, true) => {
            "들을 노래를 찾고 있군요. 근처에 남겨진 곡을 소개해 드릴게요."
        }
        (QueryCategory::Generic, true) => "뮤직 맵 DJ에 찾아와 줘서 고마워요.",
    };
    format!("{} {}", opener, closest_line(nearby, korean))
}
