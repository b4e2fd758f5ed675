//! Drop fixtures written straight into a server's store.

use music_map_server::drop_store::{DropStore, GeoPoint, MusicDrop, NewDrop, ANONYMOUS_OWNER};

pub struct DropSeed<'a> {
    pub track_name: &'a str,
    pub artist_name: &'a str,
    pub mood: &'a str,
    pub user_text: &'a str,
    pub lat: f64,
    pub lng: f64,
}

impl Default for DropSeed<'_> {
    fn default() -> Self {
        Self {
            track_name: "Ditto",
            artist_name: "NewJeans",
            mood: "calm",
            user_text: "Snow started falling while this played.",
            lat: super::NEAR_LAT,
            lng: super::NEAR_LNG,
        }
    }
}

pub fn seed_drop(store: &dyn DropStore, seed: DropSeed) -> MusicDrop {
    store
        .insert_drop(NewDrop {
            track_name: seed.track_name.to_string(),
            artist_name: seed.artist_name.to_string(),
            cover_url: format!("https://covers.example.com/{}.jpg", seed.track_name),
            preview_url: format!("https://previews.example.com/{}.m4a", seed.track_name),
            user_text: seed.user_text.to_string(),
            mood: seed.mood.to_string(),
            location: GeoPoint::new(seed.lat, seed.lng).expect("Invalid seed coordinates"),
            owner_id: ANONYMOUS_OWNER.to_string(),
        })
        .expect("Failed to seed drop")
}
