use super::distance::haversine_km;
use crate::drop_store::{DropFilter, DropStore, GeoPoint, MusicDrop};
use crate::server::metrics;
use crate::timeout::{call_with_timeout, CallError};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A drop as seen from a query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDrop {
    pub id: String,
    pub track_name: String,
    pub artist_name: String,
    pub cover_url: String,
    pub preview_url: String,
    pub user_text: String,
    pub mood: String,
    pub like_count: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Rounded to two decimals.
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub mood: Option<String>,
    /// Cap on the candidates fetched from the store before distance filtering.
    pub limit: usize,
}

fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes distances from `center`, drops candidates outside `radius_km` and
/// sorts the rest by ascending distance. Equal distances keep fetch order.
pub fn rank_by_distance(
    center: &GeoPoint,
    radius_km: f64,
    candidates: Vec<MusicDrop>,
) -> Vec<NearbyDrop> {
    let mut ranked: Vec<(f64, NearbyDrop)> = candidates
        .into_iter()
        .filter_map(|drop| {
            let raw = haversine_km(
                center.latitude(),
                center.longitude(),
                drop.location.latitude(),
                drop.location.longitude(),
            );
            if raw > radius_km {
                return None;
            }
            let distance_km = round_2(raw);
            Some((
                raw,
                NearbyDrop {
                    id: drop.id,
                    track_name: drop.track_name,
                    artist_name: drop.artist_name,
                    cover_url: drop.cover_url,
                    preview_url: drop.preview_url,
                    user_text: drop.user_text,
                    mood: drop.mood,
                    like_count: drop.like_count,
                    created_at: drop.created_at,
                    distance_km,
                },
            ))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.into_iter().map(|(_, drop)| drop).collect()
}

/// Finds drops around a point. Never fails: store errors and timeouts
/// degrade to an empty list.
///
/// The store is asked for `limit` candidates before any distance filtering,
/// so when more than `limit` drops match the mood the nearest ones can be
/// missed.
pub struct NearbyLocator {
    store: Arc<dyn DropStore>,
    store_timeout: Duration,
}

impl NearbyLocator {
    pub fn new(store: Arc<dyn DropStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    pub async fn find_nearby(&self, query: &NearbyQuery) -> Vec<NearbyDrop> {
        let store = self.store.clone();
        let filter = DropFilter::with_mood(query.mood.as_deref());
        let limit = query.limit;
        let start = Instant::now();

        let fetch = async move {
            tokio::task::spawn_blocking(move || store.query_drops(&filter, limit))
                .await
                .map_err(anyhow::Error::from)?
        };

        let candidates = match call_with_timeout(self.store_timeout, fetch).await {
            Ok(candidates) => {
                metrics::record_external_call("store", "ok", start.elapsed());
                candidates
            }
            Err(CallError::TimedOut(after)) => {
                warn!("Nearby drop query timed out after {:?}", after);
                metrics::record_external_call("store", "timeout", start.elapsed());
                metrics::record_degraded("locator");
                return Vec::new();
            }
            Err(CallError::Failed(err)) => {
                warn!("Nearby drop query failed: {:#}", err);
                metrics::record_external_call("store", "error", start.elapsed());
                metrics::record_degraded("locator");
                return Vec::new();
            }
        };

        let fetched = candidates.len();
        let nearby = rank_by_distance(&query.center, query.radius_km, candidates);
        debug!(
            "Locator kept {}/{} candidates within {} km",
            nearby.len(),
            fetched,
            query.radius_km
        );
        nearby
    }
}
