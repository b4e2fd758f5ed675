use super::metrics;
use super::state::{GuardedConversationService, GuardedDropStore, ServerState};
use crate::conversation::{ConversationError, ValidationError};
use crate::drop_store::{CreateDropBody, DropStore, GeoPoint, MusicDrop, NewDrop};
use crate::nearby::{NearbyDrop, NearbyQuery};
use crate::timeout::{call_with_timeout, CallError};
use anyhow::anyhow;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DROPS_ENDPOINT: &str = "/v1/drops";
/// Upper bound for the `limit` query parameter of the nearby listing.
const MAX_NEARBY_LIMIT: usize = 200;

#[derive(Serialize)]
struct CreateDropResponse {
    success: bool,
    id: String,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
struct NearbyParams {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
    mood: Option<String>,
    limit: Option<usize>,
}

/// Runs a blocking store call off the runtime, bounded by `timeout`.
async fn run_store<T, F>(
    store: Arc<dyn DropStore>,
    timeout: Duration,
    op: F,
) -> Result<T, ConversationError>
where
    T: Send + 'static,
    F: FnOnce(&dyn DropStore) -> anyhow::Result<T> + Send + 'static,
{
    let call = async move {
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(anyhow::Error::from)?
    };
    match call_with_timeout(timeout, call).await {
        Ok(value) => Ok(value),
        Err(CallError::TimedOut(after)) => {
            Err(anyhow!("drop store did not answer within {:?}", after).into())
        }
        Err(CallError::Failed(err)) => Err(err.into()),
    }
}

async fn insert_drop(
    store: GuardedDropStore,
    timeout: Duration,
    body: Result<Json<CreateDropBody>, JsonRejection>,
) -> Result<MusicDrop, ConversationError> {
    let Json(body) = body.map_err(|e| ValidationError::Malformed(e.body_text()))?;
    let new_drop = NewDrop::from_body(body, None)?;
    run_store(store, timeout, move |store| {
        let drop = store.insert_drop(new_drop)?;
        refresh_drops_gauge(store);
        Ok(drop)
    })
    .await
}

/// The drop is already persisted here, so a failed count only skips the gauge.
fn refresh_drops_gauge(store: &dyn DropStore) {
    match store.count_drops() {
        Ok(count) => metrics::set_drops_total(count),
        Err(err) => warn!("Could not refresh drop count: {:#}", err),
    }
}

async fn create_drop(
    State(state): State<ServerState>,
    body: Result<Json<CreateDropBody>, JsonRejection>,
) -> Result<impl IntoResponse, ConversationError> {
    let drop = insert_drop(state.drop_store.clone(), state.store_timeout, body)
        .await
        .map_err(|e| e.recorded(DROPS_ENDPOINT))?;

    info!("Created drop {} ({:?} by {:?})", drop.id, drop.track_name, drop.artist_name);
    Ok((
        StatusCode::CREATED,
        Json(CreateDropResponse {
            success: true,
            id: drop.id,
            message: "Drop saved successfully!",
        }),
    ))
}

async fn get_drop(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<MusicDrop>, ConversationError> {
    let found = run_store(state.drop_store.clone(), state.store_timeout, move |store| {
        store.get_drop(&id)
    })
    .await
    .map_err(|e| e.recorded(DROPS_ENDPOINT))?;

    match found {
        Some(drop) => Ok(Json(drop)),
        None => Err(ConversationError::NotFound.recorded(DROPS_ENDPOINT)),
    }
}

fn nearby_query(
    params: NearbyParams,
    conversation: &GuardedConversationService,
) -> Result<NearbyQuery, ValidationError> {
    let (lat, lng) = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(ValidationError::MissingLocation),
    };
    let settings = conversation.settings();
    let radius_km = params.radius_km.unwrap_or(settings.radius_km);
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(ValidationError::Malformed(
            "radius_km must be a positive number".to_string(),
        ));
    }
    Ok(NearbyQuery {
        center: GeoPoint::new(lat, lng)?,
        radius_km,
        mood: params.mood,
        limit: params
            .limit
            .unwrap_or(settings.candidate_limit)
            .clamp(1, MAX_NEARBY_LIMIT),
    })
}

async fn get_nearby_drops(
    State(conversation): State<GuardedConversationService>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<Vec<NearbyDrop>>, ConversationError> {
    let query = params
        .map_err(|e| ValidationError::Malformed(e.body_text()))
        .and_then(|Query(params)| nearby_query(params, &conversation))
        .map_err(|e| ConversationError::from(e).recorded(DROPS_ENDPOINT))?;

    Ok(Json(conversation.locator().find_nearby(&query).await))
}

pub fn make_drop_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", post(create_drop))
        .route("/nearby", get(get_nearby_drops))
        .route("/{id}", get(get_drop))
        .with_state(state)
}
