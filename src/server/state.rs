use axum::extract::FromRef;

use crate::conversation::ConversationService;
use crate::drop_store::DropStore;
use crate::services::Services;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ServerConfig;

pub type GuardedDropStore = Arc<dyn DropStore>;
pub type GuardedConversationService = Arc<ConversationService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub drop_store: GuardedDropStore,
    pub conversation: GuardedConversationService,
    pub store_timeout: Duration,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, services: Services) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            drop_store: services.store,
            conversation: services.conversation,
            store_timeout: services.store_timeout,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for GuardedDropStore {
    fn from_ref(input: &ServerState) -> Self {
        input.drop_store.clone()
    }
}

impl FromRef<ServerState> for GuardedConversationService {
    fn from_ref(input: &ServerState) -> Self {
        input.conversation.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
