//! Test server lifecycle management
//!
//! Each test gets an isolated server in production mode: a fresh SQLite
//! drop store in a temp dir and wiremock stand-ins for the speech, model
//! and voice services.

use super::constants::*;
use music_map_server::config::{
    AppConfig, CliConfig, FileConfig, Mode, ModelConfig, SpeechConfig, VoiceConfig,
};
use music_map_server::drop_store::DropStore;
use music_map_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use music_map_server::services::Services;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fake upstream services. The default happy-path mocks carry the lowest
/// priority, so any mock a test mounts takes precedence.
pub struct Upstreams {
    pub speech: MockServer,
    pub model: MockServer,
    pub voice: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        let upstreams = Self {
            speech: MockServer::start().await,
            model: MockServer::start().await,
            voice: MockServer::start().await,
        };

        Mock::given(method("POST"))
            .and(path("/v1p1beta1/speech:recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"alternatives": [{"transcript": SPOKEN_QUERY, "confidence": 0.93}]}]
            })))
            .with_priority(10)
            .mount(&upstreams.speech)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": MODEL_ANSWER}, "finish_reason": "stop"}]
            })))
            .with_priority(10)
            .mount(&upstreams.model)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"^/v1/text-to-speech/[^/]+$"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(VOICE_AUDIO.to_vec()),
            )
            .with_priority(10)
            .mount(&upstreams.voice)
            .await;

        upstreams
    }

    /// Bodies of every request the model service received, as JSON.
    pub async fn model_requests(&self) -> Vec<serde_json::Value> {
        self.model
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.body_json::<serde_json::Value>().expect("Model request was not JSON"))
            .collect()
    }

    /// Paths hit on the voice service.
    pub async fn voice_paths(&self) -> Vec<String> {
        self.voice
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Drop store for direct seeding in tests
    pub store: Arc<dyn DropStore>,

    pub upstreams: Upstreams,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

fn file_config(db_dir: &TempDir, upstreams: &Upstreams) -> FileConfig {
    FileConfig {
        mode: Some("production".to_string()),
        db_dir: Some(db_dir.path().to_string_lossy().into_owned()),
        model: Some(ModelConfig {
            provider: Some("openai".to_string()),
            base_url: Some(upstreams.model.uri()),
            model: Some("gpt-test".to_string()),
            api_key: Some(MODEL_API_KEY.to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        }),
        speech: Some(SpeechConfig {
            endpoint: Some(upstreams.speech.uri()),
            api_key: Some(SPEECH_TOKEN.to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        }),
        voice: Some(VoiceConfig {
            base_url: Some(upstreams.voice.uri()),
            api_key: Some(VOICE_API_KEY.to_string()),
            voice_id: Some(VOICE_ID.to_string()),
            story_voice_id: Some(STORY_VOICE_ID.to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if configuration, port binding or startup fails, or if the
    /// server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");
        let upstreams = Upstreams::start().await;

        let cli = CliConfig {
            mode: Mode::Production,
            logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app_config = AppConfig::resolve(&cli, Some(file_config(&temp_db_dir, &upstreams)))
            .expect("Failed to resolve test config");
        let services = Services::from_config(&app_config).expect("Failed to build services");
        let store = services.store.clone();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        let app = make_app(config, services);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            upstreams,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
