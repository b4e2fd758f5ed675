//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Home
    // ========================================================================

    pub async fn home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // AI DJ Endpoints
    // ========================================================================

    /// POST /v1/ai/ask with an arbitrary JSON body
    pub async fn ask_json(&self, body: Value) -> Response {
        self.client
            .post(self.url("/v1/ai/ask"))
            .json(&body)
            .send()
            .await
            .expect("Ask request failed")
    }

    /// POST /v1/ai/ask with a typed question
    pub async fn ask_text(&self, text: &str, lat: f64, lng: f64) -> Response {
        self.ask_json(json!({
            "text": text,
            "location": {"latitude": lat, "longitude": lng},
        }))
        .await
    }

    /// POST /v1/ai/ask as multipart, the way the recorder uploads clips
    pub async fn ask_audio(&self, audio: Vec<u8>, mime_type: &str, lat: f64, lng: f64) -> Response {
        let part = Part::bytes(audio)
            .file_name("question.webm")
            .mime_str(mime_type)
            .expect("Invalid mime type");
        let form = Form::new()
            .part("audio", part)
            .text("location", json!({"lat": lat, "lng": lng}).to_string());
        self.client
            .post(self.url("/v1/ai/ask"))
            .multipart(form)
            .send()
            .await
            .expect("Audio ask request failed")
    }

    /// POST /v1/ai/storytelling
    pub async fn storytelling(&self, body: Value) -> Response {
        self.client
            .post(self.url("/v1/ai/storytelling"))
            .json(&body)
            .send()
            .await
            .expect("Storytelling request failed")
    }

    // ========================================================================
    // Drop Endpoints
    // ========================================================================

    /// POST /v1/drops
    pub async fn create_drop(&self, body: Value) -> Response {
        self.client
            .post(self.url("/v1/drops"))
            .json(&body)
            .send()
            .await
            .expect("Create drop request failed")
    }

    /// GET /v1/drops/{id}
    pub async fn get_drop(&self, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/drops/{}", id)))
            .send()
            .await
            .expect("Get drop request failed")
    }

    /// GET /v1/drops/nearby
    pub async fn nearby(&self, query: &[(&str, String)]) -> Response {
        self.client
            .get(self.url("/v1/drops/nearby"))
            .query(query)
            .send()
            .await
            .expect("Nearby request failed")
    }
}
