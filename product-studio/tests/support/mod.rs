#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

use product_studio::Client;

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

pub fn build_client(base_url: &str) -> Client {
    Client::builder()
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

pub fn image_body(data: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "Here is your shot."},
                    {"inlineData": {"mimeType": "image/png", "data": data}}
                ]
            },
            "finishReason": "STOP"
        }]
    })
}

pub fn image_response(data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(image_body(data))
}

pub fn rate_limit_response() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(json!({
        "error": {
            "code": 429,
            "message": "Resource has been exhausted (e.g. check quota).",
            "status": "RESOURCE_EXHAUSTED"
        }
    }))
}

/// Replies with the scripted responses in order, repeating the last one.
#[derive(Clone)]
pub struct SequenceResponder {
    calls: Arc<AtomicUsize>,
    responses: Arc<Vec<ResponseTemplate>>,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty());
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            responses: Arc::new(responses),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        let last = self.responses.len() - 1;
        self.responses[idx.min(last)].clone()
    }
}
