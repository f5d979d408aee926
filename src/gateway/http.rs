//! `ureq`-backed transport.
use super::Transport;
use crate::error::TransportError;
use std::time::Duration;
use ureq::http::Response;
use ureq::{Agent, Body};

/// Error bodies are kept for diagnostics but capped.
const MAX_ERROR_BODY_BYTES: usize = 512;

pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /// `timeout` bounds each whole request; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, TransportError> {
        let response = self
            .agent
            .post(url)
            .send_json(body)
            .map_err(|err| TransportError::Connection(format!("POST {url}: {err}")))?;
        read_body(response)
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let response = request
            .call()
            .map_err(|err| TransportError::Connection(format!("GET {url}: {err}")))?;
        read_body(response)
    }
}

fn read_body(mut response: Response<Body>) -> Result<String, TransportError> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|err| TransportError::Connection(format!("read response body: {err}")))?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_string(text.trim(), MAX_ERROR_BODY_BYTES),
        });
    }
    Ok(text)
}

fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}
