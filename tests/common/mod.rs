//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use agro_pipeline::config::{default_config, EndpointsConfig, PipelineConfig};
use agro_pipeline::error::TransportError;
use agro_pipeline::gateway::Transport;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

pub const WEATHER_URL: &str = "http://weather.test/data/2.5/weather";
pub const GEOCODE_URL: &str = "http://geocode.test/geocoding/v5/mapbox.places";
pub const CROP_URL: &str = "http://crop.test/predict";
pub const NUTRIENT_URL: &str = "http://nutrient.test/predict";
pub const FERTILIZER_URL: &str = "http://fertilizer.test/predict";

/// Config pointing every capability at a `*.test` host.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        endpoints: EndpointsConfig {
            weather: WEATHER_URL.to_string(),
            geocode: GEOCODE_URL.to_string(),
            crop: CROP_URL.to_string(),
            nutrient: NUTRIENT_URL.to_string(),
            fertilizer: FERTILIZER_URL.to_string(),
        },
        weather_api_key: Some("weather-key".to_string()),
        geocode_token: Some("geo-token".to_string()),
        ..default_config()
    }
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// Transport that answers by URL prefix, in the order replies were queued.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<BTreeMap<String, VecDeque<Result<String, TransportError>>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, prefix: &str, body: serde_json::Value) -> Self {
        self.push(prefix, Ok(body.to_string()))
    }

    pub fn fail(self, prefix: &str, err: TransportError) -> Self {
        self.push(prefix, Err(err))
    }

    fn push(self, prefix: &str, reply: Result<String, TransportError>) -> Self {
        self.replies
            .borrow_mut()
            .entry(prefix.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// URLs hit so far, without query strings.
    pub fn urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|call| call.url.clone()).collect()
    }

    fn answer(&self, url: &str) -> Result<String, TransportError> {
        let mut replies = self.replies.borrow_mut();
        let queue = replies
            .iter_mut()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, queue)| queue);
        match queue.and_then(VecDeque::pop_front) {
            Some(reply) => reply,
            None => Err(TransportError::Connection(format!("no scripted reply for {url}"))),
        }
    }
}

impl Transport for ScriptedTransport {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, TransportError> {
        self.calls.borrow_mut().push(Call {
            url: url.to_string(),
            body: Some(body.clone()),
        });
        self.answer(url)
    }

    fn get(&self, url: &str, _query: &[(&str, &str)]) -> Result<String, TransportError> {
        self.calls.borrow_mut().push(Call {
            url: url.to_string(),
            body: None,
        });
        self.answer(url)
    }
}
