//! Prediction gateways: one typed remote call per capability.
//!
//! A gateway issues exactly one request per `predict` call, never retries, and
//! validates the response shape before handing back a typed result. Anything
//! that goes wrong below the JSON layer becomes `RequestFailed`; anything
//! wrong with the JSON itself becomes `MalformedResponse`.
mod http;
mod lookup;
mod payloads;

pub use http::HttpTransport;
pub use lookup::{
    rainfall_from_wind, resolve_coordinates, DeviceLocator, GeocodeRequest, StaticLocator,
    WeatherReading, WeatherRequest,
};
pub use payloads::{
    CropPrediction, CropRequest, FertilizerPrediction, FertilizerRequest, NutrientPrediction,
    NutrientRequest,
};

use crate::error::{PredictionError, TransportError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;

/// The remote capabilities the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Weather,
    Geocode,
    Crop,
    Nutrient,
    Fertilizer,
}

impl Capability {
    /// Return the stable string identifier used in config and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Weather => "weather",
            Capability::Geocode => "geocode",
            Capability::Crop => "crop",
            Capability::Nutrient => "nutrient",
            Capability::Fertilizer => "fertilizer",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking JSON-over-HTTP seam. Implementations return the raw response body
/// for 2xx statuses and `TransportError::Status` otherwise.
pub trait Transport {
    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String, TransportError>;
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError>;
}

/// Where a capability lives, plus the credential its provider expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub credential: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }
}

/// A stage-specific request payload and the response contract that goes
/// with it.
pub trait PredictionRequest {
    const CAPABILITY: Capability;
    /// The JSON shape the service is expected to return.
    type Wire: DeserializeOwned;
    type Output;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint)
        -> Result<String, TransportError>;

    /// Check the decoded wire value and convert it; `Err` carries a detail
    /// for `MalformedResponse`.
    fn validate(wire: Self::Wire) -> Result<Self::Output, String>;
}

pub struct Gateway<'t, R> {
    endpoint: Endpoint,
    transport: &'t dyn Transport,
    _request: PhantomData<fn(&R)>,
}

impl<'t, R: PredictionRequest> Gateway<'t, R> {
    pub fn new(endpoint: Endpoint, transport: &'t dyn Transport) -> Self {
        Self {
            endpoint,
            transport,
            _request: PhantomData,
        }
    }

    pub fn predict(&self, request: &R) -> Result<R::Output, PredictionError> {
        let capability = R::CAPABILITY;
        let started = Instant::now();
        tracing::debug!(%capability, url = %self.endpoint.url, "prediction request");

        let body = request
            .send(self.transport, &self.endpoint)
            .map_err(|cause| {
                tracing::warn!(%capability, error = %cause, "prediction request failed");
                PredictionError::RequestFailed { capability, cause }
            })?;
        let output = decode::<R>(&body).inspect_err(|err| {
            tracing::warn!(%capability, error = %err, "prediction response rejected");
        })?;

        tracing::info!(
            %capability,
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_bytes = body.len(),
            "prediction complete"
        );
        Ok(output)
    }
}

/// Decode and validate a response body for `R`.
pub fn decode<R: PredictionRequest>(body: &str) -> Result<R::Output, PredictionError> {
    let malformed = |detail: String| PredictionError::MalformedResponse {
        capability: R::CAPABILITY,
        detail,
    };
    let wire: R::Wire = serde_json::from_str(body).map_err(|err| malformed(err.to_string()))?;
    R::validate(wire).map_err(malformed)
}

pub(crate) fn post<T: Serialize>(
    transport: &dyn Transport,
    endpoint: &Endpoint,
    payload: &T,
) -> Result<String, TransportError> {
    let body = serde_json::to_value(payload)
        .map_err(|err| TransportError::Connection(format!("encode request: {err}")))?;
    transport.post_json(&endpoint.url, &body)
}

pub(crate) fn require_finite(label: &str, value: f64) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{label} is not a finite number"))
    }
}

pub(crate) fn require_label(label: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
