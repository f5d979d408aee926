//! Weather, geocode and device-location lookups used by the weather stage.
use super::{require_finite, Capability, Endpoint, Gateway, PredictionRequest, Transport};
use crate::context::{Coordinates, Field, StageContext};
use crate::error::{LookupError, TransportError};
use crate::normalize::round_to;
use serde::{Deserialize, Serialize};

/// Rainfall estimate in millimeters from wind speed in m/s.
///
/// `floor(clamp(wind / 10, 0, 1) * 800) + 300`, so the result is always in
/// `300..=1100`.
pub fn rainfall_from_wind(wind_speed: f64) -> f64 {
    let scaled = (wind_speed / 10.0).clamp(0.0, 1.0);
    (scaled * 800.0).floor() + 300.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherRequest {
    pub coordinates: Coordinates,
}

impl WeatherRequest {
    pub const READS: [Field; 2] = [Field::Latitude, Field::Longitude];
}

#[derive(Debug, Deserialize)]
pub struct WeatherWire {
    main: MainWire,
    wind: WindWire,
}

#[derive(Debug, Deserialize)]
struct MainWire {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WindWire {
    speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Degrees Celsius, one decimal place.
    pub temperature: f64,
    pub wind_speed: f64,
    /// Millimeters, from `rainfall_from_wind`.
    pub rainfall_estimate: f64,
}

impl WeatherReading {
    /// The fields this reading contributes to the stage context.
    pub fn as_partial(&self) -> StageContext {
        StageContext {
            temperature: Some(self.temperature),
            rainfall: Some(self.rainfall_estimate),
            ..StageContext::default()
        }
    }
}

impl PredictionRequest for WeatherRequest {
    const CAPABILITY: Capability = Capability::Weather;
    type Wire = WeatherWire;
    type Output = WeatherReading;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint) -> Result<String, TransportError> {
        let latitude = self.coordinates.latitude.to_string();
        let longitude = self.coordinates.longitude.to_string();
        let mut query = vec![
            ("lat", latitude.as_str()),
            ("lon", longitude.as_str()),
            ("units", "metric"),
        ];
        if let Some(key) = endpoint.credential.as_deref() {
            query.push(("appid", key));
        }
        transport.get(&endpoint.url, &query)
    }

    fn validate(wire: WeatherWire) -> Result<WeatherReading, String> {
        let temperature = require_finite("main.temp", wire.main.temp)?;
        let wind_speed = require_finite("wind.speed", wire.wind.speed)?;
        Ok(WeatherReading {
            temperature: round_to(temperature, 1),
            wind_speed,
            rainfall_estimate: rainfall_from_wind(wind_speed),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeocodeRequest {
    pub city: String,
    pub state: String,
}

impl GeocodeRequest {
    pub fn from_context(context: &StageContext) -> Result<Self, Field> {
        Ok(Self {
            city: context.text(Field::City)?.to_string(),
            state: context.text(Field::State)?.to_string(),
        })
    }

    pub fn query(&self) -> String {
        format!("{},{}", self.city, self.state)
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeWire {
    features: Vec<FeatureWire>,
}

#[derive(Debug, Deserialize)]
struct FeatureWire {
    /// `[longitude, latitude]`
    center: Vec<f64>,
}

impl PredictionRequest for GeocodeRequest {
    const CAPABILITY: Capability = Capability::Geocode;
    type Wire = GeocodeWire;
    /// `None` when the service matched nothing.
    type Output = Option<Coordinates>;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint) -> Result<String, TransportError> {
        let mut url = url::Url::parse(&endpoint.url)
            .map_err(|err| TransportError::Connection(format!("invalid geocode url: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| TransportError::Connection("geocode url cannot take a path".to_string()))?
            .pop_if_empty()
            .push(&format!("{}.json", self.query()));
        let query: Vec<(&str, &str)> = endpoint
            .credential
            .as_deref()
            .map(|token| vec![("access_token", token)])
            .unwrap_or_default();
        transport.get(url.as_str(), &query)
    }

    fn validate(wire: GeocodeWire) -> Result<Option<Coordinates>, String> {
        // First match wins.
        let Some(first) = wire.features.into_iter().next() else {
            return Ok(None);
        };
        match first.center.as_slice() {
            [longitude, latitude, ..] => Ok(Some(Coordinates {
                latitude: require_finite("center[1]", *latitude)?,
                longitude: require_finite("center[0]", *longitude)?,
            })),
            other => Err(format!(
                "center must hold [longitude, latitude], got {} values",
                other.len()
            )),
        }
    }
}

/// The device's own position, when the user allows it.
pub trait DeviceLocator {
    fn current_position(&self) -> Result<Coordinates, LookupError>;
}

/// A locator with a fixed answer; `None` behaves like a denied permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocator {
    position: Option<Coordinates>,
}

impl StaticLocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

impl DeviceLocator for StaticLocator {
    fn current_position(&self) -> Result<Coordinates, LookupError> {
        self.position.ok_or(LookupError::PermissionDenied)
    }
}

/// Resolve coordinates for the weather stage: the device position when the
/// context asks for the current location, a city/state geocode otherwise.
pub fn resolve_coordinates(
    context: &StageContext,
    geocode: &Gateway<'_, GeocodeRequest>,
    locator: &dyn DeviceLocator,
) -> Result<Coordinates, LookupError> {
    if context.use_current_location == Some(true) {
        return locator.current_position();
    }
    let request = GeocodeRequest::from_context(context)
        .map_err(|field| LookupError::MissingField { field })?;
    geocode
        .predict(&request)?
        .ok_or_else(|| LookupError::NoResultsFound {
            query: request.query(),
        })
}
