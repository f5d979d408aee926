//! Drive one session through every stage for a single set of inputs.
//!
//! This is the non-interactive presentation surface: it fills each stage's
//! form from the run inputs, issues the stage call, and stops at the first
//! stage that cannot hand its context forward.
use crate::config::PipelineConfig;
use crate::context::{Coordinates, Field, StageContext};
use crate::error::{FormError, PredictionError};
use crate::gateway::{
    resolve_coordinates, Capability, CropRequest, DeviceLocator, FertilizerRequest, Gateway,
    GeocodeRequest, NutrientRequest, Transport, WeatherRequest,
};
use crate::normalize::{normalize_form, parse_number};
use crate::pipeline::{Outcome, Session, Stage, StageRequest, StageResult};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;

/// One gateway per remote capability.
pub struct Gateways<'t> {
    weather: Gateway<'t, WeatherRequest>,
    geocode: Gateway<'t, GeocodeRequest>,
    crop: Gateway<'t, CropRequest>,
    nutrient: Gateway<'t, NutrientRequest>,
    fertilizer: Gateway<'t, FertilizerRequest>,
}

impl<'t> Gateways<'t> {
    pub fn from_config(config: &PipelineConfig, transport: &'t dyn Transport) -> Self {
        Self {
            weather: Gateway::new(config.endpoint(Capability::Weather), transport),
            geocode: Gateway::new(config.endpoint(Capability::Geocode), transport),
            crop: Gateway::new(config.endpoint(Capability::Crop), transport),
            nutrient: Gateway::new(config.endpoint(Capability::Nutrient), transport),
            fertilizer: Gateway::new(config.endpoint(Capability::Fertilizer), transport),
        }
    }

    pub fn geocode(&self) -> &Gateway<'t, GeocodeRequest> {
        &self.geocode
    }

    /// Send `request` through the gateway of its stage.
    pub fn dispatch(&self, request: &StageRequest) -> Result<StageResult, PredictionError> {
        match request {
            StageRequest::Weather(request) => self.weather.predict(request).map(StageResult::Weather),
            StageRequest::Crop(request) => self.crop.predict(request).map(StageResult::Crop),
            StageRequest::Nutrients(request) => {
                self.nutrient.predict(request).map(StageResult::Nutrients)
            }
            StageRequest::Fertilizer(request) => {
                self.fertilizer.predict(request).map(StageResult::Fertilizer)
            }
        }
    }
}

/// Where the weather stage gets its coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocationInput {
    /// Skip the lookup; rainfall and temperature must be entered manually.
    #[default]
    Manual,
    CurrentDevice,
    Place {
        city: String,
        state: String,
    },
    Coordinates {
        latitude: String,
        longitude: String,
    },
}

/// Raw form text for every stage, as a user would type it.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub location: LocationInput,
    pub rainfall: Option<String>,
    pub temperature: Option<String>,
    pub soil_color: String,
    pub ph: String,
    /// Stop after this stage instead of running to the end.
    pub stop_after: Option<Stage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    /// The stage call was never offered (missing input or gated transfer).
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// The stage the session ended on.
    pub reached: Stage,
    pub halted_at: Option<Stage>,
    pub stages: Vec<StageReport>,
    pub context: StageContext,
    pub warnings: Vec<String>,
}

impl PipelineReport {
    pub fn completed(&self) -> bool {
        self.halted_at.is_none()
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .and_then(|report| report.result.as_ref())
    }
}

/// Parse `LAT,LON` as typed on the command line.
pub fn parse_position(raw: &str) -> Result<Coordinates> {
    let (latitude, longitude) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected LAT,LON (got {raw:?})"))?;
    Ok(Coordinates {
        latitude: parse_number(latitude).context("parse latitude")?,
        longitude: parse_number(longitude).context("parse longitude")?,
    })
}

/// Run the full pipeline. Invalid form text is rejected before any remote
/// call; remote failures end up in the report instead of the error.
pub fn run_pipeline(
    gateways: &Gateways<'_>,
    locator: &dyn DeviceLocator,
    inputs: &RunInputs,
) -> Result<PipelineReport, FormError> {
    let forms = Forms::from_inputs(inputs)?;
    let mut session = Session::new();
    let mut stages = Vec::new();
    let mut warnings = Vec::new();

    let halted_at = 'run: {
        run_weather(&mut session, gateways, locator, &forms, &mut warnings);
        let leave = session.advance();
        let weather_result = session.result(Stage::Weather).cloned();
        match leave {
            Ok(_) => stages.push(StageReport {
                stage: Stage::Weather,
                status: StageStatus::Succeeded,
                result: weather_result,
                message: None,
                detail: None,
            }),
            Err(err) => {
                stages.push(blocked(Stage::Weather, err.to_string()));
                break 'run Some(Stage::Weather);
            }
        }
        if inputs.stop_after == Some(Stage::Weather) {
            break 'run None;
        }

        for stage in [Stage::Crop, Stage::Nutrients, Stage::Fertilizer] {
            let form = if stage == Stage::Crop {
                &forms.soil
            } else {
                &forms.empty
            };
            let report = run_stage(&mut session, gateways, stage, form);
            let failed = report.status != StageStatus::Succeeded;
            stages.push(report);
            if failed {
                break 'run Some(stage);
            }
            if let Err(err) = session.advance() {
                stages.push(blocked(stage, err.to_string()));
                break 'run Some(stage);
            }
            if inputs.stop_after == Some(stage) {
                break 'run None;
            }
        }
        None
    };

    Ok(PipelineReport {
        reached: session.stage(),
        halted_at,
        stages,
        context: session.context().clone(),
        warnings,
    })
}

/// Normalized forms, built once so bad input fails before any network call.
struct Forms {
    weather: StageContext,
    coordinates: Option<Coordinates>,
    soil: StageContext,
    empty: StageContext,
}

impl Forms {
    fn from_inputs(inputs: &RunInputs) -> Result<Self, FormError> {
        let manual = [
            (Field::Rainfall, inputs.rainfall.as_deref().unwrap_or_default()),
            (Field::Temperature, inputs.temperature.as_deref().unwrap_or_default()),
        ];
        let mut weather = normalize_form(manual)?;
        let mut coordinates = None;
        match &inputs.location {
            LocationInput::Manual => {}
            LocationInput::CurrentDevice => {
                weather.use_current_location = Some(true);
            }
            LocationInput::Place { city, state } => {
                let place = normalize_form([
                    (Field::City, city.as_str()),
                    (Field::State, state.as_str()),
                ])?;
                weather = weather.merge(&place);
                weather.use_current_location = Some(false);
            }
            LocationInput::Coordinates {
                latitude,
                longitude,
            } => {
                let parsed = normalize_form([
                    (Field::Latitude, latitude.as_str()),
                    (Field::Longitude, longitude.as_str()),
                ])?;
                coordinates = parsed.coordinates();
            }
        }
        let soil = normalize_form([
            (Field::SoilColor, inputs.soil_color.as_str()),
            (Field::Ph, inputs.ph.as_str()),
        ])?;
        Ok(Self {
            weather,
            coordinates,
            soil,
            empty: StageContext::default(),
        })
    }
}

fn run_weather(
    session: &mut Session,
    gateways: &Gateways<'_>,
    locator: &dyn DeviceLocator,
    forms: &Forms,
    warnings: &mut Vec<String>,
) {
    session.edit(&forms.weather);

    let wants_lookup =
        session.context().use_current_location.is_some() || forms.coordinates.is_some();
    if !wants_lookup {
        return;
    }
    let coordinates = match forms.coordinates {
        Some(coordinates) => coordinates,
        None => match resolve_coordinates(session.context(), gateways.geocode(), locator) {
            Ok(coordinates) => coordinates,
            Err(err) => {
                tracing::warn!(error = %err, "location lookup failed; keeping previous values");
                warnings.push(format!("location lookup failed: {err}"));
                return;
            }
        },
    };

    if let Some((ticket, request)) = session.set_coordinates(coordinates) {
        let outcome = gateways.dispatch(&request);
        session.complete(ticket, outcome);
    }
    if let Some(Outcome::Failed { message, detail }) = session.outcome(Stage::Weather) {
        warnings.push(format!("{message} ({detail})"));
    }
}

fn run_stage(
    session: &mut Session,
    gateways: &Gateways<'_>,
    stage: Stage,
    form: &StageContext,
) -> StageReport {
    let (ticket, request) = match session.submit(stage, form) {
        Ok(issued) => issued,
        Err(err) => return blocked(stage, err.to_string()),
    };
    let outcome = gateways.dispatch(&request);
    session.complete(ticket, outcome);

    match session.outcome(stage) {
        Some(Outcome::Succeeded { result }) => StageReport {
            stage,
            status: StageStatus::Succeeded,
            result: Some(result.clone()),
            message: None,
            detail: None,
        },
        Some(Outcome::Failed { message, detail }) => StageReport {
            stage,
            status: StageStatus::Failed,
            result: None,
            message: Some(message.clone()),
            detail: Some(detail.clone()),
        },
        None => blocked(stage, "no outcome recorded".to_string()),
    }
}

fn blocked(stage: Stage, message: String) -> StageReport {
    StageReport {
        stage,
        status: StageStatus::Blocked,
        result: None,
        message: Some(message),
        detail: None,
    }
}
