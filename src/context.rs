//! The accumulating record carried from stage to stage.
//!
//! `StageContext` doubles as its own partial: a merge takes another context
//! and overlays every populated field, so later stages can only add to or
//! overwrite what earlier stages produced, never remove it.
use crate::normalize::FieldKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every field a stage can produce or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Rainfall,
    Temperature,
    SoilColor,
    Ph,
    Crop,
    Nitrogen,
    Phosphorus,
    Potassium,
    Latitude,
    Longitude,
    UseCurrentLocation,
    City,
    State,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Rainfall,
        Field::Temperature,
        Field::SoilColor,
        Field::Ph,
        Field::Crop,
        Field::Nitrogen,
        Field::Phosphorus,
        Field::Potassium,
        Field::Latitude,
        Field::Longitude,
        Field::UseCurrentLocation,
        Field::City,
        Field::State,
    ];

    /// Return the stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Rainfall => "rainfall",
            Field::Temperature => "temperature",
            Field::SoilColor => "soil_color",
            Field::Ph => "ph",
            Field::Crop => "crop",
            Field::Nitrogen => "nitrogen",
            Field::Phosphorus => "phosphorus",
            Field::Potassium => "potassium",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::UseCurrentLocation => "use_current_location",
            Field::City => "city",
            Field::State => "state",
        }
    }

    /// How raw form text for this field is normalized.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Rainfall
            | Field::Temperature
            | Field::Ph
            | Field::Nitrogen
            | Field::Phosphorus
            | Field::Potassium
            | Field::Latitude
            | Field::Longitude => FieldKind::Numeric,
            Field::SoilColor | Field::Crop | Field::City | Field::State => FieldKind::Categorical,
            Field::UseCurrentLocation => FieldKind::Flag,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved coordinate pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// All fields collected or predicted so far. Categorical values keep the
/// casing the user (or service) supplied; case folding happens only when a
/// request payload is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nitrogen: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phosphorus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_current_location: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl StageContext {
    /// The empty context a session starts with.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Return a new context with every populated field of `partial` laid over
    /// this one. Fields absent from `partial` are carried unchanged.
    pub fn merge(&self, partial: &StageContext) -> StageContext {
        StageContext {
            rainfall: partial.rainfall.or(self.rainfall),
            temperature: partial.temperature.or(self.temperature),
            soil_color: overlay(&partial.soil_color, &self.soil_color),
            ph: partial.ph.or(self.ph),
            crop: overlay(&partial.crop, &self.crop),
            nitrogen: partial.nitrogen.or(self.nitrogen),
            phosphorus: partial.phosphorus.or(self.phosphorus),
            potassium: partial.potassium.or(self.potassium),
            latitude: partial.latitude.or(self.latitude),
            longitude: partial.longitude.or(self.longitude),
            use_current_location: partial.use_current_location.or(self.use_current_location),
            city: overlay(&partial.city, &self.city),
            state: overlay(&partial.state, &self.state),
        }
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Rainfall => self.rainfall.is_some(),
            Field::Temperature => self.temperature.is_some(),
            Field::SoilColor => self.soil_color.is_some(),
            Field::Ph => self.ph.is_some(),
            Field::Crop => self.crop.is_some(),
            Field::Nitrogen => self.nitrogen.is_some(),
            Field::Phosphorus => self.phosphorus.is_some(),
            Field::Potassium => self.potassium.is_some(),
            Field::Latitude => self.latitude.is_some(),
            Field::Longitude => self.longitude.is_some(),
            Field::UseCurrentLocation => self.use_current_location.is_some(),
            Field::City => self.city.is_some(),
            Field::State => self.state.is_some(),
        }
    }

    /// Fields populated in this context, in declaration order.
    pub fn populated(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.has(*field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated().is_empty()
    }

    /// Read a numeric field, reporting which one is missing.
    pub fn number(&self, field: Field) -> Result<f64, Field> {
        let value = match field {
            Field::Rainfall => self.rainfall,
            Field::Temperature => self.temperature,
            Field::Ph => self.ph,
            Field::Nitrogen => self.nitrogen,
            Field::Phosphorus => self.phosphorus,
            Field::Potassium => self.potassium,
            Field::Latitude => self.latitude,
            Field::Longitude => self.longitude,
            _ => None,
        };
        value.ok_or(field)
    }

    /// Read a categorical field in display casing. Blank text counts as absent.
    pub fn text(&self, field: Field) -> Result<&str, Field> {
        let value = match field {
            Field::SoilColor => self.soil_color.as_deref(),
            Field::Crop => self.crop.as_deref(),
            Field::City => self.city.as_deref(),
            Field::State => self.state.as_deref(),
            _ => None,
        };
        value
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(field)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

impl From<Coordinates> for StageContext {
    fn from(coordinates: Coordinates) -> Self {
        StageContext {
            latitude: Some(coordinates.latitude),
            longitude: Some(coordinates.longitude),
            ..StageContext::default()
        }
    }
}

fn overlay(partial: &Option<String>, base: &Option<String>) -> Option<String> {
    partial.clone().or_else(|| base.clone())
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
