//! Request and response contracts of the three prediction services.
use super::{post, require_finite, require_label, Capability, Endpoint, PredictionRequest, Transport};
use crate::context::{Field, StageContext};
use crate::error::TransportError;
use crate::normalize::{fold_case, round_to};
use serde::{Deserialize, Serialize};

/// `{"prediction": "<label>"}`, shared by the crop and fertilizer services.
#[derive(Debug, Deserialize)]
pub struct LabelWire {
    prediction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRequest {
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Soil_color")]
    pub soil_color: String,
    #[serde(rename = "pH")]
    pub ph: f64,
}

impl CropRequest {
    pub const READS: [Field; 4] = [Field::Rainfall, Field::Temperature, Field::SoilColor, Field::Ph];

    pub fn from_context(context: &StageContext) -> Result<Self, Field> {
        Ok(Self {
            rainfall: context.number(Field::Rainfall)?,
            temperature: context.number(Field::Temperature)?,
            soil_color: fold_case(context.text(Field::SoilColor)?),
            ph: context.number(Field::Ph)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPrediction {
    pub crop: String,
}

impl PredictionRequest for CropRequest {
    const CAPABILITY: Capability = Capability::Crop;
    type Wire = LabelWire;
    type Output = CropPrediction;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint) -> Result<String, TransportError> {
        post(transport, endpoint, self)
    }

    fn validate(wire: LabelWire) -> Result<CropPrediction, String> {
        let crop = require_label("prediction", wire.prediction)?;
        Ok(CropPrediction { crop })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientRequest {
    pub temperature: f64,
    pub rainfall: f64,
    pub soil_color: String,
    pub ph: f64,
    pub crop: String,
}

impl NutrientRequest {
    pub const READS: [Field; 5] = [
        Field::Temperature,
        Field::Rainfall,
        Field::SoilColor,
        Field::Ph,
        Field::Crop,
    ];

    pub fn from_context(context: &StageContext) -> Result<Self, Field> {
        Ok(Self {
            temperature: context.number(Field::Temperature)?,
            rainfall: context.number(Field::Rainfall)?,
            soil_color: fold_case(context.text(Field::SoilColor)?),
            ph: context.number(Field::Ph)?,
            crop: fold_case(context.text(Field::Crop)?),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NutrientWire {
    #[serde(rename = "Nitrogen")]
    nitrogen: f64,
    #[serde(rename = "Phosphorus")]
    phosphorus: f64,
    #[serde(rename = "Potassium")]
    potassium: f64,
}

/// Nutrient levels exactly as the service returned them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientPrediction {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl NutrientPrediction {
    /// The two-decimal values shown to the user and carried downstream.
    pub fn rounded(&self) -> NutrientPrediction {
        NutrientPrediction {
            nitrogen: round_to(self.nitrogen, 2),
            phosphorus: round_to(self.phosphorus, 2),
            potassium: round_to(self.potassium, 2),
        }
    }
}

impl PredictionRequest for NutrientRequest {
    const CAPABILITY: Capability = Capability::Nutrient;
    type Wire = NutrientWire;
    type Output = NutrientPrediction;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint) -> Result<String, TransportError> {
        post(transport, endpoint, self)
    }

    fn validate(wire: NutrientWire) -> Result<NutrientPrediction, String> {
        Ok(NutrientPrediction {
            nitrogen: require_finite("Nitrogen", wire.nitrogen)?,
            phosphorus: require_finite("Phosphorus", wire.phosphorus)?,
            potassium: require_finite("Potassium", wire.potassium)?,
        })
    }
}

/// Every numeric field is sent as a float; categorical values go out in the
/// casing they were entered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRequest {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
    #[serde(rename = "Soil_color")]
    pub soil_color: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Nitrogen")]
    pub nitrogen: f64,
    #[serde(rename = "Phosphorus")]
    pub phosphorus: f64,
    #[serde(rename = "Potassium")]
    pub potassium: f64,
}

impl FertilizerRequest {
    pub const READS: [Field; 8] = [
        Field::Temperature,
        Field::Rainfall,
        Field::SoilColor,
        Field::Ph,
        Field::Crop,
        Field::Nitrogen,
        Field::Phosphorus,
        Field::Potassium,
    ];

    pub fn from_context(context: &StageContext) -> Result<Self, Field> {
        Ok(Self {
            temperature: context.number(Field::Temperature)?,
            rainfall: context.number(Field::Rainfall)?,
            soil_color: context.text(Field::SoilColor)?.to_string(),
            ph: context.number(Field::Ph)?,
            crop: context.text(Field::Crop)?.to_string(),
            nitrogen: context.number(Field::Nitrogen)?,
            phosphorus: context.number(Field::Phosphorus)?,
            potassium: context.number(Field::Potassium)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerPrediction {
    pub fertilizer: String,
}

impl PredictionRequest for FertilizerRequest {
    const CAPABILITY: Capability = Capability::Fertilizer;
    type Wire = LabelWire;
    type Output = FertilizerPrediction;

    fn send(&self, transport: &dyn Transport, endpoint: &Endpoint) -> Result<String, TransportError> {
        post(transport, endpoint, self)
    }

    fn validate(wire: LabelWire) -> Result<FertilizerPrediction, String> {
        let fertilizer = require_label("prediction", wire.prediction)?;
        Ok(FertilizerPrediction { fertilizer })
    }
}
