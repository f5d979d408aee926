//! Pure transition rules: which request a stage sends and when it may hand
//! its context to the next stage.
use super::Stage;
use crate::context::{Field, StageContext};
use crate::error::{AdvanceError, SubmitError};
use crate::gateway::{
    CropPrediction, CropRequest, FertilizerPrediction, FertilizerRequest, NutrientPrediction,
    NutrientRequest, WeatherReading, WeatherRequest,
};
use serde::{Deserialize, Serialize};

/// A successful gateway outcome, tagged by the stage that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StageResult {
    Weather(WeatherReading),
    Crop(CropPrediction),
    Nutrients(NutrientPrediction),
    Fertilizer(FertilizerPrediction),
}

impl StageResult {
    pub fn stage(&self) -> Stage {
        match self {
            StageResult::Weather(_) => Stage::Weather,
            StageResult::Crop(_) => Stage::Crop,
            StageResult::Nutrients(_) => Stage::Nutrients,
            StageResult::Fertilizer(_) => Stage::Fertilizer,
        }
    }
}

/// A request ready to hand to the matching gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRequest {
    Weather(WeatherRequest),
    Crop(CropRequest),
    Nutrients(NutrientRequest),
    Fertilizer(FertilizerRequest),
}

impl StageRequest {
    pub fn stage(&self) -> Stage {
        match self {
            StageRequest::Weather(_) => Stage::Weather,
            StageRequest::Crop(_) => Stage::Crop,
            StageRequest::Nutrients(_) => Stage::Nutrients,
            StageRequest::Fertilizer(_) => Stage::Fertilizer,
        }
    }
}

/// Fields the weather stage must have before the pipeline can leave it.
pub const WEATHER_CARRIES: [Field; 2] = [Field::Rainfall, Field::Temperature];

/// Fields the request of `stage` is built from.
pub fn reads(stage: Stage) -> &'static [Field] {
    match stage {
        Stage::Weather => &WeatherRequest::READS,
        Stage::Crop => &CropRequest::READS,
        Stage::Nutrients => &NutrientRequest::READS,
        Stage::Fertilizer => &FertilizerRequest::READS,
        Stage::Done => &[],
    }
}

/// Build the request `stage` would send from `context`.
pub fn request_for(stage: Stage, context: &StageContext) -> Result<StageRequest, SubmitError> {
    let missing = |field| SubmitError::MissingField { stage, field };
    match stage {
        Stage::Weather => {
            let coordinates = context.coordinates().ok_or_else(|| {
                let field = if context.latitude.is_none() {
                    Field::Latitude
                } else {
                    Field::Longitude
                };
                missing(field)
            })?;
            Ok(StageRequest::Weather(WeatherRequest { coordinates }))
        }
        Stage::Crop => CropRequest::from_context(context)
            .map(StageRequest::Crop)
            .map_err(missing),
        Stage::Nutrients => NutrientRequest::from_context(context)
            .map(StageRequest::Nutrients)
            .map_err(missing),
        Stage::Fertilizer => FertilizerRequest::from_context(context)
            .map(StageRequest::Fertilizer)
            .map_err(missing),
        Stage::Done => Err(SubmitError::NoGateway { stage }),
    }
}

/// Decide the next stage and the context it starts with.
///
/// Weather leaves once rainfall and temperature are known, however they got
/// there. Every other stage leaves only with its own successful prediction,
/// which is folded into the carried context (nutrients at two decimals).
pub fn advance(
    stage: Stage,
    context: &StageContext,
    result: Option<&StageResult>,
) -> Result<(Stage, StageContext), AdvanceError> {
    let next = stage.next().ok_or(AdvanceError::Terminal)?;
    let not_offered = AdvanceError::NotOffered { stage };
    match (stage, result) {
        (Stage::Weather, _) => {
            if let Some(field) = WEATHER_CARRIES.into_iter().find(|f| !context.has(*f)) {
                return Err(AdvanceError::MissingField { stage, field });
            }
            Ok((next, context.clone()))
        }
        (Stage::Crop, Some(StageResult::Crop(prediction))) => {
            let carried = StageContext {
                crop: Some(prediction.crop.clone()),
                ..StageContext::default()
            };
            Ok((next, context.merge(&carried)))
        }
        (Stage::Nutrients, Some(StageResult::Nutrients(prediction))) => {
            let rounded = prediction.rounded();
            let carried = StageContext {
                nitrogen: Some(rounded.nitrogen),
                phosphorus: Some(rounded.phosphorus),
                potassium: Some(rounded.potassium),
                ..StageContext::default()
            };
            Ok((next, context.merge(&carried)))
        }
        (Stage::Fertilizer, Some(StageResult::Fertilizer(_))) => {
            Ok((next, context.clone()))
        }
        _ => Err(not_offered),
    }
}

/// Whether the "continue" action should be shown for `stage`.
pub fn offers_advance(stage: Stage, context: &StageContext, result: Option<&StageResult>) -> bool {
    advance(stage, context, result).is_ok()
}
