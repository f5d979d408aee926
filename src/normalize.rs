//! Raw form text to typed, canonical values.
use crate::categories;
use crate::context::{Field, StageContext};
use crate::error::{FormError, NormalizationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
    Flag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Number(f64),
    Category(String),
    Flag(bool),
}

/// Normalize one raw value. Categorical values are folded to lowercase with no
/// membership check; numeric values must parse to a finite float.
pub fn normalize(raw: &str, kind: FieldKind) -> Result<TypedValue, NormalizationError> {
    match kind {
        FieldKind::Numeric => parse_number(raw).map(TypedValue::Number),
        FieldKind::Categorical => Ok(TypedValue::Category(fold_case(raw))),
        FieldKind::Flag => parse_flag(raw).map(TypedValue::Flag),
    }
}

pub fn parse_number(raw: &str) -> Result<f64, NormalizationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(NormalizationError::NotANumber {
            raw: raw.to_string(),
        }),
    }
}

fn parse_flag(raw: &str) -> Result<bool, NormalizationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(NormalizationError::NotABoolean {
            raw: raw.to_string(),
        }),
    }
}

/// The single case convention used for anything a remote service matches on.
pub fn fold_case(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Round half away from zero at `places` decimals.
///
/// Nutrient values use two places, weather temperature one. Ties are decided
/// on the binary value after scaling, so a decimal tie that `f64` cannot hold
/// exactly may go either way: `1.005` rounds to `1.0`, `2.675` to `2.68`.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Turn a stage form of `(field, raw text)` pairs into a partial context.
///
/// Categorical fields are trimmed but keep their display casing here; the
/// lowercase form is produced when a request payload is built. Blank entries
/// are skipped so an untouched form field never erases a carried value.
pub fn normalize_form<'a, I>(entries: I) -> Result<StageContext, FormError>
where
    I: IntoIterator<Item = (Field, &'a str)>,
{
    let mut partial = StageContext::default();
    for (field, raw) in entries {
        if raw.trim().is_empty() {
            continue;
        }
        let value = normalize(raw, field.kind()).map_err(|source| FormError { field, source })?;
        let value = match value {
            TypedValue::Category(_) => TypedValue::Category(raw.trim().to_string()),
            other => other,
        };
        assign(&mut partial, field, value);
    }
    warn_unknown_categories(&partial);
    Ok(partial)
}

fn assign(partial: &mut StageContext, field: Field, value: TypedValue) {
    match (field, value) {
        (Field::Rainfall, TypedValue::Number(v)) => partial.rainfall = Some(v),
        (Field::Temperature, TypedValue::Number(v)) => partial.temperature = Some(v),
        (Field::Ph, TypedValue::Number(v)) => partial.ph = Some(v),
        (Field::Nitrogen, TypedValue::Number(v)) => partial.nitrogen = Some(v),
        (Field::Phosphorus, TypedValue::Number(v)) => partial.phosphorus = Some(v),
        (Field::Potassium, TypedValue::Number(v)) => partial.potassium = Some(v),
        (Field::Latitude, TypedValue::Number(v)) => partial.latitude = Some(v),
        (Field::Longitude, TypedValue::Number(v)) => partial.longitude = Some(v),
        (Field::SoilColor, TypedValue::Category(v)) => partial.soil_color = Some(v),
        (Field::Crop, TypedValue::Category(v)) => partial.crop = Some(v),
        (Field::City, TypedValue::Category(v)) => partial.city = Some(v),
        (Field::State, TypedValue::Category(v)) => partial.state = Some(v),
        (Field::UseCurrentLocation, TypedValue::Flag(v)) => partial.use_current_location = Some(v),
        (field, value) => {
            tracing::debug!(%field, ?value, "value kind does not match field; ignored");
        }
    }
}

fn warn_unknown_categories(partial: &StageContext) {
    if let Some(color) = partial.soil_color.as_deref() {
        if !categories::is_known_soil_color(color) {
            tracing::warn!(soil_color = color, "soil color outside the known set; forwarding as-is");
        }
    }
    if let Some(state) = partial.state.as_deref() {
        if !categories::is_known_region(state) {
            tracing::warn!(state, "region outside the known set; forwarding as-is");
        }
    }
}
