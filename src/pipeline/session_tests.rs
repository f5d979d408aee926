use super::*;
use crate::error::TransportError;
use crate::gateway::{Capability, CropPrediction, NutrientPrediction};

fn reading(temperature: f64, rainfall: f64) -> StageResult {
    StageResult::Weather(WeatherReading {
        temperature,
        wind_speed: 0.0,
        rainfall_estimate: rainfall,
    })
}

fn failure(capability: Capability) -> PredictionError {
    PredictionError::RequestFailed {
        capability,
        cause: TransportError::Connection("connection refused".to_string()),
    }
}

fn pune() -> Coordinates {
    Coordinates {
        latitude: 18.5,
        longitude: 73.8,
    }
}

fn soil_form() -> StageContext {
    StageContext {
        soil_color: Some("Dark Brown".to_string()),
        ph: Some(6.5),
        ..StageContext::default()
    }
}

/// A session sitting on the crop stage with weather already resolved.
fn at_crop() -> Session {
    let mut session = Session::new();
    session.edit(&StageContext {
        rainfall: Some(700.0),
        temperature: Some(24.5),
        ..StageContext::default()
    });
    session.advance().expect("leave weather");
    session
}

#[test]
fn new_session_starts_empty_on_weather() {
    let session = Session::new();
    assert_eq!(session.stage(), Stage::Weather);
    assert!(session.context().is_empty());
    assert!(!session.offers_advance());
}

#[test]
fn coordinates_trigger_lookup_that_fills_weather_fields() {
    let mut session = Session::new();
    let (ticket, request) = session.set_coordinates(pune()).expect("lookup triggered");
    assert_eq!(request.stage(), Stage::Weather);
    assert_eq!(session.context().coordinates(), Some(pune()));

    assert_eq!(
        session.complete(ticket, Ok(reading(24.4, 700.0))),
        Completion::Applied
    );

    assert_eq!(session.context().temperature, Some(24.4));
    assert_eq!(session.context().rainfall, Some(700.0));
    assert!(session.offers_advance());
}

#[test]
fn unchanged_coordinates_do_not_retrigger() {
    let mut session = Session::new();
    let (ticket, _) = session.set_coordinates(pune()).expect("first lookup");
    session.complete(ticket, Ok(reading(24.4, 700.0)));
    assert!(session.set_coordinates(pune()).is_none());
}

#[test]
fn new_coordinates_supersede_lookup_in_flight() {
    let mut session = Session::new();
    let (first, _) = session.set_coordinates(pune()).expect("first lookup");
    let (second, _) = session
        .set_coordinates(Coordinates {
            latitude: 21.1,
            longitude: 79.0,
        })
        .expect("second lookup");

    // The newer response lands first; the older one must not overwrite it.
    assert_eq!(
        session.complete(second, Ok(reading(30.0, 1100.0))),
        Completion::Applied
    );
    assert_eq!(
        session.complete(first, Ok(reading(20.0, 300.0))),
        Completion::Discarded
    );
    assert_eq!(session.context().temperature, Some(30.0));
    assert_eq!(session.context().rainfall, Some(1100.0));
}

#[test]
fn manual_rainfall_survives_weather_lookup() {
    let mut session = Session::new();
    session.edit(&StageContext {
        rainfall: Some(950.0),
        ..StageContext::default()
    });
    assert!(session.is_pinned(Field::Rainfall));

    let (ticket, _) = session.set_coordinates(pune()).expect("lookup");
    session.complete(ticket, Ok(reading(24.4, 700.0)));

    assert_eq!(session.context().rainfall, Some(950.0));
    assert_eq!(session.context().temperature, Some(24.4));
}

#[test]
fn unpinned_rainfall_follows_lookup_again() {
    let mut session = Session::new();
    session.edit(&StageContext {
        rainfall: Some(950.0),
        ..StageContext::default()
    });
    session.unpin(Field::Rainfall);

    let (ticket, _) = session.set_coordinates(pune()).expect("lookup");
    session.complete(ticket, Ok(reading(24.4, 700.0)));

    assert_eq!(session.context().rainfall, Some(700.0));
}

#[test]
fn failed_weather_lookup_keeps_previous_values() {
    let mut session = Session::new();
    let (ticket, _) = session.set_coordinates(pune()).expect("lookup");
    session.complete(ticket, Ok(reading(24.4, 700.0)));

    let (ticket, _) = session
        .set_coordinates(Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        })
        .expect("second lookup");
    session.complete(ticket, Err(failure(Capability::Weather)));

    assert_eq!(session.context().temperature, Some(24.4));
    assert_eq!(session.context().rainfall, Some(700.0));
    assert!(matches!(
        session.outcome(Stage::Weather),
        Some(Outcome::Failed { message, .. }) if message == WEATHER_FAILED_MESSAGE
    ));
    // Manual values are still enough to leave the stage.
    assert!(session.offers_advance());
}

#[test]
fn crop_transfer_is_gated_on_success() {
    let mut session = at_crop();
    assert!(!session.offers_advance());
    assert_eq!(
        session.advance(),
        Err(AdvanceError::NotOffered { stage: Stage::Crop })
    );

    let (ticket, request) = session.submit(Stage::Crop, &soil_form()).expect("submit");
    assert!(matches!(request, StageRequest::Crop(_)));
    session.complete(
        ticket,
        Ok(StageResult::Crop(CropPrediction {
            crop: "Rice".to_string(),
        })),
    );

    assert!(session.offers_advance());
    assert_eq!(session.advance(), Ok(Stage::Nutrients));
    assert_eq!(session.context().crop.as_deref(), Some("Rice"));
    assert_eq!(session.context().soil_color.as_deref(), Some("Dark Brown"));
    assert_eq!(session.context().rainfall, Some(700.0));
}

#[test]
fn failed_prediction_blocks_transfer() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("submit");
    session.complete(ticket, Err(failure(Capability::Crop)));

    assert!(matches!(
        session.outcome(Stage::Crop),
        Some(Outcome::Failed { message, .. }) if message == PREDICTION_FAILED_MESSAGE
    ));
    assert!(!session.offers_advance());
    assert_eq!(session.stage(), Stage::Crop);
}

#[test]
fn resubmission_clears_previous_result_before_the_new_call() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("first submit");
    session.complete(
        ticket,
        Ok(StageResult::Crop(CropPrediction {
            crop: "Rice".to_string(),
        })),
    );
    assert!(session.result(Stage::Crop).is_some());

    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("resubmit");
    assert_eq!(session.outcome(Stage::Crop), None);
    assert!(!session.offers_advance());

    session.complete(ticket, Err(failure(Capability::Crop)));
    assert!(session.result(Stage::Crop).is_none());
    assert!(!session.offers_advance());
}

#[test]
fn resubmission_clears_previous_error() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("submit");
    session.complete(ticket, Err(failure(Capability::Crop)));
    assert!(session.outcome(Stage::Crop).is_some());

    session.submit(Stage::Crop, &soil_form()).expect("resubmit");
    assert_eq!(session.outcome(Stage::Crop), None);
}

#[test]
fn submit_is_rejected_while_in_flight() {
    let mut session = at_crop();
    session.submit(Stage::Crop, &soil_form()).expect("submit");
    assert_eq!(
        session.submit(Stage::Crop, &soil_form()),
        Err(SubmitError::InFlight { stage: Stage::Crop })
    );
    assert_eq!(
        session.advance(),
        Err(AdvanceError::InFlight { stage: Stage::Crop })
    );
}

#[test]
fn cancelled_request_is_discarded() {
    let mut session = at_crop();
    let (stale, _) = session.submit(Stage::Crop, &soil_form()).expect("submit");
    assert!(session.cancel(Stage::Crop));
    let (fresh, _) = session.submit(Stage::Crop, &soil_form()).expect("resubmit");
    assert_ne!(stale.generation(), fresh.generation());

    let late = Ok(StageResult::Crop(CropPrediction {
        crop: "Wheat".to_string(),
    }));
    assert_eq!(session.complete(stale, late), Completion::Discarded);
    assert_eq!(session.outcome(Stage::Crop), None);

    session.complete(
        fresh,
        Ok(StageResult::Crop(CropPrediction {
            crop: "Rice".to_string(),
        })),
    );
    assert_eq!(
        session.result(Stage::Crop),
        Some(&StageResult::Crop(CropPrediction {
            crop: "Rice".to_string()
        }))
    );
}

#[test]
fn submit_without_inputs_is_not_offered() {
    let mut session = at_crop();
    let err = session
        .submit(
            Stage::Crop,
            &StageContext {
                soil_color: Some("Red".to_string()),
                ..StageContext::default()
            },
        )
        .expect_err("ph missing");
    assert_eq!(
        err,
        SubmitError::MissingField {
            stage: Stage::Crop,
            field: Field::Ph
        }
    );
    assert!(!session.is_in_flight(Stage::Crop));
}

#[test]
fn submit_only_targets_active_stage() {
    let mut session = Session::new();
    assert_eq!(
        session.submit(Stage::Crop, &soil_form()),
        Err(SubmitError::NotCurrent {
            stage: Stage::Crop,
            active: Stage::Weather
        })
    );
}

#[test]
fn result_for_wrong_stage_is_recorded_as_failure() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("submit");
    session.complete(ticket, Ok(reading(20.0, 300.0)));
    assert!(matches!(
        session.outcome(Stage::Crop),
        Some(Outcome::Failed { .. })
    ));
}

#[test]
fn nutrients_reach_fertilizer_rounded() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("crop");
    session.complete(
        ticket,
        Ok(StageResult::Crop(CropPrediction {
            crop: "Rice".to_string(),
        })),
    );
    session.advance().expect("to nutrients");

    let (ticket, request) = session
        .submit(Stage::Nutrients, &StageContext::default())
        .expect("nutrients");
    let StageRequest::Nutrients(request) = request else {
        panic!("expected nutrient request");
    };
    assert_eq!(request.crop, "rice");
    assert_eq!(request.soil_color, "dark brown");

    session.complete(
        ticket,
        Ok(StageResult::Nutrients(NutrientPrediction {
            nitrogen: 12.345,
            phosphorus: 7.0,
            potassium: 99.999,
        })),
    );
    assert_eq!(session.advance(), Ok(Stage::Fertilizer));
    assert_eq!(session.context().nitrogen, Some(12.35));
    assert_eq!(session.context().potassium, Some(100.0));
    // Display casing is untouched by the lowercase payload.
    assert_eq!(session.context().soil_color.as_deref(), Some("Dark Brown"));
}

#[test]
fn editing_read_fields_discards_the_request_in_flight() {
    let mut session = at_crop();
    let (ticket, _) = session.submit(Stage::Crop, &soil_form()).expect("submit");

    session.edit(&StageContext {
        ph: Some(7.2),
        ..StageContext::default()
    });
    assert!(!session.is_in_flight(Stage::Crop));

    let computed_from_old_ph = Ok(StageResult::Crop(CropPrediction {
        crop: "Rice".to_string(),
    }));
    assert_eq!(
        session.complete(ticket, computed_from_old_ph),
        Completion::Discarded
    );
    assert!(!session.offers_advance());
    assert_eq!(session.context().ph, Some(7.2));
}

#[test]
fn editing_unrelated_fields_keeps_the_request() {
    let mut session = Session::new();
    let (ticket, _) = session.set_coordinates(pune()).expect("lookup");

    session.edit(&StageContext {
        rainfall: Some(950.0),
        ..StageContext::default()
    });
    assert!(session.is_in_flight(Stage::Weather));
    assert_eq!(
        session.complete(ticket, Ok(reading(24.4, 700.0))),
        Completion::Applied
    );
    assert_eq!(session.context().rainfall, Some(950.0));
}
