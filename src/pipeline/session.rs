//! One user's walk through the pipeline.
//!
//! `Session` is a reducer over an explicit `StageContext`: every user action
//! (edit, submit, coordinate change, transfer) is a method that returns what
//! the caller has to do next, and every remote outcome comes back through
//! `complete`. Each stage keeps a generation counter; a response is applied
//! only when its ticket carries the latest generation for that stage.
use super::controller::{self, request_for, StageRequest, StageResult};
use super::Stage;
use crate::context::{Coordinates, Field, StageContext};
use crate::error::{AdvanceError, PredictionError, SubmitError};
use crate::gateway::{WeatherReading, WeatherRequest};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Shown in place of any prediction failure.
pub const PREDICTION_FAILED_MESSAGE: &str = "There was an error making the prediction request!";
/// Shown when the weather lookup fails.
pub const WEATHER_FAILED_MESSAGE: &str = "There was an error fetching weather data!";

/// Fields a weather lookup fills in unless the user typed them.
const LOOKUP_FIELDS: [Field; 2] = [Field::Rainfall, Field::Temperature];

/// What a stage currently displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded { result: StageResult },
    Failed { message: String, detail: String },
}

/// Identifies one issued request; hand it back to `Session::complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    stage: Stage,
    generation: u64,
}

impl Ticket {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// Superseded or cancelled; nothing changed.
    Discarded,
}

#[derive(Debug, Clone, Default)]
struct StageSlot {
    generation: u64,
    in_flight: bool,
    outcome: Option<Outcome>,
}

#[derive(Debug, Clone)]
pub struct Session {
    context: StageContext,
    stage: Stage,
    slots: BTreeMap<Stage, StageSlot>,
    pinned: BTreeSet<Field>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            context: StageContext::initial(),
            stage: Stage::Weather,
            slots: BTreeMap::new(),
            pinned: BTreeSet::new(),
        }
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn outcome(&self, stage: Stage) -> Option<&Outcome> {
        self.slots.get(&stage).and_then(|slot| slot.outcome.as_ref())
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        match self.outcome(stage) {
            Some(Outcome::Succeeded { result }) => Some(result),
            _ => None,
        }
    }

    pub fn is_in_flight(&self, stage: Stage) -> bool {
        self.slots.get(&stage).is_some_and(|slot| slot.in_flight)
    }

    pub fn is_pinned(&self, field: Field) -> bool {
        self.pinned.contains(&field)
    }

    /// Apply an explicit user edit. Rainfall and temperature typed by the
    /// user are pinned so a later weather lookup leaves them alone. Editing a
    /// field the active stage's in-flight request was built from cancels
    /// that request.
    pub fn edit(&mut self, partial: &StageContext) {
        let stage = self.stage;
        let stale = partial
            .populated()
            .into_iter()
            .find(|field| controller::reads(stage).contains(field));
        if let Some(field) = stale {
            if self.cancel(stage) {
                tracing::info!(%stage, %field, "edit superseded the request in flight");
            }
        }
        for field in partial.populated() {
            if LOOKUP_FIELDS.contains(&field) {
                self.pinned.insert(field);
            }
        }
        self.context = self.context.merge(partial);
    }

    /// Hand rainfall/temperature back to the weather lookup.
    pub fn unpin(&mut self, field: Field) {
        self.pinned.remove(&field);
    }

    /// Record newly resolved coordinates. A change always starts a fresh
    /// weather lookup, superseding one already in flight.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) -> Option<(Ticket, StageRequest)> {
        if self.stage != Stage::Weather {
            tracing::debug!(stage = %self.stage, "coordinates ignored outside the weather stage");
            return None;
        }
        if self.context.coordinates() == Some(coordinates) {
            return None;
        }
        self.context = self.context.merge(&coordinates.into());
        let request = StageRequest::Weather(WeatherRequest { coordinates });
        Some(self.start(Stage::Weather, request))
    }

    /// Submit the active stage's form. The form is merged as a user edit,
    /// then the stage request is built from the whole context. On success the
    /// stage's previous outcome is cleared before the caller issues the call.
    pub fn submit(
        &mut self,
        stage: Stage,
        form: &StageContext,
    ) -> Result<(Ticket, StageRequest), SubmitError> {
        if stage != self.stage {
            return Err(SubmitError::NotCurrent {
                stage,
                active: self.stage,
            });
        }
        if self.is_in_flight(stage) {
            return Err(SubmitError::InFlight { stage });
        }
        self.edit(form);
        let request = request_for(stage, &self.context)?;
        Ok(self.start(stage, request))
    }

    fn start(&mut self, stage: Stage, request: StageRequest) -> (Ticket, StageRequest) {
        let slot = self.slots.entry(stage).or_default();
        slot.generation += 1;
        slot.in_flight = true;
        slot.outcome = None;
        tracing::debug!(%stage, generation = slot.generation, "stage request issued");
        let ticket = Ticket {
            stage,
            generation: slot.generation,
        };
        (ticket, request)
    }

    /// Deliver the outcome of a request issued by `submit` or
    /// `set_coordinates`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<StageResult, PredictionError>,
    ) -> Completion {
        let stage = ticket.stage;
        let slot = self.slots.entry(stage).or_default();
        if !slot.in_flight || slot.generation != ticket.generation {
            tracing::debug!(
                %stage,
                ticket = ticket.generation,
                latest = slot.generation,
                "discarding superseded response"
            );
            return Completion::Discarded;
        }
        slot.in_flight = false;

        let outcome = match result {
            Ok(result) if result.stage() == stage => {
                if let StageResult::Weather(reading) = &result {
                    let update = unpinned_reading(reading, &self.pinned);
                    self.context = self.context.merge(&update);
                }
                tracing::info!(%stage, "stage prediction applied");
                Outcome::Succeeded { result }
            }
            Ok(result) => {
                tracing::warn!(%stage, produced = %result.stage(), "result does not belong to this stage");
                Outcome::Failed {
                    message: failure_message(stage).to_string(),
                    detail: format!("{} result delivered to {stage}", result.stage()),
                }
            }
            Err(err) => {
                if stage == Stage::Weather {
                    tracing::warn!(error = %err, "weather lookup failed; keeping previous values");
                } else {
                    tracing::warn!(%stage, error = %err, "stage prediction failed");
                }
                Outcome::Failed {
                    message: failure_message(stage).to_string(),
                    detail: err.to_string(),
                }
            }
        };
        slot.outcome = Some(outcome);
        Completion::Applied
    }

    /// Drop the in-flight request of `stage`, if any. Its response will be
    /// discarded when it arrives.
    pub fn cancel(&mut self, stage: Stage) -> bool {
        match self.slots.get_mut(&stage) {
            Some(slot) if slot.in_flight => {
                slot.generation += 1;
                slot.in_flight = false;
                tracing::debug!(%stage, generation = slot.generation, "stage request cancelled");
                true
            }
            _ => false,
        }
    }

    /// Whether the "continue" action is available for the active stage.
    pub fn offers_advance(&self) -> bool {
        !self.is_in_flight(self.stage)
            && controller::offers_advance(self.stage, &self.context, self.result(self.stage))
    }

    /// Move to the next stage, carrying the merged context forward.
    pub fn advance(&mut self) -> Result<Stage, AdvanceError> {
        let stage = self.stage;
        if self.is_in_flight(stage) {
            return Err(AdvanceError::InFlight { stage });
        }
        let (next, context) = controller::advance(stage, &self.context, self.result(stage))?;
        tracing::info!(from = %stage, to = %next, "stage advanced");
        self.context = context;
        self.stage = next;
        Ok(next)
    }
}

fn failure_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Weather => WEATHER_FAILED_MESSAGE,
        _ => PREDICTION_FAILED_MESSAGE,
    }
}

fn unpinned_reading(reading: &WeatherReading, pinned: &BTreeSet<Field>) -> StageContext {
    let mut update = reading.as_partial();
    if pinned.contains(&Field::Rainfall) {
        update.rainfall = None;
    }
    if pinned.contains(&Field::Temperature) {
        update.temperature = None;
    }
    update
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
