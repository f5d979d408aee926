//! Stage sequencing: Weather, Crop, Nutrients, Fertilizer, Done.
//!
//! `controller` holds the pure transition rules; `session` wraps them with
//! the per-stage request bookkeeping a live walk through the stages needs.
mod controller;
mod session;
mod stage;

pub use controller::{
    advance, offers_advance, request_for, StageRequest, StageResult, WEATHER_CARRIES,
};
pub use session::{
    Completion, Outcome, Session, Ticket, PREDICTION_FAILED_MESSAGE, WEATHER_FAILED_MESSAGE,
};
pub use stage::Stage;
