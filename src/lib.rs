//! Agronomic recommendation pipeline.
//!
//! A session walks four stages in a fixed order (weather, crop, nutrients,
//! fertilizer). Each stage collects a small form, calls one remote prediction
//! service, and hands an accumulated context to the next stage.
pub mod categories;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod workflow;

pub use context::{Coordinates, Field, StageContext};
pub use pipeline::{Session, Stage};
pub use workflow::{run_pipeline, Gateways, LocationInput, PipelineReport, RunInputs};
