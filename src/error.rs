//! Error taxonomy for the stage pipeline.
//!
//! Every remote failure is converted at the stage boundary into one of these
//! types; nothing here is allowed to cross into the next stage.
use crate::context::Field;
use crate::gateway::Capability;
use crate::pipeline::Stage;
use thiserror::Error;

/// Raw form text that could not be turned into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("expected a number, got {raw:?}")]
    NotANumber { raw: String },
    #[error("expected true or false, got {raw:?}")]
    NotABoolean { raw: String },
}

/// A normalization failure tied to the form field it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {source}")]
pub struct FormError {
    pub field: Field,
    #[source]
    pub source: NormalizationError,
}

/// Failure below the JSON layer: connection, timeout, or non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connection(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{capability} request failed: {cause}")]
    RequestFailed {
        capability: Capability,
        #[source]
        cause: TransportError,
    },
    #[error("{capability} response malformed: {detail}")]
    MalformedResponse {
        capability: Capability,
        detail: String,
    },
}

impl PredictionError {
    pub fn capability(&self) -> Capability {
        match self {
            PredictionError::RequestFailed { capability, .. }
            | PredictionError::MalformedResponse { capability, .. } => *capability,
        }
    }
}

/// Failures of the coordinate lookups inside the weather stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("no results found for {query:?}")]
    NoResultsFound { query: String },
    #[error("device location permission denied")]
    PermissionDenied,
    #[error("{field} is required to look up a location")]
    MissingField { field: Field },
    #[error(transparent)]
    Gateway(#[from] PredictionError),
}

/// Why a stage's gateway call was not offered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{stage} is not the active stage (active: {active})")]
    NotCurrent { stage: Stage, active: Stage },
    #[error("{stage} already has a request in flight")]
    InFlight { stage: Stage },
    #[error("{stage} requires {field}")]
    MissingField { stage: Stage, field: Field },
    #[error("{stage} has no prediction request")]
    NoGateway { stage: Stage },
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Why the controller refused to move past a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvanceError {
    #[error("{stage} has no successful prediction to carry forward")]
    NotOffered { stage: Stage },
    #[error("{stage} cannot advance without {field}")]
    MissingField { stage: Stage, field: Field },
    #[error("{stage} still has a request in flight")]
    InFlight { stage: Stage },
    #[error("pipeline is already done")]
    Terminal,
}
