//! Error types for the fit workflow
//!
//! - Validation errors: the selected geometry or catalog cannot support a fit
//! - Invalid selections: a user answer that cannot be interpreted
//! - Document faults: anything the host document reports while querying or
//!   applying features
//!
//! Cancelling a prompt is not an error; see
//! [`PipelineOutcome::Aborted`](crate::pipeline::PipelineOutcome::Aborted).

use thiserror::Error;

use crate::kernel::{BodyId, CadError, FaceId};
use crate::pipeline::Stage;

/// Geometry or catalog conditions that make the fit impossible
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Face does not belong to the expected body
    #[error("Face {face} must belong to body '{expected}'")]
    FaceNotOnBody {
        face: FaceId,
        expected: String,
        actual: BodyId,
    },

    /// Face surface is not a cylinder
    #[error("Selected face must be cylindrical, found {surface} surface")]
    NotCylindrical { face: FaceId, surface: &'static str },

    /// Cylinder has no circular boundary edge to chamfer
    #[error("Could not identify a circular lead-in edge on face {0}")]
    NoLeadInEdge(FaceId),

    /// No catalog family matches the configured standard
    #[error("Thread standard '{0}' not found in catalog")]
    StandardNotFound(String),

    /// Matched family lists no sizes
    #[error("Thread family '{0}' has no sizes")]
    NoThreadSizes(String),

    /// Chosen size lists no designations
    #[error("Thread size '{size}' in '{family}' has no designations")]
    NoDesignations { family: String, size: String },

    /// Lid and bolt are the same body
    #[error("Bolt and lid must be different bodies")]
    SameBody,
}

/// Fatal workflow errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Fault reported by the host document
    #[error("Document operation failed during {stage}: {source}")]
    Document {
        stage: Stage,
        #[source]
        source: CadError,
    },

    /// The pipeline was driven out of order
    #[error("Pipeline misuse: {0}")]
    Protocol(String),
}

impl FitError {
    /// Wrap a document fault with the stage it happened in
    pub fn document(stage: Stage) -> impl FnOnce(CadError) -> FitError {
        move |source| FitError::Document { stage, source }
    }

    /// Message shown to the user before the run stops
    pub fn user_message(&self) -> String {
        match self {
            FitError::Document { source, .. } => {
                let mut msg = format!("Fatal Error: {}", self);
                let mut cause = std::error::Error::source(source);
                while let Some(e) = cause {
                    msg.push_str(&format!("\n  caused by: {}", e));
                    cause = std::error::Error::source(e);
                }
                msg
            }
            other => format!("Fatal Error: {}", other),
        }
    }
}

/// Recoverable conditions surfaced to the user after the run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitWarning {
    /// The chamfer could not be moved before the thread
    #[error(
        "Timeline reorder failed ({reason}). Please manually drag the Chamfer before the Thread."
    )]
    ReorderFailed { reason: String },
}

pub type FitResult<T> = Result<T, FitError>;
