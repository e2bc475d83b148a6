//! Thread Fit Workflow
//!
//! This crate provides:
//! - An abstract host document trait for geometry queries and feature creation
//! - An in-memory document with an ordered, dependency-checked operation history
//! - Lead-in edge detection on cylindrical faces
//! - Thread catalog lookup and designation selection
//! - Thread/chamfer sequencing with history reordering
//! - The interactive bolt/lid fit pipeline

pub mod config;
pub mod error;
pub mod feature;
pub mod history;
pub mod kernel;
pub mod lead_in;
pub mod pipeline;
pub mod sequencer;
pub mod thread;

// Re-exports for convenience
pub use config::{ClearanceDirection, ClearancePreset, ConfigError, FitConfig};
pub use error::{FitError, FitResult, FitWarning, ValidationError};
pub use feature::{FeatureId, FeatureKind, FeatureOp, FeatureRecord, ThreadSpec};
pub use history::{HistoryEntry, HistoryError, OperationHistory};
pub use kernel::{
    BodyId, CadDocument, CadError, CadResult, Curve, Cylinder, EdgeId, EdgeInfo, FaceId,
    FaceSide, LengthUnit, MemoryDocument, Scene, SceneError, Surface,
};
pub use lead_in::select_lead_in_edge;
pub use pipeline::{
    Answer, EntityFilter, EntityRef, FitPipeline, FitReport, PipelineOutcome, Prompter, Request,
    ScriptedPrompter, Stage, Step,
};
pub use sequencer::{FeatureSequencer, ReorderOutcome, SequencedFeatures};
pub use thread::{StaticCatalog, ThreadCatalog, ThreadResolution, ThreadResolver, ThreadSize};
