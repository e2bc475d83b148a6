//! Feature Operations
//!
//! Describes the parametric operations the fit workflow applies to a host
//! document: thread, chamfer, boolean cut and face offset.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::{BodyId, EdgeId, FaceId};

/// Stable handle for a feature in the operation history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub Uuid);

impl FeatureId {
    /// Create a new random feature ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature:{}", self.0)
    }
}

/// Kind of operation a feature applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Thread,
    Chamfer,
    Cut,
    Offset,
}

impl FeatureKind {
    /// Get the type name of this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureKind::Thread => "Thread",
            FeatureKind::Chamfer => "Chamfer",
            FeatureKind::Cut => "Cut",
            FeatureKind::Offset => "Offset",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A feature applied to the document, as reported back to the workflow
///
/// `position` is the history index at the time the record was produced.
/// Later reordering does not update it; ask the document for the current
/// position via [`CadDocument::position_of`](crate::kernel::CadDocument::position_of).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Handle used for repositioning
    pub id: FeatureId,
    /// Operation kind
    pub kind: FeatureKind,
    /// Display name (e.g. "Thread1")
    pub name: String,
    /// History position when the record was produced
    pub position: usize,
}

/// Parameters of a thread feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSpec {
    /// Thread family name as listed by the catalog (e.g. "ISO Metric profile")
    pub family: String,
    /// Nominal size label (e.g. "M20")
    pub size: String,
    /// Designation (e.g. "M20x2.5")
    pub designation: String,
    /// Tolerance class (e.g. "6g")
    pub tolerance_class: String,
    /// Whether the thread is modeled as real geometry rather than cosmetic
    pub modeled: bool,
    /// Whether the thread runs the full length of the face
    pub full_length: bool,
}

impl ThreadSpec {
    /// Create a modeled, full-length external thread specification
    pub fn new(
        family: impl Into<String>,
        size: impl Into<String>,
        designation: impl Into<String>,
        tolerance_class: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            size: size.into(),
            designation: designation.into(),
            tolerance_class: tolerance_class.into(),
            modeled: true,
            full_length: true,
        }
    }
}

/// Operation payload stored in a history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureOp {
    /// Thread a cylindrical face
    Thread {
        /// Face to thread
        face: FaceId,
        /// Thread parameters
        spec: ThreadSpec,
    },

    /// Equal-distance chamfer of edges
    Chamfer {
        /// Edges to chamfer
        edges: Vec<EdgeId>,
        /// Chamfer distance in document units (both directions)
        distance: f64,
    },

    /// Subtract a tool body from a target body
    Cut {
        /// Body that receives the cavity
        target: BodyId,
        /// Body used as the cutting tool
        tool: BodyId,
        /// Whether the tool body survives the cut
        keep_tool: bool,
    },

    /// Move faces along their outward normal
    Offset {
        /// Faces to offset
        faces: Vec<FaceId>,
        /// Signed distance in document units
        distance: f64,
    },
}

impl FeatureOp {
    /// Get the kind of this operation
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureOp::Thread { .. } => FeatureKind::Thread,
            FeatureOp::Chamfer { .. } => FeatureKind::Chamfer,
            FeatureOp::Cut { .. } => FeatureKind::Cut,
            FeatureOp::Offset { .. } => FeatureKind::Offset,
        }
    }
}
