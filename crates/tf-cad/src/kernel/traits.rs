//! Host document trait definitions
//!
//! These traits define the interface a host CAD document must implement to
//! run the fit workflow: read-only geometric queries plus the handful of
//! feature operations the workflow applies.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::LengthUnit;
use crate::feature::{FeatureId, FeatureRecord, ThreadSpec};
use crate::history::HistoryError;

/// Unique identifier for a solid body within a document session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub Uuid);

/// Unique identifier for a face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId(pub Uuid);

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

macro_rules! impl_handle {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Create a new random handle
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

impl_handle!(BodyId, "body");
impl_handle!(FaceId, "face");
impl_handle!(EdgeId, "edge");

/// Geometry of a cylindrical surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// Axis direction (normalized)
    pub axis: DVec3,
    /// A point on the axis
    pub origin: DVec3,
    /// Radius in document units
    pub radius: f64,
}

impl Cylinder {
    /// Create a cylinder, normalizing the axis
    pub fn new(axis: DVec3, origin: DVec3, radius: f64) -> Self {
        Self {
            axis: axis.normalize(),
            origin,
            radius,
        }
    }

    /// Diameter in document units
    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }
}

/// Classified surface of a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    Cylinder(Cylinder),
    /// Any surface the workflow does not need to inspect
    Other,
}

impl Surface {
    /// Shorthand for a cylindrical surface
    pub fn cylinder(axis: DVec3, origin: DVec3, radius: f64) -> Self {
        Surface::Cylinder(Cylinder::new(axis, origin, radius))
    }

    pub fn as_cylinder(&self) -> Option<&Cylinder> {
        match self {
            Surface::Cylinder(c) => Some(c),
            Surface::Other => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Surface::Cylinder(_) => "Cylinder",
            Surface::Other => "Other",
        }
    }
}

/// Classified curve of an edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    Circle {
        /// Circle center
        center: DVec3,
        /// Circle radius in document units
        radius: f64,
    },
    /// Lines, helices and anything else
    Other,
}

impl Curve {
    pub fn circle(center: DVec3, radius: f64) -> Self {
        Curve::Circle { center, radius }
    }

    /// Center point if this is a circle
    pub fn circle_center(&self) -> Option<DVec3> {
        match self {
            Curve::Circle { center, .. } => Some(*center),
            Curve::Other => None,
        }
    }
}

/// Information about an edge bounding a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Face the edge was enumerated from
    pub face: FaceId,
    /// Edge geometry
    pub curve: Curve,
}

/// Error type for host document operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CadError {
    #[error("Body not found: {0}")]
    BodyNotFound(BodyId),

    #[error("Face not found: {0}")]
    FaceNotFound(FaceId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Result type for document operations
pub type CadResult<T> = Result<T, CadError>;

/// A host CAD document
///
/// Queries are answered from live document state and must not be cached by
/// callers across workflow runs. Feature operations append to the
/// document's operation history and are individually atomic.
pub trait CadDocument {
    /// Units used for all lengths this document reports or accepts
    fn internal_units(&self) -> LengthUnit;

    /// Convert a length between units
    fn convert(&self, value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
        from.convert(value, to)
    }

    // ========== Geometry Queries ==========

    /// Body that owns a face
    fn owner_of(&self, face: FaceId) -> CadResult<BodyId>;

    /// Surface classification of a face
    fn surface_of(&self, face: FaceId) -> CadResult<Surface>;

    /// Boundary edges of a face, in document enumeration order
    fn edges_of(&self, face: FaceId) -> CadResult<Vec<EdgeInfo>>;

    /// Display name of a body
    fn body_name(&self, body: BodyId) -> CadResult<String>;

    // ========== Feature Creation ==========

    /// Thread a cylindrical face
    fn create_thread(&mut self, face: FaceId, spec: &ThreadSpec) -> CadResult<FeatureRecord>;

    /// Chamfer edges by `distance` (document units) in both directions
    fn create_chamfer(&mut self, edges: &[EdgeId], distance: f64) -> CadResult<FeatureRecord>;

    /// Subtract `tool` from `target`
    fn cut_boolean(
        &mut self,
        target: BodyId,
        tool: BodyId,
        keep_tool: bool,
    ) -> CadResult<FeatureRecord>;

    /// Move faces along their outward normal by `signed_distance` (document units)
    fn create_offset(
        &mut self,
        faces: &[FaceId],
        signed_distance: f64,
    ) -> CadResult<FeatureRecord>;

    // ========== History ==========

    /// Current position of a feature in the operation history
    fn position_of(&self, feature: FeatureId) -> CadResult<usize>;

    /// Reposition a feature, shifting the features in between by one slot
    fn move_to_position(&mut self, feature: FeatureId, position: usize) -> CadResult<()>;
}
