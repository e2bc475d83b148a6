//! Host document abstraction
//!
//! The workflow never touches document state directly; everything goes
//! through [`CadDocument`], which a host implements and passes in.

mod memory;
mod traits;
mod units;

pub use memory::{
    BodyState, BodyView, CylinderFace, FaceSide, FaceView, LeadIn, MemoryDocument, Scene,
    SceneBody, SceneError, SceneFace,
};
pub use traits::{
    BodyId, CadDocument, CadError, CadResult, Curve, Cylinder, EdgeId, EdgeInfo, FaceId, Surface,
};
pub use units::{LengthUnit, convert};
