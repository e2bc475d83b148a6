//! In-memory host document
//!
//! A small B-rep style document (bodies, faces, edges) with a real
//! operation history. It implements [`CadDocument`] so the workflow can run
//! headless, and can be loaded from a RON scene description.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    BodyId, CadDocument, CadError, CadResult, Curve, EdgeId, EdgeInfo, FaceId, LengthUnit, Surface,
};
use crate::feature::{FeatureId, FeatureKind, FeatureOp, FeatureRecord, ThreadSpec};
use crate::history::{HistoryEntry, OperationHistory};

/// Which side of its body's material a face bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceSide {
    /// Outward normal points away from the body's axis (shafts, outer walls)
    #[default]
    External,
    /// Outward normal points toward the axis (holes, cavities)
    Internal,
}

#[derive(Debug, Clone)]
struct BodyData {
    id: BodyId,
    name: String,
    consumed: bool,
}

#[derive(Debug, Clone)]
struct FaceData {
    id: FaceId,
    owner: BodyId,
    surface: Surface,
    side: FaceSide,
    produced_by: Option<FeatureId>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    id: EdgeId,
    face: FaceId,
    curve: Curve,
}

/// Read-only view of a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyView<'a> {
    pub id: BodyId,
    pub name: &'a str,
    pub consumed: bool,
}

/// Read-only view of a face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceView {
    pub id: FaceId,
    pub owner: BodyId,
    pub surface: Surface,
    pub side: FaceSide,
}

/// Handles of a cylinder face added with [`MemoryDocument::add_cylinder`]
#[derive(Debug, Clone, Copy)]
pub struct CylinderFace {
    pub face: FaceId,
    /// Circular edge at the origin end
    pub base: EdgeId,
    /// Circular edge at the far end along the axis
    pub top: EdgeId,
}

/// How the lead-in edge of a body was chamfered, after evaluating the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadIn {
    /// No chamfer applied
    #[default]
    Unchamfered,
    /// Chamfer evaluated on plain cylinder geometry
    Clean,
    /// Chamfer evaluated after a thread already cut the face
    OverThread,
}

/// Evaluated state of a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub id: BodyId,
    pub name: String,
    pub consumed: bool,
    pub threaded_faces: Vec<FaceId>,
    pub lead_in: LeadIn,
    /// Effective radius of each internal cylindrical face
    pub cavity_radii: Vec<(FaceId, f64)>,
}

/// Scene loading errors
#[derive(Debug, Clone, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Duplicate body name: {0}")]
    DuplicateBody(String),
}

/// Serializable scene description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub units: LengthUnit,
    pub bodies: Vec<SceneBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBody {
    pub name: String,
    #[serde(default)]
    pub faces: Vec<SceneFace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFace {
    pub surface: Surface,
    #[serde(default)]
    pub side: FaceSide,
    #[serde(default)]
    pub edges: Vec<Curve>,
}

impl Scene {
    /// Load a scene from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| SceneError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }

    /// Save a scene to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| SceneError::Io(e.to_string()))
    }
}

/// In-memory document with an operation history
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    units: LengthUnit,
    bodies: Vec<BodyData>,
    faces: Vec<FaceData>,
    edges: Vec<EdgeData>,
    history: OperationHistory,
}

impl MemoryDocument {
    /// Create an empty document using `units` for all lengths
    pub fn new(units: LengthUnit) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Build a document from a scene description
    pub fn from_scene(scene: &Scene) -> Result<Self, SceneError> {
        let mut doc = Self::new(scene.units);
        let mut seen = HashSet::new();

        for body in &scene.bodies {
            if !seen.insert(body.name.as_str()) {
                return Err(SceneError::DuplicateBody(body.name.clone()));
            }
            let body_id = doc.add_body(&body.name);
            for face in &body.faces {
                let surface = match face.surface {
                    Surface::Cylinder(c) => Surface::cylinder(c.axis, c.origin, c.radius),
                    Surface::Other => Surface::Other,
                };
                let face_id = doc.insert_face(body_id, surface, face.side, None);
                for curve in &face.edges {
                    doc.insert_edge(face_id, *curve);
                }
            }
        }

        Ok(doc)
    }

    // ============== Building ==============

    /// Add a body
    pub fn add_body(&mut self, name: impl Into<String>) -> BodyId {
        let id = BodyId::new();
        self.bodies.push(BodyData {
            id,
            name: name.into(),
            consumed: false,
        });
        id
    }

    /// Add a face to a body
    pub fn add_face(&mut self, body: BodyId, surface: Surface, side: FaceSide) -> CadResult<FaceId> {
        self.body(body)?;
        Ok(self.insert_face(body, surface, side, None))
    }

    /// Add a boundary edge to a face
    pub fn add_edge(&mut self, face: FaceId, curve: Curve) -> CadResult<EdgeId> {
        self.face(face)?;
        Ok(self.insert_edge(face, curve))
    }

    /// Add an external cylindrical face of `height` along `axis`, bounded by
    /// two circular edges
    pub fn add_cylinder(
        &mut self,
        body: BodyId,
        axis: DVec3,
        origin: DVec3,
        radius: f64,
        height: f64,
    ) -> CadResult<CylinderFace> {
        let surface = Surface::cylinder(axis, origin, radius);
        let axis = surface.as_cylinder().map(|c| c.axis).unwrap_or(axis);
        let face = self.add_face(body, surface, FaceSide::External)?;
        let base = self.insert_edge(face, Curve::circle(origin, radius));
        let top = self.insert_edge(face, Curve::circle(origin + axis * height, radius));
        Ok(CylinderFace { face, base, top })
    }

    fn insert_face(
        &mut self,
        owner: BodyId,
        surface: Surface,
        side: FaceSide,
        produced_by: Option<FeatureId>,
    ) -> FaceId {
        let id = FaceId::new();
        self.faces.push(FaceData {
            id,
            owner,
            surface,
            side,
            produced_by,
        });
        id
    }

    fn insert_edge(&mut self, face: FaceId, curve: Curve) -> EdgeId {
        let id = EdgeId::new();
        self.edges.push(EdgeData { id, face, curve });
        id
    }

    // ============== Accessors ==============

    /// Get the operation history
    pub fn history(&self) -> &OperationHistory {
        &self.history
    }

    /// Iterate over bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = BodyView<'_>> {
        self.bodies.iter().map(|b| BodyView {
            id: b.id,
            name: &b.name,
            consumed: b.consumed,
        })
    }

    /// Iterate over faces in creation order
    pub fn faces(&self) -> impl Iterator<Item = FaceView> + '_ {
        self.faces.iter().map(|f| FaceView {
            id: f.id,
            owner: f.owner,
            surface: f.surface,
            side: f.side,
        })
    }

    /// Find a body by name
    pub fn body_by_name(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().find(|b| b.name == name).map(|b| b.id)
    }

    /// Faces owned by a body
    pub fn faces_of(&self, body: BodyId) -> Vec<FaceView> {
        self.faces().filter(|f| f.owner == body).collect()
    }

    fn body(&self, id: BodyId) -> CadResult<&BodyData> {
        self.bodies
            .iter()
            .find(|b| b.id == id)
            .ok_or(CadError::BodyNotFound(id))
    }

    fn face(&self, id: FaceId) -> CadResult<&FaceData> {
        self.faces
            .iter()
            .find(|f| f.id == id)
            .ok_or(CadError::FaceNotFound(id))
    }

    fn edge(&self, id: EdgeId) -> CadResult<&EdgeData> {
        self.edges
            .iter()
            .find(|e| e.id == id)
            .ok_or(CadError::EdgeNotFound(id))
    }

    fn next_name(&self, kind: FeatureKind) -> String {
        let count = self
            .history
            .entries()
            .iter()
            .filter(|e| e.kind() == kind)
            .count();
        format!("{}{}", kind.type_name(), count + 1)
    }

    /// Features in the history that modify `body`
    fn features_touching(&self, body: BodyId) -> Vec<FeatureId> {
        let owner = |face: &FaceId| self.face(*face).map(|f| f.owner).ok();
        let edge_owner = |edge: &EdgeId| {
            self.edge(*edge)
                .ok()
                .and_then(|e| self.face(e.face).ok())
                .map(|f| f.owner)
        };

        self.history
            .entries()
            .iter()
            .filter(|entry| match &entry.op {
                FeatureOp::Thread { face, .. } => owner(face) == Some(body),
                FeatureOp::Chamfer { edges, .. } => edges.iter().any(|e| edge_owner(e) == Some(body)),
                FeatureOp::Cut { target, .. } => *target == body,
                FeatureOp::Offset { faces, .. } => faces.iter().any(|f| owner(f) == Some(body)),
            })
            .map(|entry| entry.id)
            .collect()
    }

    fn active_body(&self, id: BodyId) -> CadResult<&BodyData> {
        let body = self.body(id)?;
        if body.consumed {
            return Err(CadError::OperationFailed(format!(
                "Body '{}' was consumed by an earlier cut",
                body.name
            )));
        }
        Ok(body)
    }

    // ============== Evaluation ==============

    /// Evaluate the history in position order and report each body's state
    pub fn evaluate(&self) -> Vec<BodyState> {
        let mut states: Vec<BodyState> = self
            .bodies
            .iter()
            .map(|b| BodyState {
                id: b.id,
                name: b.name.clone(),
                consumed: b.consumed,
                threaded_faces: Vec::new(),
                lead_in: LeadIn::Unchamfered,
                cavity_radii: Vec::new(),
            })
            .collect();
        let index: HashMap<BodyId, usize> =
            states.iter().enumerate().map(|(i, s)| (s.id, i)).collect();

        let mut threaded: HashSet<FaceId> = HashSet::new();
        let mut radii: HashMap<FaceId, f64> = self
            .faces
            .iter()
            .filter_map(|f| f.surface.as_cylinder().map(|c| (f.id, c.radius)))
            .collect();

        for entry in self.history.entries() {
            match &entry.op {
                FeatureOp::Thread { face, .. } => {
                    if let Ok(data) = self.face(*face)
                        && threaded.insert(*face)
                    {
                        states[index[&data.owner]].threaded_faces.push(*face);
                    }
                }
                FeatureOp::Chamfer { edges, .. } => {
                    for edge in edges {
                        let Ok(face) = self.edge(*edge).and_then(|e| self.face(e.face)) else {
                            continue;
                        };
                        let state = &mut states[index[&face.owner]];
                        if threaded.contains(&face.id) {
                            state.lead_in = LeadIn::OverThread;
                        } else if state.lead_in == LeadIn::Unchamfered {
                            state.lead_in = LeadIn::Clean;
                        }
                    }
                }
                FeatureOp::Cut { .. } => {}
                FeatureOp::Offset { faces, distance } => {
                    for face in faces {
                        let Ok(data) = self.face(*face) else {
                            continue;
                        };
                        if let Some(r) = radii.get_mut(face) {
                            match data.side {
                                FaceSide::External => *r += distance,
                                FaceSide::Internal => *r -= distance,
                            }
                        }
                    }
                }
            }
        }

        for face in self.faces.iter().filter(|f| f.side == FaceSide::Internal) {
            if let Some(r) = radii.get(&face.id) {
                states[index[&face.owner]].cavity_radii.push((face.id, *r));
            }
        }

        states
    }

    /// Evaluated state of one body
    pub fn body_state(&self, body: BodyId) -> Option<BodyState> {
        self.evaluate().into_iter().find(|s| s.id == body)
    }
}

impl CadDocument for MemoryDocument {
    fn internal_units(&self) -> LengthUnit {
        self.units
    }

    fn owner_of(&self, face: FaceId) -> CadResult<BodyId> {
        Ok(self.face(face)?.owner)
    }

    fn surface_of(&self, face: FaceId) -> CadResult<Surface> {
        Ok(self.face(face)?.surface)
    }

    fn edges_of(&self, face: FaceId) -> CadResult<Vec<EdgeInfo>> {
        self.face(face)?;
        Ok(self
            .edges
            .iter()
            .filter(|e| e.face == face)
            .map(|e| EdgeInfo {
                id: e.id,
                face: e.face,
                curve: e.curve,
            })
            .collect())
    }

    fn body_name(&self, body: BodyId) -> CadResult<String> {
        Ok(self.body(body)?.name.clone())
    }

    fn create_thread(&mut self, face: FaceId, spec: &ThreadSpec) -> CadResult<FeatureRecord> {
        let data = self.face(face)?;
        let cylinder = *data.surface.as_cylinder().ok_or_else(|| {
            CadError::InvalidInput("Threads can only be applied to cylindrical faces".into())
        })?;
        let produced_by = data.produced_by;
        self.active_body(data.owner)?;

        if spec.designation.trim().is_empty() {
            return Err(CadError::InvalidInput("Empty thread designation".into()));
        }
        let already_threaded = self
            .history
            .entries()
            .iter()
            .any(|e| matches!(&e.op, FeatureOp::Thread { face: f, .. } if *f == face));
        if already_threaded {
            return Err(CadError::OperationFailed(format!("Face {} is already threaded", face)));
        }

        let mut entry = HistoryEntry::new(
            self.next_name(FeatureKind::Thread),
            FeatureOp::Thread {
                face,
                spec: spec.clone(),
            },
        )
        .with_dependencies(produced_by);

        if spec.modeled {
            // Modeled threads add a helical boundary along the face
            let helix = self.insert_edge(face, Curve::Other);
            entry.produced_edges.push(helix);
        }

        let record = self.history.push(entry);
        tracing::debug!(
            "Threaded {} ({}, r={})",
            face,
            spec.designation,
            cylinder.radius
        );
        Ok(record)
    }

    fn create_chamfer(&mut self, edges: &[EdgeId], distance: f64) -> CadResult<FeatureRecord> {
        if edges.is_empty() {
            return Err(CadError::InvalidInput("Chamfer requires at least one edge".into()));
        }
        if !distance.is_finite() || distance <= 0.0 {
            return Err(CadError::InvalidInput(format!(
                "Chamfer distance must be positive, got {}",
                distance
            )));
        }

        let mut dependencies = Vec::new();
        for edge in edges {
            let face = self.face(self.edge(*edge)?.face)?;
            self.active_body(face.owner)?;
            dependencies.extend(face.produced_by);
            dependencies.extend(self.history.producer_of(*edge));
        }

        let entry = HistoryEntry::new(
            self.next_name(FeatureKind::Chamfer),
            FeatureOp::Chamfer {
                edges: edges.to_vec(),
                distance,
            },
        )
        .with_dependencies(dependencies);

        Ok(self.history.push(entry))
    }

    fn cut_boolean(
        &mut self,
        target: BodyId,
        tool: BodyId,
        keep_tool: bool,
    ) -> CadResult<FeatureRecord> {
        if target == tool {
            return Err(CadError::InvalidInput("Cannot cut a body with itself".into()));
        }
        self.active_body(target)?;
        self.active_body(tool)?;

        let mut dependencies = self.features_touching(target);
        dependencies.extend(self.features_touching(tool));

        let mut entry = HistoryEntry::new(
            self.next_name(FeatureKind::Cut),
            FeatureOp::Cut {
                target,
                tool,
                keep_tool,
            },
        )
        .with_dependencies(dependencies);

        // The tool's cylindrical walls become cavity walls in the target
        let tool_faces: Vec<(FaceId, Surface)> = self
            .faces
            .iter()
            .filter(|f| f.owner == tool && f.side == FaceSide::External)
            .filter(|f| f.surface.as_cylinder().is_some())
            .map(|f| (f.id, f.surface))
            .collect();

        for (source, surface) in tool_faces {
            let cavity = self.insert_face(target, surface, FaceSide::Internal, Some(entry.id));
            let circles: Vec<Curve> = self
                .edges
                .iter()
                .filter(|e| e.face == source && matches!(e.curve, Curve::Circle { .. }))
                .map(|e| e.curve)
                .collect();
            for curve in circles {
                let edge = self.insert_edge(cavity, curve);
                entry.produced_edges.push(edge);
            }
        }

        if !keep_tool && let Some(body) = self.bodies.iter_mut().find(|b| b.id == tool) {
            body.consumed = true;
        }

        Ok(self.history.push(entry))
    }

    fn create_offset(
        &mut self,
        faces: &[FaceId],
        signed_distance: f64,
    ) -> CadResult<FeatureRecord> {
        if faces.is_empty() {
            return Err(CadError::InvalidInput("Offset requires at least one face".into()));
        }
        if !signed_distance.is_finite() {
            return Err(CadError::InvalidInput("Offset distance must be finite".into()));
        }

        let mut dependencies = Vec::new();
        for face in faces {
            let data = self.face(*face)?;
            self.active_body(data.owner)?;
            dependencies.extend(data.produced_by);
        }

        let entry = HistoryEntry::new(
            self.next_name(FeatureKind::Offset),
            FeatureOp::Offset {
                faces: faces.to_vec(),
                distance: signed_distance,
            },
        )
        .with_dependencies(dependencies);

        Ok(self.history.push(entry))
    }

    fn position_of(&self, feature: FeatureId) -> CadResult<usize> {
        self.history
            .position_of(feature)
            .ok_or(CadError::History(crate::history::HistoryError::FeatureNotFound(feature)))
    }

    fn move_to_position(&mut self, feature: FeatureId, position: usize) -> CadResult<()> {
        self.history.move_to_position(feature, position)?;
        Ok(())
    }
}
