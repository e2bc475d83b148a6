//! Thread and chamfer sequencing
//!
//! The chamfer has to reference the lead-in edge of the face, so it is
//! created after the thread. It must also be evaluated on the un-threaded
//! cylinder, so once both exist the chamfer is moved into the thread's
//! slot in the operation history. Each step consumes the previous one,
//! which keeps the order fixed and allows only one reorder attempt.

use crate::error::{FitError, FitResult, FitWarning};
use crate::feature::{FeatureRecord, ThreadSpec};
use crate::kernel::{CadDocument, CadError, EdgeId, FaceId};
use crate::pipeline::Stage;

/// Creates and orders the thread and lead-in chamfer
#[derive(Debug, Clone, Copy)]
pub struct FeatureSequencer {
    /// Chamfer distance in document units
    chamfer_distance: f64,
}

impl FeatureSequencer {
    pub fn new(chamfer_distance: f64) -> Self {
        Self { chamfer_distance }
    }

    /// Create the thread on `face`, remembering the lead-in edge for the chamfer
    pub fn create_thread<D: CadDocument + ?Sized>(
        &self,
        doc: &mut D,
        face: FaceId,
        lead_in: EdgeId,
        spec: &ThreadSpec,
    ) -> FitResult<ThreadedFace> {
        let thread = doc
            .create_thread(face, spec)
            .map_err(FitError::document(Stage::CreateThread))?;

        let thread_edges: Vec<EdgeId> = doc
            .edges_of(face)
            .map_err(FitError::document(Stage::CreateThread))?
            .into_iter()
            .map(|e| e.id)
            .collect();

        tracing::info!(
            "Created {} ({}) at position {}",
            thread.name,
            spec.designation,
            thread.position
        );

        Ok(ThreadedFace {
            chamfer_distance: self.chamfer_distance,
            face,
            lead_in,
            thread,
            thread_edges,
        })
    }

    /// Run all three steps
    pub fn sequence<D: CadDocument + ?Sized>(
        &self,
        doc: &mut D,
        face: FaceId,
        lead_in: EdgeId,
        spec: &ThreadSpec,
    ) -> FitResult<SequencedFeatures> {
        Ok(self
            .create_thread(doc, face, lead_in, spec)?
            .create_chamfer(doc)?
            .reorder(doc))
    }
}

/// A threaded face awaiting its lead-in chamfer
#[derive(Debug, Clone)]
pub struct ThreadedFace {
    chamfer_distance: f64,
    face: FaceId,
    lead_in: EdgeId,
    thread: FeatureRecord,
    thread_edges: Vec<EdgeId>,
}

impl ThreadedFace {
    pub fn thread(&self) -> &FeatureRecord {
        &self.thread
    }

    /// Edges bounding the face after threading
    pub fn thread_edges(&self) -> &[EdgeId] {
        &self.thread_edges
    }

    /// Chamfer the original lead-in edge
    pub fn create_chamfer<D: CadDocument + ?Sized>(self, doc: &mut D) -> FitResult<ChamferedThread> {
        if !self.thread_edges.contains(&self.lead_in) {
            return Err(FitError::Document {
                stage: Stage::CreateChamfer,
                source: CadError::InvalidInput(format!(
                    "Lead-in edge {} no longer bounds face {} after threading",
                    self.lead_in, self.face
                )),
            });
        }

        let chamfer = doc
            .create_chamfer(&[self.lead_in], self.chamfer_distance)
            .map_err(FitError::document(Stage::CreateChamfer))?;

        tracing::info!("Created {} at position {}", chamfer.name, chamfer.position);

        Ok(ChamferedThread {
            thread: self.thread,
            chamfer,
        })
    }
}

/// Thread and chamfer in creation order
#[derive(Debug, Clone)]
pub struct ChamferedThread {
    thread: FeatureRecord,
    chamfer: FeatureRecord,
}

/// Result of moving the chamfer ahead of the thread
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderOutcome {
    /// Chamfer now sits before the thread
    Moved {
        chamfer_position: usize,
        thread_position: usize,
    },
    /// Chamfer was already before the thread
    AlreadyOrdered,
    /// History refused the move; both features stay in creation order
    Failed(FitWarning),
    /// History accepted the move but the chamfer still follows the thread
    ///
    /// The timeline may no longer be in creation order.
    Unconfirmed {
        chamfer_position: usize,
        thread_position: usize,
        warning: FitWarning,
    },
}

impl ChamferedThread {
    pub fn thread(&self) -> &FeatureRecord {
        &self.thread
    }

    pub fn chamfer(&self) -> &FeatureRecord {
        &self.chamfer
    }

    /// Move the chamfer into the thread's slot
    ///
    /// Failure here is recoverable: the outcome carries a warning instead of
    /// an error.
    pub fn reorder<D: CadDocument + ?Sized>(self, doc: &mut D) -> SequencedFeatures {
        let outcome = match self.try_reorder(doc) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Reorder of {} failed: {}", self.chamfer.name, e);
                ReorderOutcome::Failed(FitWarning::ReorderFailed {
                    reason: e.to_string(),
                })
            }
        };

        SequencedFeatures {
            thread: self.thread,
            chamfer: self.chamfer,
            outcome,
        }
    }

    fn try_reorder<D: CadDocument + ?Sized>(&self, doc: &mut D) -> Result<ReorderOutcome, CadError> {
        let chamfer_pos = doc.position_of(self.chamfer.id)?;
        let thread_pos = doc.position_of(self.thread.id)?;

        if chamfer_pos < thread_pos {
            return Ok(ReorderOutcome::AlreadyOrdered);
        }

        doc.move_to_position(self.chamfer.id, thread_pos)?;

        let chamfer_position = doc.position_of(self.chamfer.id)?;
        let thread_position = doc.position_of(self.thread.id)?;
        if chamfer_position >= thread_position {
            let reason = format!(
                "move was accepted but left {} at {} after {} at {}; the timeline may have changed",
                self.chamfer.name, chamfer_position, self.thread.name, thread_position
            );
            tracing::warn!("Reorder of {} unconfirmed: {}", self.chamfer.name, reason);
            return Ok(ReorderOutcome::Unconfirmed {
                chamfer_position,
                thread_position,
                warning: FitWarning::ReorderFailed { reason },
            });
        }

        tracing::debug!(
            "Moved {} to {} ahead of {} at {}",
            self.chamfer.name,
            chamfer_position,
            self.thread.name,
            thread_position
        );

        Ok(ReorderOutcome::Moved {
            chamfer_position,
            thread_position,
        })
    }
}

/// Thread and chamfer after the reorder attempt
#[derive(Debug, Clone)]
pub struct SequencedFeatures {
    pub thread: FeatureRecord,
    pub chamfer: FeatureRecord,
    pub outcome: ReorderOutcome,
}

impl SequencedFeatures {
    pub fn warning(&self) -> Option<&FitWarning> {
        match &self.outcome {
            ReorderOutcome::Failed(w) | ReorderOutcome::Unconfirmed { warning: w, .. } => Some(w),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureId, FeatureKind};
    use crate::kernel::{
        BodyId, CadResult, EdgeInfo, LeadIn, LengthUnit, MemoryDocument, Surface,
    };
    use glam::DVec3;

    /// Document whose history refuses every move, or accepts it and does nothing
    struct LockedHistory {
        doc: MemoryDocument,
        accept_moves: bool,
    }

    impl CadDocument for LockedHistory {
        fn internal_units(&self) -> LengthUnit {
            self.doc.internal_units()
        }
        fn owner_of(&self, face: FaceId) -> CadResult<BodyId> {
            self.doc.owner_of(face)
        }
        fn surface_of(&self, face: FaceId) -> CadResult<Surface> {
            self.doc.surface_of(face)
        }
        fn edges_of(&self, face: FaceId) -> CadResult<Vec<EdgeInfo>> {
            self.doc.edges_of(face)
        }
        fn body_name(&self, body: BodyId) -> CadResult<String> {
            self.doc.body_name(body)
        }
        fn create_thread(&mut self, face: FaceId, spec: &ThreadSpec) -> CadResult<FeatureRecord> {
            self.doc.create_thread(face, spec)
        }
        fn create_chamfer(&mut self, edges: &[EdgeId], distance: f64) -> CadResult<FeatureRecord> {
            self.doc.create_chamfer(edges, distance)
        }
        fn cut_boolean(
            &mut self,
            target: BodyId,
            tool: BodyId,
            keep_tool: bool,
        ) -> CadResult<FeatureRecord> {
            self.doc.cut_boolean(target, tool, keep_tool)
        }
        fn create_offset(&mut self, faces: &[FaceId], distance: f64) -> CadResult<FeatureRecord> {
            self.doc.create_offset(faces, distance)
        }
        fn position_of(&self, feature: FeatureId) -> CadResult<usize> {
            self.doc.position_of(feature)
        }
        fn move_to_position(&mut self, _feature: FeatureId, _position: usize) -> CadResult<()> {
            if self.accept_moves {
                return Ok(());
            }
            Err(CadError::OperationFailed("timeline is locked".into()))
        }
    }

    fn setup() -> (MemoryDocument, BodyId, FaceId, EdgeId) {
        let mut doc = MemoryDocument::new(LengthUnit::Millimeters);
        let bolt = doc.add_body("Bolt");
        let cyl = doc
            .add_cylinder(bolt, DVec3::Z, DVec3::ZERO, 10.0, 20.0)
            .unwrap();
        (doc, bolt, cyl.face, cyl.top)
    }

    fn spec() -> ThreadSpec {
        ThreadSpec::new("ISO Metric profile", "M20", "M20x2.5", "6g")
    }

    #[test]
    fn test_sequence_moves_chamfer_before_thread() {
        let (mut doc, bolt, face, top) = setup();
        let seq = FeatureSequencer::new(1.0)
            .sequence(&mut doc, face, top, &spec())
            .unwrap();

        assert_eq!(
            seq.outcome,
            ReorderOutcome::Moved {
                chamfer_position: 0,
                thread_position: 1
            }
        );
        assert!(seq.warning().is_none());
        assert_eq!(doc.history().kinds(), vec![FeatureKind::Chamfer, FeatureKind::Thread]);
        assert_eq!(doc.body_state(bolt).unwrap().lead_in, LeadIn::Clean);
    }

    #[test]
    fn test_reorder_keeps_positions_dense() {
        let (mut doc, _bolt, face, top) = setup();
        // Pre-existing feature ahead of the thread
        doc.create_offset(&[face], 0.0).unwrap();

        let seq = FeatureSequencer::new(1.0)
            .sequence(&mut doc, face, top, &spec())
            .unwrap();

        let chamfer = doc.position_of(seq.chamfer.id).unwrap();
        let thread = doc.position_of(seq.thread.id).unwrap();
        assert_eq!((chamfer, thread), (1, 2));

        let mut positions: Vec<usize> = doc.history().records().map(|r| r.position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_failure_is_warning() {
        let (doc, bolt, face, top) = setup();
        let mut doc = LockedHistory {
            doc,
            accept_moves: false,
        };

        let seq = FeatureSequencer::new(1.0)
            .sequence(&mut doc, face, top, &spec())
            .unwrap();

        assert!(matches!(seq.outcome, ReorderOutcome::Failed(_)));
        assert!(seq.warning().is_some());
        // Creation order preserved
        assert_eq!(doc.doc.history().kinds(), vec![FeatureKind::Thread, FeatureKind::Chamfer]);
        assert_eq!(doc.doc.body_state(bolt).unwrap().lead_in, LeadIn::OverThread);
    }

    #[test]
    fn test_silently_ignored_move_is_unconfirmed() {
        let (doc, _bolt, face, top) = setup();
        let mut doc = LockedHistory {
            doc,
            accept_moves: true,
        };

        let seq = FeatureSequencer::new(1.0)
            .sequence(&mut doc, face, top, &spec())
            .unwrap();

        match &seq.outcome {
            ReorderOutcome::Unconfirmed {
                chamfer_position,
                thread_position,
                warning: FitWarning::ReorderFailed { reason },
            } => {
                assert_eq!((*chamfer_position, *thread_position), (1, 0));
                assert!(reason.contains("move was accepted"));
                assert!(reason.contains("timeline may have changed"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(seq.warning().is_some_and(|w| w.to_string().contains("manually drag")));
        assert_eq!(doc.doc.history().kinds(), vec![FeatureKind::Thread, FeatureKind::Chamfer]);
    }

    #[test]
    fn test_invalid_thread_is_fatal() {
        let (mut doc, _bolt, face, top) = setup();
        let mut bad = spec();
        bad.designation.clear();

        let err = FeatureSequencer::new(1.0)
            .sequence(&mut doc, face, top, &bad)
            .unwrap_err();
        assert!(matches!(
            err,
            FitError::Document {
                stage: Stage::CreateThread,
                ..
            }
        ));
        assert!(doc.history().is_empty());
    }

    #[test]
    fn test_foreign_lead_in_edge_is_fatal() {
        let (mut doc, _bolt, face, _top) = setup();
        let stray = EdgeId::new();

        let threaded = FeatureSequencer::new(1.0)
            .create_thread(&mut doc, face, stray, &spec())
            .unwrap();
        assert_eq!(threaded.thread_edges().len(), 3);

        let err = threaded.create_chamfer(&mut doc).unwrap_err();
        assert!(matches!(
            err,
            FitError::Document {
                stage: Stage::CreateChamfer,
                ..
            }
        ));
        // Thread stays committed
        assert_eq!(doc.history().kinds(), vec![FeatureKind::Thread]);
    }
}
