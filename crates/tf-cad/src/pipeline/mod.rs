//! Fit Pipeline
//!
//! Drives the whole bolt/lid workflow as a state machine:
//!
//! ```text
//! SelectBolt -> SelectLid -> SelectFace -> Validate -> DetectEdge
//!   -> ResolveThread -> ChooseDesignation -> CreateThread -> CreateChamfer
//!   -> Reorder -> BooleanCut -> SelectTargetFace -> ChooseClearance
//!   -> ApplyOffset -> Done
//! ```
//!
//! Interactive stages suspend with a [`Request`] until the caller supplies an
//! [`Answer`]. A cancelled answer moves the pipeline to `Aborted`; features
//! already committed to the document stay there.

mod prompt;

use std::fmt;

pub use prompt::{
    Answer, Cancelled, EntityFilter, EntityRef, Prompter, Request, ScriptedPrompter,
};

use crate::config::FitConfig;
use crate::error::{FitError, FitResult, FitWarning, ValidationError};
use crate::feature::FeatureRecord;
use crate::kernel::{BodyId, CadDocument, Cylinder, EdgeId, FaceId, LengthUnit};
use crate::lead_in::select_lead_in_edge;
use crate::sequencer::{
    ChamferedThread, FeatureSequencer, ReorderOutcome, SequencedFeatures, ThreadedFace,
};
use crate::thread::{ThreadCatalog, ThreadResolution, ThreadResolver};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SelectBolt,
    SelectLid,
    SelectFace,
    Validate,
    DetectEdge,
    ResolveThread,
    ChooseDesignation,
    CreateThread,
    CreateChamfer,
    Reorder,
    BooleanCut,
    SelectTargetFace,
    ChooseClearance,
    ApplyOffset,
    Done,
    Aborted,
}

impl Stage {
    /// Whether the stage waits for user input
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            Stage::SelectBolt
                | Stage::SelectLid
                | Stage::SelectFace
                | Stage::ChooseDesignation
                | Stage::SelectTargetFace
                | Stage::ChooseClearance
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Aborted)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of one [`FitPipeline::step`]
#[derive(Debug, Clone)]
pub enum Step {
    /// Moved on to the given stage
    Advanced(Stage),
    /// Waiting for [`FitPipeline::answer`]
    NeedsInput(Request),
    /// Workflow finished
    Finished(Box<FitReport>),
    /// User cancelled at the given stage
    Aborted(Stage),
}

/// Everything the workflow produced
#[derive(Debug, Clone)]
pub struct FitReport {
    pub bolt: BodyId,
    pub lid: BodyId,
    /// Threaded face on the bolt
    pub face: FaceId,
    /// Chamfered lead-in edge
    pub lead_in: EdgeId,
    /// Measured diameter
    pub diameter_mm: f64,
    pub family: String,
    pub size: String,
    pub designation: String,
    pub thread: FeatureRecord,
    pub chamfer: FeatureRecord,
    pub reorder: ReorderOutcome,
    pub cut: FeatureRecord,
    /// Lid face that received the clearance offset
    pub target_face: FaceId,
    pub clearance_mm: f64,
    /// Offset actually applied, in document units
    pub offset_distance: f64,
    pub offset: FeatureRecord,
    pub warnings: Vec<FitWarning>,
}

/// How a complete run ended
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Completed(Box<FitReport>),
    /// Cancelled by the user; earlier features remain in the document
    Aborted { stage: Stage },
}

/// Values gathered as the pipeline advances
#[derive(Debug, Default)]
struct Context {
    bolt: Option<BodyId>,
    lid: Option<BodyId>,
    face: Option<FaceId>,
    cylinder: Option<Cylinder>,
    lead_in: Option<EdgeId>,
    resolution: Option<ThreadResolution>,
    designation: Option<String>,
    threaded: Option<ThreadedFace>,
    chamfered: Option<ChamferedThread>,
    sequenced: Option<SequencedFeatures>,
    cut: Option<FeatureRecord>,
    target_face: Option<FaceId>,
    clearance_mm: Option<f64>,
}

fn require<T>(value: Option<T>, what: &str) -> FitResult<T> {
    value.ok_or_else(|| FitError::Protocol(format!("{} not available", what)))
}

fn expect_body(answer: Answer) -> FitResult<BodyId> {
    match answer {
        Answer::Entity(EntityRef::Body(id)) => Ok(id),
        other => Err(FitError::InvalidSelection(format!(
            "Expected a body, got {:?}",
            other
        ))),
    }
}

fn expect_face(answer: Answer) -> FitResult<FaceId> {
    match answer {
        Answer::Entity(EntityRef::Face(id)) => Ok(id),
        other => Err(FitError::InvalidSelection(format!(
            "Expected a face, got {:?}",
            other
        ))),
    }
}

fn expect_text(answer: Answer) -> FitResult<String> {
    match answer {
        Answer::Text(text) => Ok(text),
        other => Err(FitError::InvalidSelection(format!(
            "Expected a text answer, got {:?}",
            other
        ))),
    }
}

/// Parse a clearance answer in millimeters
pub fn parse_clearance(text: &str) -> FitResult<f64> {
    let value: f64 = text.trim().parse().map_err(|_| {
        FitError::InvalidSelection(format!("'{}' is not a clearance value", text.trim()))
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(FitError::InvalidSelection(format!(
            "Clearance must be a positive number of millimeters, got {}",
            value
        )));
    }
    Ok(value)
}

/// The bolt/lid thread fit workflow
#[derive(Debug)]
pub struct FitPipeline {
    config: FitConfig,
    resolver: ThreadResolver,
    stage: Stage,
    /// Stage that was active when the run stopped early
    stopped_at: Option<Stage>,
    pending: Option<Request>,
    answer: Option<Answer>,
    notices: Vec<String>,
    warnings: Vec<FitWarning>,
    ctx: Context,
}

impl Default for FitPipeline {
    fn default() -> Self {
        Self::new(FitConfig::default())
    }
}

impl FitPipeline {
    pub fn new(config: FitConfig) -> Self {
        let resolver = ThreadResolver::new(&config.thread_family, &config.tolerance_class);
        Self {
            config,
            resolver,
            stage: Stage::SelectBolt,
            stopped_at: None,
            pending: None,
            answer: None,
            notices: vec![
                "Select Parent (Bolt), then Mating Part (Lid), then the Face to Thread.".into(),
            ],
            warnings: Vec::new(),
            ctx: Context::default(),
        }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stage at which a cancelled or failed run stopped
    pub fn stopped_at(&self) -> Option<Stage> {
        self.stopped_at
    }

    /// Request waiting for an answer, if any
    pub fn pending_request(&self) -> Option<&Request> {
        self.pending.as_ref()
    }

    /// Thread resolution, once the ResolveThread stage has run
    pub fn resolution(&self) -> Option<&ThreadResolution> {
        self.ctx.resolution.as_ref()
    }

    /// Messages for the user produced since the last drain
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Supply the answer for the pending request
    pub fn answer(&mut self, answer: Answer) -> FitResult<()> {
        if self.pending.take().is_none() {
            return Err(FitError::Protocol(format!(
                "No input requested at stage {}",
                self.stage
            )));
        }
        self.answer = Some(answer);
        Ok(())
    }

    /// Advance by one stage
    ///
    /// A fatal error moves the pipeline to `Aborted` and is returned as-is.
    pub fn step<D, C>(&mut self, doc: &mut D, catalog: &C) -> FitResult<Step>
    where
        D: CadDocument + ?Sized,
        C: ThreadCatalog + ?Sized,
    {
        if self.stage.is_terminal() {
            return Err(FitError::Protocol(format!(
                "Pipeline already finished ({})",
                self.stage
            )));
        }
        if let Some(request) = &self.pending {
            return Ok(Step::NeedsInput(request.clone()));
        }

        let stage = self.stage;
        match self.advance(doc, catalog) {
            Ok(Step::Aborted(at)) => {
                tracing::info!("Fit workflow cancelled at {}", at);
                self.stop(at);
                Ok(Step::Aborted(at))
            }
            Ok(step) => {
                if let Step::Advanced(next) = &step {
                    tracing::debug!("{} -> {}", stage, next);
                }
                Ok(step)
            }
            Err(e) => {
                tracing::error!("Fit workflow failed at {}: {}", stage, e);
                self.stop(stage);
                Err(e)
            }
        }
    }

    /// Run to completion, answering requests with `prompter`
    pub fn run<D, C, P>(
        mut self,
        doc: &mut D,
        catalog: &C,
        prompter: &mut P,
    ) -> FitResult<PipelineOutcome>
    where
        D: CadDocument + ?Sized,
        C: ThreadCatalog + ?Sized,
        P: Prompter + ?Sized,
    {
        loop {
            let step = self.step(doc, catalog);
            for notice in self.drain_notices() {
                prompter.notify(&notice);
            }

            match step {
                Ok(Step::Advanced(_)) => {}
                Ok(Step::NeedsInput(request)) => {
                    let answer = prompter.ask(&request);
                    self.answer(answer)?;
                }
                Ok(Step::Finished(report)) => return Ok(PipelineOutcome::Completed(report)),
                Ok(Step::Aborted(stage)) => return Ok(PipelineOutcome::Aborted { stage }),
                Err(e) => {
                    prompter.notify(&e.user_message());
                    return Err(e);
                }
            }
        }
    }

    fn stop(&mut self, at: Stage) {
        self.stopped_at = Some(at);
        self.stage = Stage::Aborted;
        self.pending = None;
        self.answer = None;
    }

    fn goto(&mut self, next: Stage) -> FitResult<Step> {
        self.stage = next;
        Ok(Step::Advanced(next))
    }

    /// Take the answer for this stage, or suspend with `request`
    fn input(&mut self, request: Request) -> Result<Answer, Step> {
        match self.answer.take() {
            Some(Answer::Cancelled) => Err(Step::Aborted(self.stage)),
            Some(answer) => Ok(answer),
            None => {
                self.pending = Some(request.clone());
                Err(Step::NeedsInput(request))
            }
        }
    }

    fn mm_to_doc<D: CadDocument + ?Sized>(doc: &D, value: f64) -> f64 {
        doc.convert(value, LengthUnit::Millimeters, doc.internal_units())
    }

    fn advance<D, C>(&mut self, doc: &mut D, catalog: &C) -> FitResult<Step>
    where
        D: CadDocument + ?Sized,
        C: ThreadCatalog + ?Sized,
    {
        let stage = self.stage;
        match stage {
            Stage::SelectBolt => {
                let answer = match self.input(Request::select(
                    "Select Parent Body (Bolt)",
                    EntityFilter::Bodies,
                )) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                self.ctx.bolt = Some(expect_body(answer)?);
                self.goto(Stage::SelectLid)
            }

            Stage::SelectLid => {
                let answer = match self.input(Request::select(
                    "Select Mating Body (Lid)",
                    EntityFilter::Bodies,
                )) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                let lid = expect_body(answer)?;
                if Some(lid) == self.ctx.bolt {
                    return Err(ValidationError::SameBody.into());
                }
                self.ctx.lid = Some(lid);
                self.goto(Stage::SelectFace)
            }

            Stage::SelectFace => {
                let answer = match self.input(Request::select(
                    "Select Cylindrical Face on Parent",
                    EntityFilter::Faces,
                )) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                self.ctx.face = Some(expect_face(answer)?);
                self.goto(Stage::Validate)
            }

            Stage::Validate => {
                let bolt = require(self.ctx.bolt, "bolt body")?;
                let face = require(self.ctx.face, "thread face")?;

                let owner = doc.owner_of(face).map_err(FitError::document(stage))?;
                if owner != bolt {
                    let expected = doc.body_name(bolt).map_err(FitError::document(stage))?;
                    return Err(ValidationError::FaceNotOnBody {
                        face,
                        expected,
                        actual: owner,
                    }
                    .into());
                }

                let surface = doc.surface_of(face).map_err(FitError::document(stage))?;
                let cylinder =
                    surface
                        .as_cylinder()
                        .copied()
                        .ok_or(ValidationError::NotCylindrical {
                            face,
                            surface: surface.type_name(),
                        })?;
                self.ctx.cylinder = Some(cylinder);
                self.goto(Stage::DetectEdge)
            }

            Stage::DetectEdge => {
                let face = require(self.ctx.face, "thread face")?;
                let cylinder = require(self.ctx.cylinder, "cylinder")?;

                let edges = doc.edges_of(face).map_err(FitError::document(stage))?;
                let edge = select_lead_in_edge(face, &cylinder, &edges)?;
                self.ctx.lead_in = Some(edge.id);
                self.goto(Stage::ResolveThread)
            }

            Stage::ResolveThread => {
                let cylinder = require(self.ctx.cylinder, "cylinder")?;
                let diameter_mm = doc.convert(
                    cylinder.diameter(),
                    doc.internal_units(),
                    LengthUnit::Millimeters,
                );
                let resolution = self.resolver.resolve(catalog, diameter_mm)?;
                self.ctx.resolution = Some(resolution);
                self.goto(Stage::ChooseDesignation)
            }

            Stage::ChooseDesignation => {
                let resolution = require(self.ctx.resolution.as_ref(), "thread resolution")?;
                let request = Request::choice("Thread Selection", resolution.prompt(), "0");
                let answer = match self.input(request) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                let text = expect_text(answer)?;
                let resolution = require(self.ctx.resolution.as_ref(), "thread resolution")?;
                let designation = resolution.choose(&text)?.to_string();
                self.ctx.designation = Some(designation);
                self.goto(Stage::CreateThread)
            }

            Stage::CreateThread => {
                let face = require(self.ctx.face, "thread face")?;
                let lead_in = require(self.ctx.lead_in, "lead-in edge")?;
                let resolution = require(self.ctx.resolution.as_ref(), "thread resolution")?;
                let designation = require(self.ctx.designation.as_deref(), "designation")?;

                let mut spec = resolution.thread_spec(designation);
                spec.modeled = self.config.modeled_thread;
                spec.full_length = self.config.full_length;

                let sequencer =
                    FeatureSequencer::new(Self::mm_to_doc(&*doc, self.config.chamfer_distance_mm));
                let threaded = sequencer.create_thread(doc, face, lead_in, &spec)?;
                self.ctx.threaded = Some(threaded);
                self.goto(Stage::CreateChamfer)
            }

            Stage::CreateChamfer => {
                let threaded = require(self.ctx.threaded.take(), "threaded face")?;
                self.ctx.chamfered = Some(threaded.create_chamfer(doc)?);
                self.goto(Stage::Reorder)
            }

            Stage::Reorder => {
                let chamfered = require(self.ctx.chamfered.take(), "chamfered thread")?;
                let sequenced = chamfered.reorder(doc);
                if let Some(warning) = sequenced.warning() {
                    self.notices.push(format!("Warning: {}", warning));
                    self.warnings.push(warning.clone());
                }
                self.ctx.sequenced = Some(sequenced);
                self.goto(Stage::BooleanCut)
            }

            Stage::BooleanCut => {
                let bolt = require(self.ctx.bolt, "bolt body")?;
                let lid = require(self.ctx.lid, "lid body")?;

                let cut = doc
                    .cut_boolean(lid, bolt, true)
                    .map_err(FitError::document(stage))?;
                tracing::info!("Created {} at position {}", cut.name, cut.position);
                self.ctx.cut = Some(cut);
                self.notices
                    .push("Select the resulting internal thread face on the Mating Body.".into());
                self.goto(Stage::SelectTargetFace)
            }

            Stage::SelectTargetFace => {
                let answer = match self.input(Request::select(
                    "Select internal thread face",
                    EntityFilter::Faces,
                )) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                let face = expect_face(answer)?;
                let lid = require(self.ctx.lid, "lid body")?;

                let owner = doc.owner_of(face).map_err(FitError::document(stage))?;
                if owner != lid {
                    let expected = doc.body_name(lid).map_err(FitError::document(stage))?;
                    return Err(ValidationError::FaceNotOnBody {
                        face,
                        expected,
                        actual: owner,
                    }
                    .into());
                }
                self.ctx.target_face = Some(face);
                self.goto(Stage::ChooseClearance)
            }

            Stage::ChooseClearance => {
                let request = Request::choice(
                    "Clearance",
                    self.config.clearance_prompt(),
                    self.config.default_clearance_mm.to_string(),
                );
                let answer = match self.input(request) {
                    Ok(a) => a,
                    Err(step) => return Ok(step),
                };
                self.ctx.clearance_mm = Some(parse_clearance(&expect_text(answer)?)?);
                self.goto(Stage::ApplyOffset)
            }

            Stage::ApplyOffset => {
                let target = require(self.ctx.target_face, "target face")?;
                let clearance_mm = require(self.ctx.clearance_mm, "clearance")?;

                let signed_mm = self.config.clearance_direction.signed(clearance_mm);
                let offset_distance = Self::mm_to_doc(&*doc, signed_mm);
                let offset = doc
                    .create_offset(&[target], offset_distance)
                    .map_err(FitError::document(stage))?;
                tracing::info!(
                    "Created {} ({} {}) at position {}",
                    offset.name,
                    offset_distance,
                    doc.internal_units(),
                    offset.position
                );

                self.stage = Stage::Done;
                self.notices
                    .push("Workflow complete. Inspect the lead-in and test the fit.".into());
                Ok(Step::Finished(Box::new(
                    self.report(clearance_mm, offset_distance, offset)?,
                )))
            }

            Stage::Done | Stage::Aborted => Err(FitError::Protocol(format!(
                "Pipeline already finished ({})",
                stage
            ))),
        }
    }

    fn report(
        &mut self,
        clearance_mm: f64,
        offset_distance: f64,
        offset: FeatureRecord,
    ) -> FitResult<FitReport> {
        let resolution = require(self.ctx.resolution.take(), "thread resolution")?;
        let sequenced = require(self.ctx.sequenced.take(), "thread and chamfer")?;

        Ok(FitReport {
            bolt: require(self.ctx.bolt, "bolt body")?,
            lid: require(self.ctx.lid, "lid body")?,
            face: require(self.ctx.face, "thread face")?,
            lead_in: require(self.ctx.lead_in, "lead-in edge")?,
            diameter_mm: resolution.diameter_mm,
            family: resolution.family,
            size: resolution.size.label,
            designation: require(self.ctx.designation.take(), "designation")?,
            thread: sequenced.thread,
            chamfer: sequenced.chamfer,
            reorder: sequenced.outcome,
            cut: require(self.ctx.cut.take(), "cut")?,
            target_face: require(self.ctx.target_face, "target face")?,
            clearance_mm,
            offset_distance,
            offset,
            warnings: std::mem::take(&mut self.warnings),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKind;
    use crate::kernel::{FaceSide, MemoryDocument, Surface};
    use crate::thread::StaticCatalog;
    use glam::DVec3;

    struct Fixture {
        doc: MemoryDocument,
        bolt: BodyId,
        lid: BodyId,
        face: FaceId,
    }

    fn fixture() -> Fixture {
        let mut doc = MemoryDocument::new(LengthUnit::Millimeters);
        let bolt = doc.add_body("Bolt");
        let lid = doc.add_body("Lid");
        let cyl = doc
            .add_cylinder(bolt, DVec3::Z, DVec3::ZERO, 10.0, 20.0)
            .unwrap();
        Fixture {
            doc,
            bolt,
            lid,
            face: cyl.face,
        }
    }

    /// Step until input is needed, returning the request
    fn step_to_input(
        pipeline: &mut FitPipeline,
        doc: &mut MemoryDocument,
        catalog: &StaticCatalog,
    ) -> Request {
        loop {
            match pipeline.step(doc, catalog).unwrap() {
                Step::Advanced(_) => {}
                Step::NeedsInput(request) => return request,
                other => panic!("unexpected step {:?}", other),
            }
        }
    }

    #[test]
    fn test_first_step_requests_bolt() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut pipeline = FitPipeline::default();

        let request = step_to_input(&mut pipeline, &mut f.doc, &catalog);
        assert_eq!(
            request,
            Request::select("Select Parent Body (Bolt)", EntityFilter::Bodies)
        );
        assert_eq!(pipeline.pending_request(), Some(&request));
        assert_eq!(pipeline.drain_notices().len(), 1);

        // Stepping again without answering repeats the request
        assert!(matches!(
            pipeline.step(&mut f.doc, &catalog).unwrap(),
            Step::NeedsInput(_)
        ));
    }

    #[test]
    fn test_answer_without_request() {
        let mut pipeline = FitPipeline::default();
        assert!(matches!(
            pipeline.answer(Answer::Text("0".into())),
            Err(FitError::Protocol(_))
        ));
    }

    #[test]
    fn test_manual_stepping_to_designation() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut pipeline = FitPipeline::default();

        step_to_input(&mut pipeline, &mut f.doc, &catalog);
        pipeline.answer(Answer::Entity(EntityRef::Body(f.bolt))).unwrap();
        step_to_input(&mut pipeline, &mut f.doc, &catalog);
        pipeline.answer(Answer::Entity(EntityRef::Body(f.lid))).unwrap();
        step_to_input(&mut pipeline, &mut f.doc, &catalog);
        pipeline.answer(Answer::Entity(EntityRef::Face(f.face))).unwrap();

        let request = step_to_input(&mut pipeline, &mut f.doc, &catalog);
        assert_eq!(pipeline.stage(), Stage::ChooseDesignation);
        match request {
            Request::Choice {
                message, default, ..
            } => {
                assert!(message.starts_with("Detected ~20mm diameter."));
                assert_eq!(default, "0");
            }
            other => panic!("unexpected request {:?}", other),
        }
        assert_eq!(pipeline.resolution().unwrap().size.label, "M20");
        assert!(f.doc.history().is_empty());
    }

    #[test]
    fn test_face_on_wrong_body_rejected() {
        let mut f = fixture();
        let lid_face = f
            .doc
            .add_cylinder(f.lid, DVec3::Z, DVec3::ZERO, 10.0, 5.0)
            .unwrap()
            .face;
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default()
            .body(f.bolt)
            .body(f.lid)
            .face(lid_face);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert!(matches!(
            err,
            FitError::Validation(ValidationError::FaceNotOnBody { .. })
        ));
        assert!(f.doc.history().is_empty());
        assert!(prompter.notices.last().unwrap().contains("must belong to body 'Bolt'"));
    }

    #[test]
    fn test_non_cylindrical_face_rejected() {
        let mut f = fixture();
        let flat = f
            .doc
            .add_face(f.bolt, Surface::Other, FaceSide::External)
            .unwrap();
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default()
            .body(f.bolt)
            .body(f.lid)
            .face(flat);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert!(matches!(
            err,
            FitError::Validation(ValidationError::NotCylindrical { .. })
        ));
        assert!(f.doc.history().is_empty());
    }

    #[test]
    fn test_cylinder_without_circular_edges() {
        let mut f = fixture();
        let bare = f
            .doc
            .add_face(
                f.bolt,
                Surface::cylinder(DVec3::Z, DVec3::ZERO, 3.0),
                FaceSide::External,
            )
            .unwrap();
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default()
            .body(f.bolt)
            .body(f.lid)
            .face(bare);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert_eq!(
            err,
            FitError::Validation(ValidationError::NoLeadInEdge(bare))
        );
    }

    #[test]
    fn test_same_body_rejected() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default().body(f.bolt).body(f.bolt);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert_eq!(err, FitError::Validation(ValidationError::SameBody));
    }

    #[test]
    fn test_wrong_entity_kind_is_invalid_selection() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default().face(f.face);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidSelection(_)));
    }

    #[test]
    fn test_missing_standard() {
        let mut f = fixture();
        let catalog = StaticCatalog::default();
        let mut prompter = ScriptedPrompter::default()
            .body(f.bolt)
            .body(f.lid)
            .face(f.face);

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert_eq!(
            err,
            FitError::Validation(ValidationError::StandardNotFound("ISO Metric".into()))
        );
    }

    #[test]
    fn test_bad_designation_index_aborts_before_features() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut prompter = ScriptedPrompter::default()
            .body(f.bolt)
            .body(f.lid)
            .face(f.face)
            .text("42");

        let err = FitPipeline::default()
            .run(&mut f.doc, &catalog, &mut prompter)
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidSelection(_)));
        assert!(f.doc.history().is_empty());
    }

    #[test]
    fn test_cancel_at_clearance_keeps_committed_features() {
        let mut f = fixture();
        let catalog = StaticCatalog::iso_metric();
        let mut pipeline = FitPipeline::default();

        let mut answers = vec![
            Answer::Entity(EntityRef::Body(f.bolt)),
            Answer::Entity(EntityRef::Body(f.lid)),
            Answer::Entity(EntityRef::Face(f.face)),
            Answer::Text("0".into()),
        ]
        .into_iter();

        let stopped = loop {
            match pipeline.step(&mut f.doc, &catalog).unwrap() {
                Step::Advanced(_) => {}
                Step::NeedsInput(Request::SelectEntity { prompt, .. })
                    if prompt == "Select internal thread face" =>
                {
                    let cavity = f
                        .doc
                        .faces_of(f.lid)
                        .into_iter()
                        .find(|face| face.side == FaceSide::Internal)
                        .unwrap();
                    pipeline
                        .answer(Answer::Entity(EntityRef::Face(cavity.id)))
                        .unwrap();
                }
                Step::NeedsInput(_) => match answers.next() {
                    Some(answer) => pipeline.answer(answer).unwrap(),
                    None => pipeline.answer(Answer::Cancelled).unwrap(),
                },
                Step::Aborted(stage) => break stage,
                Step::Finished(_) => panic!("should have been cancelled"),
            }
        };

        assert_eq!(stopped, Stage::ChooseClearance);
        assert_eq!(pipeline.stage(), Stage::Aborted);
        assert_eq!(pipeline.stopped_at(), Some(Stage::ChooseClearance));
        assert_eq!(
            f.doc.history().kinds(),
            vec![FeatureKind::Chamfer, FeatureKind::Thread, FeatureKind::Cut]
        );
        assert!(matches!(
            pipeline.step(&mut f.doc, &catalog),
            Err(FitError::Protocol(_))
        ));
    }

    #[test]
    fn test_parse_clearance() {
        assert_eq!(parse_clearance(" 0.2 ").unwrap(), 0.2);
        assert!(parse_clearance("abc").is_err());
        assert!(parse_clearance("-0.1").is_err());
        assert!(parse_clearance("0").is_err());
        assert!(parse_clearance("inf").is_err());
    }

    #[test]
    fn test_stage_interactivity() {
        assert!(Stage::ChooseDesignation.is_interactive());
        assert!(!Stage::Reorder.is_interactive());
        assert!(Stage::Done.is_terminal());
        assert_eq!(Stage::BooleanCut.to_string(), "BooleanCut");
    }
}
