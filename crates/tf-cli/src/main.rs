//! ThreadFit CLI
//!
//! Loads a scene into an in-memory document and runs the bolt/lid thread
//! fit workflow against it, answering prompts on the terminal.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tf_cad::{
    CadDocument, FitConfig, FitPipeline, FitReport, MemoryDocument, Request, Scene,
    StaticCatalog, Step,
};

mod terminal;

use terminal::Terminal;

#[derive(Parser, Debug)]
#[command(name = "threadfit")]
#[command(about = "Thread a bolt, cut its lid and apply a print clearance", long_about = None)]
struct Cli {
    /// Scene file (.ron) describing the bodies
    scene: PathBuf,

    /// Workflow config file (.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Thread catalog file (.ron); defaults to built-in ISO metric sizes
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tf_cli=info,tf_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FitConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => FitConfig::default(),
    };

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("Failed to write config {:?}", path))?;
        println!("Wrote config to {:?}", path);
        return Ok(());
    }

    let catalog = match &cli.catalog {
        Some(path) => StaticCatalog::load(path)
            .with_context(|| format!("Failed to load thread catalog {:?}", path))?,
        None => StaticCatalog::iso_metric(),
    };

    let scene =
        Scene::load(&cli.scene).with_context(|| format!("Failed to load scene {:?}", cli.scene))?;
    let mut doc = MemoryDocument::from_scene(&scene).context("Invalid scene")?;
    tracing::info!(
        "Loaded {:?}: {} bodies, {} faces ({})",
        cli.scene,
        doc.bodies().count(),
        doc.faces().count(),
        doc.internal_units()
    );

    let stdin = io::stdin();
    let mut term = Terminal::new(stdin.lock(), io::stdout());
    let mut pipeline = FitPipeline::new(config);

    loop {
        let step = pipeline.step(&mut doc, &catalog);
        for notice in pipeline.drain_notices() {
            term.notify(&notice)?;
        }

        match step {
            Ok(Step::Advanced(_)) => {}
            Ok(Step::NeedsInput(request)) => {
                let answer = match &request {
                    Request::SelectEntity { prompt, filter } => {
                        term.select_entity(&doc, prompt, *filter)?
                    }
                    Request::Choice {
                        title,
                        message,
                        default,
                    } => term.prompt_choice(title, message, default)?,
                };
                pipeline.answer(answer)?;
            }
            Ok(Step::Finished(report)) => {
                print_report(&report);
                break;
            }
            Ok(Step::Aborted(stage)) => {
                println!("Cancelled at {}; features created so far were kept.", stage);
                break;
            }
            Err(e) => {
                term.notify(&e.user_message())?;
                print_history(&doc);
                return Err(e.into());
            }
        }
    }

    print_history(&doc);
    Ok(())
}

fn print_report(report: &FitReport) {
    println!();
    println!("=== Fit Summary ===");
    println!(
        "Thread:    {} {} ({:.2}mm measured)",
        report.family, report.designation, report.diameter_mm
    );
    println!("Reorder:   {:?}", report.reorder);
    println!("Clearance: {}mm", report.clearance_mm);
    for warning in &report.warnings {
        println!("Warning:   {}", warning);
    }
}

fn print_history(doc: &MemoryDocument) {
    println!();
    println!("=== Operation History ===");
    for record in doc.history().records() {
        println!("  {:>2}. {} ({})", record.position, record.name, record.kind);
    }
    for state in doc.evaluate() {
        println!(
            "  {}: lead-in {:?}, {} threaded face(s), cavities {:?}",
            state.name,
            state.lead_in,
            state.threaded_faces.len(),
            state.cavity_radii.iter().map(|(_, r)| *r).collect::<Vec<_>>()
        );
    }
}
