//! Locframe: bilingual localization frames for design canvases.
//!
//! Locframe pairs images on a design canvas with the overlays that
//! annotate them (`BBox:` regions, `VI:`/`EN:` text), builds such
//! localization frames from tabular data, and exports one flattened image
//! per frame and language without leaving the document changed.
//!
//! # Modules
//!
//! - [`scene`]: the host document interface and an in-memory document
//! - [`matcher`]: pairing images with bounding boxes and text
//! - [`visibility`]: scoped visibility overrides with guaranteed restore
//! - [`bridge`]: single-slot async bridge to an image-processing context
//! - [`session`]: the scan → clean workflow
//! - [`import`] / [`export`]: the orchestrators
//! - [`protocol`] / [`controller`]: the message interface for a front end
//! - [`config`]: tunable settings
//! - [`error`]: error types

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod import;
pub mod matcher;
pub mod protocol;
pub mod scene;
pub mod session;
pub mod visibility;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use error::LocframeError;

use config::Settings;
use export::{ExportOptions, Resampling};
use import::ImportOptions;
use scene::io_json::{read_scene_json, write_scene_json};
use scene::{Document, Language, NodeId};
use session::Session;

/// The locframe CLI application.
#[derive(Parser)]
#[command(name = "locframe")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (YAML).
    #[arg(long, global = true, env = "LOCFRAME_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Match an image with its bounding boxes and text pairs.
    Scan(ScanArgs),
    /// List the localization frames on the current page.
    Frames(FramesArgs),
    /// Build localization frames from a CSV file.
    Import(ImportArgs),
    /// Export one image per image frame for a language.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Scene JSON file.
    scene: PathBuf,

    /// ID of the selected node (repeatable).
    #[arg(long = "select", required = true)]
    select: Vec<u64>,
}

#[derive(clap::Args)]
struct FramesArgs {
    /// Scene JSON file.
    scene: PathBuf,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Scene JSON file.
    scene: PathBuf,

    /// CSV file with one row per text region.
    #[arg(long)]
    csv: PathBuf,

    /// Language left visible after import ('vi' or 'en').
    #[arg(long, default_value = "vi", env = "LOCFRAME_LANGUAGE")]
    language: Language,

    /// Do not draw bounding boxes over text regions.
    #[arg(long)]
    no_bboxes: bool,

    /// Where to write the updated scene (defaults to overwriting the input).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Scene JSON file.
    scene: PathBuf,

    /// Output directory.
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Localization frame ID to export (repeatable; default: every frame on the current page).
    #[arg(long = "frame")]
    frames: Vec<u64>,

    /// Language to export ('vi' or 'en').
    #[arg(long, default_value = "en", env = "LOCFRAME_LANGUAGE")]
    language: Language,

    /// Keep bounding boxes visible.
    #[arg(long)]
    include_bbox: bool,

    /// Append '_<language>' to filenames.
    #[arg(long)]
    suffix: bool,

    /// Resampling filter ('nearest', 'bilinear' or 'bicubic').
    #[arg(long, default_value = "bilinear")]
    resampling: Resampling,
}

/// Name of the file describing an export, written next to the images.
pub const EXPORT_MANIFEST: &str = "manifest.json";

/// Run the locframe CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LocframeError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Scan(args)) => run_scan(args),
        Some(Commands::Frames(args)) => run_frames(args),
        Some(Commands::Import(args)) => run_import(args, &settings),
        Some(Commands::Export(args)) => run_export(args),
        None => {
            println!("locframe {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bilingual localization frames for design canvases.");
            println!();
            println!("Run 'locframe --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LocframeError> {
    let json = serde_json::to_string_pretty(value).map_err(LocframeError::OutputJson)?;
    println!("{}", json);
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<(), LocframeError> {
    let doc = read_scene_json(&args.scene)?;
    let selection: Vec<NodeId> = args.select.into_iter().map(NodeId::new).collect();
    let report = Session::new().scan(&doc, &selection)?;
    print_json(&report)
}

fn run_frames(args: FramesArgs) -> Result<(), LocframeError> {
    let doc = read_scene_json(&args.scene)?;
    let frames = matcher::find_localization_frames(&doc, doc.current_page())?;
    print_json(&frames)
}

fn run_import(args: ImportArgs, settings: &Settings) -> Result<(), LocframeError> {
    let mut doc = read_scene_json(&args.scene)?;
    let rows = import::read_import_csv(&args.csv)?;
    let options = ImportOptions {
        language: args.language,
        create_bounding_boxes: !args.no_bboxes,
    };

    let report = import::import_rows(&mut doc, &rows, &options, settings)?;

    let output = args.output.as_deref().unwrap_or(args.scene.as_path());
    write_scene_json(output, &doc)?;

    println!("{}", report.message());
    println!(
        "  text pairs: {}, bounding boxes: {}, placeholders: {}",
        report.text_pairs, report.bounding_boxes, report.placeholders
    );
    println!("  main frame: {}", report.main_frame);
    Ok(())
}

/// Manifest entry for one exported file; the bytes live in the file itself.
#[derive(Serialize)]
struct ManifestEntry<'a> {
    filename: &'a str,
    folder_path: &'a str,
    mime_type: &'a str,
    regions: &'a [matcher::CleaningArea],
}

fn run_export(args: ExportArgs) -> Result<(), LocframeError> {
    let mut doc = read_scene_json(&args.scene)?;

    let frames = if args.frames.is_empty() {
        matcher::find_localization_frames(&doc, doc.current_page())?
            .into_iter()
            .map(|f| f.node)
            .collect()
    } else {
        args.frames.into_iter().map(NodeId::new).collect()
    };
    let options = ExportOptions {
        frames,
        language: args.language,
        include_bbox: args.include_bbox,
        add_suffix: args.suffix,
        resampling: args.resampling,
    };

    let report = export::export_images(&mut doc, &options)?;

    fs::create_dir_all(&args.out_dir).map_err(LocframeError::Io)?;
    let mut manifest: Vec<ManifestEntry<'_>> = Vec::with_capacity(report.files.len());
    let mut write_failures = Vec::new();
    for file in &report.files {
        match write_exported(&args.out_dir, file) {
            Ok(()) => manifest.push(ManifestEntry {
                filename: &file.filename,
                folder_path: &file.folder_path,
                mime_type: &file.mime_type,
                regions: &file.regions,
            }),
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "could not write exported file");
                write_failures.push((file, e));
            }
        }
    }

    let json = serde_json::to_string_pretty(&manifest).map_err(LocframeError::OutputJson)?;
    fs::write(args.out_dir.join(EXPORT_MANIFEST), json).map_err(LocframeError::Io)?;

    println!(
        "Exported {} images to {}",
        manifest.len(),
        args.out_dir.display()
    );
    for failure in &report.failures {
        eprintln!("  failed: {} ({}): {}", failure.name, failure.node, failure.message);
    }
    for (file, e) in &write_failures {
        eprintln!("  failed: {}/{}: {}", file.folder_path, file.filename, e);
    }
    Ok(())
}

/// Writes one exported file under `out_dir`, refusing paths that leave it.
fn write_exported(out_dir: &Path, file: &export::ExportedFile) -> Result<(), LocframeError> {
    let path = export::output_path(out_dir, &file.folder_path, &file.filename)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(LocframeError::Io)?;
    }
    fs::write(&path, &file.bytes).map_err(LocframeError::Io)
}
