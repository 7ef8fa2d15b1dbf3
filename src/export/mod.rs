//! The export orchestrator: renders one image per image frame and language.
//!
//! For every image frame found under the requested frames, the orchestrator
//! computes which nodes must be shown or hidden for the target language,
//! renders the frame inside a [`VisibilityScope`](crate::visibility::VisibilityScope),
//! and collects the bytes with a filename and folder path. Frames are
//! processed one at a time and each one restores the document before the
//! next begins; a failing frame is recorded and the batch moves on.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LocframeError;
use crate::matcher::{self, CleaningArea, ImageFrame};
use crate::scene::{Document, ImageFormat, Language, NodeId, NodeKind, NodeRole};
use crate::visibility::{with_visibility_override, VisibilityOverride};

/// Resampling filter requested for the export.
///
/// Rendering happens at scale 1, so the filter is recorded but does not
/// change the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resampling::Nearest => "nearest",
            Resampling::Bilinear => "bilinear",
            Resampling::Bicubic => "bicubic",
        })
    }
}

impl FromStr for Resampling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            "bicubic" => Ok(Resampling::Bicubic),
            other => Err(format!(
                "unknown resampling '{}' (expected nearest, bilinear or bicubic)",
                other
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Localization frames to search for image frames.
    pub frames: Vec<NodeId>,
    pub language: Language,
    /// Keep `BBox:` rectangles visible in the output.
    #[serde(default)]
    pub include_bbox: bool,
    /// Append `_<lang>` to every filename.
    #[serde(default)]
    pub add_suffix: bool,
    #[serde(default)]
    pub resampling: Resampling,
}

/// One rendered image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Folder path recovered from enclosing `📁` frames; empty at top level.
    pub folder_path: String,
    pub mime_type: String,
    /// Bounding boxes of the frame, relative to its image.
    pub regions: Vec<CleaningArea>,
}

/// An image frame that could not be exported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub node: NodeId,
    pub name: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub exported_count: usize,
    pub files: Vec<ExportedFile>,
    pub failures: Vec<ExportFailure>,
}

// ============================================================================
// Naming
// ============================================================================

/// Builds the output filename: `<base>[_<lang>].<ext>`.
///
/// ```
/// use locframe::export::export_filename;
/// use locframe::scene::{ImageFormat, Language};
///
/// assert_eq!(export_filename("hero", Language::En, true, ImageFormat::Png), "hero_en.png");
/// assert_eq!(export_filename("hero", Language::En, false, ImageFormat::Jpeg), "hero.jpg");
/// ```
pub fn export_filename(base: &str, language: Language, add_suffix: bool, format: ImageFormat) -> String {
    if add_suffix {
        format!("{}_{}.{}", base, language.code(), format.extension())
    } else {
        format!("{}.{}", base, format.extension())
    }
}

/// Image extensions stripped from frame names, lower-case.
const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// The base filename for a frame: its name without a trailing image
/// extension (matched case-insensitively).
fn base_name(frame_name: &str) -> &str {
    let lower = frame_name.to_ascii_lowercase();
    for ext in IMAGE_EXTENSIONS {
        if lower.ends_with(ext) {
            return &frame_name[..frame_name.len() - ext.len()];
        }
    }
    frame_name
}

/// Where an exported file goes under `out_dir`.
///
/// Folder paths and filenames come from node names, so every segment must
/// be a single plain name: no `.` or `..`, no separators, no root or drive.
/// Empty folder segments are skipped.
///
/// # Errors
/// [`LocframeError::UnsafeOutputPath`] if any segment would leave `out_dir`.
pub fn output_path(out_dir: &Path, folder_path: &str, filename: &str) -> Result<PathBuf, LocframeError> {
    let mut path = out_dir.to_path_buf();
    for segment in folder_path.split(matcher::FOLDER_DELIMITER).filter(|s| !s.is_empty()) {
        check_segment(segment, folder_path)?;
        path.push(segment);
    }
    check_segment(filename, filename)?;
    path.push(filename);
    Ok(path)
}

fn check_segment(segment: &str, context: &str) -> Result<(), LocframeError> {
    let plain = !segment.contains(['/', '\\'])
        && matches!(
            Path::new(segment).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
    if plain {
        Ok(())
    } else {
        Err(LocframeError::UnsafeOutputPath {
            path: context.to_string(),
            segment: segment.to_string(),
        })
    }
}

/// The raw source image of a frame and the format it dictates.
///
/// Only the first child is inspected. Without a recognizable extension
/// there is no source and the format is PNG.
fn detect_source<D: Document + ?Sized>(
    doc: &D,
    frame: NodeId,
) -> Result<(Option<NodeId>, ImageFormat), LocframeError> {
    if let Some(&first) = doc.children(frame)?.first() {
        if let Some(format) = ImageFormat::detect(doc.name(first)?) {
            return Ok((Some(first), format));
        }
    }
    Ok((None, ImageFormat::default()))
}

// ============================================================================
// Visibility plan
// ============================================================================

/// Computes the overrides for exporting `frame` in `language`.
///
/// Across the whole subtree: text is shown only when tagged with the
/// target language, `BBox:` rectangles follow `include_bbox`, and the raw
/// source is hidden.
pub fn visibility_plan<D: Document + ?Sized>(
    doc: &D,
    frame: NodeId,
    source: Option<NodeId>,
    language: Language,
    include_bbox: bool,
) -> Result<Vec<VisibilityOverride>, LocframeError> {
    let mut plan = Vec::new();
    plan_node(doc, frame, source, language, include_bbox, &mut plan)?;
    Ok(plan)
}

fn plan_node<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    source: Option<NodeId>,
    language: Language,
    include_bbox: bool,
    plan: &mut Vec<VisibilityOverride>,
) -> Result<(), LocframeError> {
    let role = doc.role(node)?;
    let visible = if doc.kind(node)? == NodeKind::Text {
        Some(role.language() == Some(language))
    } else if let NodeRole::BoundingBox(_) = role {
        Some(include_bbox)
    } else if source == Some(node) {
        Some(false)
    } else {
        None
    };
    if let Some(visible) = visible {
        plan.push(VisibilityOverride::new(node, visible));
    }

    for &child in doc.children(node)? {
        plan_node(doc, child, source, language, include_bbox, plan)?;
    }
    Ok(())
}

// ============================================================================
// Orchestration
// ============================================================================

/// Exports every image frame under `options.frames`.
///
/// Unknown frame IDs are skipped with a warning. An image frame reachable
/// from several requested frames is exported once, with the folder path
/// seen from the first of them. A frame that fails to export is listed in
/// [`ExportReport::failures`]; its visibility changes are still rolled back.
pub fn export_images<D: Document + ?Sized>(
    doc: &mut D,
    options: &ExportOptions,
) -> Result<ExportReport, LocframeError> {
    let mut report = ExportReport::default();
    let mut seen = BTreeSet::new();

    for &frame in &options.frames {
        if doc.find_descendant(doc.root(), frame)?.is_none() {
            tracing::warn!(frame = %frame, "skipping unknown frame");
            continue;
        }

        for image_frame in matcher::find_image_frames(&*doc, frame)? {
            if !seen.insert(image_frame.node) {
                continue;
            }
            match export_image_frame(doc, &image_frame, options) {
                Ok(file) => {
                    tracing::debug!(file = %file.filename, path = %file.folder_path, "exported");
                    report.files.push(file);
                }
                Err(e) => {
                    tracing::warn!(frame = %image_frame.node, error = %e, "export failed");
                    report.failures.push(ExportFailure {
                        node: image_frame.node,
                        name: doc.name(image_frame.node).unwrap_or_default().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    report.exported_count = report.files.len();
    tracing::info!(
        exported = report.exported_count,
        failed = report.failures.len(),
        language = %options.language,
        "export complete"
    );
    Ok(report)
}

/// Renders a single image frame for `options.language`.
pub fn export_image_frame<D: Document + ?Sized>(
    doc: &mut D,
    image_frame: &ImageFrame,
    options: &ExportOptions,
) -> Result<ExportedFile, LocframeError> {
    let frame = image_frame.node;
    let (source, format) = detect_source(&*doc, frame)?;
    let filename = export_filename(
        base_name(doc.name(frame)?),
        options.language,
        options.add_suffix,
        format,
    );

    let regions = matcher::image_frame_regions(&*doc, frame)?;

    let plan = visibility_plan(&*doc, frame, source, options.language, options.include_bbox)?;
    tracing::debug!(file = %filename, resampling = %options.resampling, "rendering");
    let bytes = with_visibility_override(doc, &plan, |d| d.export_node(frame, format))?;

    Ok(ExportedFile {
        bytes,
        filename,
        folder_path: image_frame.path.clone(),
        mime_type: format.mime_type().to_string(),
        regions,
    })
}
