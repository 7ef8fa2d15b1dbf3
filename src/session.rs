//! The scan → clean workflow for a single image.
//!
//! A [`Session`] remembers what the last scan matched so a later clean
//! request knows which image and regions to process. It replaces any
//! process-wide "current selection" state: one session per workflow.

use serde::Serialize;

use crate::bridge::{CleanOptions, ProcessRequest, ProcessingBridge};
use crate::error::LocframeError;
use crate::matcher::{self, CleaningArea, ImageInfo, MatchedGroup, TextPair};
use crate::scene::{Document, Fill, NodeId};

/// Suffix appended to the name of a cleaned copy.
pub const CLEANED_SUFFIX: &str = " (Cleaned)";

/// Index at which the cleaned copy is inserted into the image's parent,
/// just above the original source.
const CLEANED_INSERT_INDEX: usize = 1;

/// What a scan found.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanReport {
    pub image: ImageInfo,
    pub cleaning_areas: Vec<CleaningArea>,
    pub total_bboxes: usize,
    pub text_pairs: Vec<TextPair>,
}

/// The outcome of a successful clean.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CleanReport {
    /// The newly inserted cleaned copy.
    pub node: NodeId,
    pub message: String,
}

/// Scan state carried between a scan and the clean that follows it.
#[derive(Clone, Debug, Default)]
pub struct Session {
    scanned: Option<MatchedGroup>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group matched by the last successful scan.
    pub fn scanned(&self) -> Option<&MatchedGroup> {
        self.scanned.as_ref()
    }

    /// Matches `selection` and remembers the result for [`Session::clean`].
    ///
    /// A failed scan forgets any earlier result.
    pub fn scan<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        selection: &[NodeId],
    ) -> Result<ScanReport, LocframeError> {
        self.scanned = None;
        let group = matcher::find_image_and_overlays(doc, selection)?;

        let report = ScanReport {
            image: matcher::image_info(doc, group.image)?,
            cleaning_areas: group.bounding_boxes.clone(),
            total_bboxes: group.bbox_nodes.len(),
            text_pairs: group.text_pairs.clone(),
        };
        tracing::info!(
            image = %report.image.name,
            bboxes = report.total_bboxes,
            "scan complete"
        );

        self.scanned = Some(group);
        Ok(report)
    }

    /// Sends the scanned image through `bridge` and inserts the result as a
    /// cleaned copy next to the original.
    ///
    /// The copy keeps the original's position, is named
    /// `"<name> (Cleaned)"`, and goes to index 1 of the original's parent
    /// (or of the current page for a parentless image).
    ///
    /// # Errors
    /// [`LocframeError::Selection`] without a prior scan,
    /// [`LocframeError::Match`] if the image has no image fill, plus any
    /// bridge error. The document is untouched on error.
    pub async fn clean<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        bridge: &ProcessingBridge,
        options: CleanOptions,
    ) -> Result<CleanReport, LocframeError> {
        let group = self.scanned.as_ref().ok_or_else(|| {
            LocframeError::Selection("no image scanned; scan a selection first".to_string())
        })?;
        let image = group.image;

        let image_bytes = doc
            .fill(image)?
            .image_bytes()
            .ok_or_else(|| {
                LocframeError::Match(format!("'{}' has no image fill", doc.name(image).unwrap_or("?")))
            })?
            .to_vec();

        let method = options.method.clone();
        let cleaned_bytes = bridge
            .request_processing(ProcessRequest {
                image_bytes,
                cleaning_areas: group.bounding_boxes.clone(),
                options,
            })
            .await?;

        let bounds = doc.bounds(image)?;
        let size = bounds.rounded();
        check_result_size(&cleaned_bytes, size.width, size.height);

        let cleaned = doc.clone_node(image)?;
        let name = format!("{}{}", doc.name(image)?, CLEANED_SUFFIX);
        doc.set_name(cleaned, &name)?;
        doc.set_position(cleaned, bounds.x, bounds.y)?;
        doc.set_fill(
            cleaned,
            Fill::Image {
                bytes: cleaned_bytes,
            },
        )?;

        let parent = match doc.parent(image)? {
            Some(parent) => parent,
            None => doc.current_page(),
        };
        doc.insert_child(parent, CLEANED_INSERT_INDEX, cleaned)?;

        tracing::info!(node = %cleaned, method = %method, "image cleaned");
        Ok(CleanReport {
            node: cleaned,
            message: format!("Image cleaned with method {}", method),
        })
    }
}

/// Logs when processed bytes decode to a size other than the node's.
fn check_result_size(bytes: &[u8], width: i64, height: i64) {
    match imagesize::blob_size(bytes) {
        Ok(size) if size.width as i64 != width || size.height as i64 != height => {
            tracing::warn!(
                result_width = size.width,
                result_height = size.height,
                width,
                height,
                "processed image size differs from the source node"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "could not read processed image dimensions"),
    }
}
