//! Node matching: pairing images with their overlays.
//!
//! Everything here is a pure read of the document. The matcher classifies
//! nodes by [`NodeRole`] and containment and produces:
//!
//! - a [`MatchedGroup`] for a selection (image, bounding boxes, text pairs),
//! - the [`LocalizationFrame`]s on a page,
//! - the [`ImageFrame`]s inside a localization frame, with folder paths.
//!
//! Geometry handed out by the matcher is always relative to the matched
//! image's origin and rounded to integers.

mod assets;

pub use assets::{strip_extension, AssetIndex, AssetMatch, AssetMatchKind};

use serde::{Deserialize, Serialize};

use crate::error::LocframeError;
use crate::scene::{
    Direction, Document, Language, NodeId, NodeKind, NodeRole, Rect, PLACEHOLDER_SUFFIX,
};

/// Separator between folder names in an image frame's path.
pub const FOLDER_DELIMITER: &str = "/";

/// A bounding box region, relative to its image and in whole pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningArea {
    /// Position of the box among the matched boxes.
    pub id: usize,
    /// The box label with its tag stripped.
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// A Vietnamese/English text pair sharing one label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPair {
    pub original: String,
    pub vi: String,
    pub en: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub direction: Direction,
}

/// An image node together with the overlays that annotate it.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedGroup {
    pub image: NodeId,
    /// The `BBox:` rectangles, in child order.
    pub bbox_nodes: Vec<NodeId>,
    /// One area per entry of `bbox_nodes`, same order.
    pub bounding_boxes: Vec<CleaningArea>,
    pub text_pairs: Vec<TextPair>,
}

/// Summary of a matched image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub name: String,
    pub width: i64,
    pub height: i64,
    pub has_image: bool,
}

/// A frame holding both Vietnamese and English text somewhere below it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalizationFrame {
    pub node: NodeId,
    pub name: String,
    pub width: i64,
    pub height: i64,
    /// Number of [`ImageFrame`]s inside this frame.
    pub image_count: usize,
}

/// A frame directly holding an image and localized text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageFrame {
    pub node: NodeId,
    /// Enclosing folder names joined by [`FOLDER_DELIMITER`]; empty at top level.
    pub path: String,
}

// ============================================================================
// Selection matching
// ============================================================================

/// Finds the image and its overlays in a selection.
///
/// - A single frame: its first image-fill child (direct children only) is
///   the image; every `BBox:` rectangle child is a bounding box; `VI:`/`EN:`
///   text children are paired by label.
/// - A single image-fill node: it is the image, with no overlays.
///
/// # Errors
/// [`LocframeError::Selection`] for an empty or multi-root selection,
/// [`LocframeError::Match`] if no image is found. Nothing is partially
/// matched.
pub fn find_image_and_overlays<D: Document + ?Sized>(
    doc: &D,
    selection: &[NodeId],
) -> Result<MatchedGroup, LocframeError> {
    let selected = match selection {
        [] => {
            return Err(LocframeError::Selection(
                "nothing selected; select an image or a frame containing an image and its bounding boxes"
                    .to_string(),
            ))
        }
        [one] => *one,
        many => {
            return Err(LocframeError::Selection(format!(
                "select exactly one image or frame ({} selected)",
                many.len()
            )))
        }
    };

    if !doc.kind(selected)?.is_container() {
        if doc.has_image_fill(selected)? {
            return Ok(MatchedGroup {
                image: selected,
                bbox_nodes: Vec::new(),
                bounding_boxes: Vec::new(),
                text_pairs: Vec::new(),
            });
        }
        return Err(LocframeError::Match(format!(
            "selected node '{}' has no image fill",
            doc.name(selected)?
        )));
    }

    let mut image = None;
    for &child in doc.children(selected)? {
        if doc.has_image_fill(child)? {
            image = Some(child);
            break;
        }
    }

    let image = image.ok_or_else(|| {
        LocframeError::Match(format!(
            "no image found in frame '{}'",
            doc.name(selected).unwrap_or("?")
        ))
    })?;
    let origin = doc.bounds(image)?;
    let (bbox_nodes, bounding_boxes) = collect_bounding_boxes(doc, selected, &origin)?;

    let text_pairs = collect_text_pairs(doc, doc.children(selected)?, &origin)?;

    Ok(MatchedGroup {
        image,
        bbox_nodes,
        bounding_boxes,
        text_pairs,
    })
}

/// The `BBox:` rectangle children of `container` and their areas relative
/// to `origin`, in child order.
fn collect_bounding_boxes<D: Document + ?Sized>(
    doc: &D,
    container: NodeId,
    origin: &Rect,
) -> Result<(Vec<NodeId>, Vec<CleaningArea>), LocframeError> {
    let mut nodes = Vec::new();
    let mut areas = Vec::new();
    for &child in doc.children(container)? {
        if let NodeRole::BoundingBox(label) = doc.role(child)? {
            let area = doc.bounds(child)?.relative_to(origin).rounded();
            areas.push(CleaningArea {
                id: nodes.len(),
                name: label,
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height,
            });
            nodes.push(child);
        }
    }
    Ok((nodes, areas))
}

/// Pairs `VI:` and `EN:` text nodes among `nodes` by label.
///
/// Pairs appear in the order their label was first seen and take their
/// geometry from that first node. A side with no text node stays empty.
fn collect_text_pairs<D: Document + ?Sized>(
    doc: &D,
    nodes: &[NodeId],
    origin: &Rect,
) -> Result<Vec<TextPair>, LocframeError> {
    let mut pairs: Vec<TextPair> = Vec::new();

    for &node in nodes {
        let (language, label) = match doc.role(node)? {
            NodeRole::Localized { language, label } => (language, label),
            _ => continue,
        };
        let props = doc.text(node)?;
        let characters = props.map(|t| t.characters.clone()).unwrap_or_default();

        let index = match pairs.iter().position(|p| p.original == label) {
            Some(index) => index,
            None => {
                let area = doc.bounds(node)?.relative_to(origin).rounded();
                pairs.push(TextPair {
                    original: label,
                    vi: String::new(),
                    en: String::new(),
                    x: area.x,
                    y: area.y,
                    width: area.width,
                    height: area.height,
                    direction: props.map(|t| t.direction).unwrap_or_default(),
                });
                pairs.len() - 1
            }
        };

        match language {
            Language::Vi => pairs[index].vi = characters,
            Language::En => pairs[index].en = characters,
        }
    }

    Ok(pairs)
}

/// Summarizes the matched image for display.
pub fn image_info<D: Document + ?Sized>(doc: &D, image: NodeId) -> Result<ImageInfo, LocframeError> {
    let size = doc.bounds(image)?.rounded();
    Ok(ImageInfo {
        name: doc.name(image)?.to_string(),
        width: size.width,
        height: size.height,
        has_image: doc.fill(image)?.is_image(),
    })
}

// ============================================================================
// Localization frames
// ============================================================================

/// Lists every frame below `root` (exclusive) that holds both a `VI:` and
/// an `EN:` text node somewhere in its subtree, in depth-first pre-order.
///
/// Qualifying frames are still descended into, so nested units are listed too.
pub fn find_localization_frames<D: Document + ?Sized>(
    doc: &D,
    root: NodeId,
) -> Result<Vec<LocalizationFrame>, LocframeError> {
    let mut frames = Vec::new();
    for &child in doc.children(root)? {
        scan_localization_frames(doc, child, &mut frames)?;
    }
    Ok(frames)
}

fn scan_localization_frames<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    frames: &mut Vec<LocalizationFrame>,
) -> Result<(), LocframeError> {
    if doc.kind(node)? == NodeKind::Frame && is_localization_unit(doc, node)? {
        let size = doc.bounds(node)?.rounded();
        frames.push(LocalizationFrame {
            node,
            name: doc.name(node)?.to_string(),
            width: size.width,
            height: size.height,
            image_count: find_image_frames(doc, node)?.len(),
        });
    }
    for &child in doc.children(node)? {
        scan_localization_frames(doc, child, frames)?;
    }
    Ok(())
}

/// True if the subtree under `node` (inclusive) contains both a `VI:`- and
/// an `EN:`-tagged text node.
pub fn is_localization_unit<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
) -> Result<bool, LocframeError> {
    let mut seen = (false, false);
    find_languages(doc, node, &mut seen)?;
    Ok(seen == (true, true))
}

fn find_languages<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    seen: &mut (bool, bool),
) -> Result<(), LocframeError> {
    match doc.role(node)?.language() {
        Some(Language::Vi) => seen.0 = true,
        Some(Language::En) => seen.1 = true,
        None => {}
    }
    for &child in doc.children(node)? {
        if *seen == (true, true) {
            break;
        }
        find_languages(doc, child, seen)?;
    }
    Ok(())
}

// ============================================================================
// Image frames
// ============================================================================

/// Lists the image frames under `root` (inclusive), accumulating the names
/// of enclosing `📁` folders into each frame's path.
pub fn find_image_frames<D: Document + ?Sized>(
    doc: &D,
    root: NodeId,
) -> Result<Vec<ImageFrame>, LocframeError> {
    let mut frames = Vec::new();
    collect_image_frames(doc, root, String::new(), &mut frames)?;
    Ok(frames)
}

fn collect_image_frames<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    path: String,
    frames: &mut Vec<ImageFrame>,
) -> Result<(), LocframeError> {
    if is_image_frame(doc, node)? {
        frames.push(ImageFrame {
            node,
            path: path.clone(),
        });
    }

    let child_path = match doc.role(node)? {
        NodeRole::Folder(folder) if path.is_empty() => folder,
        NodeRole::Folder(folder) => format!("{}{}{}", path, FOLDER_DELIMITER, folder),
        _ => path,
    };
    for &child in doc.children(node)? {
        collect_image_frames(doc, child, child_path.clone(), frames)?;
    }
    Ok(())
}

/// True if `node` can stand for a frame's image: it carries an image fill,
/// or it is a placeholder rectangle drawn for a missing asset.
pub fn is_image_source<D: Document + ?Sized>(doc: &D, node: NodeId) -> Result<bool, LocframeError> {
    if doc.has_image_fill(node)? {
        return Ok(true);
    }
    Ok(doc.kind(node)? == NodeKind::Rectangle && doc.name(node)?.ends_with(PLACEHOLDER_SUFFIX))
}

/// The bounding boxes of an image frame, relative to its first image
/// source child.
///
/// Unlike [`find_image_and_overlays`] the source may be a placeholder.
/// Empty when the frame has no image source.
pub fn image_frame_regions<D: Document + ?Sized>(
    doc: &D,
    frame: NodeId,
) -> Result<Vec<CleaningArea>, LocframeError> {
    for &child in doc.children(frame)? {
        if is_image_source(doc, child)? {
            let origin = doc.bounds(child)?;
            return Ok(collect_bounding_boxes(doc, frame, &origin)?.1);
        }
    }
    Ok(Vec::new())
}

/// True if `node` is a non-folder frame with at least one image source
/// child (see [`is_image_source`]) and at least one `VI:`/`EN:` text child.
/// Only direct children count.
pub fn is_image_frame<D: Document + ?Sized>(doc: &D, node: NodeId) -> Result<bool, LocframeError> {
    if doc.kind(node)? != NodeKind::Frame || doc.role(node)?.is_folder() {
        return Ok(false);
    }

    let mut has_image = false;
    let mut has_text = false;
    for &child in doc.children(node)? {
        has_image = has_image || is_image_source(doc, child)?;
        has_text = has_text || doc.role(child)?.language().is_some();
        if has_image && has_text {
            return Ok(true);
        }
    }
    Ok(false)
}
