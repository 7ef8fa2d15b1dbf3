//! Scene JSON reader and writer for [`MemoryDocument`].
//!
//! A scene file is a nested tree, which is far easier to write by hand
//! than the flat arena the document keeps in memory:
//!
//! ```json
//! {
//!   "current_page": 0,
//!   "pages": [
//!     { "name": "Page 1", "children": [
//!       { "id": 10, "kind": "frame", "name": "hero", "width": 800, "height": 600,
//!         "children": [
//!           { "kind": "rectangle", "name": "hero.png", "width": 800, "height": 600,
//!             "fill": { "type": "image", "bytes": [137, 80, 78, 71] } },
//!           { "kind": "text", "name": "VI: title", "x": 10, "y": 20, "width": 100, "height": 30,
//!             "text": { "characters": "Xin chao" } }
//!         ] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Node IDs are optional. Nodes without one get an ID greater than every
//! explicit ID in the file, so IDs are stable across a read/write cycle.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::ids::NodeId;
use super::memory::MemoryDocument;
use super::node::{Fill, NodeKind, NodeSpec, Stroke, TextProps};
use super::rect::Rect;
use crate::error::LocframeError;

// ============================================================================
// Scene file schema (internal to this module)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SceneFile {
    #[serde(default)]
    current_page: usize,
    pages: Vec<ScenePage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScenePage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<NodeId>,
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SceneNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<NodeId>,
    kind: NodeKind,
    name: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default, skip_serializing_if = "is_no_fill")]
    fill: Fill,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke: Option<Stroke>,
    #[serde(default, skip_serializing_if = "is_zero")]
    corner_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<TextProps>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SceneNode>,
}

fn default_visible() -> bool {
    true
}

fn is_no_fill(fill: &Fill) -> bool {
    *fill == Fill::None
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a document from a scene JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if it
/// contains duplicate node IDs or an out-of-range `current_page`.
pub fn read_scene_json(path: &Path) -> Result<MemoryDocument, LocframeError> {
    let file = File::open(path).map_err(LocframeError::Io)?;
    let reader = BufReader::new(file);

    let scene: SceneFile =
        serde_json::from_reader(reader).map_err(|source| LocframeError::SceneJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    scene_to_document(scene)
}

/// Writes a document to a scene JSON file.
///
/// Only nodes reachable from the root are written.
pub fn write_scene_json(path: &Path, doc: &MemoryDocument) -> Result<(), LocframeError> {
    let scene = document_to_scene(doc)?;
    let file = File::create(path).map_err(LocframeError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &scene).map_err(|source| LocframeError::SceneJsonWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a document from a scene JSON string.
///
/// Useful for testing without file I/O.
pub fn from_scene_str(json: &str) -> Result<MemoryDocument, LocframeError> {
    let scene: SceneFile =
        serde_json::from_str(json).map_err(|source| LocframeError::SceneJsonParse {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;
    scene_to_document(scene)
}

/// Writes a document to a scene JSON string.
pub fn to_scene_string(doc: &MemoryDocument) -> Result<String, LocframeError> {
    let scene = document_to_scene(doc)?;
    serde_json::to_string_pretty(&scene).map_err(|source| LocframeError::SceneJsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })
}

// ============================================================================
// Conversion: scene file -> document
// ============================================================================

fn scene_to_document(scene: SceneFile) -> Result<MemoryDocument, LocframeError> {
    if scene.pages.is_empty() {
        return Err(LocframeError::SceneInvalid {
            message: "scene has no pages".to_string(),
        });
    }
    if scene.current_page >= scene.pages.len() {
        return Err(LocframeError::SceneInvalid {
            message: format!(
                "current_page {} out of range ({} pages)",
                scene.current_page,
                scene.pages.len()
            ),
        });
    }

    let mut doc = MemoryDocument::empty();

    // Reserve explicit IDs up front so generated ones never collide with them
    let max_explicit = scene
        .pages
        .iter()
        .flat_map(|page| {
            page.id
                .into_iter()
                .chain(page.children.iter().filter_map(max_node_id))
        })
        .max();
    if let Some(max) = max_explicit {
        doc.reserve_through(max);
    }

    let root = doc.root();
    let mut current = None;
    for (index, page) in scene.pages.into_iter().enumerate() {
        let id = page.id.unwrap_or_else(|| doc.allocate_id());
        doc.insert_with_id(id, NodeSpec::frame(page.name, Rect::default()), root)?;
        for child in page.children {
            insert_scene_node(&mut doc, child, id)?;
        }
        if index == scene.current_page {
            current = Some(id);
        }
    }
    if let Some(page) = current {
        doc.set_current_page(page)?;
    }

    Ok(doc)
}

fn max_node_id(node: &SceneNode) -> Option<NodeId> {
    node.id
        .into_iter()
        .chain(node.children.iter().filter_map(max_node_id))
        .max()
}

fn insert_scene_node(
    doc: &mut MemoryDocument,
    node: SceneNode,
    parent: NodeId,
) -> Result<(), LocframeError> {
    let id = node.id.unwrap_or_else(|| doc.allocate_id());
    let spec = NodeSpec {
        kind: node.kind,
        name: node.name,
        bounds: Rect::new(node.x, node.y, node.width, node.height),
        visible: node.visible,
        fill: node.fill,
        stroke: node.stroke,
        corner_radius: node.corner_radius,
        text: node.text,
    };
    doc.insert_with_id(id, spec, parent)?;
    for child in node.children {
        insert_scene_node(doc, child, id)?;
    }
    Ok(())
}

// ============================================================================
// Conversion: document -> scene file
// ============================================================================

fn document_to_scene(doc: &MemoryDocument) -> Result<SceneFile, LocframeError> {
    let pages = doc.children(doc.root())?;
    let current_page = pages
        .iter()
        .position(|&p| p == doc.current_page())
        .unwrap_or(0);

    let mut scene_pages = Vec::with_capacity(pages.len());
    for &page in pages {
        let mut children = Vec::new();
        for &child in doc.children(page)? {
            children.push(node_to_scene(doc, child)?);
        }
        scene_pages.push(ScenePage {
            id: Some(page),
            name: doc.name(page)?.to_string(),
            children,
        });
    }

    Ok(SceneFile {
        current_page,
        pages: scene_pages,
    })
}

fn node_to_scene(doc: &MemoryDocument, id: NodeId) -> Result<SceneNode, LocframeError> {
    let stored = doc.stored(id)?;
    let mut children = Vec::with_capacity(stored.children.len());
    for &child in &stored.children {
        children.push(node_to_scene(doc, child)?);
    }

    Ok(SceneNode {
        id: Some(id),
        kind: stored.kind,
        name: stored.name.clone(),
        x: stored.bounds.x,
        y: stored.bounds.y,
        width: stored.bounds.width,
        height: stored.bounds.height,
        visible: stored.visible,
        fill: stored.fill.clone(),
        stroke: stored.stroke,
        corner_radius: stored.corner_radius,
        text: stored.text.clone(),
        children,
    })
}
