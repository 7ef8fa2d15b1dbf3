//! An in-memory [`Document`] backed by an ID-keyed arena.
//!
//! This is the document the CLI loads scene files into and the one tests run
//! against. Its [`Document::export_node`] does not rasterize; it emits a JSON
//! render manifest listing the visible layers in paint order, which is enough
//! to observe what an export would have shown.

use std::collections::HashMap;

use serde::Serialize;

use super::document::Document;
use super::ids::NodeId;
use super::node::{Fill, ImageFormat, NodeKind, NodeSpec, Stroke, TextProps};
use super::rect::Rect;
use crate::error::LocframeError;

/// Storage for a single node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StoredNode {
    pub kind: NodeKind,
    pub name: String,
    pub bounds: Rect,
    pub visible: bool,
    pub fill: Fill,
    pub stroke: Option<Stroke>,
    pub corner_radius: f64,
    pub text: Option<TextProps>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl StoredNode {
    fn from_spec(spec: NodeSpec) -> Self {
        Self {
            kind: spec.kind,
            name: spec.name,
            bounds: spec.bounds,
            visible: spec.visible,
            fill: spec.fill,
            stroke: spec.stroke,
            corner_radius: spec.corner_radius,
            text: spec.text,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn to_spec(&self) -> NodeSpec {
        NodeSpec {
            kind: self.kind,
            name: self.name.clone(),
            bounds: self.bounds,
            visible: self.visible,
            fill: self.fill.clone(),
            stroke: self.stroke,
            corner_radius: self.corner_radius,
            text: self.text.clone(),
        }
    }
}

/// The manifest [`MemoryDocument::export_node`] renders instead of pixels.
#[derive(Debug, Serialize)]
struct RenderManifest<'a> {
    format: ImageFormat,
    width: i64,
    height: i64,
    layers: Vec<&'a str>,
}

/// An arena-backed document tree.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    nodes: HashMap<NodeId, StoredNode>,
    root: NodeId,
    current_page: NodeId,
    next_id: u64,
}

impl MemoryDocument {
    /// Creates a document with a single empty page named "Page 1".
    pub fn new() -> Self {
        let mut doc = Self::empty();
        let page = doc.add_page("Page 1");
        doc.current_page = page;
        doc
    }

    /// A document holding only its root. The root doubles as the current
    /// page until one is set.
    pub(crate) fn empty() -> Self {
        let root = NodeId::new(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            StoredNode::from_spec(NodeSpec::frame("Document", Rect::default())),
        );
        Self {
            nodes,
            root,
            current_page: root,
            next_id: 1,
        }
    }

    /// Adds a page under the root and returns its ID.
    pub fn add_page(&mut self, name: &str) -> NodeId {
        let page = self.create_node(NodeSpec::frame(name, Rect::default()));
        self.attach(self.root, None, page);
        page
    }

    /// Makes `page` (a child of the root) the current page.
    pub fn set_current_page(&mut self, page: NodeId) -> Result<(), LocframeError> {
        if self.get(page)?.parent != Some(self.root) {
            return Err(LocframeError::SceneInvalid {
                message: format!("node {} is not a page", page),
            });
        }
        self.current_page = page;
        Ok(())
    }

    /// Creates a node and appends it to `parent` in one step.
    pub fn add(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId, LocframeError> {
        let id = self.create_node(spec);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Number of nodes, including detached ones and the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn stroke(&self, id: NodeId) -> Result<Option<Stroke>, LocframeError> {
        Ok(self.get(id)?.stroke)
    }

    pub fn corner_radius(&self, id: NodeId) -> Result<f64, LocframeError> {
        Ok(self.get(id)?.corner_radius)
    }

    pub(crate) fn stored(&self, id: NodeId) -> Result<&StoredNode, LocframeError> {
        self.get(id)
    }

    /// Ensures freshly allocated IDs are greater than `id`.
    pub(crate) fn reserve_through(&mut self, id: NodeId) {
        self.next_id = self.next_id.max(id.as_u64() + 1);
    }

    /// Inserts a node under a caller-chosen ID and appends it to `parent`.
    pub(crate) fn insert_with_id(
        &mut self,
        id: NodeId,
        spec: NodeSpec,
        parent: NodeId,
    ) -> Result<(), LocframeError> {
        if self.nodes.contains_key(&id) {
            return Err(LocframeError::SceneInvalid {
                message: format!("duplicate node id {}", id),
            });
        }
        self.get(parent)?;
        self.reserve_through(id);
        self.nodes.insert(id, StoredNode::from_spec(spec));
        self.attach(parent, None, id);
        Ok(())
    }

    pub(crate) fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn get(&self, id: NodeId) -> Result<&StoredNode, LocframeError> {
        self.nodes.get(&id).ok_or(LocframeError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut StoredNode, LocframeError> {
        self.nodes.get_mut(&id).ok_or(LocframeError::NodeNotFound(id))
    }

    /// Removes `child` from its current parent's child list, if any.
    fn detach(&mut self, child: NodeId) {
        let old_parent = self.nodes.get_mut(&child).and_then(|n| n.parent.take());
        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            old.children.retain(|&c| c != child);
        }
    }

    /// Links an already-detached `child` under `parent`. Both must exist.
    fn attach(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(&parent) {
            let at = index.unwrap_or(p.children.len()).min(p.children.len());
            p.children.insert(at, child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    /// True if `ancestor` is `node` or lies on `node`'s parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn move_child(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        child: NodeId,
    ) -> Result<(), LocframeError> {
        if !self.get(parent)?.kind.is_container() {
            return Err(LocframeError::SceneInvalid {
                message: format!("node {} cannot hold children", parent),
            });
        }
        self.get(child)?;
        if child == self.root || self.is_ancestor(child, parent) {
            return Err(LocframeError::SceneInvalid {
                message: format!("moving node {} under {} would create a cycle", child, parent),
            });
        }
        self.detach(child);
        self.attach(parent, index, child);
        Ok(())
    }

    fn collect_visible_layers<'a>(&'a self, id: NodeId, out: &mut Vec<&'a str>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        for child in &node.children {
            if let Some(c) = self.nodes.get(child) {
                if c.visible {
                    out.push(c.name.as_str());
                    self.collect_visible_layers(*child, out);
                }
            }
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn current_page(&self) -> NodeId {
        self.current_page
    }

    fn kind(&self, id: NodeId) -> Result<NodeKind, LocframeError> {
        Ok(self.get(id)?.kind)
    }

    fn name(&self, id: NodeId) -> Result<&str, LocframeError> {
        Ok(self.get(id)?.name.as_str())
    }

    fn bounds(&self, id: NodeId) -> Result<Rect, LocframeError> {
        Ok(self.get(id)?.bounds)
    }

    fn is_visible(&self, id: NodeId) -> Result<bool, LocframeError> {
        Ok(self.get(id)?.visible)
    }

    fn children(&self, id: NodeId) -> Result<&[NodeId], LocframeError> {
        Ok(self.get(id)?.children.as_slice())
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, LocframeError> {
        Ok(self.get(id)?.parent)
    }

    fn fill(&self, id: NodeId) -> Result<&Fill, LocframeError> {
        Ok(&self.get(id)?.fill)
    }

    fn text(&self, id: NodeId) -> Result<Option<&TextProps>, LocframeError> {
        Ok(self.get(id)?.text.as_ref())
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), LocframeError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), LocframeError> {
        self.get_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), LocframeError> {
        let node = self.get_mut(id)?;
        node.bounds.x = x;
        node.bounds.y = y;
        Ok(())
    }

    fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), LocframeError> {
        let node = self.get_mut(id)?;
        node.bounds.width = width;
        node.bounds.height = height;
        Ok(())
    }

    fn set_fill(&mut self, id: NodeId, fill: Fill) -> Result<(), LocframeError> {
        self.get_mut(id)?.fill = fill;
        Ok(())
    }

    fn create_node(&mut self, spec: NodeSpec) -> NodeId {
        let id = self.allocate_id();
        self.nodes.insert(id, StoredNode::from_spec(spec));
        id
    }

    fn clone_node(&mut self, id: NodeId) -> Result<NodeId, LocframeError> {
        let source = self.get(id)?.clone();
        let copy = self.create_node(source.to_spec());
        for child in source.children {
            let child_copy = self.clone_node(child)?;
            self.attach(copy, None, child_copy);
        }
        Ok(copy)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LocframeError> {
        self.move_child(parent, None, child)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), LocframeError> {
        self.move_child(parent, Some(index), child)
    }

    fn export_node(&self, id: NodeId, format: ImageFormat) -> Result<Vec<u8>, LocframeError> {
        let node = self.get(id)?;
        let size = node.bounds.rounded();
        let mut layers = Vec::new();
        self.collect_visible_layers(id, &mut layers);

        let manifest = RenderManifest {
            format,
            width: size.width,
            height: size.height,
            layers,
        };
        serde_json::to_vec(&manifest).map_err(|e| LocframeError::SceneInvalid {
            message: format!("failed to render node {}: {}", id, e),
        })
    }
}
