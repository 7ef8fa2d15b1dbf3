//! The capability interface the core uses to read and mutate a host document.

use super::ids::NodeId;
use super::node::{Fill, ImageFormat, NodeKind, NodeSpec, TextProps};
use super::rect::Rect;
use super::role::{classify, NodeRole};
use crate::error::LocframeError;

/// A mutable, externally-owned scene graph.
///
/// The document owns every node; callers hold [`NodeId`]s only. The tree is
/// rooted at [`Document::root`], whose children are pages. `x`/`y` of a node
/// are expressed in its parent's coordinate space.
///
/// Every accessor fails with [`LocframeError::NodeNotFound`] for IDs the
/// document does not know.
pub trait Document {
    /// The document root; its children are pages.
    fn root(&self) -> NodeId;

    /// The page new content is added to and scans start from.
    fn current_page(&self) -> NodeId;

    fn kind(&self, id: NodeId) -> Result<NodeKind, LocframeError>;

    fn name(&self, id: NodeId) -> Result<&str, LocframeError>;

    fn bounds(&self, id: NodeId) -> Result<Rect, LocframeError>;

    fn is_visible(&self, id: NodeId) -> Result<bool, LocframeError>;

    /// Ordered children. Empty for non-container nodes.
    fn children(&self, id: NodeId) -> Result<&[NodeId], LocframeError>;

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, LocframeError>;

    fn fill(&self, id: NodeId) -> Result<&Fill, LocframeError>;

    /// Text content, present only on Text nodes.
    fn text(&self, id: NodeId) -> Result<Option<&TextProps>, LocframeError>;

    fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), LocframeError>;

    fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), LocframeError>;

    fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), LocframeError>;

    fn resize(&mut self, id: NodeId, width: f64, height: f64) -> Result<(), LocframeError>;

    fn set_fill(&mut self, id: NodeId, fill: Fill) -> Result<(), LocframeError>;

    /// Creates a detached node. It joins the tree once appended somewhere.
    fn create_node(&mut self, spec: NodeSpec) -> NodeId;

    /// Deep-copies a node and its subtree. The copy is detached.
    fn clone_node(&mut self, id: NodeId) -> Result<NodeId, LocframeError>;

    /// Moves `child` to the end of `parent`'s children.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LocframeError>;

    /// Moves `child` to position `index` (clamped) among `parent`'s children.
    fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), LocframeError>;

    /// Renders a node and its visible descendants.
    fn export_node(&self, id: NodeId, format: ImageFormat) -> Result<Vec<u8>, LocframeError>;

    /// The semantic role of a node, derived from its kind and name.
    fn role(&self, id: NodeId) -> Result<NodeRole, LocframeError> {
        Ok(classify(self.kind(id)?, self.name(id)?))
    }

    /// True for Image nodes and for any node painted with an image fill.
    fn has_image_fill(&self, id: NodeId) -> Result<bool, LocframeError> {
        Ok(self.kind(id)? == NodeKind::Image || self.fill(id)?.is_image())
    }

    /// Finds the first direct child of `parent` with the given name.
    fn find_child_by_name(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>, LocframeError> {
        for &child in self.children(parent)? {
            if self.name(child)? == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Finds a node anywhere under `start` (inclusive), depth-first.
    fn find_descendant(&self, start: NodeId, target: NodeId) -> Result<Option<NodeId>, LocframeError> {
        if start == target {
            return Ok(Some(start));
        }
        for &child in self.children(start)? {
            if let Some(found) = self.find_descendant(child, target)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}
