//! Lookup of original image assets by name.

use serde::Serialize;

use crate::error::LocframeError;
use crate::scene::{Document, NodeId};

/// How an asset lookup was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetMatchKind {
    /// The asset name equals the key.
    Exact,
    /// The asset name equals the key without its extension.
    Stem,
    /// The asset name contains the key without its extension.
    Substring,
}

/// A resolved asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetMatch {
    pub node: NodeId,
    pub kind: AssetMatchKind,
}

/// Image-bearing nodes of an assets page, in depth-first order.
///
/// When several assets share a name the first one found wins.
#[derive(Clone, Debug, Default)]
pub struct AssetIndex {
    entries: Vec<(String, NodeId)>,
}

impl AssetIndex {
    /// Indexes every image-fill-bearing node under `page` (exclusive).
    pub fn build<D: Document + ?Sized>(doc: &D, page: NodeId) -> Result<Self, LocframeError> {
        let mut index = Self::default();
        for &child in doc.children(page)? {
            index.collect(doc, child)?;
        }
        Ok(index)
    }

    /// Indexes the root-level page called `page_name`, or returns an empty
    /// index if the document has no such page.
    pub fn for_page_named<D: Document + ?Sized>(
        doc: &D,
        page_name: &str,
    ) -> Result<Self, LocframeError> {
        match doc.find_child_by_name(doc.root(), page_name)? {
            Some(page) => Self::build(doc, page),
            None => {
                tracing::debug!(page = page_name, "no assets page; every image gets a placeholder");
                Ok(Self::default())
            }
        }
    }

    fn collect<D: Document + ?Sized>(&mut self, doc: &D, id: NodeId) -> Result<(), LocframeError> {
        if doc.has_image_fill(id)? {
            self.entries.push((doc.name(id)?.to_string(), id));
        }
        for &child in doc.children(id)? {
            self.collect(doc, child)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `key` by exact name, then by name without extension, then
    /// by substring containment of the extension-less key.
    ///
    /// Returns `None` when nothing matches; callers fall back to a placeholder.
    pub fn resolve(&self, key: &str) -> Option<AssetMatch> {
        let stem = strip_extension(key);

        if let Some(node) = self.first(|name| name == key) {
            return Some(AssetMatch {
                node,
                kind: AssetMatchKind::Exact,
            });
        }
        if let Some(node) = self.first(|name| name == stem) {
            return Some(AssetMatch {
                node,
                kind: AssetMatchKind::Stem,
            });
        }
        self.first(|name| name.contains(stem))
            .map(|node| AssetMatch {
                node,
                kind: AssetMatchKind::Substring,
            })
    }

    fn first(&self, pred: impl Fn(&str) -> bool) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(name, _)| pred(name.as_str()))
            .map(|(_, id)| *id)
    }
}

/// Removes a trailing `.ext` from `name`. A dot followed by a path
/// separator, or a trailing dot, is not an extension.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}
