//! Scoped visibility overrides.
//!
//! Producing an export variant means temporarily hiding and showing nodes
//! (one language's text, the bounding boxes, the raw source image). The
//! document must look exactly as it did before once the export is done,
//! whether it succeeded, failed, or panicked.
//!
//! [`VisibilityScope`] is the guard: it snapshots each node's visibility
//! right before changing it and replays the snapshot, in capture order,
//! when it is restored or dropped. [`with_visibility_override`] wraps an
//! action in such a scope.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use crate::error::LocframeError;
use crate::scene::{Document, NodeId};

/// A requested visibility for one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityOverride {
    pub node: NodeId,
    pub visible: bool,
}

impl VisibilityOverride {
    pub fn new(node: NodeId, visible: bool) -> Self {
        Self { node, visible }
    }
}

/// Original visibility of every node a scope touched, in capture order.
///
/// A node appears at most once, holding the value it had before its
/// first mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilitySnapshot {
    entries: Vec<(NodeId, bool)>,
    captured: BTreeSet<NodeId>,
}

impl VisibilitySnapshot {
    /// Captures the current visibility of `nodes`, skipping repeats.
    pub fn capture<D: Document + ?Sized>(
        doc: &D,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<Self, LocframeError> {
        let mut snapshot = Self::default();
        for node in nodes {
            snapshot.record(doc, node)?;
        }
        Ok(snapshot)
    }

    fn record<D: Document + ?Sized>(&mut self, doc: &D, node: NodeId) -> Result<(), LocframeError> {
        if !self.captured.contains(&node) {
            let visible = doc.is_visible(node)?;
            self.captured.insert(node);
            self.entries.push((node, visible));
        }
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.captured.contains(&node)
    }

    /// `(node, original visibility)` pairs in capture order.
    pub fn entries(&self) -> &[(NodeId, bool)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes every captured value back, in capture order.
    ///
    /// A failing node does not stop the replay; the first error is returned
    /// after all other nodes have been restored.
    pub fn restore<D: Document + ?Sized>(&self, doc: &mut D) -> Result<(), LocframeError> {
        let mut first_error = None;
        for &(node, visible) in &self.entries {
            if let Err(e) = doc.set_visible(node, visible) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Exclusive access to a document with some visibilities overridden.
///
/// Dereferences to the document. Dropping the scope restores the snapshot;
/// call [`VisibilityScope::restore`] to observe restoration errors.
pub struct VisibilityScope<'d, D: Document + ?Sized> {
    doc: &'d mut D,
    snapshot: VisibilitySnapshot,
    restored: bool,
}

impl<'d, D: Document + ?Sized> VisibilityScope<'d, D> {
    /// Applies `overrides` in order, capturing each node before it changes.
    ///
    /// If an override fails, the nodes already changed are restored before
    /// the error is returned.
    pub fn apply(doc: &'d mut D, overrides: &[VisibilityOverride]) -> Result<Self, LocframeError> {
        let mut scope = Self {
            doc,
            snapshot: VisibilitySnapshot::default(),
            restored: false,
        };
        for o in overrides {
            scope.snapshot.record(&*scope.doc, o.node)?;
            scope.doc.set_visible(o.node, o.visible)?;
        }
        Ok(scope)
    }

    pub fn snapshot(&self) -> &VisibilitySnapshot {
        &self.snapshot
    }

    /// Ends the scope, restoring every captured visibility.
    pub fn restore(mut self) -> Result<(), LocframeError> {
        self.restored = true;
        self.snapshot.restore(&mut *self.doc)
    }
}

impl<D: Document + ?Sized> Deref for VisibilityScope<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.doc
    }
}

impl<D: Document + ?Sized> DerefMut for VisibilityScope<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.doc
    }
}

impl<D: Document + ?Sized> Drop for VisibilityScope<'_, D> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.snapshot.restore(&mut *self.doc) {
            tracing::error!(error = %e, "failed to restore visibility");
        }
    }
}

/// Runs `action` with `overrides` applied, then restores every touched
/// node's visibility, on success and on failure alike.
///
/// An error from `action` takes precedence over a restoration error.
pub fn with_visibility_override<D, T, F>(
    doc: &mut D,
    overrides: &[VisibilityOverride],
    action: F,
) -> Result<T, LocframeError>
where
    D: Document + ?Sized,
    F: FnOnce(&mut D) -> Result<T, LocframeError>,
{
    let mut scope = VisibilityScope::apply(doc, overrides)?;
    let outcome = action(&mut *scope);
    let restored = scope.restore();

    match (outcome, restored) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryDocument, NodeSpec, Rect};

    fn doc_with_nodes(visible: &[bool]) -> (MemoryDocument, Vec<NodeId>) {
        let mut doc = MemoryDocument::new();
        let page = doc.current_page();
        let ids = visible
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                doc.add(
                    page,
                    NodeSpec::rectangle(format!("n{}", i), Rect::sized(1.0, 1.0)).with_visible(v),
                )
                .unwrap()
            })
            .collect();
        (doc, ids)
    }

    fn visibility(doc: &MemoryDocument, ids: &[NodeId]) -> Vec<bool> {
        ids.iter().map(|&id| doc.is_visible(id).unwrap()).collect()
    }

    #[test]
    fn test_action_sees_overrides_and_state_is_restored() {
        let (mut doc, ids) = doc_with_nodes(&[true, false, true]);
        let overrides = [
            VisibilityOverride::new(ids[0], false),
            VisibilityOverride::new(ids[1], true),
        ];

        let seen = with_visibility_override(&mut doc, &overrides, |d| {
            Ok(visibility(d, &ids))
        })
        .unwrap();

        assert_eq!(seen, vec![false, true, true]);
        assert_eq!(visibility(&doc, &ids), vec![true, false, true]);
    }

    #[test]
    fn test_restores_when_action_fails() {
        let (mut doc, ids) = doc_with_nodes(&[true, true]);
        let overrides = [VisibilityOverride::new(ids[0], false)];

        let result: Result<(), _> = with_visibility_override(&mut doc, &overrides, |_| {
            Err(LocframeError::Processing("boom".into()))
        });

        assert!(matches!(result, Err(LocframeError::Processing(_))));
        assert_eq!(visibility(&doc, &ids), vec![true, true]);
    }

    #[test]
    fn test_failed_override_restores_earlier_ones() {
        let (mut doc, ids) = doc_with_nodes(&[true]);
        let overrides = [
            VisibilityOverride::new(ids[0], false),
            VisibilityOverride::new(NodeId(9999), false),
        ];

        let result = with_visibility_override(&mut doc, &overrides, |_| Ok(()));
        assert!(matches!(result, Err(LocframeError::NodeNotFound(_))));
        assert_eq!(visibility(&doc, &ids), vec![true]);
    }

    #[test]
    fn test_repeated_node_captured_once() {
        let (mut doc, ids) = doc_with_nodes(&[true]);
        let overrides = [
            VisibilityOverride::new(ids[0], false),
            VisibilityOverride::new(ids[0], true),
            VisibilityOverride::new(ids[0], false),
        ];

        let scope = VisibilityScope::apply(&mut doc, &overrides).unwrap();
        assert_eq!(scope.snapshot().entries(), &[(ids[0], true)]);
        assert!(!scope.is_visible(ids[0]).unwrap());
        drop(scope);
        assert!(doc.is_visible(ids[0]).unwrap());
    }

    #[test]
    fn test_restores_on_panic() {
        let (mut doc, ids) = doc_with_nodes(&[true]);
        let overrides = [VisibilityOverride::new(ids[0], false)];

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = with_visibility_override(&mut doc, &overrides, |_| -> Result<(), _> {
                panic!("export crashed")
            });
        }));

        assert!(result.is_err());
        assert!(doc.is_visible(ids[0]).unwrap());
    }

    #[test]
    fn test_snapshot_capture_skips_duplicates() {
        let (doc, ids) = doc_with_nodes(&[false, true]);
        let snapshot =
            VisibilitySnapshot::capture(&doc, [ids[1], ids[0], ids[1]]).unwrap();
        assert_eq!(snapshot.entries(), &[(ids[1], true), (ids[0], false)]);
        assert_eq!(snapshot.len(), 2);
    }
}
