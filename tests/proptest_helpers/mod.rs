#![allow(dead_code)]

use locframe::scene::{Document, MemoryDocument, NodeId, NodeSpec, Rect};
use locframe::visibility::VisibilityOverride;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Canvas coordinates with a fractional part, kept well inside f64 precision.
pub fn arb_coord() -> BoxedStrategy<f64> {
    (-5_000i32..5_000, 0u8..100)
        .prop_map(|(whole, frac)| whole as f64 + frac as f64 / 100.0)
        .boxed()
}

pub fn arb_size() -> BoxedStrategy<f64> {
    (1u32..4_000, 0u8..100)
        .prop_map(|(whole, frac)| whole as f64 + frac as f64 / 100.0)
        .boxed()
}

pub fn arb_rect() -> BoxedStrategy<Rect> {
    (arb_coord(), arb_coord(), arb_size(), arb_size())
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
        .boxed()
}

/// A short folder or file name segment.
pub fn arb_segment() -> BoxedStrategy<String> {
    "[a-z0-9_]{1,8}".boxed()
}

/// Initial visibilities for `1..=max_nodes` nodes.
pub fn arb_visibility(max_nodes: usize) -> BoxedStrategy<Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..=max_nodes).boxed()
}

/// Initial visibilities plus a list of overrides indexing into them.
/// Overrides may repeat a node.
pub fn arb_visibility_with_overrides(
    max_nodes: usize,
    max_overrides: usize,
) -> BoxedStrategy<(Vec<bool>, Vec<(usize, bool)>)> {
    arb_visibility(max_nodes)
        .prop_flat_map(move |visible| {
            let n = visible.len();
            let overrides = prop::collection::vec((0..n, any::<bool>()), 0..=max_overrides);
            (Just(visible), overrides)
        })
        .boxed()
}

/// A document whose current page holds one rectangle per entry of `visible`.
pub fn flat_doc(visible: &[bool]) -> (MemoryDocument, Vec<NodeId>) {
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
            .expect("add node")
        })
        .collect();
    (doc, ids)
}

pub fn overrides_for(ids: &[NodeId], overrides: &[(usize, bool)]) -> Vec<VisibilityOverride> {
    overrides
        .iter()
        .map(|&(i, visible)| VisibilityOverride::new(ids[i], visible))
        .collect()
}

pub fn visibility_of<D: Document>(doc: &D, ids: &[NodeId]) -> Vec<bool> {
    ids.iter()
        .map(|&id| doc.is_visible(id).expect("visible"))
        .collect()
}
