#![allow(dead_code)]

use locframe::scene::{Document, Fill, MemoryDocument, NodeId, NodeSpec, Rect, TextProps};

/// A minimal uncompressed 24-bit BMP of the given size.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn image_spec(name: &str, bounds: Rect, width: u32, height: u32) -> NodeSpec {
    NodeSpec::rectangle(name, bounds).with_fill(Fill::Image {
        bytes: bmp_bytes(width, height),
    })
}

pub fn text_spec(name: &str, characters: &str, bounds: Rect) -> NodeSpec {
    NodeSpec::text(
        name,
        bounds,
        TextProps {
            characters: characters.to_string(),
            ..Default::default()
        },
    )
}

/// An "Original Assets" page holding one image asset per `(name, w, h)`.
pub fn doc_with_assets(assets: &[(&str, u32, u32)]) -> MemoryDocument {
    let mut doc = MemoryDocument::new();
    let page = doc.add_page("Original Assets");
    for &(name, w, h) in assets {
        doc.add(page, image_spec(name, Rect::sized(w as f64, h as f64), w, h))
            .expect("add asset");
    }
    doc
}

/// Visibility of every node reachable from the root, in depth-first order.
pub fn all_visibility(doc: &MemoryDocument) -> Vec<(NodeId, bool)> {
    fn walk(doc: &MemoryDocument, id: NodeId, out: &mut Vec<(NodeId, bool)>) {
        out.push((id, doc.is_visible(id).expect("visible")));
        for &child in doc.children(id).expect("children") {
            walk(doc, child, out);
        }
    }
    let mut out = Vec::new();
    walk(doc, doc.root(), &mut out);
    out
}
