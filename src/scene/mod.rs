//! The host document model.
//!
//! The document tree is owned by its host. The core reads and mutates it
//! only through the [`Document`] capability trait, so any scene graph that
//! can answer those calls can be driven by the matcher and orchestrators.
//! [`MemoryDocument`] is the in-memory implementation used by the CLI and
//! by tests.
//!
//! # Naming conventions
//!
//! Node names carry semantic tags, parsed once into a [`NodeRole`]:
//!
//! | Prefix  | Kind      | Role                                   |
//! |---------|-----------|----------------------------------------|
//! | `BBox:` | Rectangle | bounding box over a text region        |
//! | `VI:`   | Text      | Vietnamese text for a region           |
//! | `EN:`   | Text      | English text for a region              |
//! | `📁`    | Frame     | folder used only to group image frames |
//!
//! # Example
//!
//! ```
//! use locframe::scene::{Document, MemoryDocument, NodeSpec, Rect, NodeRole};
//!
//! let mut doc = MemoryDocument::new();
//! let page = doc.current_page();
//! let frame = doc.add(page, NodeSpec::frame("hero", Rect::sized(800.0, 600.0))).unwrap();
//! let bbox = doc
//!     .add(frame, NodeSpec::rectangle("BBox: title", Rect::new(10.0, 10.0, 50.0, 20.0)))
//!     .unwrap();
//! assert_eq!(doc.role(bbox).unwrap(), NodeRole::BoundingBox("title".into()));
//! ```

mod document;
mod ids;
pub mod io_json;
mod memory;
mod node;
mod rect;
mod role;

pub use document::Document;
pub use ids::NodeId;
pub use memory::MemoryDocument;
pub use node::{Color, Direction, Fill, ImageFormat, NodeKind, NodeSpec, Stroke, TextProps};
pub use rect::{PixelRect, Rect};
pub use role::{
    classify, Language, NodeRole, BBOX_PREFIX, EN_PREFIX, FOLDER_MARKER, PLACEHOLDER_SUFFIX, VI_PREFIX,
};
