//! Node attribute types shared by every [`Document`](super::Document) implementation.

use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// The kinds of node the core understands.
///
/// Only [`NodeKind::Frame`] is a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Frame,
    Rectangle,
    Text,
    Image,
}

impl NodeKind {
    /// Returns true if nodes of this kind carry children.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Frame)
    }
}

/// An RGB color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const PLACEHOLDER_GRAY: Color = Color::rgb(0.9, 0.9, 0.9);
    pub const BBOX_RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const VERTICAL_GREEN: Color = Color::rgb(0.0, 0.7, 0.0);
    pub const HORIZONTAL_BLUE: Color = Color::rgb(0.0, 0.0, 0.8);
    pub const ENGLISH_ORANGE: Color = Color::rgb(0.8, 0.4, 0.1);

    #[inline]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// The paint filling a node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fill {
    #[default]
    None,
    Solid { color: Color },
    /// Encoded image bytes (PNG, JPEG, ...).
    Image { bytes: Vec<u8> },
}

impl Fill {
    #[inline]
    pub fn is_image(&self) -> bool {
        matches!(self, Fill::Image { .. })
    }

    /// Returns the encoded image bytes if this is an image fill.
    pub fn image_bytes(&self) -> Option<&[u8]> {
        match self {
            Fill::Image { bytes } => Some(bytes),
            _ => None,
        }
    }
}

/// An outline drawn around a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub opacity: f64,
    pub weight: f64,
}

/// Layout direction of a text run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

/// Text content and styling of a Text node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub characters: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

fn default_font_size() -> f64 {
    12.0
}

/// Everything needed to create a detached node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub name: String,
    pub bounds: Rect,
    pub visible: bool,
    pub fill: Fill,
    pub stroke: Option<Stroke>,
    pub corner_radius: f64,
    pub text: Option<TextProps>,
}

impl NodeSpec {
    /// A visible, unfilled node of the given kind and geometry.
    pub fn new(kind: NodeKind, name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            kind,
            name: name.into(),
            bounds,
            visible: true,
            fill: Fill::None,
            stroke: None,
            corner_radius: 0.0,
            text: None,
        }
    }

    pub fn frame(name: impl Into<String>, bounds: Rect) -> Self {
        Self::new(NodeKind::Frame, name, bounds)
    }

    pub fn rectangle(name: impl Into<String>, bounds: Rect) -> Self {
        Self::new(NodeKind::Rectangle, name, bounds)
    }

    pub fn text(name: impl Into<String>, bounds: Rect, props: TextProps) -> Self {
        Self {
            text: Some(props),
            ..Self::new(NodeKind::Text, name, bounds)
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Raster formats a node can be exported as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detects the format from an image extension appearing anywhere in
    /// `name` (case-insensitive). Returns `None` if no known extension occurs.
    pub fn detect(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains(".png") {
            Some(ImageFormat::Png)
        } else if lower.contains(".jpg") || lower.contains(".jpeg") {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_from_name() {
        assert_eq!(ImageFormat::detect("hero.PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect("hero.jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect("page_01.jpg (copy)"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect("hero"), None);
    }

    #[test]
    fn test_format_extension_and_mime() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::default().mime_type(), "image/png");
    }

    #[test]
    fn test_image_fill_bytes() {
        let fill = Fill::Image {
            bytes: vec![1, 2, 3],
        };
        assert!(fill.is_image());
        assert_eq!(fill.image_bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(Fill::None.image_bytes(), None);
    }
}
