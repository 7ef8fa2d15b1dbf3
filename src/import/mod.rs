//! The import orchestrator: builds localization frames from tabular rows.
//!
//! Rows are grouped per image. Each image gets a frame holding a copy of
//! its original asset (or a placeholder) and, for every text region, a
//! `VI:` and an `EN:` text node at identical geometry plus an optional
//! `BBox:` rectangle. Both languages share layout, so switching the visible
//! language never moves anything.
//!
//! Images whose source path lives in a folder are nested inside `📁` frames
//! mirroring that folder, which is how export later recovers the path.

mod rows;

pub use rows::{from_import_csv_str, normalize_folder, read_import_csv, ImportRow};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::LocframeError;
use crate::matcher::AssetIndex;
use crate::scene::{
    Color, Direction, Document, Fill, Language, NodeId, NodeSpec, Rect, Stroke, TextProps,
    BBOX_PREFIX, FOLDER_MARKER, PLACEHOLDER_SUFFIX,
};

const PLACEHOLDER_RADIUS: f64 = 8.0;
const BBOX_RADIUS: f64 = 4.0;
const BBOX_STROKE: Stroke = Stroke {
    color: Color::BBOX_RED,
    opacity: 0.7,
    weight: 2.0,
};

/// Per-run import choices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// The language left visible after import.
    pub language: Language,
    /// Draw a `BBox:` rectangle over every text region.
    pub create_bounding_boxes: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            language: Language::Vi,
            create_bounding_boxes: true,
        }
    }
}

/// What an import created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Number of image frames created.
    pub images: usize,
    /// Number of VI/EN text pairs created.
    pub text_pairs: usize,
    pub bounding_boxes: usize,
    /// Images with no matching asset.
    pub placeholders: usize,
    pub main_frame: NodeId,
}

impl ImportReport {
    pub fn message(&self) -> String {
        format!("Successfully imported {} images", self.images)
    }
}

/// Rows of one image, keyed by `(folder, image name)`.
type ImageGroups<'r> = BTreeMap<(String, String), Vec<&'r ImportRow>>;

/// Groups rows by folder key and image name, in sorted order.
fn group_rows<'r>(rows: &'r [ImportRow], settings: &Settings) -> ImageGroups<'r> {
    let mut groups: ImageGroups<'r> = BTreeMap::new();
    for row in rows {
        let folder = normalize_folder(&row.path, settings.path_root.as_deref());
        groups
            .entry((folder, row.name.trim().to_string()))
            .or_default()
            .push(row);
    }
    groups
}

/// Imports `rows` into a new main frame on the current page.
///
/// Assets are looked up on the page named by [`Settings::assets_page`]
/// with the exact → stem → substring fallback chain; a miss produces a
/// placeholder and is not an error.
///
/// # Errors
/// [`LocframeError::ConfigInvalid`] for unusable settings,
/// [`LocframeError::CsvInvalid`] if a row fails validation (both checked
/// before anything is created), or a document error.
pub fn import_rows<D: Document + ?Sized>(
    doc: &mut D,
    rows: &[ImportRow],
    options: &ImportOptions,
    settings: &Settings,
) -> Result<ImportReport, LocframeError> {
    settings
        .validate()
        .map_err(|message| LocframeError::ConfigInvalid {
            path: PathBuf::from("<settings>"),
            message,
        })?;
    for (i, row) in rows.iter().enumerate() {
        rows::validate_row(row, i + 1, Path::new("<rows>"))?;
    }

    let assets = AssetIndex::for_page_named(&*doc, &settings.assets_page)?;
    let groups = group_rows(rows, settings);

    let main_frame = doc.create_node(
        NodeSpec::frame(
            format!("Localization - {}", options.language.code().to_uppercase()),
            Rect::sized(settings.main_frame_width, settings.main_frame_height),
        )
        .with_fill(Fill::Solid {
            color: Color::BLACK,
        }),
    );

    let mut report = ImportReport {
        images: 0,
        text_pairs: 0,
        bounding_boxes: 0,
        placeholders: 0,
        main_frame,
    };
    let mut folders: BTreeMap<String, NodeId> = BTreeMap::new();
    let mut current_y = settings.frame_margin;

    for ((folder, name), entries) in &groups {
        let parent = ensure_folder(doc, main_frame, folder, settings, &mut folders)?;

        let (element, size) = match assets.resolve(name) {
            Some(found) => {
                tracing::debug!(image = %name, kind = ?found.kind, "asset matched");
                let element = doc.clone_node(found.node)?;
                doc.set_name(element, name)?;
                doc.set_position(element, 0.0, 0.0)?;
                (element, doc.bounds(found.node)?)
            }
            None => {
                tracing::info!(image = %name, "no original asset, using placeholder");
                report.placeholders += 1;
                let size = Rect::sized(settings.placeholder_width, settings.placeholder_height);
                let element = doc.create_node(
                    NodeSpec::rectangle(format!("{}{}", name, PLACEHOLDER_SUFFIX), size)
                        .with_fill(Fill::Solid {
                            color: Color::PLACEHOLDER_GRAY,
                        })
                        .with_corner_radius(PLACEHOLDER_RADIUS),
                );
                (element, size)
            }
        };

        let image_frame = doc.create_node(
            NodeSpec::frame(
                name.clone(),
                Rect::new(settings.frame_margin, current_y, size.width, size.height),
            )
            .with_fill(Fill::Solid {
                color: Color::BLACK,
            }),
        );
        doc.append_child(image_frame, element)?;

        for row in entries {
            if options.create_bounding_boxes {
                let bbox = doc.create_node(
                    NodeSpec::rectangle(format!("{} {}", BBOX_PREFIX, row.label()), row.bounds())
                        .with_stroke(BBOX_STROKE)
                        .with_corner_radius(BBOX_RADIUS),
                );
                doc.append_child(image_frame, bbox)?;
                report.bounding_boxes += 1;
            }
            for language in [Language::Vi, Language::En] {
                let text = doc.create_node(localized_text(row, language, options.language, settings));
                doc.append_child(image_frame, text)?;
            }
            report.text_pairs += 1;
        }

        doc.append_child(parent, image_frame)?;
        report.images += 1;
        current_y += size.height + settings.frame_margin;
    }

    let page = doc.current_page();
    doc.append_child(page, main_frame)?;

    tracing::info!(
        images = report.images,
        placeholders = report.placeholders,
        text_pairs = report.text_pairs,
        "import complete"
    );
    Ok(report)
}

/// Returns the frame for `folder`, creating `📁` frames along the way.
fn ensure_folder<D: Document + ?Sized>(
    doc: &mut D,
    main_frame: NodeId,
    folder: &str,
    settings: &Settings,
    folders: &mut BTreeMap<String, NodeId>,
) -> Result<NodeId, LocframeError> {
    let mut parent = main_frame;
    let mut key = String::new();

    for segment in folder.split('/').filter(|s| !s.is_empty()) {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(segment);

        parent = match folders.get(&key) {
            Some(&existing) => existing,
            None => {
                let created = doc.create_node(NodeSpec::frame(
                    format!("{} {}", FOLDER_MARKER, segment),
                    Rect::sized(settings.main_frame_width, settings.main_frame_height),
                ));
                doc.append_child(parent, created)?;
                folders.insert(key.clone(), created);
                created
            }
        };
    }
    Ok(parent)
}

fn localized_text(row: &ImportRow, language: Language, shown: Language, settings: &Settings) -> NodeSpec {
    let direction = row.direction();
    let color = match (language, direction) {
        (Language::En, _) => Color::ENGLISH_ORANGE,
        (Language::Vi, Direction::Vertical) => Color::VERTICAL_GREEN,
        (Language::Vi, Direction::Horizontal) => Color::HORIZONTAL_BLUE,
    };

    NodeSpec::text(
        language.tag(row.label()),
        row.bounds(),
        TextProps {
            characters: row.text_for(language).to_string(),
            direction,
            font_size: settings.font_size_for(row.height),
        },
    )
    .with_fill(Fill::Solid { color })
    .with_visible(language == shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{self, find_image_frames};
    use crate::scene::{MemoryDocument, NodeKind, NodeRole};

    fn row(name: &str, path: &str, text: &str, x: f64, y: f64) -> ImportRow {
        ImportRow {
            name: name.into(),
            path: path.into(),
            extract_text: text.into(),
            x,
            y,
            width: 40.0,
            height: 20.0,
            direction: None,
            vi: Some(format!("vi {}", text)),
            en: Some(format!("en {}", text)),
        }
    }

    fn doc_with_asset(name: &str) -> (MemoryDocument, NodeId) {
        let mut doc = MemoryDocument::new();
        let assets = doc.add_page("Original Assets");
        let asset = doc
            .add(
                assets,
                NodeSpec::rectangle(name, Rect::new(300.0, 300.0, 640.0, 480.0))
                    .with_fill(Fill::Image { bytes: vec![7] }),
            )
            .unwrap();
        (doc, asset)
    }

    #[test]
    fn test_import_builds_image_frame_from_asset() {
        let (mut doc, _) = doc_with_asset("hero.png");
        let rows = vec![row("hero.png", "", "Hello", 10.0, 20.0)];
        let report = import_rows(&mut doc, &rows, &ImportOptions::default(), &Settings::default()).unwrap();

        assert_eq!(report.images, 1);
        assert_eq!(report.placeholders, 0);
        assert_eq!(report.text_pairs, 1);
        assert_eq!(report.bounding_boxes, 1);
        assert_eq!(report.message(), "Successfully imported 1 images");
        assert_eq!(doc.name(report.main_frame).unwrap(), "Localization - VI");
        assert_eq!(doc.parent(report.main_frame).unwrap(), Some(doc.current_page()));

        let frame = doc.children(report.main_frame).unwrap()[0];
        assert_eq!(doc.name(frame).unwrap(), "hero.png");
        assert_eq!(doc.bounds(frame).unwrap(), Rect::new(50.0, 50.0, 640.0, 480.0));

        let children = doc.children(frame).unwrap().to_vec();
        let names: Vec<&str> = children.iter().map(|&c| doc.name(c).unwrap()).collect();
        assert_eq!(names, vec!["hero.png", "BBox: Hello", "VI: Hello", "EN: Hello"]);

        // Cloned asset sits at the frame origin and keeps its pixels
        assert_eq!(doc.bounds(children[0]).unwrap(), Rect::sized(640.0, 480.0));
        assert!(doc.fill(children[0]).unwrap().is_image());

        assert_eq!(doc.stroke(children[1]).unwrap(), Some(BBOX_STROKE));
        assert_eq!(*doc.fill(children[1]).unwrap(), Fill::None);

        assert!(doc.is_visible(children[2]).unwrap());
        assert!(!doc.is_visible(children[3]).unwrap());
        assert_eq!(doc.bounds(children[2]).unwrap(), doc.bounds(children[3]).unwrap());
        assert_eq!(doc.text(children[3]).unwrap().unwrap().characters, "en Hello");
    }

    #[test]
    fn test_missing_asset_gets_placeholder() {
        let mut doc = MemoryDocument::new();
        let rows = vec![row("ghost.png", "", "Boo", 0.0, 0.0)];
        let options = ImportOptions {
            language: Language::En,
            create_bounding_boxes: false,
        };
        let report = import_rows(&mut doc, &rows, &options, &Settings::default()).unwrap();

        assert_eq!(report.placeholders, 1);
        assert_eq!(report.bounding_boxes, 0);
        assert_eq!(doc.name(report.main_frame).unwrap(), "Localization - EN");

        let frame = doc.children(report.main_frame).unwrap()[0];
        assert_eq!(doc.bounds(frame).unwrap().width, 400.0);
        let placeholder = doc.children(frame).unwrap()[0];
        assert_eq!(doc.name(placeholder).unwrap(), "ghost.png (PLACEHOLDER)");
        assert_eq!(doc.corner_radius(placeholder).unwrap(), 8.0);
        assert_eq!(
            *doc.fill(placeholder).unwrap(),
            Fill::Solid {
                color: Color::PLACEHOLDER_GRAY
            }
        );

        let texts = &doc.children(frame).unwrap()[1..];
        assert!(!doc.is_visible(texts[0]).unwrap());
        assert!(doc.is_visible(texts[1]).unwrap());
    }

    #[test]
    fn test_frames_stack_with_margin() {
        let mut doc = MemoryDocument::new();
        let rows = vec![
            row("b.png", "", "B", 0.0, 0.0),
            row("a.png", "", "A", 0.0, 0.0),
            row("b.png", "", "B2", 1.0, 1.0),
        ];
        let report = import_rows(&mut doc, &rows, &ImportOptions::default(), &Settings::default()).unwrap();
        assert_eq!(report.images, 2);
        assert_eq!(report.text_pairs, 3);

        let frames = doc.children(report.main_frame).unwrap().to_vec();
        assert_eq!(doc.name(frames[0]).unwrap(), "a.png");
        assert_eq!(doc.bounds(frames[0]).unwrap().y, 50.0);
        assert_eq!(doc.bounds(frames[1]).unwrap().y, 50.0 + 300.0 + 50.0);
    }

    #[test]
    fn test_folders_become_nested_frames() {
        let (mut doc, _) = doc_with_asset("p1.jpg");
        let settings = Settings {
            path_root: Some("assets".into()),
            ..Settings::default()
        };
        let rows = vec![
            row("p1.jpg", "D:\\assets\\ch1\\scenes\\p1.jpg", "T", 0.0, 0.0),
            row("cover.png", "assets/cover.png", "C", 0.0, 0.0),
        ];
        let report = import_rows(&mut doc, &rows, &ImportOptions::default(), &settings).unwrap();

        let top = doc.children(report.main_frame).unwrap().to_vec();
        assert_eq!(doc.name(top[0]).unwrap(), "cover.png");
        assert_eq!(doc.role(top[1]).unwrap(), NodeRole::Folder("ch1".into()));

        let frames = find_image_frames(&doc, report.main_frame).unwrap();
        let paths: Vec<&str> = frames.iter().map(|f| f.path.as_str()).collect();
        // The cover placeholder stands in for its image, so both frames qualify
        assert_eq!(paths, vec!["", "ch1/scenes"]);
        assert_eq!(doc.kind(frames[0].node).unwrap(), NodeKind::Frame);
    }

    #[test]
    fn test_imported_bboxes_match_input_regions() {
        let (mut doc, _) = doc_with_asset("hero.png");
        let rows = vec![row("hero.png", "", "Hello", 12.4, 30.6)];
        let report = import_rows(&mut doc, &rows, &ImportOptions::default(), &Settings::default()).unwrap();

        let frame = doc.children(report.main_frame).unwrap()[0];
        let group = matcher::find_image_and_overlays(&doc, &[frame]).unwrap();
        assert_eq!(group.bounding_boxes.len(), 1);
        let area = &group.bounding_boxes[0];
        assert_eq!((area.x, area.y, area.width, area.height), (12, 31, 40, 20));
        assert_eq!(group.text_pairs[0].vi, "vi Hello");
    }

    #[test]
    fn test_invalid_settings_create_nothing() {
        let mut doc = MemoryDocument::new();
        let before = doc.len();
        let settings = Settings {
            min_font_size: 30.0,
            max_font_size: 10.0,
            ..Settings::default()
        };
        let rows = vec![row("a.png", "", "A", 0.0, 0.0)];
        let result = import_rows(&mut doc, &rows, &ImportOptions::default(), &settings);
        assert!(matches!(result, Err(LocframeError::ConfigInvalid { .. })));
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn test_invalid_row_creates_nothing() {
        let mut doc = MemoryDocument::new();
        let before = doc.len();
        let mut bad = row("a.png", "", "A", 0.0, 0.0);
        bad.width = f64::NAN;
        let result = import_rows(&mut doc, &[bad], &ImportOptions::default(), &Settings::default());
        assert!(matches!(result, Err(LocframeError::CsvInvalid { .. })));
        assert_eq!(doc.len(), before);
    }
}
