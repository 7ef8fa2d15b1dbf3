//! Messages exchanged with the presentation layer.
//!
//! Both enums are internally tagged with a kebab-case `type` field, e.g.
//! `{"type": "scan-selection", "selection": [4]}`.

use serde::{Deserialize, Serialize};

use crate::bridge::CleanOptions;
use crate::export::{ExportFailure, ExportOptions, ExportedFile};
use crate::import::{ImportOptions, ImportRow};
use crate::matcher::LocalizationFrame;
use crate::scene::NodeId;
use crate::session::ScanReport;

/// A message sent to the controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Match the image and overlays in the current selection.
    ScanSelection { selection: Vec<NodeId> },
    /// Clean the last scanned image.
    CleanImage {
        #[serde(flatten)]
        options: CleanOptions,
    },
    /// The processing context finished successfully.
    ImageProcessed { bytes: Vec<u8> },
    /// The processing context failed.
    ImageProcessError { message: String },
    /// List the localization frames on the current page.
    ScanFrames,
    ExportImages {
        #[serde(flatten)]
        options: ExportOptions,
    },
    ImportLocalization {
        rows: Vec<ImportRow>,
        #[serde(flatten)]
        options: ImportOptions,
    },
}

/// A message sent back to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    ScanComplete(ScanReport),
    CleanSuccess { node: NodeId, message: String },
    FramesScanned { frames: Vec<LocalizationFrame> },
    ExportReady {
        exported_count: usize,
        files: Vec<ExportedFile>,
        failures: Vec<ExportFailure>,
    },
    ImportSuccess { main_frame: NodeId, message: String },
    Error { message: String },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Language;
    use serde_json::json;

    #[test]
    fn test_request_tags_are_kebab_case() {
        let request: Request = serde_json::from_value(json!({
            "type": "scan-selection",
            "selection": [3]
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::ScanSelection {
                selection: vec![NodeId(3)]
            }
        );

        let request: Request = serde_json::from_value(json!({ "type": "scan-frames" })).unwrap();
        assert_eq!(request, Request::ScanFrames);
    }

    #[test]
    fn test_clean_request_keeps_extra_options() {
        let request: Request = serde_json::from_value(json!({
            "type": "clean-image",
            "method": "telea",
            "radius": 5
        }))
        .unwrap();
        match request {
            Request::CleanImage { options } => {
                assert_eq!(options.method, "telea");
                assert_eq!(options.extra.get("radius"), Some(&json!(5)));
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_export_request_defaults_flags() {
        let request: Request = serde_json::from_value(json!({
            "type": "export-images",
            "frames": [7],
            "language": "en"
        }))
        .unwrap();
        match request {
            Request::ExportImages { options } => {
                assert_eq!(options.frames, vec![NodeId(7)]);
                assert_eq!(options.language, Language::En);
                assert!(!options.include_bbox);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_import_request_reads_rows() {
        let request: Request = serde_json::from_value(json!({
            "type": "import-localization",
            "language": "vi",
            "create_bounding_boxes": false,
            "rows": [{
                "name": "a.png",
                "extractText": "Hi",
                "x": 1, "y": 2, "width": 3, "height": 4
            }]
        }))
        .unwrap();
        match request {
            Request::ImportLocalization { rows, options } => {
                assert_eq!(rows[0].extract_text, "Hi");
                assert!(!options.create_bounding_boxes);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(Response::error("boom")).unwrap();
        assert_eq!(value, json!({ "type": "error", "message": "boom" }));
    }
}
