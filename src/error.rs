use std::path::PathBuf;
use thiserror::Error;

use crate::scene::NodeId;

/// The main error type for locframe operations.
#[derive(Debug, Error)]
pub enum LocframeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scene JSON from {path}: {source}")]
    SceneJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write scene JSON to {path}: {source}")]
    SceneJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize output: {0}")]
    OutputJson(#[source] serde_json::Error),

    #[error("Invalid scene: {message}")]
    SceneInvalid { message: String },

    #[error("Failed to parse CSV from {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid CSV in {path}: {message}")]
    CsvInvalid { path: PathBuf, message: String },

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Nothing, or the wrong shape, was selected.
    #[error("Selection error: {0}")]
    Selection(String),

    /// A required element was not found in the selection.
    #[error("Match error: {0}")]
    Match(String),

    /// A node name would place an exported file outside the output directory.
    #[error("Unsafe output path '{path}': segment '{segment}' is not a plain name")]
    UnsafeOutputPath { path: String, segment: String },

    #[error("Node {0} not found in document")]
    NodeNotFound(NodeId),

    /// A processing request was issued while another one is outstanding.
    #[error("A processing request is already in flight")]
    BridgeBusy,

    #[error("Processing bridge closed before a reply arrived")]
    BridgeClosed,

    /// The isolated processing context reported a failure.
    #[error("Processing failed: {0}")]
    Processing(String),
}
