//! Semantic roles carried by node names.
//!
//! Documents tag nodes with name prefixes (`BBox: `, `VI: `, `EN: `, `📁 `).
//! [`classify`] parses a node's kind and name once into a [`NodeRole`];
//! everything downstream matches on the variant instead of re-reading names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::node::NodeKind;

pub const BBOX_PREFIX: &str = "BBox:";
pub const VI_PREFIX: &str = "VI:";
pub const EN_PREFIX: &str = "EN:";
pub const FOLDER_MARKER: &str = "📁";
/// Suffix naming a rectangle that stands in for a missing image asset.
pub const PLACEHOLDER_SUFFIX: &str = " (PLACEHOLDER)";

/// One of the two languages a localization unit carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Vi,
    En,
}

impl Language {
    /// Lower-case code, used for filename suffixes.
    pub fn code(self) -> &'static str {
        match self {
            Language::Vi => "vi",
            Language::En => "en",
        }
    }

    /// The name prefix tagging text nodes of this language.
    pub fn prefix(self) -> &'static str {
        match self {
            Language::Vi => VI_PREFIX,
            Language::En => EN_PREFIX,
        }
    }

    /// The name a text node of this language gets for `label`.
    pub fn tag(self, label: &str) -> String {
        format!("{} {}", self.prefix(), label)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vi" => Ok(Language::Vi),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language '{}' (expected 'vi' or 'en')", other)),
        }
    }
}

/// The role a node plays, derived from its kind and name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRole {
    /// A rectangle named `BBox: <label>`.
    BoundingBox(String),
    /// A text node named `VI: <label>` or `EN: <label>`.
    Localized { language: Language, label: String },
    /// A frame named `📁 <folder>`, used only for grouping.
    Folder(String),
    Untagged,
}

impl NodeRole {
    #[inline]
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeRole::Folder(_))
    }

    /// Returns the language if this is a localized text node.
    #[inline]
    pub fn language(&self) -> Option<Language> {
        match self {
            NodeRole::Localized { language, .. } => Some(*language),
            _ => None,
        }
    }
}

/// Derives the role of a node from its kind and name.
///
/// Prefix matching is exact and case-sensitive (`vi: x` is untagged), and
/// a prefix only counts on the kind it applies to.
pub fn classify(kind: NodeKind, name: &str) -> NodeRole {
    let label = |prefix: &str| name[prefix.len()..].trim().to_string();

    match kind {
        NodeKind::Rectangle if name.starts_with(BBOX_PREFIX) => {
            NodeRole::BoundingBox(label(BBOX_PREFIX))
        }
        NodeKind::Text if name.starts_with(VI_PREFIX) => NodeRole::Localized {
            language: Language::Vi,
            label: label(VI_PREFIX),
        },
        NodeKind::Text if name.starts_with(EN_PREFIX) => NodeRole::Localized {
            language: Language::En,
            label: label(EN_PREFIX),
        },
        NodeKind::Frame if name.starts_with(FOLDER_MARKER) => {
            NodeRole::Folder(label(FOLDER_MARKER))
        }
        _ => NodeRole::Untagged,
    }
}
