//! Tabular import input.
//!
//! One CSV row per text region:
//!
//! | Column        | Required | Meaning                                        |
//! |---------------|----------|------------------------------------------------|
//! | `name`        | yes      | image the region belongs to (`hero.png`)       |
//! | `path`        | no       | source path of the image, used for folders     |
//! | `extractText` | yes      | original text; doubles as the region label     |
//! | `x`, `y`      | yes      | region origin, relative to the image           |
//! | `width`, `height` | yes  | region size                                    |
//! | `direction`   | no       | `horizontal` (default) or `vertical`           |
//! | `vi`, `en`    | no       | translations; default to `extractText`         |

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LocframeError;
use crate::scene::{Direction, Language, Rect};

/// A single text region of the import table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "extractText")]
    pub extract_text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl ImportRow {
    /// The region label: the original text, trimmed.
    pub fn label(&self) -> &str {
        self.extract_text.trim()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Text for `language`, falling back to the original text.
    pub fn text_for(&self, language: Language) -> &str {
        let translated = match language {
            Language::Vi => self.vi.as_deref(),
            Language::En => self.en.as_deref(),
        };
        translated.unwrap_or(&self.extract_text)
    }

    /// Parsed direction. Anything but `vertical` (any case) is horizontal.
    pub fn direction(&self) -> Direction {
        match self.direction.as_deref().map(str::trim) {
            Some(d) if d.eq_ignore_ascii_case("vertical") => Direction::Vertical,
            _ => Direction::Horizontal,
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Reads import rows from a CSV file with a header line.
///
/// # Errors
/// [`LocframeError::CsvParse`] for malformed rows or missing columns,
/// [`LocframeError::CsvInvalid`] for rows with an empty name or unusable
/// geometry.
pub fn read_import_csv(path: &Path) -> Result<Vec<ImportRow>, LocframeError> {
    let file = File::open(path).map_err(LocframeError::Io)?;
    rows_from_reader(BufReader::new(file), path)
}

/// Reads import rows from a CSV string.
pub fn from_import_csv_str(csv_str: &str) -> Result<Vec<ImportRow>, LocframeError> {
    rows_from_reader(csv_str.as_bytes(), Path::new("<string>"))
}

fn rows_from_reader<R: std::io::Read>(reader: R, path: &Path) -> Result<Vec<ImportRow>, LocframeError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ImportRow = result.map_err(|source| LocframeError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        // Header is line 1
        validate_row(&row, rows.len() + 2, path)?;
        rows.push(row);
    }

    Ok(rows)
}

/// Checks the fields serde cannot.
pub(crate) fn validate_row(row: &ImportRow, line: usize, path: &Path) -> Result<(), LocframeError> {
    let invalid = |message: String| LocframeError::CsvInvalid {
        path: path.to_path_buf(),
        message,
    };

    if row.name.trim().is_empty() {
        return Err(invalid(format!("line {}: empty image name", line)));
    }
    let bounds = row.bounds();
    if !bounds.is_finite() {
        return Err(invalid(format!("line {}: non-finite geometry", line)));
    }
    if bounds.width < 0.0 || bounds.height < 0.0 {
        return Err(invalid(format!(
            "line {}: negative size {}x{}",
            line, bounds.width, bounds.height
        )));
    }
    Ok(())
}

// ============================================================================
// Path normalization
// ============================================================================

/// Derives the folder key of an image from its source path.
///
/// Backslashes become slashes, empty segments and a leading drive (`C:`)
/// are dropped, and so is every segment up to and including `root` when it
/// occurs. The last segment is the file name and never part of the key.
pub fn normalize_folder(path: &str, root: Option<&str>) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();

    if segments.first().is_some_and(|s| is_drive(s)) {
        segments.remove(0);
    }
    if let Some(root) = root {
        if let Some(pos) = segments.iter().position(|s| *s == root) {
            segments.drain(..=pos);
        }
    }
    segments.pop();

    segments.join("/")
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
name,path,extractText,x,y,width,height,direction,vi,en
hero.png,C:\\work\\assets\\ch1\\hero.png,Hello,10,20,100,30,vertical,Xin chao,Hi
hero.png,C:\\work\\assets\\ch1\\hero.png,Bye,5,5,10,10,,,
";

    #[test]
    fn test_read_rows_with_optional_columns() {
        let rows = from_import_csv_str(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].direction(), Direction::Vertical);
        assert_eq!(rows[0].text_for(Language::Vi), "Xin chao");
        assert_eq!(rows[0].text_for(Language::En), "Hi");

        assert_eq!(rows[1].direction(), Direction::Horizontal);
        assert_eq!(rows[1].text_for(Language::Vi), "Bye");
        assert_eq!(rows[1].text_for(Language::En), "Bye");
    }

    #[test]
    fn test_missing_optional_columns() {
        let rows = from_import_csv_str("name,extractText,x,y,width,height\na.png,T,1,2,3,4\n").unwrap();
        assert_eq!(rows[0].path, "");
        assert_eq!(rows[0].direction(), Direction::Horizontal);
        assert_eq!(rows[0].bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_missing_required_column_is_parse_error() {
        let result = from_import_csv_str("name,extractText,x,y,width\na.png,T,1,2,3\n");
        assert!(matches!(result, Err(LocframeError::CsvParse { .. })));
    }

    #[test]
    fn test_invalid_rows_report_line() {
        let result = from_import_csv_str("name,extractText,x,y,width,height\na.png,T,1,2,3,4\n ,T,1,2,3,4\n");
        match result {
            Err(LocframeError::CsvInvalid { message, .. }) => assert!(message.contains("line 3")),
            other => panic!("unexpected result: {:?}", other),
        }

        let result = from_import_csv_str("name,extractText,x,y,width,height\na.png,T,1,2,-3,4\n");
        assert!(matches!(result, Err(LocframeError::CsvInvalid { .. })));
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("C:\\work\\assets\\ch1\\hero.png", None), "work/assets/ch1");
        assert_eq!(
            normalize_folder("C:\\work\\assets\\ch1\\hero.png", Some("assets")),
            "ch1"
        );
        assert_eq!(normalize_folder("/a//b/c.png", None), "a/b");
        assert_eq!(normalize_folder("hero.png", None), "");
        assert_eq!(normalize_folder("", Some("assets")), "");
        assert_eq!(normalize_folder("x/assets/hero.png", Some("assets")), "");
        assert_eq!(normalize_folder("x/y/hero.png", Some("missing")), "x/y");
    }
}
