//! Export of selected entries to a spreadsheet-style CSV file.
//!
//! Columns are fixed: `Title, Link, Description, Tags`. Tags are joined into a
//! single cell. The file is written to a temporary sibling and renamed into
//! place, so a failed export never leaves a partial file behind.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tagging::TaggedEntry;

/// Header row of every export.
pub const COLUMNS: [&str; 4] = ["Title", "Link", "Description", "Tags"];

/// Separator between tags inside the Tags cell.
pub const TAG_SEPARATOR: &str = ", ";

/// Default export file name, relative to the working directory.
pub const DEFAULT_EXPORT_FILE: &str = "selected_entries.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No selected entries to export")]
    Empty,

    #[error("Failed to write export file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode export file '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// An entry queued for export, with its description already reduced to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&TaggedEntry> for SelectedEntry {
    fn from(entry: &TaggedEntry) -> Self {
        Self {
            title: entry.entry.title.clone(),
            link: entry.entry.link.clone(),
            description: entry.text.clone(),
            tags: entry.tags.clone(),
        }
    }
}

/// A non-empty table ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    rows: Vec<[String; 4]>,
}

impl ExportTable {
    pub fn rows(&self) -> &[[String; 4]] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes header and rows as CSV, returning the number of rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<usize, csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(COLUMNS)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;

        Ok(self.rows.len())
    }

    /// Writes the table to `dst` atomically.
    ///
    /// The data goes to a randomized temp file next to `dst`, is synced, and is
    /// then renamed over `dst`. On any failure the temp file is removed and
    /// `dst` is untouched.
    pub fn write_to_path(&self, dst: &Path) -> Result<usize, ExportError> {
        let temp_path = temp_path_for(dst);
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ExportError::Write { path, source }
        };

        let mut temp_file = OpenOptions::new()
            .write(true)
            .create_new(true) // Fails if the path exists (prevents symlink race)
            .open(&temp_path)
            .map_err(write_err(&temp_path))?;

        let result = self
            .write_csv(&mut temp_file)
            .map_err(|source| ExportError::Csv {
                path: dst.to_path_buf(),
                source,
            })
            .and_then(|count| {
                temp_file.sync_all().map_err(write_err(dst))?;
                Ok(count)
            });

        let count = match result {
            Ok(count) => count,
            Err(e) => {
                drop(temp_file);
                let _ = std::fs::remove_file(&temp_path);
                return Err(e);
            }
        };
        drop(temp_file);

        // On Windows, rename fails if the destination exists
        #[cfg(windows)]
        if dst.exists() {
            if let Err(source) = std::fs::remove_file(dst) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(ExportError::Write {
                    path: dst.to_path_buf(),
                    source,
                });
            }
        }

        if let Err(source) = std::fs::rename(&temp_path, dst) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ExportError::Write {
                path: dst.to_path_buf(),
                source,
            });
        }

        tracing::info!(path = %dst.display(), rows = count, "Exported selected entries");
        Ok(count)
    }
}

/// Assembles selections into export tables.
#[derive(Debug, Clone)]
pub struct ExportBuilder {
    tag_separator: String,
}

impl Default for ExportBuilder {
    fn default() -> Self {
        Self {
            tag_separator: TAG_SEPARATOR.to_string(),
        }
    }
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag_separator(mut self, separator: &str) -> Self {
        self.tag_separator = separator.to_string();
        self
    }

    /// Builds one row per selected entry, in selection order.
    ///
    /// An empty selection is [`ExportError::Empty`]: there is nothing to
    /// write, and no file should be produced.
    pub fn build_table(&self, selection: &[SelectedEntry]) -> Result<ExportTable, ExportError> {
        if selection.is_empty() {
            return Err(ExportError::Empty);
        }

        let rows = selection
            .iter()
            .map(|s| {
                [
                    s.title.clone(),
                    s.link.clone(),
                    s.description.clone(),
                    s.tags.join(&self.tag_separator),
                ]
            })
            .collect();

        Ok(ExportTable { rows })
    }

    /// Builds the table and writes it to `path`.
    pub fn export(&self, selection: &[SelectedEntry], path: &Path) -> Result<usize, ExportError> {
        self.build_table(selection)?.write_to_path(path)
    }
}

fn temp_path_for(dst: &Path) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
    dst.with_file_name(format!(".{file_name}.tmp.{random_suffix:016x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn selected(title: &str, tags: &[&str]) -> SelectedEntry {
        SelectedEntry {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            description: format!("{title} description"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_selection_is_nothing_to_export() {
        let err = ExportBuilder::new().build_table(&[]).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
        assert_eq!(err.to_string(), "No selected entries to export");
    }

    #[test]
    fn test_empty_selection_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let result = ExportBuilder::new().export(&[], &path);
        assert!(matches!(result, Err(ExportError::Empty)));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_single_row_columns_in_order() {
        let table = ExportBuilder::new()
            .build_table(&[selected("New APT campaign", &["phish", "ransomware"])])
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.rows()[0],
            [
                "New APT campaign".to_string(),
                "https://example.com/new-apt-campaign".to_string(),
                "New APT campaign description".to_string(),
                "phish, ransomware".to_string(),
            ]
        );
    }

    #[test]
    fn test_csv_output_has_header_and_quotes_commas() {
        let table = ExportBuilder::new()
            .build_table(&[selected("One", &["malware", "cloud"]), selected("Two", &[])])
            .unwrap();
        let mut buf = Vec::new();
        let count = table.write_csv(&mut buf).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "Title,Link,Description,Tags");
        assert_eq!(
            lines[1],
            "One,https://example.com/one,One description,\"malware, cloud\""
        );
        assert_eq!(lines[2], "Two,https://example.com/two,Two description,");
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_csv_surfaces_writer_errors() {
        let table = ExportBuilder::new()
            .build_table(&[selected("One", &[])])
            .unwrap();
        let err = table.write_csv(BrokenWriter).unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_custom_tag_separator() {
        let table = ExportBuilder::new()
            .with_tag_separator("|")
            .build_table(&[selected("One", &["apt", "dev"])])
            .unwrap();
        assert_eq!(table.rows()[0][3], "apt|dev");
    }

    #[test]
    fn test_write_to_path_replaces_existing_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selected_entries.csv");
        std::fs::write(&path, "stale").unwrap();

        let count = ExportBuilder::new()
            .export(&[selected("Fresh", &["trojan"])], &path)
            .unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Title,Link,Description,Tags"));
        assert!(content.contains("Fresh"));
        assert!(!content.contains("stale"));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["selected_entries.csv".to_string()]);
    }

    #[test]
    fn test_unwritable_destination_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");

        let err = ExportBuilder::new()
            .export(&[selected("One", &[])], &path)
            .unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_selected_entry_from_tagged_uses_plain_text() {
        let tagged = crate::tagging::TagExtractor::default().tag(crate::feed::FeedEntry {
            title: "T".into(),
            link: "https://example.com/t".into(),
            published: String::new(),
            description: "<p>uses <i>oauth</i></p>".into(),
        });
        let selected = SelectedEntry::from(&tagged);
        assert_eq!(selected.description, "uses oauth");
        assert_eq!(selected.tags, vec!["oauth"]);
    }
}
