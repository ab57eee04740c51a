//! XLSX to CSV conversion.
//!
//! Only the first sheet of a workbook is read. Fully blank rows are dropped,
//! the first remaining row becomes the CSV header and every following row is
//! written in order. Columns are counted from column A, so empty leading
//! columns are kept.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Range, Reader, Xlsx};
use log::debug;

use crate::error::{ExportError, Result};
use crate::url_parser::validate_file_id;

/// Tabular contents of one sheet, rendered to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    fn from_range(range: &Range<Data>) -> Self {
        // The used range starts at the first non-empty cell, not at A1.
        let leading_cols = range.start().map_or(0, |(_, col)| col as usize);

        let mut rows = range
            .rows()
            .map(|row| {
                let mut cells = vec![String::new(); leading_cols];
                cells.extend(row.iter().map(render_cell));
                cells
            })
            .filter(|cells| cells.iter().any(|c| !c.is_empty()));

        let Some(header_row) = rows.next() else {
            return Self::default();
        };

        let headers = header_row
            .into_iter()
            .enumerate()
            .map(|(col, name)| {
                if name.is_empty() {
                    format!("Unnamed: {}", col)
                } else {
                    name
                }
            })
            .collect();

        Self {
            headers,
            rows: rows.collect(),
        }
    }
}

/// Render a cell the way it should appear in the CSV.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => match cell.as_datetime() {
            Some(naive) => naive.to_string(),
            None => dt.as_f64().to_string(),
        },
    }
}

/// Parse an exported workbook held in memory and return its first sheet.
pub fn parse_workbook(file_id: &str, bytes: Vec<u8>) -> Result<SheetTable> {
    let conversion_error = |source: calamine::XlsxError| ExportError::Conversion {
        file_id: file_id.to_string(),
        source,
    };

    let mut workbook = Xlsx::new(Cursor::new(bytes)).map_err(conversion_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExportError::NoSheets(file_id.to_string()))?
        .map_err(conversion_error)?;

    let table = SheetTable::from_range(&range);
    debug!(
        "Parsed {}: {} column(s), {} row(s)",
        file_id,
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}

/// Output location for a file: `<output_dir>/<file_id>.csv`.
pub fn csv_path(output_dir: &Path, file_id: &str) -> PathBuf {
    output_dir.join(format!("{}.csv", file_id))
}

/// Write a table as comma-separated text, replacing any existing file.
pub fn write_csv(table: &SheetTable, output_dir: &Path, file_id: &str) -> Result<PathBuf> {
    validate_file_id(file_id)?;
    let path = csv_path(output_dir, file_id);
    let write_error = |source: csv::Error| ExportError::Write {
        path: path.clone(),
        source,
    };

    // Rows may be ragged relative to the header once trailing cells are empty.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&path)
        .map_err(write_error)?;

    if !table.headers.is_empty() {
        writer.write_record(&table.headers).map_err(write_error)?;
    }
    for row in &table.rows {
        writer.write_record(row).map_err(write_error)?;
    }
    writer.flush().map_err(|e| write_error(e.into()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_render_numbers() {
        assert_eq!(render_cell(&Data::Float(1.0)), "1");
        assert_eq!(render_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(render_cell(&Data::Int(-7)), "-7");
    }

    #[test]
    fn test_render_other_cells() {
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::Bool(true)), "True");
        assert_eq!(render_cell(&Data::Bool(false)), "False");
        assert_eq!(render_cell(&Data::String("a,b".into())), "a,b");
        assert_eq!(render_cell(&Data::Error(CellErrorType::Div0)), "#DIV/0!");
    }

    #[test]
    fn test_csv_path_ignores_display_name() {
        let path = csv_path(Path::new("/out"), "abc123");
        assert_eq!(path, PathBuf::from("/out/abc123.csv"));
    }

    #[test]
    fn test_garbage_is_conversion_error() {
        let err = parse_workbook("bad", b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, ExportError::Conversion { ref file_id, .. } if file_id == "bad"));
    }

    #[test]
    fn test_write_rejects_unsafe_file_id() {
        let dir = std::env::temp_dir();
        let err = write_csv(&SheetTable::default(), &dir, "../escape").unwrap_err();
        assert!(matches!(err, ExportError::InvalidUrlOrId(ref id) if id == "../escape"));
    }

    #[test]
    fn test_empty_table() {
        assert!(SheetTable::default().is_empty());
    }
}
