use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use super::schema::{FieldSpec, Record};
use super::view::{Column, DataView};
use crate::classifier::PipelineError;

const DELIMITER: char = '\t';
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Fails with `FileNotFound` unless `path` points to an existing file.
pub fn validate_file_exists(path: &Path) -> Result<(), PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Loads a tab-separated file into a text view shaped like `R`.
///
/// The existence check runs before the file is opened.
///
/// # Errors
/// - `FileNotFound` if the path does not exist
/// - `Io` if the file cannot be read or is not valid UTF-8
/// - `MalformedRow` if a row lacks one of the declared columns
pub fn load_from_text_file<R: Record>(path: impl AsRef<Path>, has_header: bool) -> Result<DataView, PipelineError> {
    let path = path.as_ref();
    validate_file_exists(path)?;

    let reader = BufReader::new(File::open(path)?);
    let view = read_records::<R, _>(reader, path, has_header)?;
    info!("Loaded {} rows from {:?}", view.row_count(), path);
    Ok(view)
}

/// Parses tab-separated lines from `reader`. `source` is only used in error messages.
pub fn read_records<R: Record, B: BufRead>(
    reader: B,
    source: &Path,
    has_header: bool,
) -> Result<DataView, PipelineError> {
    let fields = R::fields();
    let mut indices: Vec<usize> = fields.iter().map(|f| f.index).collect();
    let mut header_pending = has_header;
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); fields.len()];

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = if line_no == 0 { line.trim_start_matches(BYTE_ORDER_MARK) } else { line.as_str() };
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(DELIMITER).collect();

        if header_pending {
            header_pending = false;
            if let Some(resolved) = resolve_header(fields, &cells) {
                debug!("Resolved columns by header: {:?}", resolved);
                indices = resolved;
            }
            continue;
        }

        for ((field, &index), values) in fields.iter().zip(&indices).zip(columns.iter_mut()) {
            let cell = cells.get(index).ok_or_else(|| PipelineError::MalformedRow {
                path: source.to_path_buf(),
                line: line_no + 1,
                message: format!(
                    "expected column {} ({}) but the row has {} columns",
                    index + 1,
                    field.name,
                    cells.len()
                ),
            })?;
            values.push(cell.to_string());
        }
    }

    let row_count = columns.first().map_or(0, Vec::len);
    let mut view = DataView::new(row_count);
    for (field, values) in fields.iter().zip(columns) {
        view.set_column(field.name, Column::Text(values))?;
    }
    Ok(view)
}

/// Maps each field to the header cell carrying its name, if every field is named.
fn resolve_header(fields: &[FieldSpec], header: &[&str]) -> Option<Vec<usize>> {
    fields
        .iter()
        .map(|field| {
            header
                .iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(field.name))
        })
        .collect()
}
