//! Delimited-file transport for pair corpora.
//!
//! Corpus loading happens before the engine runs and writing happens after it
//! returns; nothing here is touched mid-algorithm. Cells are
//! whitespace-normalized on the way in so stray padding in hand-edited
//! exports never produces phantom items.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::ColumnSpec;
use crate::data::{PairRecord, RawTable};
use crate::errors::SamplerError;
use crate::utils::normalize_item;

/// Read a delimited table with a header row.
pub fn read_delimited(path: &Path, delimiter: char) -> Result<RawTable, SamplerError> {
    let text = fs::read_to_string(path)?;
    let table = parse_delimited(&text, delimiter);
    debug!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.rows.len(),
        "read delimited table"
    );
    Ok(table)
}

/// Parse delimited text with a header row. Blank lines are ignored.
pub fn parse_delimited(text: &str, delimiter: char) -> RawTable {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return RawTable::default();
    };
    let columns = header.split(delimiter).map(normalize_item).collect();
    let rows = lines
        .map(|line| line.split(delimiter).map(normalize_item).collect())
        .collect();
    RawTable { columns, rows }
}

/// Write an augmented corpus as a delimited table with a label column.
pub fn write_delimited(
    path: &Path,
    rows: &[PairRecord],
    columns: &ColumnSpec,
    delimiter: char,
) -> Result<(), SamplerError> {
    let mut out = String::new();
    out.push_str(&format!(
        "{}{delimiter}{}{delimiter}{}\n",
        columns.source, columns.target, columns.label
    ));
    for record in rows {
        out.push_str(&format!(
            "{}{delimiter}{}{delimiter}{}\n",
            record.source,
            record.target,
            record.label.as_u8()
        ));
    }
    fs::write(path, out)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote augmented corpus");
    Ok(())
}
