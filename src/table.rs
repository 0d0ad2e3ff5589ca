//! Fixed-offset parsing of the scheduler's delimited text table.
//!
//! The scheduler does not escape its delimiter inside cells, so splitting a
//! row on the delimiter is wrong as soon as a command contains it. Every
//! column is padded to a fixed width though, so the delimiter positions in the
//! header line hold for every row. Those positions are recorded once from the
//! header and reused as cut points.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("header has {found} delimiters, expected {expected}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("no data rows after the header")]
    NoDataAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub columns: Vec<String>,
    /// Character positions of the delimiter in the raw header line.
    pub offsets: Vec<usize>,
}

impl TableHeader {
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: TableHeader,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Rows as (column name, cell) pairs, in the scheduler's row order.
    pub fn records(&self) -> Vec<Vec<(&str, &str)>> {
        self.rows
            .iter()
            .map(|row| {
                self.header
                    .columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.cells.iter().map(String::as_str))
                    .collect()
            })
            .collect()
    }
}

pub fn parse_header(line: &str, delimiter: char, expected_fields: usize) -> Result<TableHeader, TableError> {
    let offsets: Vec<usize> = line
        .chars()
        .enumerate()
        .filter(|(_, ch)| *ch == delimiter)
        .map(|(i, _)| i)
        .collect();
    let expected = expected_fields.saturating_sub(1);
    if expected_fields == 0 || offsets.len() != expected {
        return Err(TableError::ColumnCountMismatch { expected, found: offsets.len() });
    }
    let columns = line.split(delimiter).map(|c| c.trim().to_string()).collect();
    Ok(TableHeader { columns, offsets })
}

/// Cuts `line` at the header's delimiter offsets. The row itself is never
/// searched for the delimiter. The last cell runs to the end of the line
/// whatever its length; a short row yields empty trailing cells.
pub fn parse_row(line: &str, header: &TableHeader) -> TableRow {
    // byte position of every char boundary, plus the end of the line
    let bounds: Vec<usize> = line
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(line.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut cells = Vec::with_capacity(header.offsets.len() + 1);
    let mut start = 0usize;
    for &offset in &header.offsets {
        cells.push(cut(line, &bounds, start, offset).trim().to_string());
        start = offset + 1;
    }
    cells.push(cut(line, &bounds, start, char_len).trim().to_string());
    TableRow { cells }
}

// Slice by char position, clamped to the line; empty when start >= end.
fn cut<'a>(line: &'a str, bounds: &[usize], start: usize, end: usize) -> &'a str {
    let last = bounds.len() - 1;
    let (start, end) = (start.min(last), end.min(last));
    if start >= end {
        ""
    } else {
        &line[bounds[start]..bounds[end]]
    }
}

/// Header line first, then data lines. Fails before any row is parsed if the
/// header is wrong, so a misaligned partial table is never returned.
pub fn parse_block(raw: &str, delimiter: char, expected_fields: usize) -> Result<Table, TableError> {
    let lines: Vec<&str> = raw.trim_end_matches(['\r', '\n']).lines().collect();
    if lines.len() < 2 {
        return Err(TableError::NoDataAvailable);
    }
    let header = parse_header(lines[0], delimiter, expected_fields)?;
    let rows: Vec<TableRow> = lines[1..].iter().map(|l| parse_row(l, &header)).collect();
    log::debug!("parsed table: {} columns, {} rows", header.columns.len(), rows.len());
    Ok(Table { header, rows })
}
