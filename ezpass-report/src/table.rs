//! Generic text table renderer
//!
//! Turns an ordered sequence of records into an aligned plain-text block:
//!
//! ```text
//! ===========================
//!        Transponders
//! ===========================
//! Tag  Style    Color  Status
//! T1   Sticker  White  Active
//! ```
//!
//! Every column except the last is padded to its widest cell plus two spaces;
//! the last column is padded to exactly its widest cell. An extractor that
//! yields `None` produces an empty cell. The block ends with one blank line so
//! consecutive tables are visually separated.

use std::fmt;

/// Space between adjacent columns
const COLUMN_GAP: usize = 2;

type Extractor<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// A named column and the rule that extracts its display text from a record
pub struct Column<T> {
    name: String,
    extract: Extractor<T>,
}

impl<T> Column<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn cell(&self, record: &T) -> String {
        (self.extract)(record).unwrap_or_default()
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column").field("name", &self.name).finish()
    }
}

/// A titled table definition with an ordered list of columns
#[derive(Debug)]
pub struct Table<T> {
    title: String,
    columns: Vec<Column<T>>,
}

impl<T> Table<T> {
    /// Create a table with the given title and no columns
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: Vec::new(),
        }
    }

    /// Builder method: append a column
    ///
    /// Reusing a column name replaces the earlier extractor but keeps the
    /// earlier column's position.
    pub fn column<F>(mut self, name: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        let name = name.into();
        let extract: Extractor<T> = Box::new(extract);

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                log::warn!(
                    "Table '{}': column '{}' defined twice, keeping the last definition",
                    self.title,
                    name
                );
                existing.extract = extract;
            }
            None => self.columns.push(Column { name, extract }),
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Padded width of every column for the given records
    pub fn widths(&self, records: &[T]) -> Vec<usize> {
        let cells = self.cells(records);
        self.padded_widths(&cells)
    }

    /// Render the whole table as one block of text
    ///
    /// Pure with respect to its inputs: the same title, columns and records
    /// always produce byte-identical output.
    pub fn render(&self, records: &[T]) -> String {
        if self.columns.is_empty() {
            log::warn!("Table '{}' has no columns", self.title);
        }

        let cells = self.cells(records);
        let widths = self.padded_widths(&cells);
        let table_width: usize = widths.iter().sum();

        let mut out = String::new();
        push_divider(&mut out, table_width);
        push_title(&mut out, &self.title, table_width);
        push_divider(&mut out, table_width);

        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        push_row(&mut out, header.iter().copied(), &widths);
        for row in &cells {
            push_row(&mut out, row.iter().map(String::as_str), &widths);
        }

        out.push('\n');
        out
    }

    /// Extracted cell text, one row per record
    fn cells(&self, records: &[T]) -> Vec<Vec<String>> {
        records
            .iter()
            .map(|record| self.columns.iter().map(|c| c.cell(record)).collect())
            .collect()
    }

    fn padded_widths(&self, cells: &[Vec<String>]) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| text_width(&c.name)).collect();

        for row in cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(text_width(cell));
            }
        }

        // Gap after every column except the last
        let last = widths.len().saturating_sub(1);
        for width in widths.iter_mut().take(last) {
            *width += COLUMN_GAP;
        }
        widths
    }
}

fn text_width(text: &str) -> usize {
    text.chars().count()
}

fn push_divider(out: &mut String, width: usize) {
    out.push_str(&"=".repeat(width));
    out.push('\n');
}

fn push_title(out: &mut String, title: &str, width: usize) {
    let padding = width.saturating_sub(text_width(title)) / 2;
    out.push_str(&" ".repeat(padding));
    out.push_str(title);
    out.push('\n');
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    for (cell, width) in cells.zip(widths) {
        out.push_str(cell);
        out.push_str(&" ".repeat(width.saturating_sub(text_width(cell))));
    }
    out.push('\n');
}
