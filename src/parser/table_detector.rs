//! Table detection from text positions.
//!
//! Worksheets draw tables as text laid out in aligned columns; ruling lines
//! are not consulted. A row splits into cells wherever the horizontal gap
//! between spans is wide, and consecutive rows whose cells start at the same
//! x positions form a table.

use crate::model::{Paragraph, Table, TableCell, TableRow};

use super::layout::{append_spans, TextSpan};

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row (PDF coordinates)
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    /// Left edge of each column
    pub columns: Vec<f32>,
    /// Right edge of the widest cell in the last column
    pub right_x: f32,
    /// Rows, top to bottom
    pub rows: Vec<CandidateRow>,
}

/// A row of spans split into cells.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    /// Baseline of the row
    pub y: f32,
    /// Cells left to right; each cell holds its spans sorted by x
    pub cells: Vec<Vec<TextSpan>>,
}

impl CandidateRow {
    fn cell_starts(&self) -> Vec<f32> {
        self.cells
            .iter()
            .filter_map(|c| c.first().map(|s| s.x))
            .collect()
    }

    fn right(&self) -> f32 {
        self.cells
            .iter()
            .flatten()
            .map(|s| s.right())
            .fold(f32::MIN, f32::max)
    }

    fn into_spans(self) -> impl Iterator<Item = TextSpan> {
        self.cells.into_iter().flatten()
    }
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of cells a row needs to take part in a table
    pub min_columns: usize,
    /// Rows with more cells than this are treated as spaced-out prose
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// How far apart two cell starts may be and still share a column (points)
    pub column_tolerance: f32,
    /// Minimum gap between spans that separates two cells (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            column_tolerance: 6.0,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Split spans into detected tables and the spans that remain outside them.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        let rows = self.group_into_rows(spans);

        let mut tables = Vec::new();
        let mut remaining = Vec::new();
        let mut region: Vec<CandidateRow> = Vec::new();
        let mut anchors: Vec<f32> = Vec::new();

        for row in rows {
            let is_candidate = (self.config.min_columns..=self.config.max_columns)
                .contains(&row.cells.len());

            if is_candidate && !region.is_empty() && self.fits_columns(&row, &anchors) {
                region.push(row);
                continue;
            }

            self.flush_region(&mut region, &anchors, &mut tables, &mut remaining);

            if is_candidate {
                anchors = row.cell_starts();
                region.push(row);
            } else {
                remaining.extend(row.into_spans());
            }
        }
        self.flush_region(&mut region, &anchors, &mut tables, &mut remaining);

        if !tables.is_empty() {
            log::debug!("detected {} table(s)", tables.len());
        }
        (tables, remaining)
    }

    fn flush_region(
        &self,
        region: &mut Vec<CandidateRow>,
        anchors: &[f32],
        tables: &mut Vec<DetectedTable>,
        remaining: &mut Vec<TextSpan>,
    ) {
        if region.is_empty() {
            return;
        }
        let rows = std::mem::take(region);

        if rows.len() < self.config.min_rows || is_list_pattern(&rows) {
            remaining.extend(rows.into_iter().flat_map(CandidateRow::into_spans));
            return;
        }

        let right_x = rows.iter().map(CandidateRow::right).fold(f32::MIN, f32::max);
        tables.push(DetectedTable {
            top_y: rows[0].y,
            bottom_y: rows[rows.len() - 1].y,
            columns: anchors.to_vec(),
            right_x,
            rows,
        });
    }

    /// A row fits when each of its cells starts on a distinct known column.
    fn fits_columns(&self, row: &CandidateRow, anchors: &[f32]) -> bool {
        let mut used = vec![false; anchors.len()];
        for start in row.cell_starts() {
            match self.column_for(start, anchors) {
                Some(idx) if !used[idx] => used[idx] = true,
                _ => return false,
            }
        }
        true
    }

    fn column_for(&self, x: f32, anchors: &[f32]) -> Option<usize> {
        anchors
            .iter()
            .enumerate()
            .map(|(i, a)| (i, (a - x).abs()))
            .filter(|(_, d)| *d <= self.config.column_tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Group spans into rows by baseline and split each row into cells.
    fn group_into_rows(&self, mut spans: Vec<TextSpan>) -> Vec<CandidateRow> {
        spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut grouped: Vec<(f32, Vec<TextSpan>)> = Vec::new();
        for span in spans {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match grouped.last_mut() {
                Some((y, row)) if (span.y - *y).abs() <= tolerance => row.push(span),
                _ => grouped.push((span.y, vec![span])),
            }
        }

        grouped
            .into_iter()
            .map(|(y, mut row)| {
                row.sort_by(|a, b| a.x.total_cmp(&b.x));
                CandidateRow {
                    y,
                    cells: self.split_cells(row),
                }
            })
            .collect()
    }

    fn split_cells(&self, row: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
        let mut cells: Vec<Vec<TextSpan>> = Vec::new();
        for span in row {
            match cells.last_mut() {
                Some(cell)
                    if cell
                        .last()
                        .map(|prev| span.x - prev.right() < self.config.min_column_gap)
                        .unwrap_or(false) =>
                {
                    cell.push(span)
                }
                _ => cells.push(vec![span]),
            }
        }
        cells
    }

    /// Convert a detected table into the document model.
    ///
    /// Rows with fewer cells than columns get empty cells where nothing was
    /// printed, so every row has the same width.
    pub fn to_table_model(&self, detected: &DetectedTable) -> Table {
        let column_count = detected.columns.len();
        let mut table = Table::new();

        for row in &detected.rows {
            let mut cells = vec![TableCell::empty(); column_count];
            for cell_spans in &row.cells {
                let Some(first) = cell_spans.first() else {
                    continue;
                };
                let Some(idx) = self.column_for(first.x, &detected.columns) else {
                    continue;
                };
                let mut paragraph = Paragraph::new();
                append_spans(&mut paragraph, cell_spans);
                cells[idx] = TableCell::with_content(vec![paragraph]);
            }
            table.add_row(TableRow::new(cells));
        }

        let mut widths: Vec<f32> = detected
            .columns
            .windows(2)
            .map(|w| (w[1] - w[0]).max(1.0))
            .collect();
        if let Some(last) = detected.columns.last() {
            widths.push((detected.right_x - last).max(36.0));
        }
        table.column_widths = Some(widths);

        table
    }
}

/// Bulleted and numbered lists also line up in two columns; reject a region
/// whose first column is made of list markers.
fn is_list_pattern(rows: &[CandidateRow]) -> bool {
    let markers = rows
        .iter()
        .filter(|row| {
            row.cells
                .first()
                .map(|cell| {
                    let text: String = cell.iter().map(|s| s.text.as_str()).collect();
                    is_list_marker(&text)
                })
                .unwrap_or(false)
        })
        .count();

    markers * 2 >= rows.len() && rows.iter().all(|r| r.cells.len() <= 2)
}

/// Check if a text string looks like a list marker (number, bullet, etc.).
fn is_list_marker(text: &str) -> bool {
    is_bullet_marker(text) || is_number_marker(text)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "►" | "■" | "●" | "□" | "◆" | "➤"
    )
}

/// `1.`, `12)`, a bare number, or a single letter followed by `.` or `)`.
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let Some(body) = cleaned
        .strip_suffix('.')
        .or_else(|| cleaned.strip_suffix(')'))
    else {
        return false;
    };
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => true,
        _ => !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()),
    }
}
