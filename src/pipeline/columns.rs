//! Column-position clustering for capability-matrix tables.
//!
//! A maturity table has six columns: the question and five levels. Text
//! arrives as independent spans with x/y origins. Each span is bucketed
//! into a column by its x origin ([`ColumnLayout`]), then spans on one page
//! are grouped into rows by y proximity ([`group_rows`]).

use crate::pipeline::source::TextSpan;
use std::fmt;

/// A semantic table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Question,
    /// Maturity level 1..=5.
    Level(u8),
}

impl Column {
    /// Position in a row's cell array: question is 0, level N is N.
    pub fn index(self) -> usize {
        match self {
            Column::Question => 0,
            Column::Level(n) => usize::from(n.clamp(1, 5)),
        }
    }
}

/// Maps an x origin to a table column.
///
/// Implement this to support a table geometry other than the May 2014
/// appendices. Returning `None` discards the span.
pub trait ColumnLayout: Send + Sync + fmt::Debug {
    fn column_for(&self, x: f32) -> Option<Column>;
}

/// A half-open `[start, end)` x range owned by one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBand {
    pub start: f32,
    pub end: f32,
    pub column: Column,
}

/// Fixed threshold table.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedColumnLayout {
    bands: Vec<ColumnBand>,
}

impl FixedColumnLayout {
    pub fn new(bands: Vec<ColumnBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[ColumnBand] {
        &self.bands
    }
}

impl Default for FixedColumnLayout {
    /// Geometry of the v3.0 capability matrices (points from the left edge).
    fn default() -> Self {
        let band = |start, end, column| ColumnBand { start, end, column };
        Self::new(vec![
            band(0.0, 155.0, Column::Question),
            band(155.0, 261.0, Column::Level(1)),
            band(261.0, 371.0, Column::Level(2)),
            band(371.0, 487.0, Column::Level(3)),
            band(487.0, 597.0, Column::Level(4)),
            band(597.0, 800.0, Column::Level(5)),
        ])
    }
}

impl ColumnLayout for FixedColumnLayout {
    fn column_for(&self, x: f32) -> Option<Column> {
        self.bands
            .iter()
            .find(|b| x >= b.start && x < b.end)
            .map(|b| b.column)
    }
}

/// A span with its assigned column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub column: Column,
}

/// Bucket spans by column, dropping those outside every band.
pub fn assign_columns(spans: &[TextSpan], layout: &dyn ColumnLayout) -> Vec<PlacedSpan> {
    spans
        .iter()
        .filter_map(|s| {
            layout.column_for(s.x).map(|column| PlacedSpan {
                text: s.text.clone(),
                x: s.x,
                y: s.y,
                column,
            })
        })
        .collect()
}

/// One reconstructed table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub page: usize,
    pub y: f32,
    /// Cell texts per column; index 0 is the question, 1..=5 the levels.
    pub cells: [Vec<String>; 6],
}

impl TableRow {
    pub fn question_text(&self) -> String {
        self.cells[0].join(" ").trim().to_string()
    }

    pub fn level_parts(&self, level: usize) -> &[String] {
        self.cells.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_level_content(&self) -> bool {
        self.cells[1..].iter().any(|c| !c.is_empty())
    }
}

/// Group one page's spans into rows.
///
/// Spans are sorted by y (then x); a span joins the open row while its y is
/// within `proximity` of the row's first span.
pub fn group_rows(mut spans: Vec<PlacedSpan>, page: usize, proximity: f32) -> Vec<TableRow> {
    spans.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<TableRow> = Vec::new();
    let mut current: Option<TableRow> = None;
    for span in spans {
        let starts_row = current
            .as_ref()
            .is_none_or(|row| (span.y - row.y).abs() >= proximity);
        if starts_row {
            rows.extend(current.take());
            current = Some(TableRow {
                page,
                y: span.y,
                ..TableRow::default()
            });
        }
        if let Some(row) = current.as_mut() {
            row.cells[span.column.index()].push(span.text);
        }
    }
    rows.extend(current);
    rows
}
