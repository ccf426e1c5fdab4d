//! Header discovery and row-to-line-item binding for one grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::header::{CanonicalField, HeaderDictionary};
use crate::models::deal::LineItem;
use crate::table::Grid;

/// Line items recovered from one grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedTable {
    /// Row used as the header, `None` when no row matched a synonym.
    pub header_row: Option<u32>,
    /// Column index → canonical field for the header row.
    pub columns: BTreeMap<u32, CanonicalField>,
    pub line_items: Vec<LineItem>,
    /// Rows below the header that produced no line item.
    pub skipped_rows: usize,
}

impl MappedTable {
    pub fn has_header(&self) -> bool {
        self.header_row.is_some()
    }
}

/// Maps grids to line items through a header dictionary.
#[derive(Debug, Clone, Default)]
pub struct LineItemMapper {
    headers: HeaderDictionary,
}

impl LineItemMapper {
    pub fn new(headers: HeaderDictionary) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &HeaderDictionary {
        &self.headers
    }

    /// Map one grid.
    ///
    /// The first row holding any known header label is the header row. Rows
    /// after it with at least as many cells as header positions become line
    /// items, provided they end up with a SKU or a name.
    pub fn map(&self, grid: &Grid) -> MappedTable {
        let Some(header_row) = self.find_header_row(grid) else {
            debug!("No header row in {}-row table", grid.row_count());
            return MappedTable::default();
        };

        let columns = self.header_positions(grid, header_row);
        debug!("Header row {} maps {} columns", header_row, columns.len());

        let mut line_items = Vec::new();
        let mut skipped_rows = 0;

        for (row, cells) in grid.rows().filter(|&(r, _)| r > header_row) {
            if cells.len() < columns.len() {
                debug!("Row {} has {} cells, skipping", row, cells.len());
                skipped_rows += 1;
                continue;
            }

            let item = bind_row(cells, &columns);
            if item.is_identifiable() {
                line_items.push(item);
            } else {
                debug!("Row {} has no SKU or name, dropping", row);
                skipped_rows += 1;
            }
        }

        MappedTable {
            header_row: Some(header_row),
            columns,
            line_items,
            skipped_rows,
        }
    }

    fn find_header_row(&self, grid: &Grid) -> Option<u32> {
        grid.rows()
            .find(|(_, cells)| cells.values().any(|text| self.headers.is_header(text)))
            .map(|(row, _)| row)
    }

    /// Column → field for every recognized label in the header row. A label
    /// repeated later in the row keeps its first column.
    fn header_positions(&self, grid: &Grid, header_row: u32) -> BTreeMap<u32, CanonicalField> {
        let mut seen_labels = Vec::new();
        let mut columns = BTreeMap::new();

        let Some(cells) = grid.row(header_row) else {
            return columns;
        };

        for (&column, text) in cells {
            let Some(synonym) = self.headers.lookup(text) else {
                continue;
            };
            let label = synonym.label.trim().to_lowercase();
            if seen_labels.contains(&label) {
                continue;
            }
            seen_labels.push(label);
            columns.insert(column, synonym.field);
        }

        columns
    }
}

fn bind_row(cells: &BTreeMap<u32, String>, columns: &BTreeMap<u32, CanonicalField>) -> LineItem {
    let mut item = LineItem::default();
    let mut raw = Vec::new();

    for (column, text) in cells {
        let Some(field) = columns.get(column) else {
            continue;
        };
        if !text.trim().is_empty() {
            raw.push(text.trim());
        }
        field.apply(&mut item, text);
    }

    item.expense_raw = raw.join(" ");
    item
}
