//! Table reconstruction from TABLE and CELL blocks.
//!
//! Geometry is never inferred: row and column come straight from the
//! provider's 1-based `RowIndex` / `ColumnIndex` on each CELL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::BlockGraph;
use crate::models::block::{Block, BlockType};

/// Row → column → cell text for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: BTreeMap<u32, BTreeMap<u32, String>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cell, replacing any text already at that position.
    pub fn insert(&mut self, row: u32, column: u32, text: impl Into<String>) {
        self.rows.entry(row).or_default().insert(column, text.into());
    }

    /// Rows in ascending index order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u32, String>)> {
        self.rows.iter().map(|(&r, cells)| (r, cells))
    }

    /// Cells of one row, if the row exists.
    pub fn row(&self, row: u32) -> Option<&BTreeMap<u32, String>> {
        self.rows.get(&row)
    }

    /// Text at one position.
    pub fn cell(&self, row: u32, column: u32) -> Option<&str> {
        self.rows.get(&row)?.get(&column).map(String::as_str)
    }

    /// Number of rows that have at least one cell.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Highest column index seen in any row.
    pub fn column_count(&self) -> u32 {
        self.rows
            .values()
            .filter_map(|cells| cells.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain text rendering, one row per line, cells separated by ` | `.
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|(r, cells)| {
                let line = cells.values().map(String::as_str).collect::<Vec<_>>().join(" | ");
                format!("{:>3}: {}", r, line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds grids from TABLE blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReconstructor;

impl TableReconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Build the grid for one TABLE block.
    pub fn reconstruct(&self, graph: &BlockGraph<'_>, table: &Block) -> Grid {
        let mut grid = Grid::new();

        for cell in graph
            .children(table)
            .filter(|b| b.block_type == BlockType::Cell)
        {
            let (Some(row), Some(column)) = (cell.row_index, cell.column_index) else {
                debug!("Cell {} has no row/column index, skipping", cell.id);
                continue;
            };

            grid.insert(row, column, graph.text_of(cell));
        }

        debug!(
            "Reconstructed table {}: {} rows, {} columns",
            table.id,
            grid.row_count(),
            grid.column_count()
        );

        grid
    }

    /// Build one grid per TABLE block, in provider order.
    pub fn reconstruct_all(&self, graph: &BlockGraph<'_>) -> Vec<Grid> {
        graph.tables().map(|t| self.reconstruct(graph, t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_blocks() -> Vec<Block> {
        vec![
            Block::new("t1", BlockType::Table).with_children(["c11", "c12", "c21", "c22", "w-stray"]),
            Block::cell("c11", 1, 1).with_children(["w1"]),
            Block::cell("c12", 1, 2).with_children(["w2", "w3"]),
            Block::cell("c21", 2, 1).with_children(["w4", "missing"]),
            Block::cell("c22", 2, 2),
            Block::word("w1", "Qty"),
            Block::word("w2", "Unit"),
            Block::word("w3", "Price"),
            Block::word("w4", "5"),
            Block::word("w-stray", "noise"),
        ]
    }

    #[test]
    fn test_reconstruct_grid() {
        let graph = BlockGraph::new(table_blocks()).unwrap();
        let table = graph.get("t1").unwrap();
        let grid = TableReconstructor::new().reconstruct(&graph, table);

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.cell(1, 1), Some("Qty"));
        assert_eq!(grid.cell(1, 2), Some("Unit Price"));
        assert_eq!(grid.cell(2, 1), Some("5"));
        // A cell without words is present with empty text.
        assert_eq!(grid.cell(2, 2), Some(""));
    }

    #[test]
    fn test_out_of_range_coordinates_kept() {
        let blocks = vec![
            Block::new("t", BlockType::Table).with_children(["c"]),
            Block::cell("c", 0, 99).with_children(["w"]),
            Block::word("w", "odd"),
        ];
        let graph = BlockGraph::new(blocks).unwrap();
        let grids = TableReconstructor::new().reconstruct_all(&graph);

        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].cell(0, 99), Some("odd"));
    }

    #[test]
    fn test_tables_are_independent() {
        let blocks = vec![
            Block::new("t1", BlockType::Table).with_children(["a"]),
            Block::new("t2", BlockType::Table).with_children(["b"]),
            Block::cell("a", 1, 1).with_children(["wa"]),
            Block::cell("b", 1, 1).with_children(["wb"]),
            Block::word("wa", "first"),
            Block::word("wb", "second"),
        ];
        let graph = BlockGraph::new(blocks).unwrap();
        let grids = TableReconstructor::new().reconstruct_all(&graph);

        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].cell(1, 1), Some("first"));
        assert_eq!(grids[1].cell(1, 1), Some("second"));
    }

    #[test]
    fn test_reconstruct_is_idempotent() {
        let graph = BlockGraph::new(table_blocks()).unwrap();
        let reconstructor = TableReconstructor::new();

        assert_eq!(
            reconstructor.reconstruct_all(&graph),
            reconstructor.reconstruct_all(&graph)
        );
    }

    #[test]
    fn test_to_text() {
        let mut grid = Grid::new();
        grid.insert(1, 1, "SKU");
        grid.insert(1, 2, "Qty");
        assert_eq!(grid.to_text(), "  1: SKU | Qty");
    }
}
