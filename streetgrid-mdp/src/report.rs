//! Flat per-cell tables for plotting and export.

use serde::{Deserialize, Serialize};

use crate::GridSolution;
use crate::grid::{Action, Cell, GridMdp};
use crate::traffic::TrafficClass;

/// One grid cell with its traffic, converged value and chosen action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    pub x: usize,
    pub y: usize,
    pub traffic: TrafficClass,
    pub parameter: f64,
    pub value: f64,
    /// `None` for the terminal cell.
    pub action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridReport {
    pub size: usize,
    /// Cells in x-major order, matching [`Cell::all`].
    pub cells: Vec<CellReport>,
}

impl GridReport {
    #[must_use]
    pub fn new(mdp: &GridMdp, solution: &GridSolution) -> Self {
        let traffic_cfg = &mdp.config().traffic;
        let cells = mdp
            .traffic()
            .iter()
            .map(|(cell, traffic)| CellReport {
                x: cell.x,
                y: cell.y,
                traffic,
                parameter: traffic.parameter(traffic_cfg),
                value: solution.value(&cell).unwrap_or(0.0),
                action: solution.action(&cell),
            })
            .collect();
        Self {
            size: mdp.size(),
            cells,
        }
    }

    #[must_use]
    pub fn cell(&self, cell: Cell) -> Option<&CellReport> {
        cell.index(self.size).and_then(|idx| self.cells.get(idx))
    }

    /// Rows from the top (`y = size - 1`) down, each ordered by `x`.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellReport>> + '_ {
        (0..self.size).rev().map(move |y| {
            (0..self.size)
                .filter_map(|x| self.cell(Cell::new(x, y)))
                .collect()
        })
    }
}
