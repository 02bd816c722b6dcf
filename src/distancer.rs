// All-pairs maze distances, computed once per layout
//
// One BFS per open cell. Successor states share the table through an Arc,
// so lookups during search are a single index.

use std::collections::VecDeque;

use crate::layout::Grid;
use crate::types::Position;

/// Reported for wall cells, off-board cells and disconnected pairs
pub const UNREACHABLE_DISTANCE: f64 = 10_000.0;

const NO_PATH: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct Distancer {
    width: i32,
    cells: usize,
    distances: Vec<u32>,
}

impl Distancer {
    pub fn new(walls: &Grid) -> Self {
        let width = walls.width();
        let cells = (walls.width() * walls.height()).max(0) as usize;
        let mut distances = vec![NO_PATH; cells * cells];

        for source in walls.open_cells() {
            let src = (source.y * width + source.x) as usize;
            let row = &mut distances[src * cells..(src + 1) * cells];
            row[src] = 0;

            let mut queue = VecDeque::new();
            queue.push_back(source);
            while let Some(pos) = queue.pop_front() {
                let here = row[(pos.y * width + pos.x) as usize];
                for next in pos.neighbors().iter() {
                    if walls.is_wall(next.x, next.y) {
                        continue;
                    }
                    let idx = (next.y * width + next.x) as usize;
                    if row[idx] == NO_PATH {
                        row[idx] = here + 1;
                        queue.push_back(*next);
                    }
                }
            }
        }

        log::debug!("Computed maze distances for {} cells", cells);
        Distancer {
            width,
            cells,
            distances,
        }
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width {
            return None;
        }
        let idx = (pos.y * self.width + pos.x) as usize;
        if idx < self.cells {
            Some(idx)
        } else {
            None
        }
    }

    /// Shortest walking distance, `None` when either end is not an open
    /// cell or no path exists
    pub fn path_length(&self, a: &Position, b: &Position) -> Option<u32> {
        let (ia, ib) = (self.index(a)?, self.index(b)?);
        match self.distances[ia * self.cells + ib] {
            NO_PATH => None,
            d => Some(d),
        }
    }

    pub fn distance(&self, a: &Position, b: &Position) -> f64 {
        self.path_length(a, b)
            .map(f64::from)
            .unwrap_or(UNREACHABLE_DISTANCE)
    }
}
