// Maze layouts in the capture text format
//
// `%` wall, `.` food, `o` capsule, `1`-`4` agent starts, anything else open.
// The first text row is the top of the board (largest y).

use crate::error::LayoutError;
use crate::types::Position;

/// Point-symmetric 32x16 board; red starts on the left, blue on the right
pub const DEFAULT_LAYOUT: &str = "\
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
%.....%.......o%%......%%%....4%
%.%%%.%.%%%%%.%%...%%.....%%..2%
%.%.....%...........%%%%%.%%.%%%
%.%.%%%.%.%%%%.%%%%.....%......%
%...%o....%.........%%%.%.%%%%.%
%%%.%.%%%.%.%%%%.%%...%...%....%
%.....%.......%..%..%...%.%.%%.%
%.%%.%.%...%..%..%.......%.....%
%....%...%...%%.%%%%.%.%%%.%.%%%
%.%%%%.%.%%%.........%....o%...%
%......%.....%%%%.%%%%.%.%%%.%.%
%%%.%%.%%%%%...........%.....%.%
%1..%%.....%%...%%.%%%%%.%.%%%.%
%3....%%%......%%o.......%.....%
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%";

/// Boolean wall grid; anything outside the board counts as a wall
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            cells: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn index(&self, pos: &Position) -> Option<usize> {
        if self.in_bounds(pos.x, pos.y) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        match self.index(&Position::new(x, y)) {
            Some(i) => self.cells[i],
            None => true,
        }
    }

    pub fn set(&mut self, pos: Position, wall: bool) {
        if let Some(i) = self.index(&pos) {
            self.cells[i] = wall;
        }
    }

    pub fn open_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_wall(x, y) {
                    cells.push(Position::new(x, y));
                }
            }
        }
        cells
    }

    /// Renders walls back into layout rows, top row first
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.is_wall(x, y) { '%' } else { ' ' })
                    .collect()
            })
            .collect()
    }

    /// Parses only the wall characters of layout rows
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let (width, height) = dimensions(rows)?;
        let mut grid = Grid::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            let y = height - 1 - row as i32;
            for (x, ch) in line.as_ref().chars().enumerate() {
                grid.set(Position::new(x as i32, y), ch == '%');
            }
        }
        Ok(grid)
    }
}

/// A complete starting board
#[derive(Debug, Clone)]
pub struct Layout {
    pub walls: Grid,
    pub food: Vec<Position>,
    pub capsules: Vec<Position>,
    /// Start cell per agent index
    pub agent_starts: Vec<Position>,
}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .collect();
        let (width, height) = dimensions(&rows)?;

        let mut walls = Grid::new(width, height);
        let mut food = Vec::new();
        let mut capsules = Vec::new();
        let mut starts: Vec<Option<Position>> = vec![None; 4];

        for (row, line) in rows.iter().enumerate() {
            let y = height - 1 - row as i32;
            for (x, ch) in line.chars().enumerate() {
                let pos = Position::new(x as i32, y);
                match ch {
                    '%' => walls.set(pos, true),
                    '.' => food.push(pos),
                    'o' => capsules.push(pos),
                    '1'..='4' => {
                        let index = ch as usize - '1' as usize;
                        if starts[index].replace(pos).is_some() {
                            return Err(LayoutError::DuplicateStart(index));
                        }
                    }
                    ' ' => {}
                    other => return Err(LayoutError::UnknownChar { ch: other, pos }),
                }
            }
        }

        let found: Vec<usize> = (0..4).filter(|i| starts[*i].is_some()).collect();
        let agent_starts: Vec<Position> = starts.iter().map_while(|s| *s).collect();
        if agent_starts.len() != found.len() || agent_starts.len() < 2 {
            return Err(LayoutError::MissingStart(found));
        }

        food.sort();
        capsules.sort();

        Ok(Layout {
            walls,
            food,
            capsules,
            agent_starts,
        })
    }

    pub fn default_capture() -> Self {
        // The built-in layout is covered by tests
        Layout::parse(DEFAULT_LAYOUT).unwrap_or_else(|e| panic!("default layout: {}", e))
    }

    pub fn width(&self) -> i32 {
        self.walls.width()
    }

    pub fn height(&self) -> i32 {
        self.walls.height()
    }
}

fn dimensions<S: AsRef<str>>(rows: &[S]) -> Result<(i32, i32), LayoutError> {
    let first = rows.first().ok_or(LayoutError::Empty)?;
    let width = first.as_ref().chars().count();
    if width == 0 {
        return Err(LayoutError::Empty);
    }
    for (row, line) in rows.iter().enumerate() {
        let found = line.as_ref().chars().count();
        if found != width {
            return Err(LayoutError::Ragged {
                row,
                found,
                expected: width,
            });
        }
    }
    Ok((width as i32, rows.len() as i32))
}
