use crate::types::Position;

/// Errors that can occur while parsing a layout.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("layout is empty")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown layout character '{ch}' at {pos}")]
    UnknownChar { ch: char, pos: Position },

    #[error("agent {0} has more than one start position")]
    DuplicateStart(usize),

    #[error("agent starts are not contiguous from agent 0 (found {0:?})")]
    MissingStart(Vec<usize>),
}

/// Errors that can occur when turning a host snapshot into a game state.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid wall layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("board has {cells} cells, at most {max} are supported")]
    BoardTooLarge { cells: usize, max: usize },

    #[error("agent {0} is not part of this game")]
    UnknownAgent(usize),

    #[error("agent {index} is placed on a wall at {pos}")]
    AgentOnWall { index: usize, pos: Position },
}
