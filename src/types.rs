// Capture game types shared by the decision core, the reference environment
// and the HTTP adapter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 2D grid cell; `y` grows northward
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The four grid-adjacent cells in west, east, south, north order
    pub fn neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
            Position::new(self.x, self.y - 1),
            Position::new(self.x, self.y + 1),
        ]
    }

    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The five moves an agent can make; `Stop` is the null move
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Stop,
}

impl Direction {
    /// Returns all possible directions, null move last
    pub fn all() -> [Direction; 5] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Stop,
        ]
    }

    /// Converts direction to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
            Direction::Stop => "Stop",
        }
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Stop => Direction::Stop,
        }
    }

    /// Calculates the next position when moving in this direction
    pub fn apply(&self, pos: &Position) -> Position {
        match self {
            Direction::North => Position::new(pos.x, pos.y + 1),
            Direction::South => Position::new(pos.x, pos.y - 1),
            Direction::East => Position::new(pos.x + 1, pos.y),
            Direction::West => Position::new(pos.x - 1, pos.y),
            Direction::Stop => *pos,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Stop
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "north" => Ok(Direction::North),
            "south" => Ok(Direction::South),
            "east" => Ok(Direction::East),
            "west" => Ok(Direction::West),
            "stop" => Ok(Direction::Stop),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the environment reveals about one agent
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct AgentState {
    /// `None` when the agent is out of sight
    pub position: Option<Position>,
    pub is_pacman: bool,
    pub scared_timer: u32,
    pub direction: Direction,
}

/// Game metadata sent with every request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameInfo {
    pub id: String,
    #[serde(default)]
    pub timeout: u32,
}

/// One agent as seen by the requesting team
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AgentSnapshot {
    pub index: usize,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub start: Option<Position>,
    #[serde(default)]
    pub is_pacman: bool,
    #[serde(default)]
    pub scared_timer: u32,
    #[serde(default)]
    pub direction: Direction,
}

/// Board state: wall rows in layout text format plus the moving parts
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BoardSnapshot {
    /// Layout rows, top row first; only walls (`%`) are read from them
    pub walls: Vec<String>,
    pub food: Vec<Position>,
    pub capsules: Vec<Position>,
    pub agents: Vec<AgentSnapshot>,
    /// Red-positive score
    pub score: f64,
}

/// Complete request body received from the host
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameSnapshot {
    pub game: GameInfo,
    pub turn: i32,
    /// Index of the agent the host wants a move for
    pub you: usize,
    pub board: BoardSnapshot,
}
