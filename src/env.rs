// The host interface the decision core runs against
//
// Everything the agents know about the game goes through this trait. The
// reference implementation is `state::CaptureState`; a host with its own
// simulator only has to implement the required methods.

use crate::layout::Grid;
use crate::types::{AgentState, Direction, Position};

pub trait GameEnvironment: Sized {
    fn num_agents(&self) -> usize;

    /// Moves the agent may take this turn; `Stop` is always among them
    fn legal_actions(&self, agent: usize) -> Vec<Direction>;

    /// The state after `agent` takes `action`; `self` is left untouched
    fn generate_successor(&self, agent: usize, action: Direction) -> Self;

    fn agent_state(&self, agent: usize) -> AgentState;

    fn agent_position(&self, agent: usize) -> Option<Position> {
        self.agent_state(agent).position
    }

    /// False while the agent sits between two cells after a half-step
    fn is_aligned(&self, _agent: usize) -> bool {
        true
    }

    fn walls(&self) -> &Grid;

    fn has_wall(&self, x: i32, y: i32) -> bool {
        self.walls().is_wall(x, y)
    }

    fn width(&self) -> i32 {
        self.walls().width()
    }

    fn height(&self) -> i32 {
        self.walls().height()
    }

    /// Shortest walking distance between two cells
    fn maze_distance(&self, a: &Position, b: &Position) -> f64;

    /// Red-positive score
    fn score(&self) -> f64;

    /// Food lying on the red half when `red_side`, else on the blue half
    fn food(&self, red_side: bool) -> Vec<Position>;

    fn capsules(&self, red_side: bool) -> Vec<Position>;

    fn is_red(&self, agent: usize) -> bool {
        agent % 2 == 0
    }

    fn opponents(&self, agent: usize) -> Vec<usize> {
        let red = self.is_red(agent);
        (0..self.num_agents())
            .filter(|i| self.is_red(*i) != red)
            .collect()
    }

    fn teammates(&self, agent: usize) -> Vec<usize> {
        let red = self.is_red(agent);
        (0..self.num_agents())
            .filter(|i| self.is_red(*i) == red)
            .collect()
    }

    /// Score from the agent's team point of view
    fn team_score(&self, agent: usize) -> f64 {
        if self.is_red(agent) {
            self.score()
        } else {
            -self.score()
        }
    }

    /// Food the agent's team is trying to eat
    fn food_to_eat(&self, agent: usize) -> Vec<Position> {
        self.food(!self.is_red(agent))
    }

    fn capsules_to_eat(&self, agent: usize) -> Vec<Position> {
        self.capsules(!self.is_red(agent))
    }

    fn capsules_to_defend(&self, agent: usize) -> Vec<Position> {
        self.capsules(self.is_red(agent))
    }
}
