// Reference capture-game simulator
//
// Implements `GameEnvironment` so the agents can be run and tested without a
// host. Walls, distances and start cells are shared between successors; food
// and capsule lists are copied only when something is eaten.

use std::sync::Arc;

use crate::config::RulesConfig;
use crate::distancer::Distancer;
use crate::env::GameEnvironment;
use crate::error::SnapshotError;
use crate::layout::{Grid, Layout};
use crate::types::{AgentSnapshot, AgentState, BoardSnapshot, Direction, GameInfo, GameSnapshot, Position};

#[derive(Debug, Clone)]
pub struct CaptureState {
    walls: Arc<Grid>,
    distancer: Arc<Distancer>,
    starts: Arc<Vec<Option<Position>>>,
    food: Arc<Vec<Position>>,
    capsules: Arc<Vec<Position>>,
    agents: Vec<AgentState>,
    score: f64,
    rules: RulesConfig,
}

impl CaptureState {
    /// Start-of-game state with every agent on its start cell
    pub fn new(layout: &Layout, rules: RulesConfig) -> Self {
        let walls = Arc::new(layout.walls.clone());
        let distancer = Arc::new(Distancer::new(&walls));
        let agents = layout
            .agent_starts
            .iter()
            .map(|start| AgentState {
                position: Some(*start),
                ..AgentState::default()
            })
            .collect();

        CaptureState {
            walls,
            distancer,
            starts: Arc::new(layout.agent_starts.iter().copied().map(Some).collect()),
            food: Arc::new(layout.food.clone()),
            capsules: Arc::new(layout.capsules.clone()),
            agents,
            score: 0.0,
            rules,
        }
    }

    /// Rebuilds a state from a host snapshot, reusing precomputed walls and
    /// distances for the same board
    pub fn from_snapshot(
        board: &BoardSnapshot,
        walls: Arc<Grid>,
        distancer: Arc<Distancer>,
        rules: RulesConfig,
    ) -> Result<Self, SnapshotError> {
        let count = board.agents.len();
        let mut agents = vec![AgentState::default(); count];
        let mut starts = vec![None; count];

        for snap in &board.agents {
            if snap.index >= count {
                return Err(SnapshotError::UnknownAgent(snap.index));
            }
            if let Some(pos) = snap.position {
                if walls.is_wall(pos.x, pos.y) {
                    return Err(SnapshotError::AgentOnWall {
                        index: snap.index,
                        pos,
                    });
                }
            }
            agents[snap.index] = AgentState {
                position: snap.position,
                is_pacman: snap.is_pacman,
                scared_timer: snap.scared_timer,
                direction: snap.direction,
            };
            starts[snap.index] = snap.start;
        }

        Ok(CaptureState {
            walls,
            distancer,
            starts: Arc::new(starts),
            food: Arc::new(board.food.clone()),
            capsules: Arc::new(board.capsules.clone()),
            agents,
            score: board.score,
            rules,
        })
    }

    /// Serializes the state the way a host would send it
    pub fn to_snapshot(&self, game_id: &str, turn: i32, you: usize) -> GameSnapshot {
        GameSnapshot {
            game: GameInfo {
                id: game_id.to_string(),
                timeout: 0,
            },
            turn,
            you,
            board: BoardSnapshot {
                walls: self.walls.to_rows(),
                food: self.food.to_vec(),
                capsules: self.capsules.to_vec(),
                agents: self
                    .agents
                    .iter()
                    .enumerate()
                    .map(|(index, a)| AgentSnapshot {
                        index,
                        position: a.position,
                        start: self.starts[index],
                        is_pacman: a.is_pacman,
                        scared_timer: a.scared_timer,
                        direction: a.direction,
                    })
                    .collect(),
                score: self.score,
            },
        }
    }

    /// Copy of the state as seen by one team: opponents farther than the
    /// sight range from every teammate lose their position
    pub fn observed_by(&self, red: bool) -> Self {
        let mut seen = self.clone();
        let team: Vec<Position> = (0..self.agents.len())
            .filter(|i| self.is_red(*i) == red)
            .filter_map(|i| self.agents[i].position)
            .collect();

        for i in (0..self.agents.len()).filter(|i| self.is_red(*i) != red) {
            if let Some(pos) = self.agents[i].position {
                let visible = team
                    .iter()
                    .any(|mate| mate.manhattan(&pos) <= self.rules.sight_range);
                if !visible {
                    seen.agents[i].position = None;
                }
            }
        }
        seen
    }

    pub fn distancer(&self) -> &Arc<Distancer> {
        &self.distancer
    }

    /// Places an agent directly; used to set up scenarios
    pub fn with_agent(mut self, agent: usize, mut state: AgentState) -> Self {
        if let Some(pos) = state.position {
            state.is_pacman = self.on_enemy_side(agent, &pos);
        }
        self.agents[agent] = state;
        self
    }

    pub fn with_food(mut self, food: Vec<Position>) -> Self {
        self.food = Arc::new(food);
        self
    }

    pub fn with_capsules(mut self, capsules: Vec<Position>) -> Self {
        self.capsules = Arc::new(capsules);
        self
    }

    fn on_red_side(&self, pos: &Position) -> bool {
        pos.x < self.walls.width() / 2
    }

    fn on_enemy_side(&self, agent: usize, pos: &Position) -> bool {
        self.on_red_side(pos) != self.is_red(agent)
    }

    fn respawn(&mut self, agent: usize) {
        log::debug!("Agent {} sent back to start", agent);
        self.agents[agent] = AgentState {
            position: self.starts.get(agent).copied().flatten(),
            ..AgentState::default()
        };
    }

    fn consume(&mut self, agent: usize, pos: Position) {
        if !self.on_enemy_side(agent, &pos) {
            return;
        }
        if self.food.contains(&pos) {
            Arc::make_mut(&mut self.food).retain(|f| *f != pos);
            self.score += if self.is_red(agent) { 1.0 } else { -1.0 };
        }
        if self.capsules.contains(&pos) {
            Arc::make_mut(&mut self.capsules).retain(|c| *c != pos);
            let scared_time = self.rules.scared_time;
            for i in self.opponents(agent) {
                self.agents[i].scared_timer = scared_time;
            }
        }
    }

    fn resolve_collisions(&mut self, agent: usize) {
        let pos = match self.agents[agent].position {
            Some(pos) => pos,
            None => return,
        };
        for other in self.opponents(agent) {
            if self.agents[other].position != Some(pos) {
                continue;
            }
            let (pacman, ghost) = if self.agents[agent].is_pacman {
                (agent, other)
            } else if self.agents[other].is_pacman {
                (other, agent)
            } else {
                continue;
            };
            if self.agents[ghost].scared_timer > 0 {
                self.respawn(ghost);
            } else {
                self.respawn(pacman);
            }
            if self.agents[agent].position != Some(pos) {
                return;
            }
        }
    }
}

impl GameEnvironment for CaptureState {
    fn num_agents(&self) -> usize {
        self.agents.len()
    }

    fn legal_actions(&self, agent: usize) -> Vec<Direction> {
        let pos = match self.agents.get(agent).and_then(|a| a.position) {
            Some(pos) => pos,
            None => return vec![Direction::Stop],
        };
        Direction::all()
            .iter()
            .copied()
            .filter(|dir| {
                let next = dir.apply(&pos);
                !self.walls.is_wall(next.x, next.y)
            })
            .collect()
    }

    fn generate_successor(&self, agent: usize, action: Direction) -> Self {
        let mut next = self.clone();
        let pos = match next.agents[agent].position {
            Some(pos) => pos,
            None => return next,
        };

        let target = action.apply(&pos);
        let target = if self.walls.is_wall(target.x, target.y) {
            log::debug!("Agent {} bumped into a wall moving {}", agent, action);
            pos
        } else {
            target
        };

        let enemy_side = next.on_enemy_side(agent, &target);
        {
            let state = &mut next.agents[agent];
            state.position = Some(target);
            state.direction = action;
            state.is_pacman = enemy_side;
            state.scared_timer = state.scared_timer.saturating_sub(1);
        }

        if enemy_side {
            next.consume(agent, target);
        }
        next.resolve_collisions(agent);
        next
    }

    fn agent_state(&self, agent: usize) -> AgentState {
        self.agents.get(agent).cloned().unwrap_or_default()
    }

    fn walls(&self) -> &Grid {
        &self.walls
    }

    fn maze_distance(&self, a: &Position, b: &Position) -> f64 {
        self.distancer.distance(a, b)
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn food(&self, red_side: bool) -> Vec<Position> {
        self.food
            .iter()
            .filter(|f| self.on_red_side(f) == red_side)
            .copied()
            .collect()
    }

    fn capsules(&self, red_side: bool) -> Vec<Position> {
        self.capsules
            .iter()
            .filter(|c| self.on_red_side(c) == red_side)
            .copied()
            .collect()
    }
}
