// Per-turn action selection for one capture agent
//
// Defenders and unthreatened attackers pick the best one-step evaluation;
// an attacker facing a known ghost searches ahead against it.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::Config;
use crate::env::GameEnvironment;
use crate::features::{Evaluator, WeightVector};
use crate::locator::OpponentLocator;
use crate::search::{AlphaBeta, SearchStats};
use crate::types::Direction;

/// Strategy of a capture agent, fixed at team setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Offensive,
    Defensive,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Offensive => "offensive",
            Role::Defensive => "defensive",
        }
    }
}

/// Outcome of one decision, kept for logging and replay
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Direction,
    /// Value per candidate action in legal-action order
    pub values: Vec<(Direction, f64)>,
    /// True when the value came from the search tree
    pub searched: bool,
    pub stats: SearchStats,
}

pub struct CaptureAgent {
    index: usize,
    role: Role,
    evaluator: Evaluator,
    locator: OpponentLocator,
    search_depth: u32,
    rng: StdRng,
}

impl CaptureAgent {
    /// Creates an agent with the weights of its role
    ///
    /// A configured seed is offset by the agent index so teammates do not
    /// break ties in lockstep.
    pub fn new(index: usize, role: Role, config: &Config) -> Self {
        let weights = match role {
            Role::Offensive => config.weights.offensive.clone(),
            Role::Defensive => config.weights.defensive.clone(),
        };
        let rng = match config.agent.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_os_rng(),
        };

        CaptureAgent {
            index,
            role,
            evaluator: Evaluator::new(
                index,
                role,
                WeightVector::new(weights),
                config.features.clone(),
            ),
            locator: OpponentLocator::new(config.tracking.clone()),
            search_depth: config.search.depth,
            rng,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn locator(&self) -> &OpponentLocator {
        &self.locator
    }

    /// Called once before the first turn
    pub fn register_initial_state<E: GameEnvironment>(&mut self, state: &E) {
        self.locator.register(state, self.index);
        log::info!(
            "Agent {} registered as {} ({} team)",
            self.index,
            self.role.as_str(),
            if state.is_red(self.index) { "red" } else { "blue" }
        );
    }

    pub fn choose_action<E: GameEnvironment>(&mut self, state: &E) -> Direction {
        self.decide(state).action
    }

    /// Updates the opponent estimates for this turn and picks a move
    pub fn decide<E: GameEnvironment>(&mut self, state: &E) -> Decision {
        self.locator.observe(state);
        if self.role == Role::Offensive {
            let me = state.agent_position(self.index);
            self.locator.track_primary(state, me, &mut self.rng);
        }

        let search = AlphaBeta::new(self.index, self.search_depth, &self.evaluator, &self.locator);
        let searched = self.role == Role::Offensive && search.has_trackable_defender(state);

        let values: Vec<(Direction, f64)> = if searched {
            search.root_values(state)
        } else {
            state
                .legal_actions(self.index)
                .into_iter()
                .map(|action| (action, self.evaluator.evaluate(state, action, &self.locator)))
                .collect()
        };
        let stats = search.stats();

        let action = match select_best(&values, &mut self.rng) {
            Some(action) => action,
            None => {
                log::warn!("Agent {} has no legal action, stopping", self.index);
                Direction::Stop
            }
        };

        log::debug!(
            "Agent {} values {:?} (searched: {}, nodes: {})",
            self.index,
            values,
            searched,
            stats.nodes
        );

        Decision {
            action,
            values,
            searched,
            stats,
        }
    }

    /// One-step evaluation of an action with this agent's weights
    pub fn evaluate<E: GameEnvironment>(&self, state: &E, action: Direction) -> f64 {
        self.evaluator.evaluate(state, action, &self.locator)
    }
}

/// Arg-max over scored actions; exact ties are broken uniformly at random
pub fn select_best<R: Rng + ?Sized>(values: &[(Direction, f64)], rng: &mut R) -> Option<Direction> {
    let best = values
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<Direction> = values
        .iter()
        .filter(|(_, v)| *v == best)
        .map(|(a, _)| *a)
        .collect();
    match tied.choose(rng) {
        Some(action) => Some(*action),
        // Every value was NaN or -inf; any listed action will do
        None => values.first().map(|(a, _)| *a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::state::CaptureState;
    use crate::types::{AgentState, Position};
    use std::collections::HashMap;

    const ARENA: &str = "\
%%%%%%%%%%%%
%1   %    2%
%  %   %%  %
%   %    % %
%3        4%
%%%%%%%%%%%%";

    fn config() -> Config {
        Config::default_hardcoded().with_seed(7)
    }

    fn arena() -> CaptureState {
        CaptureState::new(&Layout::parse(ARENA).unwrap(), config().rules)
    }

    fn place(state: CaptureState, agent: usize, pos: Position) -> CaptureState {
        state.with_agent(
            agent,
            AgentState {
                position: Some(pos),
                ..AgentState::default()
            },
        )
    }

    #[test]
    fn test_select_best_picks_maximum() {
        let mut rng = StdRng::seed_from_u64(1);
        let values = vec![
            (Direction::North, 1.0),
            (Direction::East, 3.0),
            (Direction::Stop, -2.0),
        ];
        assert_eq!(select_best(&values, &mut rng), Some(Direction::East));
    }

    #[test]
    fn test_select_best_ties_are_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let values = vec![
            (Direction::North, 5.0),
            (Direction::South, 5.0),
            (Direction::West, 5.0),
            (Direction::East, 1.0),
        ];
        let mut counts: HashMap<Direction, u32> = HashMap::new();
        for _ in 0..3000 {
            let action = select_best(&values, &mut rng).unwrap();
            *counts.entry(action).or_insert(0) += 1;
        }
        assert_eq!(counts.get(&Direction::East), None);
        for action in [Direction::North, Direction::South, Direction::West].iter() {
            let n = counts[action];
            assert!(n > 850 && n < 1150, "{} chosen {} times", action, n);
        }
    }

    #[test]
    fn test_select_best_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(select_best(&[], &mut rng), None);
    }

    #[test]
    fn test_seeded_agents_differ_by_index() {
        let a = CaptureAgent::new(0, Role::Offensive, &config());
        let b = CaptureAgent::new(2, Role::Offensive, &config());
        let mut ra = a.rng.clone();
        let mut rb = b.rng.clone();
        let xs: Vec<u32> = (0..4).map(|_| ra.random()).collect();
        let ys: Vec<u32> = (0..4).map(|_| rb.random()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_defender_uses_flat_evaluation_with_stop() {
        let state = arena();
        let mut agent = CaptureAgent::new(2, Role::Defensive, &config());
        agent.register_initial_state(&state);
        let decision = agent.decide(&state);
        assert!(!decision.searched);
        assert!(decision.values.iter().any(|(a, _)| *a == Direction::Stop));
        assert_eq!(decision.stats, SearchStats::default());
        assert!(state.legal_actions(2).contains(&decision.action));
    }

    #[test]
    fn test_attacker_searches_against_visible_ghost() {
        let state = place(place(arena(), 0, Position::new(7, 1)), 3, Position::new(10, 3));
        let mut agent = CaptureAgent::new(0, Role::Offensive, &config());
        agent.register_initial_state(&state);
        let decision = agent.decide(&state);
        assert!(decision.searched);
        assert!(decision.stats.nodes > 0);
        assert!(decision.values.iter().all(|(a, _)| *a != Direction::Stop));
        assert_ne!(decision.action, Direction::Stop);
    }

    #[test]
    fn test_attacker_without_known_ghost_is_flat() {
        let state = place(arena(), 0, Position::new(6, 4)).observed_by(true);
        let mut agent = CaptureAgent::new(0, Role::Offensive, &config());
        agent.register_initial_state(&state);
        let decision = agent.decide(&state);
        assert!(!decision.searched);
        assert!(decision.values.iter().any(|(a, _)| *a == Direction::Stop));
    }

    #[test]
    fn test_agent_without_position_stops() {
        let state = arena().with_agent(0, AgentState::default());
        let mut agent = CaptureAgent::new(0, Role::Defensive, &config());
        agent.register_initial_state(&state);
        assert_eq!(agent.choose_action(&state), Direction::Stop);
    }

    #[test]
    fn test_attacker_tracks_primary_each_turn() {
        let state = place(arena(), 0, Position::new(6, 4)).observed_by(true);
        let mut agent = CaptureAgent::new(0, Role::Offensive, &config());
        agent.register_initial_state(&state);
        for turn in 1..=3 {
            agent.choose_action(&state);
            let tracked = agent.locator().tracked(3).unwrap();
            assert_eq!(tracked.elapsed, turn);
        }
    }
}
