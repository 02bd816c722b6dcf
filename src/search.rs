// Depth-bounded alpha-beta search against a single defender
//
// The tree alternates the acting agent (maximizer, never stops) and the last
// opponent that is not in pacman mode (minimizer, may stop). Leaves are the
// feature evaluation of the agent's pending action. There is no terminal
// check: every line is searched to the cutoff.

use rand::Rng;
use std::cell::Cell;

use crate::agent::select_best;
use crate::env::GameEnvironment;
use crate::features::{successor, Evaluator};
use crate::locator::OpponentLocator;
use crate::types::Direction;

/// Node and cutoff counters for one decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
    pub evaluations: u64,
}

pub struct AlphaBeta<'a> {
    agent: usize,
    depth: u32,
    evaluator: &'a Evaluator,
    locator: &'a OpponentLocator,
    nodes: Cell<u64>,
    cutoffs: Cell<u64>,
    evaluations: Cell<u64>,
}

impl<'a> AlphaBeta<'a> {
    /// # Arguments
    /// * `agent` - Index of the acting agent
    /// * `depth` - Minimizer depth at which lines are cut off and evaluated
    /// * `evaluator` - Leaf evaluation for the acting agent's role
    /// * `locator` - Read-only opponent estimates for the leaves
    pub fn new(
        agent: usize,
        depth: u32,
        evaluator: &'a Evaluator,
        locator: &'a OpponentLocator,
    ) -> Self {
        AlphaBeta {
            agent,
            depth,
            evaluator,
            locator,
            nodes: Cell::new(0),
            cutoffs: Cell::new(0),
            evaluations: Cell::new(0),
        }
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            nodes: self.nodes.get(),
            cutoffs: self.cutoffs.get(),
            evaluations: self.evaluations.get(),
        }
    }

    /// The opponent the search plays against: the last one listed that is
    /// currently a ghost
    pub fn defender<E: GameEnvironment>(&self, state: &E) -> Option<usize> {
        state
            .opponents(self.agent)
            .into_iter()
            .filter(|i| !state.agent_state(*i).is_pacman)
            .last()
    }

    /// True when there is a ghost with a known position to search against
    pub fn has_trackable_defender<E: GameEnvironment>(&self, state: &E) -> bool {
        self.defender(state)
            .map(|d| state.agent_position(d).is_some())
            .unwrap_or(false)
    }

    /// Legal actions of the acting agent, null move excluded
    pub fn root_actions<E: GameEnvironment>(&self, state: &E) -> Vec<Direction> {
        without_stop(state.legal_actions(self.agent))
    }

    pub fn root_values<E: GameEnvironment>(&self, state: &E) -> Vec<(Direction, f64)> {
        self.root_actions(state)
            .into_iter()
            .map(|action| (action, self.action_value(state, action)))
            .collect()
    }

    /// Best root action, ties broken uniformly at random
    pub fn best_action<E, R>(&self, state: &E, rng: &mut R) -> Option<Direction>
    where
        E: GameEnvironment,
        R: Rng + ?Sized,
    {
        let values = self.root_values(state);
        log::debug!("Agent {} search values: {:?}", self.agent, values);
        select_best(&values, rng)
    }

    /// Value of one root action. Falls back to a flat evaluation when the
    /// successor has no ghost with a known position.
    pub fn action_value<E: GameEnvironment>(&self, state: &E, action: Direction) -> f64 {
        let next = successor(state, self.agent, action);
        match self.defender(&next) {
            Some(defender) if next.agent_position(defender).is_some() => self.min_value(
                state,
                action,
                1,
                f64::NEG_INFINITY,
                f64::INFINITY,
                defender,
            ),
            _ => self.evaluate(state, action),
        }
    }

    fn evaluate<E: GameEnvironment>(&self, state: &E, action: Direction) -> f64 {
        self.evaluations.set(self.evaluations.get() + 1);
        self.evaluator.evaluate(state, action, self.locator)
    }

    /// Applies the agent's pending action and lets the defender answer
    fn min_value<E: GameEnvironment>(
        &self,
        state: &E,
        action: Direction,
        depth: u32,
        alpha: f64,
        mut beta: f64,
        defender: usize,
    ) -> f64 {
        self.nodes.set(self.nodes.get() + 1);
        if depth >= self.depth {
            return self.evaluate(state, action);
        }

        let next = state.generate_successor(self.agent, action);
        let replies = next.legal_actions(defender);
        if replies.is_empty() {
            // A defender that cannot move leaves the line as it stands
            return self.evaluate(state, action);
        }

        let mut value = f64::INFINITY;
        for reply in replies {
            value = value.min(self.max_value(&next, reply, depth + 1, alpha, beta, defender));
            if value <= alpha {
                self.cutoffs.set(self.cutoffs.get() + 1);
                return value;
            }
            beta = beta.min(value);
        }
        value
    }

    /// Applies the defender's reply and picks the agent's best follow-up
    fn max_value<E: GameEnvironment>(
        &self,
        state: &E,
        reply: Direction,
        depth: u32,
        mut alpha: f64,
        beta: f64,
        defender: usize,
    ) -> f64 {
        self.nodes.set(self.nodes.get() + 1);
        let next = state.generate_successor(defender, reply);
        let moves = without_stop(next.legal_actions(self.agent));
        if moves.is_empty() {
            return self.evaluate(&next, Direction::Stop);
        }

        let mut value = f64::NEG_INFINITY;
        for action in moves {
            value = value.max(self.min_value(&next, action, depth, alpha, beta, defender));
            if value >= beta {
                self.cutoffs.set(self.cutoffs.get() + 1);
                return value;
            }
            alpha = alpha.max(value);
        }
        value
    }
}

fn without_stop(actions: Vec<Direction>) -> Vec<Direction> {
    actions
        .into_iter()
        .filter(|a| *a != Direction::Stop)
        .collect()
}
