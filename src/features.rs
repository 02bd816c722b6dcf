// Linear feature evaluation
//
// evaluate(state, action) = features(successor) . weights
//
// Features are rebuilt for every call and never cached. The only outside
// input is a read-only borrow of the agent's opponent locator, so repeated
// calls with the same arguments return the same value.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use crate::agent::Role;
use crate::config::FeatureConfig;
use crate::env::GameEnvironment;
use crate::locator::{nearest_legal_location, OpponentLocator};
use crate::types::{Direction, Position};

/// Feature names, shared with the weight tables in Capture.toml
pub mod names {
    pub const SUCCESSOR_SCORE: &str = "successorScore";
    pub const AVERAGE_DIST: &str = "averageDist";
    pub const MIN_DIST: &str = "minDist";
    pub const FOOD_REMAINING: &str = "foodRemaining";
    pub const DIST_TO_ENEMY: &str = "dist2enemy";
    pub const SCARED_TIME: &str = "scaredTime";
    pub const DIST_TO_CAPSULES: &str = "dist2Capsules";

    pub const NOISY_DISTANCE_TO_INVADER: &str = "noisyDistanceToInvader";
    pub const ON_DEFENSE: &str = "onDefense";
    pub const DISTANCE_TO_CAPSULE: &str = "distanceToCapsule";
    pub const NUM_INVADERS: &str = "numInvaders";
    pub const INVADER_DISTANCE: &str = "invaderDistance";
    pub const STOP: &str = "stop";
    pub const REVERSE: &str = "reverse";
}

use names::*;

/// Named feature values for one (state, action) pair; missing names are 0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    values: BTreeMap<&'static str, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        FeatureVector::default()
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn dot(&self, weights: &WeightVector) -> f64 {
        self.values
            .iter()
            .map(|(name, value)| value * weights.get(name))
            .sum()
    }
}

/// Static per-role weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        WeightVector { weights }
    }

    /// Weight of a feature; features without a weight contribute nothing
    pub fn get(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }
}

/// Applies an action for `agent`, taking a second step if the first one
/// stopped halfway between cells
pub fn successor<E: GameEnvironment>(state: &E, agent: usize, action: Direction) -> E {
    let next = state.generate_successor(agent, action);
    if next.is_aligned(agent) {
        next
    } else {
        next.generate_successor(agent, action)
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    agent: usize,
    role: Role,
    weights: WeightVector,
    thresholds: FeatureConfig,
}

impl Evaluator {
    pub fn new(agent: usize, role: Role, weights: WeightVector, thresholds: FeatureConfig) -> Self {
        Evaluator {
            agent,
            role,
            weights,
            thresholds,
        }
    }

    /// Linear combination of features and weights
    pub fn evaluate<E: GameEnvironment>(
        &self,
        state: &E,
        action: Direction,
        locator: &OpponentLocator,
    ) -> f64 {
        self.features(state, action, locator).dot(&self.weights)
    }

    pub fn features<E: GameEnvironment>(
        &self,
        state: &E,
        action: Direction,
        locator: &OpponentLocator,
    ) -> FeatureVector {
        match self.role {
            Role::Offensive => self.offensive_features(state, action, locator),
            Role::Defensive => self.defensive_features(state, action, locator),
        }
    }

    fn offensive_features<E: GameEnvironment>(
        &self,
        state: &E,
        action: Direction,
        locator: &OpponentLocator,
    ) -> FeatureVector {
        let mut features = FeatureVector::new();
        let next = successor(state, self.agent, action);
        features.set(SUCCESSOR_SCORE, next.team_score(self.agent));

        let food = next.food_to_eat(self.agent);
        let my_pos = next.agent_position(self.agent);

        if let Some(pos) = my_pos {
            if !food.is_empty() {
                let dists: Vec<f64> = food.iter().map(|f| next.maze_distance(&pos, f)).collect();
                let total: f64 = dists.iter().sum();
                let nearest = dists.iter().cloned().fold(f64::INFINITY, f64::min);
                features.set(AVERAGE_DIST, total / dists.len() as f64);
                features.set(MIN_DIST, nearest);
            }
        }
        features.set(FOOD_REMAINING, food.len() as f64);

        // The enemy is read from the state before the move; while it is
        // hidden the locator's estimate stands in for it
        let primary = state.opponents(self.agent).last().copied();
        let scared_time = primary
            .map(|p| state.agent_state(p).scared_timer)
            .unwrap_or(0);
        let enemy = primary.and_then(|p| {
            state
                .agent_position(p)
                .or_else(|| locator.estimate(p))
        });
        features.set(SCARED_TIME, f64::from(scared_time));

        let dist_to_enemy = match (my_pos, enemy) {
            (Some(me), Some(enemy)) => next.maze_distance(&me, &enemy),
            _ => f64::INFINITY,
        };
        features.set(DIST_TO_ENEMY, self.enemy_proximity(dist_to_enemy, scared_time));

        let capsule_dist = match my_pos {
            Some(pos) => next
                .capsules_to_eat(self.agent)
                .iter()
                .map(|c| next.maze_distance(&pos, c))
                .fold(f64::INFINITY, f64::min),
            None => f64::INFINITY,
        };
        features.set(
            DIST_TO_CAPSULES,
            if capsule_dist.is_finite() { capsule_dist } else { 0.0 },
        );

        features
    }

    /// Threshold policy for the distance to the primary enemy
    fn enemy_proximity(&self, distance: f64, scared_time: u32) -> f64 {
        let t = &self.thresholds;
        let mut value = if distance < t.danger_distance {
            -t.danger_penalty
        } else if distance < t.caution_distance {
            -t.danger_penalty / distance
        } else {
            0.0
        };

        if scared_time > 0 {
            value = -value;
            if distance == 0.0 {
                value = 1.0;
            }
        }
        value
    }

    fn defensive_features<E: GameEnvironment>(
        &self,
        state: &E,
        action: Direction,
        locator: &OpponentLocator,
    ) -> FeatureVector {
        let mut features = FeatureVector::new();
        let next = successor(state, self.agent, action);
        let me = next.agent_state(self.agent);

        if let Some(my_pos) = me.position {
            features.set(
                NOISY_DISTANCE_TO_INVADER,
                self.closest_estimated_opponent(state, &next, my_pos, locator),
            );
        }

        features.set(ON_DEFENSE, if me.is_pacman { 0.0 } else { 1.0 });

        if let Some(my_pos) = me.position {
            let capsules = next.capsules_to_defend(self.agent);
            if !capsules.is_empty() {
                let nearest = capsules
                    .iter()
                    .map(|c| next.maze_distance(&my_pos, c))
                    .fold(f64::INFINITY, f64::min);
                features.set(DISTANCE_TO_CAPSULE, nearest);
            }
        }

        let invaders: Vec<Position> = next
            .opponents(self.agent)
            .into_iter()
            .map(|i| next.agent_state(i))
            .filter(|a| a.is_pacman)
            .filter_map(|a| a.position)
            .collect();
        features.set(NUM_INVADERS, invaders.len() as f64);
        match me.position {
            Some(my_pos) if !invaders.is_empty() => {
                let nearest = invaders
                    .iter()
                    .map(|p| next.maze_distance(&my_pos, p))
                    .fold(f64::INFINITY, f64::min);
                let sign = if me.scared_timer > 0 { -1.0 } else { 1.0 };
                features.set(INVADER_DISTANCE, nearest * sign);
            }
            _ => {}
        }

        if action == Direction::Stop {
            features.set(STOP, 1.0);
        }
        let facing = state.agent_state(self.agent).direction;
        if action == facing.reverse() {
            features.set(REVERSE, 1.0);
        }

        features
    }

    /// Distance to the nearest belief average, each pushed off walls first
    fn closest_estimated_opponent<E: GameEnvironment>(
        &self,
        state: &E,
        next: &E,
        my_pos: Position,
        locator: &OpponentLocator,
    ) -> f64 {
        let mut nearest = self.thresholds.invader_distance_cap;
        for opponent in state.opponents(self.agent) {
            let guess = match locator.beliefs(opponent) {
                Some(guess) => guess,
                None => continue,
            };
            // Seeded from the cell so the evaluation stays repeatable
            let mut rng = StdRng::seed_from_u64(cell_seed(&guess));
            match nearest_legal_location(state, guess, &mut rng) {
                Some(legal) => nearest = nearest.min(next.maze_distance(&my_pos, &legal)),
                None => log::warn!("No open cell near belief {} for opponent {}", guess, opponent),
            }
        }
        nearest
    }
}

fn cell_seed(pos: &Position) -> u64 {
    ((pos.x as u32 as u64) << 32) | (pos.y as u32 as u64)
}
