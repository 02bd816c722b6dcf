// Opponent location estimates
//
// Two cheap estimators live here. The primary opponent of an offensive agent
// is followed with a `TrackedOpponent`: exact while visible, then a short
// pursuit-biased guess, a coin flip, and finally nothing. Every opponent also
// keeps a `BeliefDistribution` whose unweighted mean is the defensive agent's
// single-point guess.
//
// The locator is mutated once per real turn by its agent. Evaluation and
// search only ever borrow it.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::TrackingConfig;
use crate::env::GameEnvironment;
use crate::types::Position;

/// Last sighting of an opponent and how long ago it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackedOpponent {
    /// Current estimate; the observed cell while visible
    pub last_position: Option<Position>,
    /// Real turns since the last direct observation
    pub elapsed: u32,
}

impl TrackedOpponent {
    pub fn observed(pos: Position) -> Self {
        TrackedOpponent {
            last_position: Some(pos),
            elapsed: 0,
        }
    }
}

/// Weighted candidate cells for one opponent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeliefDistribution {
    weights: HashMap<Position, f64>,
}

impl BeliefDistribution {
    /// Equal weight on every given cell
    pub fn uniform(cells: &[Position]) -> Self {
        let mut belief = BeliefDistribution::default();
        for cell in cells {
            belief.weights.insert(*cell, 1.0);
        }
        belief
    }

    pub fn point(pos: Position) -> Self {
        Self::uniform(&[pos])
    }

    pub fn set(&mut self, pos: Position, weight: f64) {
        self.weights.insert(pos, weight.max(0.0));
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.values().all(|w| *w <= 0.0)
    }

    /// Arithmetic mean of every cell holding weight, rounded to the grid.
    ///
    /// Weights only decide membership, they do not pull the mean. With a
    /// multimodal distribution the result can sit between the modes, off any
    /// path the opponent could take.
    pub fn average(&self) -> Option<Position> {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut count = 0.0;
        for (pos, weight) in &self.weights {
            if *weight > 0.0 {
                x += f64::from(pos.x);
                y += f64::from(pos.y);
                count += 1.0;
            }
        }
        if count == 0.0 {
            return None;
        }
        Some(Position::new((x / count).round() as i32, (y / count).round() as i32))
    }
}

/// Orientation constants for the agent's team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeSide {
    pub red: bool,
    /// Column the opponent's ghost is not expected to cross back over
    pub center_x: i32,
}

impl HomeSide {
    pub fn new(width: i32, red: bool) -> Self {
        HomeSide {
            red,
            center_x: width / 2 - 1,
        }
    }

    /// True when an opponent estimate at `pos` would have crossed deep into
    /// our half
    pub fn out_of_bounds(&self, pos: &Position) -> bool {
        if self.red {
            pos.x < self.center_x
        } else {
            pos.x > self.center_x
        }
    }
}

/// Advances one tracked opponent by one real turn.
///
/// A direct observation resets the estimate. Otherwise the estimate walks to a
/// neighbouring open cell on the opponent's side: the one closest to `me` for
/// the first ticks, a random one on the coin-flip tick, and none from the
/// expiry tick on.
pub fn track<E, R>(
    tracked: TrackedOpponent,
    observed: Option<Position>,
    env: &E,
    me: Option<Position>,
    side: HomeSide,
    config: &TrackingConfig,
    rng: &mut R,
) -> TrackedOpponent
where
    E: GameEnvironment,
    R: Rng + ?Sized,
{
    if let Some(pos) = observed {
        return TrackedOpponent::observed(pos);
    }

    let elapsed = tracked.elapsed.saturating_add(1);
    let last = match tracked.last_position {
        Some(pos) => pos,
        None => {
            return TrackedOpponent {
                last_position: None,
                elapsed,
            }
        }
    };

    if elapsed >= config.expiry_tick {
        return TrackedOpponent {
            last_position: None,
            elapsed,
        };
    }

    let candidates: Vec<Position> = last
        .neighbors()
        .iter()
        .copied()
        .filter(|n| !env.has_wall(n.x, n.y) && !side.out_of_bounds(n))
        .collect();

    let next = if candidates.is_empty() {
        last
    } else if elapsed >= config.coin_flip_tick || me.is_none() {
        *candidates.choose(rng).unwrap_or(&last)
    } else {
        let me = me.unwrap_or(last);
        let dists: Vec<f64> = candidates
            .iter()
            .map(|c| env.maze_distance(&me, c))
            .collect();
        let nearest = dists.iter().cloned().fold(f64::INFINITY, f64::min);
        let closest: Vec<Position> = candidates
            .iter()
            .zip(dists.iter())
            .filter(|(_, d)| **d == nearest)
            .map(|(c, _)| *c)
            .collect();
        *closest.choose(rng).unwrap_or(&last)
    };

    TrackedOpponent {
        last_position: Some(next),
        elapsed,
    }
}

/// Resolves a possibly walled-in cell to an open one.
///
/// Open cells come back unchanged, then the first open neighbour in west,
/// east, south, north order. Failing that, a depth-first walk through
/// in-bounds cells in random order; the visited set enters each cell at most
/// once, so the walk ends after at most width * height steps. `None` means the
/// board has no open cell reachable through in-bounds cells.
pub fn nearest_legal_location<E, R>(env: &E, pos: Position, rng: &mut R) -> Option<Position>
where
    E: GameEnvironment,
    R: Rng + ?Sized,
{
    if !env.has_wall(pos.x, pos.y) {
        return Some(pos);
    }
    if let Some(open) = pos.neighbors().iter().find(|n| !env.has_wall(n.x, n.y)) {
        return Some(*open);
    }
    let mut visited = HashSet::new();
    visited.insert(pos);
    wander(env, pos, &mut visited, rng)
}

fn wander<E, R>(env: &E, pos: Position, visited: &mut HashSet<Position>, rng: &mut R) -> Option<Position>
where
    E: GameEnvironment,
    R: Rng + ?Sized,
{
    let mut next: Vec<Position> = pos
        .neighbors()
        .iter()
        .copied()
        .filter(|n| env.walls().in_bounds(n.x, n.y))
        .collect();
    next.shuffle(rng);

    for cell in next {
        if !visited.insert(cell) {
            continue;
        }
        if !env.has_wall(cell.x, cell.y) {
            return Some(cell);
        }
        if let Some(found) = wander(env, cell, visited, rng) {
            return Some(found);
        }
    }
    None
}

/// Per-agent store of opponent estimates
#[derive(Debug, Clone)]
pub struct OpponentLocator {
    config: TrackingConfig,
    side: Option<HomeSide>,
    primary: Option<usize>,
    tracked: BTreeMap<usize, TrackedOpponent>,
    beliefs: BTreeMap<usize, BeliefDistribution>,
}

impl OpponentLocator {
    pub fn new(config: TrackingConfig) -> Self {
        OpponentLocator {
            config,
            side: None,
            primary: None,
            tracked: BTreeMap::new(),
            beliefs: BTreeMap::new(),
        }
    }

    /// Seeds beliefs on the opponents' spawn cells and picks the primary
    /// opponent (the last one the environment lists)
    pub fn register<E: GameEnvironment>(&mut self, env: &E, agent: usize) {
        let red = env.is_red(agent);
        let side = HomeSide::new(env.width(), red);
        let opponents = env.opponents(agent);

        self.tracked.clear();
        self.beliefs.clear();
        for (k, opponent) in opponents.iter().enumerate() {
            let seed = env
                .agent_position(*opponent)
                .unwrap_or_else(|| fallback_spawn(env, red, k, opponents.len()));
            self.beliefs.insert(*opponent, BeliefDistribution::point(seed));
            self.tracked.insert(
                *opponent,
                TrackedOpponent {
                    last_position: env.agent_position(*opponent),
                    elapsed: 0,
                },
            );
        }

        self.side = Some(side);
        self.primary = opponents.last().copied();
        log::debug!(
            "Agent {} tracking opponents {:?}, primary {:?}",
            agent,
            opponents,
            self.primary
        );
    }

    /// Collapses the belief of every visible opponent onto its cell
    pub fn observe<E: GameEnvironment>(&mut self, env: &E) {
        for (opponent, belief) in self.beliefs.iter_mut() {
            if let Some(pos) = env.agent_position(*opponent) {
                *belief = BeliefDistribution::point(pos);
            }
        }
    }

    /// Advances the primary opponent's estimate by one real turn
    pub fn track_primary<E, R>(&mut self, env: &E, me: Option<Position>, rng: &mut R)
    where
        E: GameEnvironment,
        R: Rng + ?Sized,
    {
        let (primary, side) = match (self.primary, self.side) {
            (Some(primary), Some(side)) => (primary, side),
            _ => return,
        };
        let previous = self.tracked.get(&primary).copied().unwrap_or_default();
        let next = track(
            previous,
            env.agent_position(primary),
            env,
            me,
            side,
            &self.config,
            rng,
        );
        if previous.last_position.is_some() && next.last_position.is_none() {
            log::debug!(
                "Lost track of opponent {} after {} turns",
                primary,
                next.elapsed
            );
        }
        self.tracked.insert(primary, next);
    }

    pub fn primary(&self) -> Option<usize> {
        self.primary
    }

    pub fn side(&self) -> Option<HomeSide> {
        self.side
    }

    pub fn tracked(&self, opponent: usize) -> Option<&TrackedOpponent> {
        self.tracked.get(&opponent)
    }

    pub fn estimate(&self, opponent: usize) -> Option<Position> {
        self.tracked.get(&opponent).and_then(|t| t.last_position)
    }

    /// Single-point guess for an opponent from its belief distribution
    pub fn beliefs(&self, opponent: usize) -> Option<Position> {
        self.beliefs.get(&opponent).and_then(|b| b.average())
    }
}

/// Spawn cell guess near the far corner of the opponent's home side
fn fallback_spawn<E: GameEnvironment>(env: &E, red: bool, k: usize, count: usize) -> Position {
    if red {
        Position::new(env.width() - 2, env.height() - 3 + k as i32)
    } else {
        Position::new(1, (count - k) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::layout::Layout;
    use crate::state::CaptureState;
    use crate::types::AgentState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_board() -> CaptureState {
        // 12 wide, red home x < 6, blue ghost side x >= 5 for tracking
        let text = "\
%%%%%%%%%%%%
%1        2%
%          %
%          %
%3        4%
%%%%%%%%%%%%";
        CaptureState::new(&Layout::parse(text).unwrap(), Config::default_hardcoded().rules)
    }

    fn tracking() -> TrackingConfig {
        Config::default_hardcoded().tracking
    }

    #[test]
    fn test_observation_resets_elapsed() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(1);
        let before = TrackedOpponent {
            last_position: None,
            elapsed: 9,
        };
        let side = HomeSide::new(env.width(), true);
        let after = track(
            before,
            Some(Position::new(8, 2)),
            &env,
            Some(Position::new(1, 1)),
            side,
            &tracking(),
            &mut rng,
        );
        assert_eq!(after, TrackedOpponent::observed(Position::new(8, 2)));
    }

    #[test]
    fn test_estimate_expires_exactly_at_tick_six() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(2);
        let side = HomeSide::new(env.width(), true);
        let me = Some(Position::new(2, 2));
        let mut tracked = TrackedOpponent::observed(Position::new(9, 2));

        for tick in 1..=8 {
            tracked = track(tracked, None, &env, me, side, &tracking(), &mut rng);
            assert_eq!(tracked.elapsed, tick);
            if tick < 6 {
                assert!(tracked.last_position.is_some(), "lost at tick {}", tick);
            } else {
                assert!(tracked.last_position.is_none(), "kept at tick {}", tick);
            }
        }
    }

    #[test]
    fn test_pursuit_guess_moves_toward_agent() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(3);
        let side = HomeSide::new(env.width(), true);
        let tracked = TrackedOpponent::observed(Position::new(9, 2));
        let next = track(
            tracked,
            None,
            &env,
            Some(Position::new(2, 2)),
            side,
            &tracking(),
            &mut rng,
        );
        assert_eq!(next.last_position, Some(Position::new(8, 2)));
    }

    #[test]
    fn test_pursuit_holds_until_coin_flip_tick() {
        let env = open_board();
        let side = HomeSide::new(env.width(), true);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tracked = TrackedOpponent {
                last_position: Some(Position::new(8, 2)),
                elapsed: 3,
            };
            let next = track(tracked, None, &env, Some(Position::new(2, 2)), side, &tracking(), &mut rng);
            assert_eq!(next.elapsed, 4);
            assert_eq!(next.last_position, Some(Position::new(7, 2)));
        }
    }

    #[test]
    fn test_coin_flip_tick_picks_any_open_neighbour() {
        let env = open_board();
        let side = HomeSide::new(env.width(), true);
        let mut seen = HashSet::new();
        for seed in 0..400 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tracked = TrackedOpponent {
                last_position: Some(Position::new(8, 2)),
                elapsed: 4,
            };
            let next = track(tracked, None, &env, Some(Position::new(2, 2)), side, &tracking(), &mut rng);
            assert_eq!(next.elapsed, 5);
            seen.insert(next.last_position.unwrap());
        }
        let expected: HashSet<Position> = Position::new(8, 2).neighbors().iter().copied().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_walled_in_estimate_stays_and_ages() {
        // (8, 2) is open but every neighbour is a wall
        let text = "\
%%%%%%%%%%%%
%1        2%
%       %  %
%      % % %
%3      % 4%
%%%%%%%%%%%%";
        let env = CaptureState::new(&Layout::parse(text).unwrap(), Config::default_hardcoded().rules);
        let side = HomeSide::new(env.width(), true);
        let mut rng = StdRng::seed_from_u64(8);
        let mut tracked = TrackedOpponent {
            last_position: Some(Position::new(8, 2)),
            elapsed: 1,
        };
        for tick in 2..=5 {
            tracked = track(tracked, None, &env, Some(Position::new(2, 2)), side, &tracking(), &mut rng);
            assert_eq!(tracked.elapsed, tick);
            assert_eq!(tracked.last_position, Some(Position::new(8, 2)));
        }
        tracked = track(tracked, None, &env, Some(Position::new(2, 2)), side, &tracking(), &mut rng);
        assert_eq!(tracked.last_position, None);
    }

    #[test]
    fn test_guess_never_crosses_center_line() {
        let env = open_board();
        let side = HomeSide::new(env.width(), true);
        assert_eq!(side.center_x, 5);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tracked = TrackedOpponent::observed(Position::new(5, 2));
            let next = track(
                tracked,
                None,
                &env,
                Some(Position::new(1, 2)),
                side,
                &tracking(),
                &mut rng,
            );
            let pos = next.last_position.unwrap();
            assert!(pos.x >= 5, "crossed to {}", pos);
        }
    }

    #[test]
    fn test_unknown_estimate_stays_unknown() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(4);
        let side = HomeSide::new(env.width(), false);
        let next = track(
            TrackedOpponent::default(),
            None,
            &env,
            Some(Position::new(8, 2)),
            side,
            &tracking(),
            &mut rng,
        );
        assert_eq!(next.last_position, None);
        assert_eq!(next.elapsed, 1);
    }

    #[test]
    fn test_single_point_belief_average_is_exact() {
        let belief = BeliefDistribution::point(Position::new(7, 3));
        assert_eq!(belief.average(), Some(Position::new(7, 3)));
    }

    #[test]
    fn test_belief_average_ignores_weights_and_zeroes() {
        let mut belief = BeliefDistribution::default();
        belief.set(Position::new(1, 1), 10.0);
        belief.set(Position::new(3, 4), 1.0);
        belief.set(Position::new(20, 20), 0.0);
        // (2, 2.5) rounds half away from zero
        assert_eq!(belief.average(), Some(Position::new(2, 3)));
        assert_eq!(belief.total(), 11.0);
    }

    #[test]
    fn test_empty_belief_has_no_average() {
        assert!(BeliefDistribution::default().is_empty());
        assert_eq!(BeliefDistribution::default().average(), None);
    }

    #[test]
    fn test_nearest_legal_location_keeps_open_cells() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(5);
        let pos = Position::new(4, 2);
        assert_eq!(nearest_legal_location(&env, pos, &mut rng), Some(pos));
    }

    #[test]
    fn test_nearest_legal_location_prefers_listed_neighbour_order() {
        let env = open_board();
        let mut rng = StdRng::seed_from_u64(6);
        // (0,2) is a border wall; east neighbour (1,2) is open
        assert_eq!(
            nearest_legal_location(&env, Position::new(0, 2), &mut rng),
            Some(Position::new(1, 2))
        );
    }

    #[test]
    fn test_nearest_legal_location_escapes_wall_blocks() {
        let text = "\
%%%%%%%
%%%%%%%
%%%%% %
%%%%%%%";
        let layout_walls = crate::layout::Grid::from_rows(&text.lines().collect::<Vec<_>>()).unwrap();
        let layout = Layout {
            walls: layout_walls,
            food: vec![],
            capsules: vec![],
            agent_starts: vec![Position::new(5, 1), Position::new(5, 1)],
        };
        let env = CaptureState::new(&layout, Config::default_hardcoded().rules);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let found = nearest_legal_location(&env, Position::new(1, 2), &mut rng);
            assert_eq!(found, Some(Position::new(5, 1)));
        }
    }

    #[test]
    fn test_register_seeds_hidden_opponents_on_spawn_cells() {
        let env = CaptureState::new(&Layout::default_capture(), Config::default_hardcoded().rules);
        let seen = env.observed_by(true);
        let mut locator = OpponentLocator::new(tracking());
        locator.register(&seen, 0);

        assert_eq!(locator.primary(), Some(3));
        assert_eq!(locator.beliefs(1), Some(Position::new(30, 13)));
        assert_eq!(locator.beliefs(3), Some(Position::new(30, 14)));
        assert_eq!(locator.estimate(3), None);
        assert_eq!(locator.side().map(|s| s.center_x), Some(15));
    }

    #[test]
    fn test_observe_collapses_visible_beliefs() {
        let env = open_board().with_agent(
            3,
            AgentState {
                position: Some(Position::new(6, 3)),
                ..AgentState::default()
            },
        );
        let mut locator = OpponentLocator::new(tracking());
        locator.register(&env, 0);
        locator.observe(&env);
        assert_eq!(locator.beliefs(3), Some(Position::new(6, 3)));

        let mut rng = StdRng::seed_from_u64(7);
        locator.track_primary(&env, Some(Position::new(1, 4)), &mut rng);
        assert_eq!(locator.tracked(3), Some(&TrackedOpponent::observed(Position::new(6, 3))));
    }
}
