// Single-decision scenarios on a small open board (red home x < 6)

use capture_agents::agent::{CaptureAgent, Role};
use capture_agents::config::Config;
use capture_agents::layout::Layout;
use capture_agents::state::CaptureState;
use capture_agents::types::{AgentState, Direction, Position};

const ARENA: &str = "\
%%%%%%%%%%%%
%1        2%
%          %
%          %
%3        4%
%%%%%%%%%%%%";

fn config() -> Config {
    Config::default_hardcoded().with_seed(31)
}

fn arena() -> CaptureState {
    CaptureState::new(&Layout::parse(ARENA).unwrap(), config().rules)
        .with_food(vec![])
        .with_capsules(vec![])
}

fn place(state: CaptureState, agent: usize, x: i32, y: i32) -> CaptureState {
    state.with_agent(
        agent,
        AgentState {
            position: Some(Position::new(x, y)),
            ..AgentState::default()
        },
    )
}

fn hide(state: CaptureState, agent: usize) -> CaptureState {
    state.with_agent(agent, AgentState::default())
}

fn agent(index: usize, role: Role, state: &CaptureState) -> CaptureAgent {
    let mut agent = CaptureAgent::new(index, role, &config());
    agent.register_initial_state(state);
    agent
}

#[test]
fn test_defender_closes_in_on_visible_invader() {
    let state = place(place(arena(), 2, 3, 2), 1, 5, 2);
    let mut defender = agent(2, Role::Defensive, &state);
    assert_eq!(defender.choose_action(&state), Direction::East);
}

#[test]
fn test_defender_does_not_cross_the_middle() {
    let state = hide(hide(place(arena(), 2, 5, 2), 1), 3);
    let mut defender = agent(2, Role::Defensive, &state);
    for _ in 0..20 {
        assert_ne!(defender.choose_action(&state), Direction::East);
    }
}

#[test]
fn test_attacker_eats_adjacent_food_when_unopposed() {
    let state = hide(hide(place(arena(), 0, 7, 2), 1), 3)
        .with_food(vec![Position::new(8, 2), Position::new(10, 4)]);
    let mut attacker = agent(0, Role::Offensive, &state);
    let decision = attacker.decide(&state);
    assert!(!decision.searched);
    assert_eq!(decision.action, Direction::East);
}

#[test]
fn test_symmetric_food_splits_choices_evenly() {
    let state = hide(hide(place(arena(), 0, 8, 2), 1), 3)
        .with_food(vec![Position::new(7, 2), Position::new(9, 2)]);
    let mut attacker = agent(0, Role::Offensive, &state);

    let mut west = 0;
    let mut east = 0;
    for _ in 0..400 {
        let decision = attacker.decide(&state);
        assert!(!decision.searched);
        match decision.action {
            Direction::West => west += 1,
            Direction::East => east += 1,
            other => panic!("chose untied action {}", other),
        }
    }
    assert!(west > 150 && east > 150, "west {} east {}", west, east);
}
