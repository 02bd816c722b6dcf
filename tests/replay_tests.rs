// Replay of logged decisions against a fresh session
//
// A game is played through `GameSession` exactly as the server would, every
// decision is logged in the debug JSONL format, and the replay engine must
// reproduce each move when it runs with the same seed.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use capture_agents::bot::GameSession;
use capture_agents::config::Config;
use capture_agents::debug_logger::DebugLogEntry;
use capture_agents::env::GameEnvironment;
use capture_agents::layout::Layout;
use capture_agents::replay::ReplayEngine;
use capture_agents::state::CaptureState;

fn temp_log(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}.jsonl", name, std::process::id()))
}

/// Plays a short game through one session per team and writes the log
fn record_game(config: &Config, rounds: i32, path: &PathBuf) -> Vec<DebugLogEntry> {
    let mut state = CaptureState::new(&Layout::default_capture(), config.rules);
    let initial = state.to_snapshot("replayed", 0, 0);
    let mut red = GameSession::from_board(&initial.board).unwrap();
    let mut blue = GameSession::from_board(&initial.board).unwrap();

    let mut entries = Vec::new();
    for turn in 0..rounds {
        for agent in 0..state.num_agents() {
            let is_red = state.is_red(agent);
            let snapshot = state.observed_by(is_red).to_snapshot("replayed", turn, agent);
            let session = if is_red { &mut red } else { &mut blue };
            let decision = session.decide(&snapshot, config).unwrap();
            entries.push(DebugLogEntry::new(
                "replayed",
                turn,
                agent,
                snapshot.board.clone(),
                decision.action,
            ));
            state = state.generate_successor(agent, decision.action);
        }
    }

    let mut file = fs::File::create(path).unwrap();
    for entry in &entries {
        writeln!(file, "{}", serde_json::to_string(entry).unwrap()).unwrap();
    }
    entries
}

#[test]
fn test_replay_reproduces_seeded_game() {
    let config = Config::default_hardcoded().with_seed(23);
    let path = temp_log("capture_replay_reproduces");
    record_game(&config, 12, &path);

    let engine = ReplayEngine::new(config, false);
    let entries = engine.load_log_file(&path).unwrap();
    assert_eq!(entries.len(), 48);
    assert_eq!(ReplayEngine::agents_in(&entries), vec![0, 1, 2, 3]);

    for agent in 0..4 {
        let results = engine.replay_agent(&entries, agent).unwrap();
        assert_eq!(results.len(), 12);
        let stats = engine.generate_stats(&results);
        assert_eq!(stats.mismatches, 0, "agent {} diverged", agent);
    }
    let _ = fs::remove_file(&path);
}

#[test]
fn test_replay_turns_keeps_requested_turns() {
    let config = Config::default_hardcoded().with_seed(4);
    let path = temp_log("capture_replay_turns");
    let entries = record_game(&config, 6, &path);

    let engine = ReplayEngine::new(config, true);
    let results = engine.replay_turns(&entries, 0, &[2, 5]).unwrap();
    let turns: Vec<i32> = results.iter().map(|r| r.turn).collect();
    assert_eq!(turns, vec![2, 5]);
    assert!(results.iter().all(|r| r.matches));

    assert!(engine.replay_turns(&entries, 0, &[9]).is_err());
    let _ = fs::remove_file(&path);
}

#[test]
fn test_malformed_log_line_is_reported() {
    let path = temp_log("capture_replay_malformed");
    fs::write(&path, "{\"turn\": 1}\n").unwrap();
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let err = engine.load_log_file(&path).unwrap_err();
    assert!(err.contains("line 1"));
    let _ = fs::remove_file(&path);
}
