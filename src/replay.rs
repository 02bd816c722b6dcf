// Replay module for re-running logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL debug logs
// 2. Re-run one agent's decisions in turn order with a fresh agent
// 3. Compare logged vs replayed moves
// 4. Generate match reports

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::bot::GameSession;
use crate::config::Config;
use crate::debug_logger::DebugLogEntry;
use crate::types::{Direction, GameInfo, GameSnapshot};

/// Result of replaying a single turn
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub turn: i32,
    pub agent: usize,
    pub original_move: Direction,
    pub replayed_move: Direction,
    pub matches: bool,
    pub searched: bool,
    pub nodes: u64,
    pub computation_time_ms: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
    pub searched_turns: usize,
}

/// Replay engine for analyzing debug logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<DebugLogEntry>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: DebugLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Agent indices that appear in the log, ascending
    pub fn agents_in(entries: &[DebugLogEntry]) -> Vec<usize> {
        let mut agents: Vec<usize> = entries.iter().map(|e| e.agent).collect();
        agents.sort_unstable();
        agents.dedup();
        agents
    }

    /// Re-runs every decision of one agent in turn order
    ///
    /// The agent's opponent estimates depend on earlier turns, so a replay
    /// always starts from the agent's first logged turn with a fresh session.
    pub fn replay_agent(&self, entries: &[DebugLogEntry], agent: usize) -> Result<Vec<ReplayResult>, String> {
        let mut own: Vec<&DebugLogEntry> = entries.iter().filter(|e| e.agent == agent).collect();
        own.sort_by_key(|e| e.turn);
        let first = own
            .first()
            .ok_or_else(|| format!("Agent {} has no logged turns", agent))?;
        let mut session = GameSession::from_board(&first.board)?;

        let mut results = Vec::with_capacity(own.len());
        for entry in own {
            match self.replay_entry(&mut session, entry) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", entry.turn, e),
            }
        }
        Ok(results)
    }

    /// Replays an agent and keeps only the requested turns
    pub fn replay_turns(
        &self,
        entries: &[DebugLogEntry],
        agent: usize,
        turn_numbers: &[i32],
    ) -> Result<Vec<ReplayResult>, String> {
        for turn in turn_numbers {
            if !entries.iter().any(|e| e.agent == agent && e.turn == *turn) {
                return Err(format!("Turn {} not found in log file for agent {}", turn, agent));
            }
        }
        Ok(self
            .replay_agent(entries, agent)?
            .into_iter()
            .filter(|r| turn_numbers.contains(&r.turn))
            .collect())
    }

    fn replay_entry(&self, session: &mut GameSession, entry: &DebugLogEntry) -> Result<ReplayResult, String> {
        let original_move: Direction = entry.chosen_move.parse()?;
        let snapshot = GameSnapshot {
            game: GameInfo {
                id: entry.game_id.clone(),
                timeout: 0,
            },
            turn: entry.turn,
            you: entry.agent,
            board: entry.board.clone(),
        };

        let start_time = Instant::now();
        let decision = session.decide(&snapshot, &self.config)?;
        let computation_time = start_time.elapsed().as_millis();

        let result = ReplayResult {
            turn: entry.turn,
            agent: entry.agent,
            original_move,
            replayed_move: decision.action,
            matches: original_move == decision.action,
            searched: decision.searched,
            nodes: decision.stats.nodes,
            computation_time_ms: computation_time,
        };

        if self.verbose {
            if result.matches {
                info!(
                    "Turn {}: MATCH - {} (searched: {}, nodes: {}, time: {}ms)",
                    result.turn, result.replayed_move, result.searched, result.nodes, computation_time
                );
            } else {
                warn!(
                    "Turn {}: MISMATCH - Original: {}, Replayed: {} (values: {:?})",
                    result.turn, original_move, result.replayed_move, decision.values
                );
            }
        }

        Ok(result)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_turns - matches;
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            matches,
            mismatches,
            match_rate,
            searched_turns: results.iter().filter(|r| r.searched).count(),
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:    {}", stats.total_turns);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("Searched Turns: {}", stats.searched_turns);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results.iter().map(|r| r.computation_time_ms as f64).sum::<f64>()
                / results.len() as f64;
            let avg_nodes: f64 =
                results.iter().map(|r| r.nodes as f64).sum::<f64>() / results.len() as f64;

            println!("Average Search Nodes:       {:.1}", avg_nodes);
            println!("Average Computation Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Turn {}: {} → {} (searched: {}, nodes: {})",
                    result.turn, result.original_move, result.replayed_move, result.searched, result.nodes
                );
            }
            println!();
        }
    }

    /// Validates that specific expected moves were logged for an agent
    pub fn validate_expected_moves(
        &self,
        entries: &[DebugLogEntry],
        agent: usize,
        expected_moves: &[(i32, Vec<Direction>)], // (turn, acceptable_moves)
    ) -> Result<(), String> {
        for (turn, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.agent == agent && e.turn == *turn)
                .ok_or_else(|| format!("Turn {} not found in log", turn))?;

            let actual_move: Direction = entry.chosen_move.parse()?;

            if !acceptable.contains(&actual_move) {
                return Err(format!(
                    "Turn {}: Expected one of {:?}, but got {}",
                    turn,
                    acceptable.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    actual_move
                ));
            }
        }

        Ok(())
    }
}
