// Debug logging module for asynchronous decision logging
//
// This module provides fire-and-forget async logging to avoid blocking
// the main request/response cycle. Each decision is written to a JSONL file
// that the replay tool reads back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::types::{BoardSnapshot, Direction};

/// One logged decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugLogEntry {
    pub game_id: String,
    pub turn: i32,
    pub agent: usize,
    pub chosen_move: String,
    pub board: BoardSnapshot,
    pub timestamp: String,
}

impl DebugLogEntry {
    pub fn new(game_id: &str, turn: i32, agent: usize, board: BoardSnapshot, chosen_move: Direction) -> Self {
        DebugLogEntry {
            game_id: game_id.to_string(),
            turn,
            agent,
            chosen_move: chosen_move.as_str().to_string(),
            board,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return DebugLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                DebugLogger::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs a decision asynchronously (fire-and-forget)
    /// This spawns a tokio task that writes to the file without blocking
    pub fn log_move(
        &self,
        game_id: &str,
        turn: i32,
        agent: usize,
        board: BoardSnapshot,
        chosen_move: Direction,
    ) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        let entry = DebugLogEntry::new(game_id, turn, agent, board, chosen_move);

        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Appends one entry; waits for the write, unlike `log_move`
    pub async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write debug log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush debug log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize debug log entry: {}", e);
                }
            }
        }
    }

    /// Writes an entry and waits for it to land on disk
    pub async fn log_move_now(&self, entry: DebugLogEntry) {
        if self.enabled {
            Self::write_entry(self.file.clone(), entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::layout::Layout;
    use crate::state::CaptureState;

    #[tokio::test]
    async fn test_disabled_logger_writes_nothing() {
        let logger = DebugLogger::new(false, "unused.jsonl").await;
        assert!(!logger.is_enabled());
        let board = CaptureState::new(&Layout::default_capture(), Config::default_hardcoded().rules)
            .to_snapshot("g", 0, 0)
            .board;
        logger.log_move("g", 0, 0, board, Direction::North);
    }

    #[tokio::test]
    async fn test_entries_are_json_lines() {
        let path = std::env::temp_dir().join(format!("capture_debug_{}.jsonl", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let logger = DebugLogger::new(true, &path_str).await;
        assert!(logger.is_enabled());

        let board = CaptureState::new(&Layout::default_capture(), Config::default_hardcoded().rules)
            .to_snapshot("g", 3, 1)
            .board;
        logger
            .log_move_now(DebugLogEntry::new("g", 3, 1, board, Direction::West))
            .await;

        let text = std::fs::read_to_string(&path).unwrap();
        let entry: DebugLogEntry = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(entry.turn, 3);
        assert_eq!(entry.agent, 1);
        assert_eq!(entry.chosen_move, "West");
        let _ = std::fs::remove_file(&path);
    }
}
