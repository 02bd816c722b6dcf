// Game sessions behind the HTTP endpoints
//
// A session holds the walls and maze distances of one game board plus the
// agents of every team that asked for moves in that game. Decisions run on
// the tokio blocking pool; the session lock keeps one decision per game at a
// time.

use log::{info, warn};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::agent::{CaptureAgent, Decision};
use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::distancer::Distancer;
use crate::env::GameEnvironment;
use crate::error::SnapshotError;
use crate::layout::Grid;
use crate::state::CaptureState;
use crate::team::{create_team, resolve_role, DEFAULT_FIRST, DEFAULT_SECOND};
use crate::types::{BoardSnapshot, Direction, GameSnapshot};

/// Largest board a session accepts; at the cap the distance table takes 16 MiB
pub const MAX_BOARD_CELLS: usize = 2048;

type GameMap = HashMap<String, Arc<Mutex<GameSession>>>;

/// Everything that persists between the turns of one game
pub struct GameSession {
    walls: Arc<Grid>,
    distancer: Arc<Distancer>,
    agents: BTreeMap<usize, CaptureAgent>,
}

impl GameSession {
    /// Parses the walls and precomputes maze distances for a board
    ///
    /// The distance table grows with the square of the cell count, so boards
    /// above `MAX_BOARD_CELLS` are refused before it is built.
    pub fn from_board(board: &BoardSnapshot) -> Result<Self, String> {
        let walls = Grid::from_rows(&board.walls).map_err(|e| format!("Invalid walls: {}", e))?;
        let cells = (walls.width().max(0) as usize) * (walls.height().max(0) as usize);
        if cells > MAX_BOARD_CELLS {
            return Err(SnapshotError::BoardTooLarge {
                cells,
                max: MAX_BOARD_CELLS,
            }
            .to_string());
        }
        let distancer = Distancer::new(&walls);
        Ok(GameSession {
            walls: Arc::new(walls),
            distancer: Arc::new(distancer),
            agents: BTreeMap::new(),
        })
    }

    pub fn state(&self, board: &BoardSnapshot, config: &Config) -> Result<CaptureState, String> {
        CaptureState::from_snapshot(
            board,
            self.walls.clone(),
            self.distancer.clone(),
            config.rules,
        )
        .map_err(|e| format!("Invalid board: {}", e))
    }

    pub fn has_agent(&self, index: usize) -> bool {
        self.agents.contains_key(&index)
    }

    /// Creates and registers the team `you` plays for, unless it exists
    ///
    /// The lower index of the team attacks, the other one defends.
    pub fn ensure_team(
        &mut self,
        state: &CaptureState,
        you: usize,
        config: &Config,
    ) -> Result<(), String> {
        if self.has_agent(you) {
            return Ok(());
        }
        if you >= state.num_agents() {
            return Err(format!("Agent {} is not on the board", you));
        }

        let is_red = state.is_red(you);
        let members = state.teammates(you);
        let mut team = match members.as_slice() {
            [first, second, ..] => {
                create_team(*first, *second, is_red, DEFAULT_FIRST, DEFAULT_SECOND, config)?
            }
            [only] => vec![CaptureAgent::new(*only, resolve_role(DEFAULT_FIRST)?, config)],
            [] => return Err(format!("Agent {} has no team", you)),
        };

        for agent in team.iter_mut() {
            agent.register_initial_state(state);
        }
        for agent in team {
            self.agents.insert(agent.index(), agent);
        }
        Ok(())
    }

    /// Runs one decision for the requesting agent
    pub fn decide(&mut self, snapshot: &GameSnapshot, config: &Config) -> Result<Decision, String> {
        let state = self.state(&snapshot.board, config)?;
        self.ensure_team(&state, snapshot.you, config)?;
        let agent = self
            .agents
            .get_mut(&snapshot.you)
            .ok_or_else(|| format!("Agent {} was not registered", snapshot.you))?;
        Ok(agent.decide(&state))
    }
}

/// Capture agent server with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    config: Config,
    games: Arc<Mutex<GameMap>>,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance with debug logging off
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    pub fn new(config: Config) -> Self {
        Bot::with_debug_logger(config, DebugLogger::disabled())
    }

    pub fn with_debug_logger(config: Config, debug_logger: DebugLogger) -> Self {
        Bot {
            config,
            games: Arc::new(Mutex::new(HashMap::new())),
            debug_logger,
        }
    }

    /// Returns server metadata
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");

        json!({
            "apiversion": "1",
            "author": "capture-agents",
            "agents": [DEFAULT_FIRST, DEFAULT_SECOND],
            "search_depth": self.config.search.depth,
        })
    }

    pub fn active_games(&self) -> usize {
        self.games.lock().len()
    }

    /// Called when a game starts; registers the requesting agent's team
    /// Corresponds to POST /start endpoint
    pub async fn start(&self, snapshot: &GameSnapshot) -> Result<(), String> {
        info!("GAME START {} (agent {})", snapshot.game.id, snapshot.you);

        let games = self.games.clone();
        let request = snapshot.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let session = Bot::session(&games, &request)?;
            let mut session = session.lock();
            let state = session.state(&request.board, &config)?;
            session.ensure_team(&state, request.you, &config)
        })
        .await
        .map_err(|e| format!("start task failed: {}", e))?
    }

    /// Called when a game ends
    /// Corresponds to POST /end endpoint
    pub fn end(&self, snapshot: &GameSnapshot) {
        info!("GAME OVER {} (score: {})", snapshot.game.id, snapshot.board.score);
        self.games.lock().remove(&snapshot.game.id);
    }

    /// Computes and returns the next move
    /// Corresponds to POST /move endpoint
    ///
    /// Session setup and the decision both run on the blocking pool; any
    /// failure answers `Stop`.
    pub async fn get_move(&self, snapshot: &GameSnapshot) -> Value {
        let start_time = Instant::now();
        info!("Turn {}: Computing move for agent {}", snapshot.turn, snapshot.you);

        let games = self.games.clone();
        let request = snapshot.clone();
        let config = self.config.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let session = Bot::session(&games, &request)?;
            let mut session = session.lock();
            session.decide(&request, &config)
        });

        let chosen = match handle.await {
            Ok(Ok(decision)) => Some(decision),
            Ok(Err(e)) => {
                warn!("Turn {}: {}", snapshot.turn, e);
                None
            }
            Err(e) => {
                warn!("Turn {}: decision task failed: {}", snapshot.turn, e);
                None
            }
        };

        let chosen_move = chosen.as_ref().map(|d| d.action).unwrap_or(Direction::Stop);
        if let Some(decision) = &chosen {
            info!(
                "Turn {}: Agent {} chose {} (searched: {}, nodes: {}, time: {}ms)",
                snapshot.turn,
                snapshot.you,
                chosen_move,
                decision.searched,
                decision.stats.nodes,
                start_time.elapsed().as_millis()
            );
        }

        self.debug_logger.log_move(
            &snapshot.game.id,
            snapshot.turn,
            snapshot.you,
            snapshot.board.clone(),
            chosen_move,
        );

        json!({ "move": chosen_move.as_str() })
    }

    /// Session of a known game, or a fresh one for a game that never started
    ///
    /// A new session is built without holding the game map lock; if another
    /// request registered the game meanwhile, that session wins.
    fn session(games: &Mutex<GameMap>, snapshot: &GameSnapshot) -> Result<Arc<Mutex<GameSession>>, String> {
        if let Some(session) = games.lock().get(&snapshot.game.id) {
            return Ok(session.clone());
        }
        if snapshot.turn > 0 {
            warn!("Unknown game {}, creating session", snapshot.game.id);
        }

        let fresh = Arc::new(Mutex::new(GameSession::from_board(&snapshot.board)?));
        let mut games = games.lock();
        Ok(games
            .entry(snapshot.game.id.clone())
            .or_insert(fresh)
            .clone())
    }
}
