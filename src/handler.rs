// HTTP handler bindings for the capture agent endpoints
//
// This module provides thin wrapper functions that bind Rocket HTTP routes
// to the Bot's core logic methods. Handlers are responsible for:
// - Deserializing incoming JSON requests
// - Extracting Bot instance from Rocket's managed state
// - Delegating to Bot methods
// - Serializing responses

use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::Value;

use capture_agents::bot::Bot;
use capture_agents::types::GameSnapshot;

/// GET / endpoint
/// Returns server metadata
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /start endpoint
/// Registers the requesting agent's team for the game
#[post("/start", format = "json", data = "<start_req>")]
pub async fn start(bot: &rocket::State<Bot>, start_req: Json<GameSnapshot>) -> Status {
    match bot.start(&start_req).await {
        Ok(()) => Status::Ok,
        Err(e) => {
            log::warn!("Rejected game start: {}", e);
            Status::BadRequest
        }
    }
}

/// POST /move endpoint
/// Called each turn to compute and return the next move
#[post("/move", format = "json", data = "<move_req>")]
pub async fn get_move(bot: &rocket::State<Bot>, move_req: Json<GameSnapshot>) -> Json<Value> {
    let response = bot.get_move(&move_req).await;

    Json(response)
}

/// POST /end endpoint
/// Called when a game ends - drops the game's session
#[post("/end", format = "json", data = "<end_req>")]
pub fn end(bot: &rocket::State<Bot>, end_req: Json<GameSnapshot>) -> Status {
    bot.end(&end_req);

    Status::Ok
}
