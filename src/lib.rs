// Library exports for the capture agents
// This allows the server, the replay tool and the integration tests to use the decision core

pub mod agent;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod distancer;
pub mod env;
pub mod error;
pub mod features;
pub mod layout;
pub mod locator;
pub mod replay;
pub mod search;
pub mod state;
pub mod team;
pub mod types;
