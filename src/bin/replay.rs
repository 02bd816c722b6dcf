// Standalone replay tool for capture agent debug logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --agent <index>        Agent to replay (default: every agent in the log)
//   --all                  Replay all turns
//   --turns <turn1,turn2>  Replay specific turns (comma-separated)
//   --validate             Run validation mode with expected moves
//   --verbose              Show detailed output for each turn
//   --config <path>        Path to Capture.toml (default: Capture.toml)

use std::env;
use std::process;

use capture_agents::config::Config;
use capture_agents::replay::ReplayEngine;
use capture_agents::types::Direction;

fn print_usage() {
    eprintln!("Capture Agents Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --agent <INDEX>         Agent to replay (default: all agents in the log)");
    eprintln!("  --all                   Replay all turns in the log");
    eprintln!("  --turns <T1,T2,...>     Replay specific turns (comma-separated)");
    eprintln!("  --validate <T:M,...>    Validate expected moves (format: turn:move,...)");
    eprintln!("  --verbose               Show detailed output for each turn");
    eprintln!("  --config <path>         Path to Capture.toml (default: Capture.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Replay all turns of every agent");
    eprintln!("  replay capture_debug.jsonl --all");
    eprintln!();
    eprintln!("  # Replay specific turns of agent 0");
    eprintln!("  replay capture_debug.jsonl --agent 0 --turns 5,10,15");
    eprintln!();
    eprintln!("  # Validate expected moves");
    eprintln!("  replay capture_debug.jsonl --agent 1 --validate 5:north,10:west|stop");
}

fn parse_turns(s: &str) -> Result<Vec<i32>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", t, e))
        })
        .collect()
}

fn parse_expected_moves(s: &str) -> Result<Vec<(i32, Vec<Direction>)>, String> {
    s.split(',')
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(':').collect();
            if parts.len() != 2 {
                return Err(format!("Invalid format '{}'. Expected 'turn:move'", pair));
            }

            let turn = parts[0]
                .parse::<i32>()
                .map_err(|e| format!("Invalid turn number '{}': {}", parts[0], e))?;

            // Support multiple acceptable moves separated by '|'
            let moves: Result<Vec<Direction>, String> =
                parts[1].split('|').map(|m| m.trim().parse()).collect();

            Ok((turn, moves?))
        })
        .collect()
}

fn option_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let log_file = &args[1];
    let mut config_path = "Capture.toml".to_string();
    let mut verbose = false;
    let mut agent: Option<usize> = None;
    let mut turns_arg: Option<String> = None;
    let mut validate_arg: Option<String> = None;
    let mut mode = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => {
                mode = Some("all");
            }
            "--turns" => {
                turns_arg = Some(option_value(&args, i, "--turns"));
                mode = Some("turns");
                i += 1;
            }
            "--validate" => {
                validate_arg = Some(option_value(&args, i, "--validate"));
                mode = Some("validate");
                i += 1;
            }
            "--agent" => {
                let value = option_value(&args, i, "--agent");
                agent = match value.parse::<usize>() {
                    Ok(index) => Some(index),
                    Err(e) => {
                        eprintln!("Error: Invalid agent index '{}': {}", value, e);
                        process::exit(1);
                    }
                };
                i += 1;
            }
            "--config" => {
                config_path = option_value(&args, i, "--config");
                i += 1;
            }
            "--verbose" => {
                verbose = true;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if mode.is_none() {
        eprintln!("Error: Must specify --all, --turns, or --validate");
        print_usage();
        process::exit(1);
    }

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let engine = ReplayEngine::new(config, verbose);

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    println!("Loaded {} log entries\n", entries.len());

    let agents = match agent {
        Some(index) => vec![index],
        None => ReplayEngine::agents_in(&entries),
    };

    match (mode, turns_arg, validate_arg) {
        (Some("all"), _, _) => {
            let mut results = Vec::new();
            for index in agents {
                println!("Replaying agent {}...", index);
                match engine.replay_agent(&entries, index) {
                    Ok(mut replayed) => results.append(&mut replayed),
                    Err(e) => {
                        eprintln!("Error during replay: {}", e);
                        process::exit(1);
                    }
                }
            }
            engine.print_report(&results);
        }
        (Some("turns"), Some(turns_arg), _) => {
            let turns = match parse_turns(&turns_arg) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error parsing turns: {}", e);
                    process::exit(1);
                }
            };

            let mut results = Vec::new();
            for index in agents {
                println!("Replaying {} turn(s) of agent {}...", turns.len(), index);
                match engine.replay_turns(&entries, index, &turns) {
                    Ok(mut replayed) => results.append(&mut replayed),
                    Err(e) => {
                        eprintln!("Error during replay: {}", e);
                        process::exit(1);
                    }
                }
            }
            engine.print_report(&results);
        }
        (Some("validate"), _, Some(validate_arg)) => {
            let expected_moves = match parse_expected_moves(&validate_arg) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Error parsing expected moves: {}", e);
                    process::exit(1);
                }
            };

            println!("Validating {} expected move(s)...\n", expected_moves.len());
            for index in agents {
                match engine.validate_expected_moves(&entries, index, &expected_moves) {
                    Ok(()) => {
                        println!("✓ Agent {}: all expected moves validated successfully!", index);
                    }
                    Err(e) => {
                        eprintln!("✗ Agent {}: validation failed: {}", index, e);
                        process::exit(1);
                    }
                }
            }
        }
        _ => unreachable!(),
    }
}
