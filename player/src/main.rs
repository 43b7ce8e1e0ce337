//! Gomoku terminal player
//!
//! Reads commands from stdin and plays against the MCTS engine:
//! 1. Loads settings from config.toml, GOMOKU_* env vars and the CLI
//! 2. Installs the configured evaluator behind a hot-swappable slot
//! 3. Answers each human move with a search at the chosen difficulty
//! 4. Prints the board and Black's win ratio after every move

use anyhow::Result;
use clap::Parser;
use mcts::{MctsAgent, SharedEvaluator};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

mod command;
mod config;
mod notation;
mod session;

use crate::command::{Command, HELP};
use crate::config::{parse_evaluator_kind, Config, CENTRAL_CONFIG};
use crate::notation::format_move;
use crate::session::{stone_name, GameSession};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let mcts_config = config.mcts_config(&CENTRAL_CONFIG.mcts)?;
    let difficulty = config.difficulty()?;
    info!(
        board_size = config.board_size,
        %difficulty,
        budgets = ?mcts_config.simulation_budgets,
        eval_batch_size = mcts_config.eval_batch_size,
        evaluator = %config.evaluator,
        "Starting player"
    );

    let evaluator = SharedEvaluator::new();
    evaluator
        .install(config.build_evaluator(parse_evaluator_kind(&config.evaluator)?)?)
        .await;

    let agent = MctsAgent::new(evaluator, mcts_config).with_difficulty(difficulty);
    let mut session = GameSession::new(
        agent,
        config.board_size,
        config.human_stone()?,
        config.auto_reply,
    );

    println!("{}", HELP);
    println!(
        "You play {}. Difficulty: {}.",
        stone_name(session.human()),
        difficulty
    );
    match session.start().await {
        Ok(Some(pos)) => println!("Engine plays {}", format_move(pos)),
        Ok(None) => {}
        Err(e) => println!("error: {}", e),
    }
    print_position(&session).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                println!();
                info!("Interrupted, exiting");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match Command::parse(&line, config.board_size) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("error: {}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = run_command(&mut session, &config, command).await {
            warn!(error = %e, "Command failed");
            println!("error: {}", e);
        }
    }

    info!("Player exiting");
    Ok(())
}

async fn run_command(
    session: &mut GameSession<SharedEvaluator>,
    config: &Config,
    command: Command,
) -> Result<()> {
    match command {
        Command::Move(pos) => {
            // The human move stays on the board even if the reply fails.
            let reply = session.play_human(pos).await;
            if let Ok(Some(reply)) = &reply {
                println!("Engine plays {}", format_move(*reply));
            }
            print_position(session).await;
            reply?;
        }
        Command::EngineMove => {
            let pos = session.engine_move().await?;
            println!("Engine plays {}", format_move(pos));
            print_position(session).await;
        }
        Command::Undo => {
            let pos = session.undo()?;
            println!("Took back {}", format_move(pos));
            print_position(session).await;
        }
        Command::Restart => {
            let opening = session.restart().await?;
            if let Some(pos) = opening {
                println!("Engine plays {}", format_move(pos));
            }
            print_position(session).await;
        }
        Command::Level(difficulty) => {
            session.agent_mut().set_difficulty(difficulty);
            println!("Difficulty set to {}", difficulty);
        }
        Command::Evaluator(kind) => {
            let evaluator = config.build_evaluator(kind)?;
            session.agent().evaluator().install(evaluator).await;
            println!("Evaluator set to {:?}", kind);
        }
        Command::Board => print_position(session).await,
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

async fn print_position(session: &GameSession<SharedEvaluator>) {
    print!("{}", session.render());
    if let Some(pos) = session.state().last_move() {
        println!("Last move: {}", format_move(pos));
    }
    match session.win_ratio().await {
        Ok(ratio) => println!("{} | Black win ratio: {}%", session.status(), ratio),
        Err(e) => {
            warn!(error = %e, "Win ratio unavailable");
            println!("{}", session.status());
        }
    }
}
