//! Self-play demo for the Squava engines
//!
//! Plays one game between two engines and prints every move.
//!
//! ```bash
//! RUST_LOG=info cargo run --example self_play -- negascout mcts
//! ```
//!
//! Engines: `alphabeta`, `negascout`, `parallel`, `mcts`.

use std::env;
use std::time::Duration;

use squava::{
    AlphaBeta, Engine, Mcts, MctsConfig, MinimaxEngine, NegaScout, Player, SearchConfig,
    SquavaError, WorkerPool,
};

fn build_engine(name: &str, search: &SearchConfig) -> squava::Result<Box<dyn Engine>> {
    let engine: Box<dyn Engine> = match name {
        "alphabeta" => Box::new(MinimaxEngine::new(AlphaBeta::from_config(search), search)),
        "negascout" => Box::new(MinimaxEngine::new(NegaScout::from_config(search), search)),
        "parallel" => Box::new(MinimaxEngine::new(WorkerPool::from_config(search)?, search)),
        "mcts" => Box::new(Mcts::new(
            MctsConfig::default()
                .with_max_iterations(200_000)
                .with_max_time(Duration::from_secs(5)),
        )?),
        other => {
            return Err(SquavaError::InvalidConfiguration(format!(
                "unknown engine '{}'",
                other
            )))
        }
    };
    Ok(engine)
}

fn main() -> squava::Result<()> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let first = args.first().map(String::as_str).unwrap_or("parallel");
    let second = args.get(1).map(String::as_str).unwrap_or("mcts");

    let search = SearchConfig::default().with_max_depth(6).with_workers(4);
    let mut max = build_engine(first, &search)?;
    let mut min = build_engine(second, &search)?;

    println!("Squava self-play");
    println!("================");
    println!("X: {}", max.name());
    println!("O: {}", min.name());
    println!();

    let mut move_counter = 0;
    let mut player = Player::Max;
    loop {
        let (mover, other) = match player {
            Player::Max => (&mut max, &mut min),
            Player::Min => (&mut min, &mut max),
        };
        mover.set_depth(move_counter);
        let outcome = mover.choose_move()?;
        let Some(cell) = outcome.best else {
            break;
        };
        other.make_move(cell, player);
        move_counter += 1;
        println!(
            "{:>2}. {:?} plays {} (score {}, {} leaves)   {}",
            move_counter,
            player,
            cell,
            outcome.score,
            outcome.leaves,
            mover.board()
        );

        if mover.find_winner().is_some() || mover.board().is_full() {
            break;
        }
        player = player.opponent();
    }

    println!();
    match max.find_winner() {
        Some(Player::Max) => println!("X ({}) wins", max.name()),
        Some(Player::Min) => println!("O ({}) wins", min.name()),
        None => println!("Draw"),
    }
    Ok(())
}
