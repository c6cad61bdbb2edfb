//! cardgo: Go played through pattern cards.
//!
//! ## Usage
//!
//! - `cardgo` - Show a demo
//! - `cardgo serve` - Start the text command server on stdin/stdout
//! - `cardgo demo` - Play one card of each hand on a fresh board

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

use cardgo::board::{Move, str_coord};
use cardgo::constants::DEFAULT_BOARD_SIZE;
use cardgo::game::{GameConfig, GameSession, PlaceOutcome, Seat};
use cardgo::patterns::{candidate_placements, completable};
use cardgo::protocol::CommandEngine;

/// cardgo: Go played through pattern cards
#[derive(Parser)]
#[command(name = "cardgo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board size
    #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
    /// Deck shuffle seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Play plain stones without cards
    #[arg(long)]
    no_cards: bool,
    /// local, black, white or spectator
    #[arg(long, default_value = "local")]
    seat: Seat,
    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text command server on stdin/stdout
    Serve,
    /// Run a short demo game
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = GameConfig {
        size: cli.size,
        card_mode: !cli.no_cards,
        seat: cli.seat,
        seed: cli.seed,
        ..GameConfig::default()
    };
    let game = GameSession::new(config).context("cannot start game")?;

    match cli.command {
        Some(Commands::Serve) => {
            let mut engine = CommandEngine::new(game);
            engine.run().context("command loop failed")?;
        }
        Some(Commands::Demo) | None => run_demo(game)?,
    }
    Ok(())
}

fn run_demo(mut game: GameSession) -> Result<()> {
    println!("cardgo: Go played through pattern cards\n");
    if game.piles().is_none() {
        let size = game.board().size();
        let mid = size / 2;
        let captures = game.play_move(Move::new(mid, mid, game.current_player()))?;
        println!("Black at {}: {} captured", str_coord((mid, mid), size), captures.len());
        println!("{}", game.board());
        return Ok(());
    }

    for _ in 0..2 {
        let player = game.current_player();
        println!("=== {player} to play ===");
        for card in game.hand() {
            println!("  [{}] {} ({} stones)", card.id, card.name, card.required_stones());
        }

        // First card that fits, with its first completable placement.
        let choice = game.hand().iter().find_map(|card| {
            let mut scratch = game.board().scratch();
            candidate_placements(&card.pattern, game.board())
                .into_iter()
                .find(|p| completable(&mut scratch, &p.points, player))
                .map(|p| (card.id, p.points))
        });
        let Some((id, points)) = choice else {
            println!("No card fits; discarding.");
            let id = game.hand().first().map(|c| c.id).context("empty hand")?;
            game.discard_card(id)?;
            continue;
        };

        let card = game.select_card(id)?;
        println!("Playing {}", card.name);
        for (x, y) in points {
            match game.place_stone(x, y)? {
                PlaceOutcome::Complete {
                    valid_pattern,
                    drawn,
                    ..
                } => {
                    println!("  complete, pattern valid: {valid_pattern}");
                    if let Some(drawn) = drawn {
                        println!("  drew {}", drawn.name);
                    }
                }
                outcome => println!(
                    "  {} placed, {} captured",
                    str_coord((x, y), game.board().size()),
                    outcome.captures().len()
                ),
            }
        }
        println!("{}", game.board());
    }

    println!("Export: {}", game.export_state().to_json()?);
    Ok(())
}
