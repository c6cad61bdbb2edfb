//! cardgo: a Go rules engine where every turn is played through a card.
//!
//! Each card carries a small stone pattern. A player selects a card and lays
//! its stones one by one; the pattern may be rotated or mirrored, and the
//! stones must end up forming it exactly. Normal Go rules (captures,
//! suicide, ko, turn order) apply to every stone.
//!
//! ## Modules
//!
//! - [`constants`] - Board size features and game parameters
//! - [`error`] - The [`GameError`](error::GameError) taxonomy
//! - [`board`] - Board state, groups, liberties and captures
//! - [`ko`] - Snapshot history for ko detection
//! - [`rules`] - Move legality rules and the rule engine
//! - [`patterns`] - Card patterns, symmetries and placement search
//! - [`cards`] - Card catalog, deck, hands and graveyard
//! - [`play`] - Progress of a card being played
//! - [`events`] - Move lifecycle events and observers
//! - [`game`] - The game session and state exchange
//! - [`protocol`] - Text command protocol
//!
//! ## Example
//!
//! ```
//! use cardgo::board::{Color, Move};
//! use cardgo::error::GameError;
//! use cardgo::game::{GameConfig, GameSession};
//!
//! let config = GameConfig { card_mode: false, ..GameConfig::default() };
//! let mut game = GameSession::new(config)?;
//!
//! game.play_move(Move::new(4, 4, Color::Black))?;
//! assert_eq!(
//!     game.check_move(Move::new(4, 4, Color::White)),
//!     Err(GameError::OccupiedCell)
//! );
//! # Ok::<(), GameError>(())
//! ```

pub mod board;
pub mod cards;
pub mod constants;
pub mod error;
pub mod events;
pub mod game;
pub mod ko;
pub mod patterns;
pub mod play;
pub mod protocol;
pub mod rules;
