//! Constants for board dimensions, card bookkeeping, and rule parameters.
//!
//! # Board Size Configuration
//!
//! The default board size is controlled by Cargo features:
//! - `board9x9` (default): 9x9 board
//! - `board13x13`: 13x13 board
//! - `board19x19`: 19x19 board
//!
//! ```sh
//! cargo build                                              # 9x9 (default)
//! cargo build --no-default-features --features board19x19  # 19x19
//! ```
//!
//! The feature only picks the default; any square size can still be requested
//! at runtime through [`GameConfig`](crate::game::GameConfig).

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN). Standard Go sizes are 9, 13, or 19.
#[cfg(feature = "board9x9")]
pub const DEFAULT_BOARD_SIZE: usize = 9;

#[cfg(feature = "board13x13")]
pub const DEFAULT_BOARD_SIZE: usize = 13;

#[cfg(feature = "board19x19")]
pub const DEFAULT_BOARD_SIZE: usize = 19;

#[cfg(any(
    all(feature = "board9x9", feature = "board13x13"),
    all(feature = "board9x9", feature = "board19x19"),
    all(feature = "board13x13", feature = "board19x19"),
))]
compile_error!("Enable only one of 'board9x9', 'board13x13' or 'board19x19'");

#[cfg(not(any(feature = "board9x9", feature = "board13x13", feature = "board19x19")))]
compile_error!("Must enable exactly one board size feature: 'board9x9', 'board13x13' or 'board19x19'");

/// Largest board accepted. Column letters run out after `Z`.
pub const MAX_BOARD_SIZE: usize = 26;

/// Orthogonal neighbour offsets, in capture search order: down, right, up, left.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

// =============================================================================
// Ko
// =============================================================================

/// Number of post-move board snapshots kept for ko comparison.
pub const KO_HISTORY_DEPTH: usize = 2;

// =============================================================================
// Cards
// =============================================================================

/// Maximum number of cards a player holds.
pub const HAND_LIMIT: usize = 3;

/// Instances of each card template shuffled into a fresh deck.
pub const COPIES_PER_CARD: usize = 3;

/// Marker for a required stone in pattern text.
pub const PATTERN_STONE: char = '1';

/// Marker for an empty cell in pattern text.
pub const PATTERN_EMPTY: char = '0';
