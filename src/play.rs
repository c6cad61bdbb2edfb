//! Tracking of an in-progress card play.
//!
//! ```text
//! Idle --select--> CardSelected --stone--> Placing --last stone--> Idle (complete)
//!   ^                   |                     |
//!   +---- deselect -----+---------------------+  (abandoned)
//! ```
//!
//! The session only records which card is being played and which stones
//! have been placed for it; the board itself is owned by the game session.

use tracing::{info, warn};

use crate::board::{Board, Color, Move, Point};
use crate::cards::Card;
use crate::error::GameError;
use crate::patterns::{can_still_complete, matches};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    CardSelected,
    Placing,
}

/// A card whose last stone has been placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedCard {
    pub card: Card,
    pub moves: Vec<Move>,
    /// Whether the stones form an exact placement of the card's pattern.
    pub valid_pattern: bool,
}

impl FinishedCard {
    /// The player who placed the first stone owns the card.
    pub fn owner(&self) -> Option<Color> {
        self.moves.first().map(|m| m.color)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CardPlay {
    card: Option<Card>,
    moves: Vec<Move>,
}

impl CardPlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayState {
        match (&self.card, self.moves.is_empty()) {
            (None, _) => PlayState::Idle,
            (Some(_), true) => PlayState::CardSelected,
            (Some(_), false) => PlayState::Placing,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    /// Stones placed so far for the selected card.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// `(placed, required)` for the selected card.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.card
            .as_ref()
            .map(|c| (self.moves.len(), c.required_stones()))
    }

    /// Start playing `card`, dropping any partial sequence.
    pub fn select(&mut self, card: Card) {
        info!(card = %card.name, id = card.id, stones = card.required_stones(), "card selected");
        self.card = Some(card);
        self.moves.clear();
    }

    /// Abandon the current card play.
    pub fn deselect(&mut self) -> Option<Card> {
        self.moves.clear();
        self.card.take()
    }

    /// Judge a proposed stone for the selected card without touching `board`.
    pub fn check_placement(&self, board: &Board, mv: Move) -> Result<(), GameError> {
        let card = self.card.as_ref().ok_or(GameError::NoCardSelected)?;
        if !board.in_bounds(mv.x, mv.y) {
            return Err(GameError::OutOfBounds);
        }
        if !board.is_empty_at(mv.x, mv.y) {
            return Err(GameError::OccupiedCell);
        }
        let mut sequence: Vec<Point> = self.moves.iter().map(Move::point).collect();
        sequence.push(mv.point());
        if can_still_complete(board, &sequence, &card.pattern, mv.color) {
            Ok(())
        } else {
            Err(GameError::PatternUnsatisfiable)
        }
    }

    /// Record an applied stone. Returns the finished card once the last
    /// required stone is in, resetting the session to idle.
    pub fn record(&mut self, mv: Move) -> Option<FinishedCard> {
        let required = self.card.as_ref()?.required_stones();
        self.moves.push(mv);
        if self.moves.len() < required {
            return None;
        }
        let card = self.card.take()?;
        let moves = std::mem::take(&mut self.moves);
        let points: Vec<Point> = moves.iter().map(Move::point).collect();
        let valid_pattern = matches(&points, &card.pattern);
        if valid_pattern {
            info!(card = %card.name, "card completed");
        } else {
            warn!(card = %card.name, "stones do not form the card's pattern");
        }
        Some(FinishedCard {
            card,
            moves,
            valid_pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::Pattern;

    fn card(rows: &[&str]) -> Card {
        Card {
            id: 1,
            name: "test".into(),
            pattern: Pattern::parse(rows).unwrap(),
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut play = CardPlay::new();
        assert_eq!(play.state(), PlayState::Idle);
        play.select(card(&["000", "011", "000"]));
        assert_eq!(play.state(), PlayState::CardSelected);
        assert!(play.record(Move::new(0, 0, Color::Black)).is_none());
        assert_eq!(play.state(), PlayState::Placing);
        assert_eq!(play.progress(), Some((1, 2)));
        let done = play.record(Move::new(1, 0, Color::Black)).unwrap();
        assert!(done.valid_pattern);
        assert_eq!(done.owner(), Some(Color::Black));
        assert_eq!(play.state(), PlayState::Idle);
    }

    #[test]
    fn test_deselect_abandons() {
        let mut play = CardPlay::new();
        play.select(card(&["000", "011", "000"]));
        play.record(Move::new(0, 0, Color::Black));
        assert!(play.deselect().is_some());
        assert_eq!(play.state(), PlayState::Idle);
        assert!(play.moves().is_empty());
    }

    #[test]
    fn test_check_placement_errors() {
        let mut play = CardPlay::new();
        let board = Board::new(5);
        let mv = Move::new(0, 0, Color::Black);
        assert_eq!(play.check_placement(&board, mv), Err(GameError::NoCardSelected));
        play.select(card(&["000", "011", "000"]));
        assert_eq!(
            play.check_placement(&board, Move::new(7, 0, Color::Black)),
            Err(GameError::OutOfBounds)
        );
        assert_eq!(play.check_placement(&board, mv), Ok(()));
        play.record(mv);
        assert_eq!(
            play.check_placement(&board, Move::new(3, 3, Color::Black)),
            Err(GameError::PatternUnsatisfiable)
        );
    }

    #[test]
    fn test_failed_final_match_is_reported() {
        // `record` trusts its caller; a sequence that misses the pattern
        // still finishes the card, flagged invalid.
        let mut play = CardPlay::new();
        play.select(card(&["000", "011", "000"]));
        play.record(Move::new(0, 0, Color::Black));
        let done = play.record(Move::new(2, 2, Color::Black)).unwrap();
        assert!(!done.valid_pattern);
    }
}
