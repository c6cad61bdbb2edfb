//! Error taxonomy shared by every core operation.
//!
//! All variants are recoverable: callers branch on them and the session keeps
//! going.

use thiserror::Error;

/// Why an operation on the game was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Coordinates fall outside the board.
    #[error("illegal move: point is off the board")]
    OutOfBounds,
    /// Target point already holds a stone.
    #[error("illegal move: point not empty")]
    OccupiedCell,
    /// A registered rule refused the move.
    #[error("illegal move: violates rule '{0}'")]
    RuleViolation(String),
    /// A card placement was attempted with no card selected.
    #[error("no card selected")]
    NoCardSelected,
    /// The card id is not in the acting player's hand.
    #[error("card not in hand")]
    CardNotInHand,
    /// The move makes the selected card's pattern impossible to complete.
    #[error("pattern cannot be completed")]
    PatternUnsatisfiable,
    /// Event name not known to the observer registry.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    /// A rule with the same name is already registered.
    #[error("rule already registered: {0}")]
    DuplicateRule(String),
    /// Pattern text is not an odd square of '0'/'1' with at least one stone.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    /// Imported state is internally inconsistent.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Algebraic coordinate could not be parsed for this board.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    /// Spectator seats observe only.
    #[error("spectators cannot play")]
    SpectatorCannotPlay,
    /// Card operation on a session created without cards.
    #[error("card mode is disabled")]
    CardModeDisabled,
}

impl GameError {
    /// Short machine-friendly tag, used in event payloads and protocol replies.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::OutOfBounds => "OutOfBounds",
            GameError::OccupiedCell => "OccupiedCell",
            GameError::RuleViolation(_) => "RuleViolation",
            GameError::NoCardSelected => "NoCardSelected",
            GameError::CardNotInHand => "CardNotInHand",
            GameError::PatternUnsatisfiable => "PatternUnsatisfiable",
            GameError::UnknownEvent(_) => "UnknownEvent",
            GameError::DuplicateRule(_) => "DuplicateRule",
            GameError::InvalidPattern(_) => "InvalidPattern",
            GameError::InvalidState(_) => "InvalidState",
            GameError::InvalidCoordinate(_) => "InvalidCoordinate",
            GameError::SpectatorCannotPlay => "SpectatorCannotPlay",
            GameError::CardModeDisabled => "CardModeDisabled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_rule_name() {
        let err = GameError::RuleViolation("ko".into());
        assert_eq!(err.to_string(), "illegal move: violates rule 'ko'");
        assert_eq!(err.kind(), "RuleViolation");
    }
}
