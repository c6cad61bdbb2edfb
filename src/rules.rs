//! Move legality: an ordered registry of named rules.
//!
//! A move is legal iff it is on the board, its point is empty, and every
//! registered rule allows it. Rules run in registration order and the first
//! refusal wins. Each rule sees the position through a [`RuleContext`] that
//! only lends the board immutably; rules that need lookahead work on a
//! [`Scratch`](crate::board::Scratch) copy.

use tracing::debug;

use crate::board::{Board, Color, Move};
use crate::error::GameError;
use crate::ko::KoHistory;

pub const NO_SUICIDE: &str = "no-suicide";
pub const KO: &str = "ko";
pub const TURN_ORDER: &str = "turn-order";

/// Everything a rule may inspect when judging a move.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub mv: Move,
    pub board: &'a Board,
    pub history: &'a KoHistory,
    /// Set when the previous move captured exactly one stone.
    pub ko_flag: bool,
    pub current_player: Color,
}

pub trait Rule {
    /// Stable name used for duplicate detection, removal, and diagnostics.
    fn name(&self) -> &str;

    /// Whether the move is allowed.
    fn allows(&self, ctx: &RuleContext<'_>) -> bool;
}

/// Forbid moves that leave the placed stone's group without liberties,
/// unless the move captures.
pub struct NoSuicide;

impl Rule for NoSuicide {
    fn name(&self) -> &str {
        NO_SUICIDE
    }

    fn allows(&self, ctx: &RuleContext<'_>) -> bool {
        let mut scratch = ctx.board.scratch();
        if scratch.play(ctx.mv).is_err() {
            return false;
        }
        let board = scratch.board();
        // Captures were applied on the copy, so a capturing move always
        // regains at least the freed point as a liberty.
        let group = board.group(ctx.mv.x, ctx.mv.y);
        !board.liberties(&group).is_empty()
    }
}

/// Forbid a capture that recreates a recent position right after a
/// single-stone capture.
pub struct KoRule;

impl Rule for KoRule {
    fn name(&self) -> &str {
        KO
    }

    fn allows(&self, ctx: &RuleContext<'_>) -> bool {
        if !ctx.ko_flag || ctx.history.is_empty() {
            return true;
        }
        let mut scratch = ctx.board.scratch();
        let Ok(captured) = scratch.play(ctx.mv) else {
            return true;
        };
        if captured.is_empty() {
            return true;
        }
        let repeats = ctx.history.contains(&scratch.board().snapshot());
        if repeats {
            debug!(x = ctx.mv.x, y = ctx.mv.y, "ko recapture refused");
        }
        !repeats
    }
}

/// The move's colour must be the player to move.
pub struct TurnOrder;

impl Rule for TurnOrder {
    fn name(&self) -> &str {
        TURN_ORDER
    }

    fn allows(&self, ctx: &RuleContext<'_>) -> bool {
        ctx.mv.color == ctx.current_player
    }
}

/// A caller-supplied rule built from a closure.
pub struct CustomRule<F> {
    name: String,
    check: F,
}

impl<F> CustomRule<F>
where
    F: Fn(&RuleContext<'_>) -> bool,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> Rule for CustomRule<F>
where
    F: Fn(&RuleContext<'_>) -> bool,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn allows(&self, ctx: &RuleContext<'_>) -> bool {
        (self.check)(ctx)
    }
}

/// Look up a built-in rule by name.
pub fn builtin(name: &str) -> Option<Box<dyn Rule>> {
    match name {
        NO_SUICIDE => Some(Box::new(NoSuicide)),
        KO => Some(Box::new(KoRule)),
        TURN_ORDER => Some(Box::new(TurnOrder)),
        _ => None,
    }
}

#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// No-suicide, ko, and turn order, in that order.
    pub fn standard() -> Self {
        Self {
            rules: vec![Box::new(NoSuicide), Box::new(KoRule), Box::new(TurnOrder)],
        }
    }

    pub fn add(&mut self, rule: Box<dyn Rule>) -> Result<&mut Self, GameError> {
        if self.contains(rule.name()) {
            return Err(GameError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Remove a rule by name. Returns whether it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.name() != name);
        self.rules.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Judge a move: bounds, emptiness, then every rule in order.
    pub fn check(&self, ctx: &RuleContext<'_>) -> Result<(), GameError> {
        if !ctx.board.in_bounds(ctx.mv.x, ctx.mv.y) {
            return Err(GameError::OutOfBounds);
        }
        if !ctx.board.is_empty_at(ctx.mv.x, ctx.mv.y) {
            return Err(GameError::OccupiedCell);
        }
        for rule in &self.rules {
            if !rule.allows(ctx) {
                debug!(rule = rule.name(), x = ctx.mv.x, y = ctx.mv.y, "move refused");
                return Err(GameError::RuleViolation(rule.name().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(board: &'a Board, history: &'a KoHistory, mv: Move, ko_flag: bool) -> RuleContext<'a> {
        RuleContext {
            mv,
            board,
            history,
            ko_flag,
            current_player: mv.color,
        }
    }

    #[test]
    fn test_suicide_refused() {
        let board = Board::from_rows(&[
            ".X...", //
            "X....", //
            ".....", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let history = KoHistory::new();
        let mv = Move::new(0, 0, Color::White);
        assert!(!NoSuicide.allows(&ctx(&board, &history, mv, false)));
        // The real board is untouched by the check.
        assert_eq!(board.stone_count(), 2);
    }

    #[test]
    fn test_capture_overrides_suicide() {
        let board = Board::from_rows(&[
            ".XO..", //
            "XO...", //
            "O....", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let history = KoHistory::new();
        // White at the corner has no liberty of its own but captures both
        // black stones.
        let mv = Move::new(0, 0, Color::White);
        assert!(NoSuicide.allows(&ctx(&board, &history, mv, false)));
    }

    #[test]
    fn test_turn_order() {
        let board = Board::new(5);
        let history = KoHistory::new();
        let mut c = ctx(&board, &history, Move::new(0, 0, Color::White), false);
        c.current_player = Color::Black;
        assert!(!TurnOrder.allows(&c));
    }

    #[test]
    fn test_duplicate_rule_refused() {
        let mut engine = RuleEngine::standard();
        let err = engine.add(Box::new(KoRule)).err();
        assert_eq!(err, Some(GameError::DuplicateRule(KO.into())));
        assert!(engine.remove(KO));
        assert!(!engine.remove(KO));
        assert!(engine.add(Box::new(KoRule)).is_ok());
        assert_eq!(engine.names(), vec![NO_SUICIDE, TURN_ORDER, KO]);
    }

    #[test]
    fn test_custom_rule_short_circuits() {
        let mut engine = RuleEngine::new();
        engine
            .add(Box::new(CustomRule::new("no-tengen", |c| c.mv.point() != (2, 2))))
            .unwrap();
        let board = Board::new(5);
        let history = KoHistory::new();
        let refused = engine.check(&ctx(&board, &history, Move::new(2, 2, Color::Black), false));
        assert_eq!(refused, Err(GameError::RuleViolation("no-tengen".into())));
        let allowed = engine.check(&ctx(&board, &history, Move::new(1, 2, Color::Black), false));
        assert_eq!(allowed, Ok(()));
    }

    #[test]
    fn test_check_reports_bounds_before_rules() {
        let engine = RuleEngine::standard();
        let board = Board::new(5);
        let history = KoHistory::new();
        let off = ctx(&board, &history, Move::new(5, 0, Color::Black), false);
        assert_eq!(engine.check(&off), Err(GameError::OutOfBounds));
    }
}
