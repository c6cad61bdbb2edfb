//! The game session: turns, rules, cards and observers around one board.
//!
//! A [`GameSession`] owns every piece of mutable game state. Callers drive it
//! through [`GameSession::place_stone`], [`GameSession::select_card`] and
//! [`GameSession::discard_card`], and branch on the returned `Result`.
//! Rejected moves are also broadcast as `invalidMove` events.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::board::{Board, Color, Move, Point};
use crate::cards::{CATALOG, Card, CardId, CardPiles, CardTemplate};
use crate::constants::{COPIES_PER_CARD, DEFAULT_BOARD_SIZE, HAND_LIMIT, MAX_BOARD_SIZE};
use crate::error::GameError;
use crate::events::{EventKind, GameEvent, HandlerId, Observers};
use crate::ko::KoHistory;
use crate::patterns::can_play_anywhere;
use crate::play::{CardPlay, FinishedCard, PlayState};
use crate::rules::{Rule, RuleContext, RuleEngine, TURN_ORDER};

/// Who is sitting at this session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seat {
    /// Hot-seat play: acts for whoever is to move and sees both hands.
    Local,
    /// Acts for one colour only and sees only that hand.
    Player(Color),
    /// Watches both hands, never acts.
    Spectator,
}

impl Seat {
    /// Colours whose hands this seat may see.
    pub fn visible(self) -> Vec<Color> {
        match self {
            Seat::Player(color) => vec![color],
            Seat::Local | Seat::Spectator => vec![Color::Black, Color::White],
        }
    }
}

impl FromStr for Seat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Seat::Local),
            "black" | "b" => Ok(Seat::Player(Color::Black)),
            "white" | "w" => Ok(Seat::Player(Color::White)),
            "spectator" => Ok(Seat::Spectator),
            other => Err(format!("unknown seat: {other}")),
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Local => f.write_str("local"),
            Seat::Player(Color::Black) => f.write_str("black"),
            Seat::Player(Color::White) => f.write_str("white"),
            Seat::Spectator => f.write_str("spectator"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub size: usize,
    /// Play with cards. When off, every stone is a plain move.
    pub card_mode: bool,
    pub seat: Seat,
    /// Deck shuffle seed.
    pub seed: u64,
    pub hand_limit: usize,
    pub copies_per_card: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            card_mode: true,
            seat: Seat::Local,
            seed: 0,
            hand_limit: HAND_LIMIT,
            copies_per_card: COPIES_PER_CARD,
        }
    }
}

/// Serializable snapshot exchanged with other seats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub current_player: Color,
    pub move_log: Vec<Move>,
    pub ko_history: KoHistory,
    pub ko_flag: bool,
    #[serde(default)]
    pub graveyard: Vec<Card>,
    /// Only the hands the exporting seat could see.
    #[serde(default)]
    pub hands: BTreeMap<Color, Vec<Card>>,
}

impl GameState {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Result of a successful [`GameSession::place_stone`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// A plain stone outside card mode.
    Played { captures: Vec<Point> },
    /// A card stone; more are needed.
    InProgress {
        placed: usize,
        required: usize,
        captures: Vec<Point>,
    },
    /// The card's last stone. The card is in the graveyard either way;
    /// `valid_pattern` tells whether the stones formed its pattern.
    Complete {
        card: Card,
        valid_pattern: bool,
        drawn: Option<Card>,
        captures: Vec<Point>,
        next_player: Color,
    },
}

impl PlaceOutcome {
    pub fn captures(&self) -> &[Point] {
        match self {
            PlaceOutcome::Played { captures }
            | PlaceOutcome::InProgress { captures, .. }
            | PlaceOutcome::Complete { captures, .. } => captures,
        }
    }
}

/// Position saved before a card's first stone, restored if the card is
/// abandoned.
#[derive(Clone, Debug)]
struct Checkpoint {
    board: Board,
    move_log: Vec<Move>,
    ko_history: KoHistory,
    ko_flag: bool,
}

pub struct GameSession {
    config: GameConfig,
    board: Board,
    current: Color,
    move_log: Vec<Move>,
    ko_history: KoHistory,
    ko_flag: bool,
    rules: RuleEngine,
    observers: Observers,
    piles: Option<CardPiles>,
    play: CardPlay,
    checkpoint: Option<Checkpoint>,
}

impl GameSession {
    /// New game with the built-in card catalog.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_templates(config, CATALOG)
    }

    /// New game whose deck is built from `templates`.
    pub fn with_templates(config: GameConfig, templates: &[CardTemplate]) -> Result<Self, GameError> {
        if config.size == 0 || config.size > MAX_BOARD_SIZE {
            return Err(GameError::InvalidState(format!(
                "board size {} outside 1..={MAX_BOARD_SIZE}",
                config.size
            )));
        }
        let piles = if config.card_mode {
            let mut piles =
                CardPiles::from_templates(templates, config.copies_per_card, config.seed)?;
            piles.deal(config.hand_limit);
            Some(piles)
        } else {
            None
        };
        debug!(size = config.size, cards = config.card_mode, seat = %config.seat, "new game");
        Ok(Self {
            board: Board::new(config.size),
            config,
            current: Color::Black,
            move_log: Vec::new(),
            ko_history: KoHistory::new(),
            ko_flag: false,
            rules: RuleEngine::standard(),
            observers: Observers::new(),
            piles,
            play: CardPlay::new(),
            checkpoint: None,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Color {
        self.current
    }

    pub fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    pub fn ko_history(&self) -> &KoHistory {
        &self.ko_history
    }

    pub fn ko_flag(&self) -> bool {
        self.ko_flag
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// `None` outside card mode.
    pub fn piles(&self) -> Option<&CardPiles> {
        self.piles.as_ref()
    }

    pub fn card_play(&self) -> &CardPlay {
        &self.play
    }

    /// The colour this seat moves with right now.
    pub fn acting_color(&self) -> Result<Color, GameError> {
        match self.config.seat {
            Seat::Local => Ok(self.current),
            Seat::Player(color) => Ok(color),
            Seat::Spectator => Err(GameError::SpectatorCannotPlay),
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.acting_color() == Ok(self.current)
    }

    /// Hand of the acting colour, or of the player to move for spectators.
    pub fn hand(&self) -> &[Card] {
        let color = self.acting_color().unwrap_or(self.current);
        self.piles
            .as_ref()
            .map(|p| p.hand(color))
            .unwrap_or(&[])
    }

    /// Judge `mv` against the rules without playing it.
    pub fn check_move(&self, mv: Move) -> Result<(), GameError> {
        self.rules.check(&self.context(mv))
    }

    pub fn is_valid_move(&self, mv: Move) -> bool {
        self.check_move(mv).is_ok()
    }

    fn context(&self, mv: Move) -> RuleContext<'_> {
        RuleContext {
            mv,
            board: &self.board,
            history: &self.ko_history,
            ko_flag: self.ko_flag,
            current_player: self.current,
        }
    }

    /// Validate and apply a single stone, then pass the turn.
    ///
    /// This is the move primitive: it ignores cards entirely.
    pub fn play_move(&mut self, mv: Move) -> Result<Vec<Point>, GameError> {
        self.apply_move(mv, true)
    }

    fn apply_move(&mut self, mv: Move, end_turn: bool) -> Result<Vec<Point>, GameError> {
        self.observers.emit(&GameEvent::BeforeMove {
            mv,
            board: &self.board,
        });
        if let Err(err) = self.check_move(mv) {
            self.reject(Some(mv), &err);
            return Err(err);
        }
        let captures = self.board.play(mv)?;
        if !captures.is_empty() {
            self.observers.emit(&GameEvent::Capture {
                mv,
                board: &self.board,
                captures: &captures,
            });
        }
        self.ko_history.record(self.board.snapshot());
        self.ko_flag = captures.len() == 1;
        self.move_log.push(mv);
        if end_turn {
            self.current = self.current.opponent();
        }
        debug!(x = mv.x, y = mv.y, color = %mv.color, captured = captures.len(), "move played");
        self.observers.emit(&GameEvent::AfterMove {
            mv,
            board: &self.board,
            captures: &captures,
        });
        Ok(captures)
    }

    /// Broadcast a refused action. `mv` is `None` for refusals that are not
    /// stone placements, such as discards.
    fn reject(&mut self, mv: Option<Move>, error: &GameError) {
        debug!(?mv, error = error.kind(), "action rejected");
        self.observers.emit(&GameEvent::InvalidMove {
            mv,
            board: &self.board,
            error,
        });
    }

    /// Place a stone for the acting colour.
    ///
    /// In card mode the stone counts toward the selected card, and the turn
    /// passes only when the card's last stone is in.
    pub fn place_stone(&mut self, x: usize, y: usize) -> Result<PlaceOutcome, GameError> {
        let color = match self.acting_color() {
            Ok(color) => color,
            Err(err) => {
                self.reject(Some(Move::new(x, y, self.current)), &err);
                return Err(err);
            }
        };
        let mv = Move::new(x, y, color);
        if self.piles.is_none() {
            let captures = self.play_move(mv)?;
            return Ok(PlaceOutcome::Played { captures });
        }
        if let Err(err) = self.play.check_placement(&self.board, mv) {
            self.reject(Some(mv), &err);
            return Err(err);
        }
        let saved = (self.play.state() == PlayState::CardSelected).then(|| Checkpoint {
            board: self.board.clone(),
            move_log: self.move_log.clone(),
            ko_history: self.ko_history.clone(),
            ko_flag: self.ko_flag,
        });
        let captures = self.apply_move(mv, false)?;
        if saved.is_some() {
            self.checkpoint = saved;
        }
        match self.play.record(mv) {
            Some(finished) => Ok(self.finish_card(finished, captures)),
            None => {
                let (placed, required) = self.play.progress().unwrap_or_default();
                Ok(PlaceOutcome::InProgress {
                    placed,
                    required,
                    captures,
                })
            }
        }
    }

    fn finish_card(&mut self, finished: FinishedCard, captures: Vec<Point>) -> PlaceOutcome {
        self.checkpoint = None;
        let owner = finished.owner().unwrap_or(self.current);
        let limit = self.config.hand_limit;
        let mut drawn = None;
        if let Some(piles) = self.piles.as_mut() {
            if let Err(err) = piles.retire_from_hand(owner, finished.card.id) {
                warn!(card = finished.card.id, %owner, %err, "finished card missing from hand");
            }
            drawn = piles.refill(owner, limit);
        }
        self.current = self.current.opponent();
        PlaceOutcome::Complete {
            card: finished.card,
            valid_pattern: finished.valid_pattern,
            drawn,
            captures,
            next_player: self.current,
        }
    }

    /// Start playing card `id` from the acting hand. Stones already placed
    /// for a previous, unfinished card are taken back.
    pub fn select_card(&mut self, id: CardId) -> Result<&Card, GameError> {
        let color = self.acting_color()?;
        let piles = self.piles.as_ref().ok_or(GameError::CardModeDisabled)?;
        let card = piles
            .find_in_hand(color, id)
            .ok_or(GameError::CardNotInHand)?
            .clone();
        self.rollback_card_stones();
        self.play.select(card);
        self.play.card().ok_or(GameError::NoCardSelected)
    }

    /// Abandon the current card play, taking back any stones placed for it.
    pub fn deselect_card(&mut self) -> Option<Card> {
        self.rollback_card_stones();
        self.play.deselect()
    }

    fn rollback_card_stones(&mut self) {
        let Some(saved) = self.checkpoint.take() else {
            return;
        };
        debug!(stones = self.play.moves().len(), "card stones taken back");
        self.board = saved.board;
        self.move_log = saved.move_log;
        self.ko_history = saved.ko_history;
        self.ko_flag = saved.ko_flag;
    }

    /// Throw card `id` away and pass the turn. Draws a replacement. Stones of
    /// an unfinished card are taken back first.
    pub fn discard_card(&mut self, id: CardId) -> Result<Option<Card>, GameError> {
        self.try_discard(id).inspect_err(|err| self.reject(None, err))
    }

    fn try_discard(&mut self, id: CardId) -> Result<Option<Card>, GameError> {
        let color = self.acting_color()?;
        if color != self.current {
            return Err(GameError::RuleViolation(TURN_ORDER.to_string()));
        }
        let limit = self.config.hand_limit;
        let piles = self.piles.as_mut().ok_or(GameError::CardModeDisabled)?;
        let card = piles.retire_from_hand(color, id)?;
        let drawn = piles.refill(color, limit);
        info!(card = %card.name, id, %color, "card discarded");
        self.rollback_card_stones();
        self.play.deselect();
        self.current = self.current.opponent();
        Ok(drawn)
    }

    /// Whether the acting colour could lay `card`'s whole pattern somewhere.
    pub fn can_play_anywhere(&self, card: &Card) -> bool {
        let color = self.acting_color().unwrap_or(self.current);
        can_play_anywhere(&card.pattern, &self.board, color)
    }

    pub fn can_play_any_card(&self) -> bool {
        self.hand().iter().any(|card| self.can_play_anywhere(card))
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) -> Result<(), GameError> {
        self.rules.add(rule).map(|_| ())
    }

    pub fn remove_rule(&mut self, name: &str) -> bool {
        self.rules.remove(name)
    }

    /// Subscribe to an event by name (`beforeMove`, `afterMove`,
    /// `invalidMove`, `capture`).
    pub fn on(
        &mut self,
        event: &str,
        handler: impl FnMut(&GameEvent<'_>) + 'static,
    ) -> Result<HandlerId, GameError> {
        let kind: EventKind = event.parse()?;
        Ok(self.on_kind(kind, handler))
    }

    pub fn on_kind(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&GameEvent<'_>) + 'static,
    ) -> HandlerId {
        self.observers.on(kind, Box::new(handler))
    }

    /// Unsubscribe a handler returned by [`GameSession::on`].
    pub fn off(&mut self, event: &str, id: HandlerId) -> Result<bool, GameError> {
        let _: EventKind = event.parse()?;
        Ok(self.observers.off(id))
    }

    /// Snapshot for other seats, with only the hands this seat can see.
    pub fn export_state(&self) -> GameState {
        let (graveyard, hands) = match &self.piles {
            Some(piles) => (
                piles.graveyard().to_vec(),
                piles.hands_for(&self.config.seat.visible()),
            ),
            None => (Vec::new(), BTreeMap::new()),
        };
        GameState {
            board: self.board.clone(),
            current_player: self.current,
            move_log: self.move_log.clone(),
            ko_history: self.ko_history.clone(),
            ko_flag: self.ko_flag,
            graveyard,
            hands,
        }
    }

    /// Overwrite local state with a received snapshot. Hands are taken only
    /// where this seat may see them; cards the snapshot places elsewhere are
    /// dropped from the local deck and the other hands.
    pub fn import_state(&mut self, state: GameState) -> Result<(), GameError> {
        state.board.validate()?;
        if state.board.size() != self.board.size() {
            return Err(GameError::InvalidState(format!(
                "board size {} does not match {}",
                state.board.size(),
                self.board.size()
            )));
        }
        if let Some(mv) = state
            .move_log
            .iter()
            .find(|m| !state.board.in_bounds(m.x, m.y))
        {
            return Err(GameError::InvalidState(format!(
                "logged move ({}, {}) is off the board",
                mv.x, mv.y
            )));
        }
        let visible = self.config.seat.visible();
        if let Some(piles) = self.piles.as_mut() {
            piles.set_graveyard(state.graveyard);
            let mut imported = Vec::new();
            for (color, cards) in state.hands {
                if visible.contains(&color) {
                    piles.set_hand(color, cards);
                    imported.push(color);
                }
            }
            piles.reconcile(&imported);
        }
        self.checkpoint = None;
        self.board = state.board;
        self.current = state.current_player;
        self.move_log = state.move_log;
        self.ko_history = state.ko_history.truncated();
        self.ko_flag = state.ko_flag;
        self.play.deselect();
        info!(moves = self.move_log.len(), to_move = %self.current, "state imported");
        Ok(())
    }
}
