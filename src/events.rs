//! Move lifecycle events and their observers.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Move, Point};
use crate::error::GameError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeMove,
    AfterMove,
    InvalidMove,
    Capture,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::BeforeMove,
        EventKind::AfterMove,
        EventKind::InvalidMove,
        EventKind::Capture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::BeforeMove => "beforeMove",
            EventKind::AfterMove => "afterMove",
            EventKind::InvalidMove => "invalidMove",
            EventKind::Capture => "capture",
        }
    }
}

impl FromStr for EventKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| GameError::UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload handed to observers. The board is the session's board at the
/// time of the event.
#[derive(Debug)]
pub enum GameEvent<'a> {
    BeforeMove {
        mv: Move,
        board: &'a Board,
    },
    AfterMove {
        mv: Move,
        board: &'a Board,
        captures: &'a [Point],
    },
    /// `mv` is `None` when the refused action was not a stone, e.g. a
    /// discard.
    InvalidMove {
        mv: Option<Move>,
        board: &'a Board,
        error: &'a GameError,
    },
    Capture {
        mv: Move,
        board: &'a Board,
        captures: &'a [Point],
    },
}

impl GameEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::BeforeMove { .. } => EventKind::BeforeMove,
            GameEvent::AfterMove { .. } => EventKind::AfterMove,
            GameEvent::InvalidMove { .. } => EventKind::InvalidMove,
            GameEvent::Capture { .. } => EventKind::Capture,
        }
    }

    pub fn mv(&self) -> Option<Move> {
        match *self {
            GameEvent::BeforeMove { mv, .. }
            | GameEvent::AfterMove { mv, .. }
            | GameEvent::Capture { mv, .. } => Some(mv),
            GameEvent::InvalidMove { mv, .. } => mv,
        }
    }

    pub fn board(&self) -> &Board {
        match *self {
            GameEvent::BeforeMove { board, .. }
            | GameEvent::AfterMove { board, .. }
            | GameEvent::InvalidMove { board, .. }
            | GameEvent::Capture { board, .. } => board,
        }
    }

    /// Captured points for `AfterMove` and `Capture`; empty otherwise.
    pub fn captures(&self) -> &[Point] {
        match *self {
            GameEvent::AfterMove { captures, .. } | GameEvent::Capture { captures, .. } => captures,
            _ => &[],
        }
    }
}

pub type HandlerId = usize;

pub type Handler = Box<dyn FnMut(&GameEvent<'_>)>;

/// Registered handlers, called in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: HandlerId,
    handlers: Vec<(HandlerId, EventKind, Handler)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    /// Unsubscribe. Returns whether the id was registered.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _, _)| *h != id);
        self.handlers.len() != before
    }

    #[cfg(test)]
    fn count(&self, kind: EventKind) -> usize {
        self.handlers.iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub fn emit(&mut self, event: &GameEvent<'_>) {
        let kind = event.kind();
        for (_, k, handler) in &mut self.handlers {
            if *k == kind {
                handler(event);
            }
        }
    }
}
