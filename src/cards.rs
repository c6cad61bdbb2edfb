//! Cards and the piles they move between.
//!
//! Every card instance lives in exactly one place: the deck, a player's
//! hand, or the graveyard. Cards are created in the deck, drawn into hands,
//! and retired to the graveyard when played or discarded.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::Color;
use crate::error::GameError;
use crate::patterns::Pattern;

pub type CardId = u32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub pattern: Pattern,
}

impl Card {
    /// Stones that must be placed to finish the card.
    pub fn required_stones(&self) -> usize {
        self.pattern.stones()
    }
}

/// A card design; the deck holds several instances of each.
#[derive(Clone, Copy, Debug)]
pub struct CardTemplate {
    pub name: &'static str,
    pub rows: [&'static str; 5],
}

/// Built-in card designs, drawn from common Go shapes.
pub const CATALOG: &[CardTemplate] = &[
    CardTemplate {
        name: "Stone",
        rows: ["00000", "00000", "00100", "00000", "00000"],
    },
    CardTemplate {
        name: "Nobi",
        rows: ["00000", "00000", "00110", "00000", "00000"],
    },
    CardTemplate {
        name: "Kosumi",
        rows: ["00000", "00000", "00100", "00010", "00000"],
    },
    CardTemplate {
        name: "One-Space Jump",
        rows: ["00000", "00000", "00101", "00000", "00000"],
    },
    CardTemplate {
        name: "Keima",
        rows: ["00000", "00000", "00100", "00000", "00010"],
    },
    CardTemplate {
        name: "Wall",
        rows: ["00000", "00000", "01110", "00000", "00000"],
    },
    CardTemplate {
        name: "Empty Triangle",
        rows: ["00000", "00000", "00110", "00100", "00000"],
    },
    CardTemplate {
        name: "Tiger's Mouth",
        rows: ["00000", "01010", "00100", "00000", "00000"],
    },
    CardTemplate {
        name: "Bamboo Joint",
        rows: ["00000", "01100", "00000", "01100", "00000"],
    },
    CardTemplate {
        name: "Ponnuki",
        rows: ["00000", "00100", "01010", "00100", "00000"],
    },
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPiles {
    deck: Vec<Card>,
    graveyard: Vec<Card>,
    hands: BTreeMap<Color, Vec<Card>>,
}

impl CardPiles {
    /// Deck of `copies` instances of each template, shuffled with `seed`.
    /// Ids are assigned from 1 before shuffling.
    pub fn from_templates(
        templates: &[CardTemplate],
        copies: usize,
        seed: u64,
    ) -> Result<Self, GameError> {
        let mut deck = Vec::with_capacity(templates.len() * copies);
        let mut next_id: CardId = 1;
        for template in templates {
            let pattern = Pattern::parse(&template.rows)?;
            for _ in 0..copies {
                deck.push(Card {
                    id: next_id,
                    name: template.name.to_string(),
                    pattern: pattern.clone(),
                });
                next_id += 1;
            }
        }
        fastrand::Rng::with_seed(seed).shuffle(&mut deck);
        let mut hands = BTreeMap::new();
        hands.insert(Color::Black, Vec::new());
        hands.insert(Color::White, Vec::new());
        Ok(Self {
            deck,
            graveyard: Vec::new(),
            hands,
        })
    }

    pub fn standard(copies: usize, seed: u64) -> Result<Self, GameError> {
        Self::from_templates(CATALOG, copies, seed)
    }

    /// Deal alternately, Black first, until both hands hold `limit` cards or
    /// the deck runs out.
    pub fn deal(&mut self, limit: usize) {
        for _ in 0..limit {
            for color in [Color::Black, Color::White] {
                if self.hand(color).len() < limit {
                    if let Some(card) = self.draw() {
                        self.hand_mut(color).push(card);
                    }
                }
            }
        }
    }

    /// Take the top card. `None` once the deck is empty.
    pub fn draw(&mut self) -> Option<Card> {
        self.deck.pop()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn graveyard(&self) -> &[Card] {
        &self.graveyard
    }

    pub fn hand(&self, color: Color) -> &[Card] {
        self.hands.get(&color).map(Vec::as_slice).unwrap_or(&[])
    }

    fn hand_mut(&mut self, color: Color) -> &mut Vec<Card> {
        self.hands.entry(color).or_default()
    }

    pub fn find_in_hand(&self, color: Color, id: CardId) -> Option<&Card> {
        self.hand(color).iter().find(|c| c.id == id)
    }

    /// Move a card from `color`'s hand to the graveyard.
    pub fn retire_from_hand(&mut self, color: Color, id: CardId) -> Result<Card, GameError> {
        let hand = self.hand_mut(color);
        let i = hand
            .iter()
            .position(|c| c.id == id)
            .ok_or(GameError::CardNotInHand)?;
        let card = hand.remove(i);
        self.graveyard.push(card.clone());
        Ok(card)
    }

    /// Draw one card for `color` if the hand is below `limit`.
    pub fn refill(&mut self, color: Color, limit: usize) -> Option<Card> {
        if self.hand(color).len() >= limit {
            return None;
        }
        match self.draw() {
            Some(card) => {
                debug!(%color, card = %card.name, "drew card");
                self.hand_mut(color).push(card.clone());
                Some(card)
            }
            None => {
                warn!(%color, "deck is empty, no card drawn");
                None
            }
        }
    }

    /// Hands keyed by colour, restricted to `visible`.
    pub fn hands_for(&self, visible: &[Color]) -> BTreeMap<Color, Vec<Card>> {
        self.hands
            .iter()
            .filter(|(color, _)| visible.contains(color))
            .map(|(&color, cards)| (color, cards.clone()))
            .collect()
    }

    pub(crate) fn set_hand(&mut self, color: Color, cards: Vec<Card>) {
        self.hands.insert(color, cards);
    }

    pub(crate) fn set_graveyard(&mut self, cards: Vec<Card>) {
        self.graveyard = cards;
    }

    /// Drop cards the graveyard or the `imported` hands now hold from the
    /// deck and from every other hand, so each id sits in one pile.
    pub(crate) fn reconcile(&mut self, imported: &[Color]) {
        let claimed: BTreeSet<CardId> = imported
            .iter()
            .flat_map(|&color| self.hand(color))
            .chain(&self.graveyard)
            .map(|card| card.id)
            .collect();
        let before = self.total();
        self.deck.retain(|card| !claimed.contains(&card.id));
        for (color, hand) in &mut self.hands {
            if !imported.contains(color) {
                hand.retain(|card| !claimed.contains(&card.id));
            }
        }
        debug!(dropped = before - self.total(), "piles reconciled");
    }

    /// Ids of every card instance, pile by pile.
    pub fn card_ids(&self) -> Vec<CardId> {
        self.deck
            .iter()
            .chain(&self.graveyard)
            .chain(self.hands.values().flatten())
            .map(|card| card.id)
            .collect()
    }

    /// Total number of card instances across all piles.
    pub fn total(&self) -> usize {
        self.deck.len() + self.graveyard.len() + self.hands.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COPIES_PER_CARD, HAND_LIMIT};

    #[test]
    fn test_catalog_patterns_parse() {
        for template in CATALOG {
            let pattern = Pattern::parse(&template.rows).unwrap();
            assert!(pattern.stones() >= 1, "{} has no stones", template.name);
        }
    }

    #[test]
    fn test_deal_fills_both_hands() {
        let mut piles = CardPiles::standard(COPIES_PER_CARD, 7).unwrap();
        let total = piles.total();
        assert_eq!(total, CATALOG.len() * COPIES_PER_CARD);
        piles.deal(HAND_LIMIT);
        assert_eq!(piles.hand(Color::Black).len(), HAND_LIMIT);
        assert_eq!(piles.hand(Color::White).len(), HAND_LIMIT);
        assert_eq!(piles.total(), total);
    }

    #[test]
    fn test_same_seed_same_deck() {
        let a = CardPiles::standard(COPIES_PER_CARD, 42).unwrap();
        let b = CardPiles::standard(COPIES_PER_CARD, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_retire_and_refill() {
        let mut piles = CardPiles::standard(1, 3).unwrap();
        piles.deal(HAND_LIMIT);
        let id = piles.hand(Color::Black)[0].id;
        assert_eq!(
            piles.retire_from_hand(Color::White, id),
            Err(GameError::CardNotInHand)
        );
        let card = piles.retire_from_hand(Color::Black, id).unwrap();
        assert_eq!(card.id, id);
        assert_eq!(piles.graveyard().len(), 1);
        assert!(piles.refill(Color::Black, HAND_LIMIT).is_some());
        assert!(piles.refill(Color::Black, HAND_LIMIT).is_none());
        assert_eq!(piles.total(), CATALOG.len());
    }

    #[test]
    fn test_reconcile_leaves_each_card_in_one_pile() {
        let mut piles = CardPiles::standard(1, 5).unwrap();
        piles.deal(HAND_LIMIT);
        let total = piles.total();
        let black = piles.hand(Color::Black).to_vec();
        let white = piles.hand(Color::White).to_vec();

        // The other side discarded a black card and drew from its deck.
        let mut graveyard = vec![black[0].clone()];
        piles.set_graveyard(graveyard.clone());
        piles.reconcile(&[Color::White]);
        assert_eq!(piles.total(), total);
        assert_eq!(piles.hand(Color::Black), &black[1..]);

        // A hand received in full claims its cards from the deck.
        let mut received = white[1..].to_vec();
        received.push(piles.draw().unwrap());
        piles.hands.get_mut(&Color::Black).unwrap().push(received[2].clone());
        graveyard.push(white[0].clone());
        piles.set_graveyard(graveyard);
        piles.set_hand(Color::White, received);
        piles.reconcile(&[Color::White]);

        let mut ids = piles.card_ids();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert_eq!(piles.hand(Color::Black), &black[1..]);
    }

    #[test]
    fn test_refill_from_empty_deck() {
        let mut piles = CardPiles::from_templates(&CATALOG[..1], 1, 0).unwrap();
        piles.deal(HAND_LIMIT);
        assert_eq!(piles.deck_len(), 0);
        assert_eq!(piles.hand(Color::Black).len(), 1);
        assert!(piles.hand(Color::White).is_empty());
        let id = piles.hand(Color::Black)[0].id;
        piles.retire_from_hand(Color::Black, id).unwrap();
        assert!(piles.refill(Color::Black, HAND_LIMIT).is_none());
    }
}
