use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

/// Number of cards dealt on a board.
pub const BOARD_SIZE: usize = 16;
/// Number of distinct pair values on a board.
pub const PAIR_COUNT: u8 = (BOARD_SIZE / 2) as u8;

/// One card of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Position of the card on the board (0..16).
    pub id: u8,
    /// Pair identifier shared with exactly one other card (0..8).
    pub value: u8,
    /// Whether the card is currently face-up.
    pub is_revealed: bool,
    /// Whether the card belongs to a found pair.
    pub is_matched: bool,
}

impl Card {
    fn hidden(id: u8, value: u8) -> Self {
        Self {
            id,
            value,
            is_revealed: false,
            is_matched: false,
        }
    }

    /// Face-up and not yet part of a found pair.
    pub fn is_pending(&self) -> bool {
        self.is_revealed && !self.is_matched
    }
}

/// Ordered set of cards making up a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cards: Vec<Card>,
}

impl Board {
    /// Deal a freshly shuffled board using the thread-local RNG.
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut rand::rng())
    }

    /// Deal a shuffled board from the provided RNG.
    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values: Vec<u8> = (0..BOARD_SIZE as u8).map(|i| i / 2).collect();
        values.shuffle(rng);

        let cards = values
            .into_iter()
            .enumerate()
            .map(|(position, value)| Card::hidden(position as u8, value))
            .collect();

        Self { cards }
    }

    /// Build a board from explicit pair values, in position order.
    ///
    /// Returns `None` unless every value in `0..8` appears exactly twice.
    pub fn from_values(values: &[u8]) -> Option<Self> {
        if values.len() != BOARD_SIZE {
            return None;
        }

        let mut counts = [0u8; PAIR_COUNT as usize];
        for value in values {
            let slot = counts.get_mut(*value as usize)?;
            *slot += 1;
        }
        if counts.iter().any(|count| *count != 2) {
            return None;
        }

        let cards = values
            .iter()
            .enumerate()
            .map(|(position, value)| Card::hidden(position as u8, *value))
            .collect();
        Some(Self { cards })
    }

    /// Cards in position order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn card_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.cards.get_mut(index)
    }

    pub(crate) fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        self.cards.iter_mut()
    }

    /// Indices of cards that are face-up but unmatched.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.is_pending())
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of cards not yet matched.
    pub fn unmatched_count(&self) -> usize {
        self.cards.iter().filter(|card| !card.is_matched).count()
    }

    /// Number of fully matched pairs.
    pub fn matched_pairs(&self) -> u8 {
        (self.cards.iter().filter(|card| card.is_matched).count() / 2) as u8
    }

    /// Distinct pair values that still have an unmatched card, ascending.
    pub fn unmatched_values(&self) -> Vec<u8> {
        let mut values: Vec<u8> = self
            .cards
            .iter()
            .filter(|card| !card.is_matched)
            .map(|card| card.value)
            .collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Turn every non-matched card face-down.
    pub(crate) fn hide_unmatched(&mut self) {
        for card in self.cards.iter_mut().filter(|card| !card.is_matched) {
            card.is_revealed = false;
        }
    }
}
