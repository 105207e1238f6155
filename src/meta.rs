// Per-game meta state: the discussion clock and named character decks.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Logical discussion clock, decremented by chat events rather than wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionTimer {
    remaining: u32,
    initial: u32,
}

impl DiscussionTimer {
    pub fn new(initial: u32) -> Self {
        DiscussionTimer {
            remaining: initial,
            initial,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn initial(&self) -> u32 {
        self.initial
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Counts one chat message and returns what is left.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    pub fn reset(&mut self) {
        self.remaining = self.initial;
    }

    pub fn expire(&mut self) {
        self.remaining = 0;
    }

    /// Storyteller override: changes both the running clock and future resets.
    pub fn set(&mut self, turns: u32) {
        self.initial = turns;
        self.remaining = turns;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub timer: DiscussionTimer,
    decks: BTreeMap<String, Vec<Role>>,
}

impl Meta {
    pub fn new(discussion_timer: u32) -> Self {
        Meta {
            timer: DiscussionTimer::new(discussion_timer),
            decks: BTreeMap::new(),
        }
    }

    /// Replaces the named deck, shuffling it when an RNG is supplied.
    pub fn init_deck(&mut self, name: &str, mut cards: Vec<Role>, rng: Option<&mut StdRng>) {
        if let Some(rng) = rng {
            cards.shuffle(rng);
        }
        self.decks.insert(name.to_string(), cards);
    }

    /// Draws up to `n` cards from the top of the deck.
    pub fn draw(&mut self, name: &str, n: usize) -> Vec<Role> {
        match self.decks.get_mut(name) {
            Some(deck) => {
                let n = n.min(deck.len());
                deck.drain(..n).collect()
            }
            None => Vec::new(),
        }
    }

    /// Removes and returns the first card matching `pred`.
    pub fn take_first(&mut self, name: &str, pred: impl Fn(&Role) -> bool) -> Option<Role> {
        let deck = self.decks.get_mut(name)?;
        let idx = deck.iter().position(|card| pred(card))?;
        Some(deck.remove(idx))
    }

    pub fn peek(&self, name: &str) -> &[Role] {
        self.decks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_timer_counts_down_and_saturates() {
        let mut timer = DiscussionTimer::new(3);
        assert_eq!(timer.tick(), 2);
        assert_eq!(timer.tick(), 1);
        assert_eq!(timer.tick(), 0);
        assert!(timer.is_expired());
        assert_eq!(timer.tick(), 0, "timer never goes negative");
        timer.reset();
        assert_eq!(timer.remaining(), 3);
    }

    #[test]
    fn test_timer_override() {
        let mut timer = DiscussionTimer::new(5);
        timer.tick();
        timer.set(2);
        assert_eq!(timer.remaining(), 2);
        timer.tick();
        timer.reset();
        assert_eq!(timer.remaining(), 2, "override also changes the reset value");
    }

    #[test]
    fn test_decks_draw_and_take() {
        let mut meta = Meta::new(5);
        meta.init_deck("bluffs", vec![Role::Chef, Role::Saint, Role::Monk], None);
        assert_eq!(meta.take_first("bluffs", |r| *r == Role::Saint), Some(Role::Saint));
        assert_eq!(meta.draw("bluffs", 5), vec![Role::Chef, Role::Monk]);
        assert!(meta.peek("bluffs").is_empty());
        assert!(meta.draw("missing", 1).is_empty());
    }

    #[test]
    fn test_shuffled_deck_is_seed_stable() {
        let cards = Role::all().to_vec();
        let mut a = Meta::new(5);
        let mut b = Meta::new(5);
        a.init_deck("d", cards.clone(), Some(&mut StdRng::seed_from_u64(7)));
        b.init_deck("d", cards.clone(), Some(&mut StdRng::seed_from_u64(7)));
        assert_eq!(a.peek("d"), b.peek("d"));
        assert_eq!(a.peek("d").len(), cards.len());
    }
}
