use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{Card, CardCount, FaceId, GameConfig, GameError, Result};

/// The full ordered set of cards for one round.
///
/// Invariant: every face id present appears exactly twice and the length is
/// even and non-zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build a deck from an explicit card list, checking the pairing invariant.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self> {
        if cards.is_empty() {
            return Err(GameError::EmptyGrid);
        }
        if cards.len() % 2 != 0 {
            return Err(GameError::OddCardCount);
        }

        let mut face_counts: BTreeMap<FaceId, u8> = BTreeMap::new();
        for card in &cards {
            *face_counts.entry(card.face()).or_default() += 1;
        }
        if face_counts.values().any(|&count| count != 2) {
            return Err(GameError::UnpairedFace);
        }

        Ok(Self { cards })
    }

    /// Build a face-down deck from a fixed face order, for tests and replays.
    pub fn from_faces(faces: impl IntoIterator<Item = FaceId>) -> Result<Self> {
        Self::from_cards(faces.into_iter().map(Card::new).collect())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total_pairs(&self) -> CardCount {
        (self.cards.len() / 2) as CardCount
    }

    pub fn get(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn card_mut(&mut self, index: usize) -> &mut Card {
        &mut self.cards[index]
    }

    pub(crate) fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> + '_ {
        self.cards.iter_mut()
    }

    /// How many pairs are already locked as matched.
    pub fn matched_pairs(&self) -> CardCount {
        let matched = self
            .cards
            .iter()
            .filter(|card| card.state().is_matched())
            .count();
        (matched / 2) as CardCount
    }
}

/// Strategy producing a shuffled, paired deck for a grid configuration.
pub trait DeckGenerator {
    fn generate(self, config: &GameConfig) -> Result<Deck>;
}

/// Uniform-random generation: a Fisher-Yates permutation of the face set
/// picks the pairs, a second shuffle orders the full deck.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RandomDeckGenerator {
    seed: u64,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(self, config: &GameConfig) -> Result<Deck> {
        config.validate()?;

        let pairs = config.total_pairs();
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut faces: Vec<FaceId> = (0..config.face_count).collect();
        faces.shuffle(&mut rng);
        faces.truncate(pairs as usize);

        let mut cards: Vec<Card> = faces
            .iter()
            .flat_map(|&face| [Card::new(face), Card::new(face)])
            .collect();
        cards.shuffle(&mut rng);

        log::debug!(
            "generated deck: {} cards, {} pairs, seed {}",
            cards.len(),
            pairs,
            self.seed
        );
        Ok(Deck { cards })
    }
}
