use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Card, CardCount, Deck, GameError, Result};

/// Valid transitions:
/// - Ready -> Active (first reveal)
/// - Active -> Won (last pair resolved)
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineState {
    /// No card has been revealed yet
    Ready,
    /// Round in progress
    Active,
    /// Every pair matched, no moves accepted anymore
    Won,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Ready
    }
}

/// Decision made once two cards are face up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Match,
    Mismatch,
}

/// Outcome of a reveal request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    /// First card of a pair is now face up
    Revealed,
    /// Second card is face up, resolution decided; the caller should call
    /// [`MatchEngine::resolve`] once its presentation delay elapses
    PairRevealed(Resolution),
}

impl RevealOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Revealed => true,
            Self::PairRevealed(_) => true,
        }
    }
}

/// Outcome of committing a pending resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    NoChange,
    Matched,
    Mismatched,
    /// The committed match was the last one
    Won,
}

impl ResolveOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Matched => true,
            Self::Mismatched => true,
            Self::Won => true,
        }
    }

    pub const fn is_win(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// Turn and match counters for one round. Monotone until an explicit reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_matches: CardCount,
    pub total_turns: u32,
}

/// Central controller: owns the deck, the 0-2 card reveal buffer, and the
/// round counters. Timing, rendering, and input stay with the embedding
/// layer; the engine only exposes plain transition functions.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchEngine {
    deck: Deck,
    reveal_buffer: SmallVec<[usize; 2]>,
    pending: Option<Resolution>,
    stats: GameStats,
    total_pairs: CardCount,
    state: EngineState,
}

impl MatchEngine {
    /// Start a fresh round over a generated deck. The pair total is fixed
    /// here once and never re-derived.
    pub fn new(deck: Deck) -> Self {
        let total_pairs = deck.total_pairs();
        Self {
            deck,
            reveal_buffer: SmallVec::new(),
            pending: None,
            stats: GameStats::default(),
            total_pairs,
            state: EngineState::default(),
        }
    }

    /// Rebuild an engine from persisted state. Only matched cards come back
    /// locked; an unresolved reveal is never restored face up.
    pub fn restore(deck: Deck, stats: GameStats) -> Self {
        let mut engine = Self::new(deck);
        engine.stats = stats;
        engine.state = if engine.matches_left() == 0 {
            EngineState::Won
        } else if stats != GameStats::default() || engine.deck.matched_pairs() > 0 {
            EngineState::Active
        } else {
            EngineState::Ready
        };
        engine
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn total_pairs(&self) -> CardCount {
        self.total_pairs
    }

    pub fn matches_left(&self) -> CardCount {
        self.total_pairs.saturating_sub(self.stats.total_matches)
    }

    pub fn cards(&self) -> &[Card] {
        self.deck.cards()
    }

    pub fn card_at(&self, index: usize) -> Result<Card> {
        self.deck.get(index).ok_or(GameError::InvalidIndex)
    }

    /// Resolution waiting for the caller's delayed [`resolve`](Self::resolve).
    pub fn pending(&self) -> Option<Resolution> {
        self.pending
    }

    /// Register a card tap. Flips the card face up and, when it completes a
    /// pair, decides the resolution and counts the turn. Duplicate taps,
    /// taps on matched cards, and a third tap while a pair awaits its
    /// resolution are all ignored.
    pub fn reveal(&mut self, index: usize) -> Result<RevealOutcome> {
        use RevealOutcome::*;

        let card = self.deck.get(index).ok_or(GameError::InvalidIndex)?;
        self.check_not_finished()?;

        // resolve-lock: only two cards can ever be compared at a time
        if self.pending.is_some() || self.reveal_buffer.len() >= 2 {
            log::trace!("reveal {} ignored, resolution pending", index);
            return Ok(NoChange);
        }
        if self.reveal_buffer.contains(&index) {
            log::trace!("reveal {} ignored, already buffered", index);
            return Ok(NoChange);
        }
        if card.state().is_matched() {
            log::trace!("reveal {} ignored, card already matched", index);
            return Ok(NoChange);
        }

        if !self.deck.card_mut(index).reveal().has_update() {
            return Ok(NoChange);
        }
        self.mark_started();
        self.reveal_buffer.push(index);
        log::debug!("revealed card {} ({} buffered)", index, self.reveal_buffer.len());

        if self.reveal_buffer.len() < 2 {
            return Ok(Revealed);
        }

        let first = self.deck.cards()[self.reveal_buffer[0]];
        let second = self.deck.cards()[self.reveal_buffer[1]];
        self.stats.total_turns += 1;
        let resolution = if first.face() == second.face() {
            self.stats.total_matches += 1;
            Resolution::Match
        } else {
            Resolution::Mismatch
        };
        log::debug!(
            "turn {}: faces {} vs {} -> {:?}",
            self.stats.total_turns,
            first.face(),
            second.face(),
            resolution
        );
        self.pending = Some(resolution);
        Ok(PairRevealed(resolution))
    }

    /// Commit the pending resolution: lock a matched pair or flip a
    /// mismatched one back down, then clear the buffer. Safe to call from a
    /// stale delayed callback; with nothing pending it is a no-op.
    pub fn resolve(&mut self) -> ResolveOutcome {
        use ResolveOutcome::*;

        let Some(resolution) = self.pending.take() else {
            return NoChange;
        };

        let buffered: SmallVec<[usize; 2]> = std::mem::take(&mut self.reveal_buffer);
        match resolution {
            Resolution::Match => {
                for &index in &buffered {
                    self.deck.card_mut(index).lock_as_matched();
                }
                if self.stats.total_matches >= self.total_pairs {
                    self.state = EngineState::Won;
                    log::debug!("round won in {} turns", self.stats.total_turns);
                    Won
                } else {
                    Matched
                }
            }
            Resolution::Mismatch => {
                for &index in &buffered {
                    self.deck.card_mut(index).reset_to_face_down();
                }
                Mismatched
            }
        }
    }

    /// Start the round over on the same deck layout: every card face down,
    /// counters zeroed. Idempotent.
    pub fn reset_game(&mut self) {
        for card in self.deck.cards_mut() {
            *card = Card::new(card.face());
        }
        self.reveal_buffer.clear();
        self.pending = None;
        self.stats = GameStats::default();
        self.state = EngineState::Ready;
        log::debug!("game reset");
    }

    fn mark_started(&mut self) {
        if self.state.is_ready() {
            self.state = EngineState::Active;
        }
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CardState;

    fn engine_2x2() -> MatchEngine {
        // fixed layout [A, A, B, B]
        MatchEngine::new(Deck::from_faces([0, 0, 1, 1]).unwrap())
    }

    #[test]
    fn matching_pair_counts_turn_and_match() {
        let mut engine = engine_2x2();

        assert_eq!(engine.reveal(0).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(
            engine.reveal(1).unwrap(),
            RevealOutcome::PairRevealed(Resolution::Match)
        );
        assert_eq!(engine.stats(), GameStats { total_matches: 1, total_turns: 1 });

        assert_eq!(engine.resolve(), ResolveOutcome::Matched);
        assert_eq!(engine.card_at(0).unwrap().state(), CardState::Matched);
        assert_eq!(engine.card_at(1).unwrap().state(), CardState::Matched);
    }

    #[test]
    fn mismatch_counts_turn_only_and_flips_back() {
        let mut engine = engine_2x2();

        engine.reveal(0).unwrap();
        assert_eq!(
            engine.reveal(2).unwrap(),
            RevealOutcome::PairRevealed(Resolution::Mismatch)
        );
        assert_eq!(engine.stats(), GameStats { total_matches: 0, total_turns: 1 });

        assert_eq!(engine.resolve(), ResolveOutcome::Mismatched);
        assert_eq!(engine.card_at(0).unwrap().state(), CardState::FaceDown);
        assert_eq!(engine.card_at(2).unwrap().state(), CardState::FaceDown);
    }

    #[test]
    fn win_triggers_exactly_once() {
        let mut engine = engine_2x2();

        engine.reveal(0).unwrap();
        engine.reveal(1).unwrap();
        assert_eq!(engine.resolve(), ResolveOutcome::Matched);

        engine.reveal(2).unwrap();
        engine.reveal(3).unwrap();
        assert_eq!(engine.resolve(), ResolveOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);

        // no further moves, no second win
        assert_eq!(engine.resolve(), ResolveOutcome::NoChange);
        assert_eq!(engine.reveal(0), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn duplicate_and_matched_reveals_are_ignored() {
        let mut engine = engine_2x2();

        engine.reveal(0).unwrap();
        assert_eq!(engine.reveal(0).unwrap(), RevealOutcome::NoChange);

        engine.reveal(1).unwrap();
        engine.resolve();
        let stats = engine.stats();

        assert_eq!(engine.reveal(0).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.reveal(1).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.stats(), stats);
    }

    #[test]
    fn third_reveal_is_locked_out_until_resolution() {
        let mut engine = engine_2x2();

        engine.reveal(0).unwrap();
        engine.reveal(2).unwrap();

        assert_eq!(engine.reveal(3).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.card_at(3).unwrap().state(), CardState::FaceDown);
        assert_eq!(engine.stats().total_turns, 1);

        engine.resolve();
        assert_eq!(engine.reveal(3).unwrap(), RevealOutcome::Revealed);
    }

    #[test]
    fn stale_resolve_after_reset_is_harmless() {
        let mut engine = engine_2x2();

        engine.reveal(0).unwrap();
        engine.reveal(1).unwrap();
        engine.reset_game();

        // simulates a delayed callback firing after a new-game reset
        assert_eq!(engine.resolve(), ResolveOutcome::NoChange);
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.stats(), GameStats::default());
        assert!(engine
            .cards()
            .iter()
            .all(|card| card.state() == CardState::FaceDown));
    }

    #[test]
    fn invalid_index_is_an_error() {
        let mut engine = engine_2x2();
        assert_eq!(engine.reveal(4), Err(GameError::InvalidIndex));
    }

    #[test]
    fn restore_locks_matched_cards_only() {
        let deck = Deck::from_cards(vec![
            Card::with_state(0, CardState::Matched),
            Card::with_state(0, CardState::Matched),
            Card::with_state(1, CardState::FaceDown),
            Card::with_state(1, CardState::FaceDown),
        ])
        .unwrap();
        let engine = MatchEngine::restore(
            deck,
            GameStats {
                total_matches: 1,
                total_turns: 3,
            },
        );

        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(engine.matches_left(), 1);
        assert_eq!(engine.card_at(0).unwrap().state(), CardState::Matched);
        assert_eq!(engine.card_at(2).unwrap().state(), CardState::FaceDown);
    }

    #[test]
    fn restore_with_everything_matched_is_won() {
        let deck = Deck::from_cards(vec![
            Card::with_state(0, CardState::Matched),
            Card::with_state(0, CardState::Matched),
        ])
        .unwrap();
        let engine = MatchEngine::restore(
            deck,
            GameStats {
                total_matches: 1,
                total_turns: 1,
            },
        );
        assert!(engine.is_finished());
    }
}
