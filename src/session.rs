use std::collections::HashMap;

use crate::{
    Coord, DeckGenerator, GameConfig, MatchEngine, PersistedState, ResolveOutcome, Result,
    RevealOutcome,
};

/// Storage key for the saved round.
pub const SAVE_KEY: &str = "cardGameSave";

/// Minimal abstraction over the embedding platform's key-value storage
/// (browser local storage, a file, ...). The core never touches the
/// platform directly.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and headless embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Composition root tying the engine to persistence: resumes a saved round
/// when one decodes, autosaves after each resolved match, and purges the
/// save once the round is won.
#[derive(Clone, Debug)]
pub struct GameSession<S> {
    engine: MatchEngine,
    rows: Coord,
    cols: Coord,
    store: S,
}

impl<S: KeyValueStore> GameSession<S> {
    /// Resume the saved round if the store holds a valid one, otherwise
    /// generate a fresh deck. A corrupt save is discarded, never fatal.
    pub fn start<G: DeckGenerator>(config: &GameConfig, generator: G, store: S) -> Result<Self> {
        if let Some(blob) = store.get(SAVE_KEY) {
            match PersistedState::from_json(&blob) {
                Ok(saved) => {
                    let (rows, cols) = (saved.rows, saved.cols);
                    let stats = saved.stats();
                    match saved.into_deck() {
                        Ok(deck) => {
                            log::debug!("resumed saved round");
                            return Ok(Self {
                                engine: MatchEngine::restore(deck, stats),
                                rows,
                                cols,
                                store,
                            });
                        }
                        Err(err) => log::debug!("discarding saved round: {}", err),
                    }
                }
                Err(err) => log::debug!("discarding saved round: {}", err),
            }
        }
        Self::fresh(config, generator, store)
    }

    fn fresh<G: DeckGenerator>(config: &GameConfig, generator: G, store: S) -> Result<Self> {
        let deck = generator.generate(config)?;
        Ok(Self {
            engine: MatchEngine::new(deck),
            rows: config.rows,
            cols: config.cols,
            store,
        })
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn grid_dims(&self) -> (Coord, Coord) {
        (self.rows, self.cols)
    }

    /// Forwarded to [`MatchEngine::reveal`]; persistence is untouched until
    /// a resolution commits.
    pub fn reveal(&mut self, index: usize) -> Result<RevealOutcome> {
        self.engine.reveal(index)
    }

    /// Commit the pending resolution and keep the save in sync: write after
    /// a match, delete on win, never write on mismatch.
    pub fn resolve(&mut self) -> ResolveOutcome {
        let outcome = self.engine.resolve();
        match outcome {
            ResolveOutcome::Matched => self.save(),
            ResolveOutcome::Won => self.store.remove(SAVE_KEY),
            ResolveOutcome::Mismatched | ResolveOutcome::NoChange => {}
        }
        outcome
    }

    /// Throw the current round away and deal a new one.
    pub fn new_game<G: DeckGenerator>(&mut self, config: &GameConfig, generator: G) -> Result<()> {
        let deck = generator.generate(config)?;
        self.engine = MatchEngine::new(deck);
        self.rows = config.rows;
        self.cols = config.cols;
        self.store.remove(SAVE_KEY);
        Ok(())
    }

    fn save(&mut self) {
        let state = PersistedState::snapshot(self.rows, self.cols, &self.engine);
        match state.to_json() {
            Ok(blob) => self.store.set(SAVE_KEY, &blob),
            Err(err) => log::warn!("could not serialize save: {}", err),
        }
    }
}
