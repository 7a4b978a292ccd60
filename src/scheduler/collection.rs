//! The in-memory card collection

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::clock::{start_of_local_day, Clock, IdGenerator};
use super::config::SchedulerConfig;
use super::error::{Result, SchedulerError};
use super::models::{Card, CardId, Note, NoteId};

/// Owns every note and card of one study collection.
///
/// Card ids must not be edited through [`Collection::cards_mut`]; lookups go
/// through an id index built when cards are added or deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredCollection")]
pub struct Collection {
    /// Local midnight of the creation day, Unix seconds
    created_at: i64,
    notes: BTreeMap<NoteId, Note>,
    cards: Vec<Card>,
    config: SchedulerConfig,
    #[serde(skip)]
    ids: IdGenerator,
    #[serde(skip)]
    index: HashMap<CardId, usize>,
}

/// Serialized form of a [`Collection`], without the derived lookup state
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCollection {
    created_at: i64,
    notes: BTreeMap<NoteId, Note>,
    cards: Vec<Card>,
    config: SchedulerConfig,
}

impl From<StoredCollection> for Collection {
    fn from(stored: StoredCollection) -> Self {
        let index = stored
            .cards
            .iter()
            .enumerate()
            .map(|(pos, card)| (card.id, pos))
            .collect();
        // new ids continue after the newest stored one
        let last_id = stored
            .cards
            .iter()
            .map(|c| c.id.0)
            .chain(stored.notes.keys().map(|n| n.0))
            .max()
            .unwrap_or(0);
        Self {
            created_at: stored.created_at,
            notes: stored.notes,
            cards: stored.cards,
            config: stored.config,
            ids: IdGenerator::starting_after(last_id),
            index,
        }
    }
}

impl Collection {
    pub fn new(clock: &impl Clock, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            created_at: start_of_local_day(clock.now()),
            notes: BTreeMap::new(),
            cards: Vec::new(),
            config,
            ids: IdGenerator::new(),
            index: HashMap::new(),
        })
    }

    pub fn with_defaults(clock: &impl Clock) -> Self {
        Self {
            created_at: start_of_local_day(clock.now()),
            notes: BTreeMap::new(),
            cards: Vec::new(),
            config: SchedulerConfig::default(),
            ids: IdGenerator::new(),
            index: HashMap::new(),
        }
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Swap the configuration between sessions
    pub fn set_config(&mut self, config: SchedulerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Add a note and generate its cards. Returns the number of cards created.
    pub fn add_note(&mut self, mut note: Note, clock: &impl Clock) -> usize {
        if note.id == NoteId::UNASSIGNED {
            note.id = NoteId(self.ids.next_id(clock));
        }
        let now = clock.now();
        let mut created = 0;
        for ord in 0..note.templates.len() {
            let id = CardId(self.ids.next_id(clock));
            self.index.insert(id, self.cards.len());
            self.cards.push(Card::new(id, note.id, ord, now));
            created += 1;
        }
        log::debug!("Added note {} with {} card(s)", note.id, created);
        self.notes.insert(note.id, note);
        created
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }

    /// Card by id, without the not-found error
    pub fn get_card(&self, id: CardId) -> Option<&Card> {
        self.index.get(&id).and_then(|&pos| self.cards.get(pos))
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.get_card(id).ok_or(SchedulerError::CardNotFound(id))
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.index
            .get(&id)
            .and_then(|&pos| self.cards.get_mut(pos))
            .ok_or(SchedulerError::CardNotFound(id))
    }

    /// A card to modify together with the configuration it is scheduled under
    pub fn card_with_config_mut(&mut self, id: CardId) -> Result<(&mut Card, &SchedulerConfig)> {
        let card = self
            .index
            .get(&id)
            .and_then(|&pos| self.cards.get_mut(pos))
            .ok_or(SchedulerError::CardNotFound(id))?;
        Ok((card, &self.config))
    }

    pub fn note(&self, id: NoteId) -> Result<&Note> {
        self.notes.get(&id).ok_or(SchedulerError::NoteNotFound(id))
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Tag the note that owns a card
    pub fn tag_note(&mut self, id: NoteId, tag: &str) -> Result<()> {
        let note = self
            .notes
            .get_mut(&id)
            .ok_or(SchedulerError::NoteNotFound(id))?;
        note.add_tag(tag);
        Ok(())
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}
