//! Queue manager
//!
//! Four disposable caches of card ids, one per schedulable queue. Each is
//! filled from the collection only when empty and then drained from the end.
//! Nothing here is persisted: any queue can be dropped and rebuilt from the
//! cards alone.
//!
//! Invalidation rules:
//! - empty queue: eligible for refill on the next request
//! - learn-ahead cutoff moved: the learning queue is dropped
//! - day rollover: everything is dropped (see [`QueueSet::clear`])

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::collection::Collection;
use super::config::{NewCardOrder, SchedulerConfig};
use super::models::{Card, CardId, CardQueue, QueueCounts, QueueKind};

/// Upper bound for the new, day-learning and review queues
pub const QUEUE_LIMIT: usize = 50;

/// Upper bound for the sub-day learning queue
pub const REPORT_LIMIT: usize = 1000;

/// Minimum movement of the learn-ahead cutoff before the learning queue is
/// rebuilt, unless forced
const LEARN_CUTOFF_REFRESH_SECS: i64 = 60;

/// Card storage the queues are filled from and checked against
pub trait CardSource {
    fn all_cards(&self) -> &[Card];

    fn find_card(&self, id: CardId) -> Option<&Card>;
}

impl CardSource for Collection {
    fn all_cards(&self) -> &[Card] {
        self.cards()
    }

    fn find_card(&self, id: CardId) -> Option<&Card> {
        self.get_card(id)
    }
}

impl CardSource for [Card] {
    fn all_cards(&self) -> &[Card] {
        self
    }

    fn find_card(&self, id: CardId) -> Option<&Card> {
        self.iter().find(|c| c.id == id)
    }
}

impl CardSource for Vec<Card> {
    fn all_cards(&self) -> &[Card] {
        self
    }

    fn find_card(&self, id: CardId) -> Option<&Card> {
        self.as_slice().find_card(id)
    }
}

/// How many new and review cards were already handed out today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyUsage {
    pub new: usize,
    pub review: usize,
}

#[derive(Debug, Default)]
pub struct QueueSet {
    new: Vec<CardId>,
    learning: Vec<CardId>,
    day_learning: Vec<CardId>,
    review: Vec<CardId>,
    new_card_modulus: usize,
    learn_ahead_cutoff: i64,
}

impl QueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached queue and move the learn-ahead cutoff
    pub fn clear(&mut self, now: i64, learn_ahead_secs: i64) {
        self.update_learn_ahead_cutoff(now, learn_ahead_secs, true);
        self.new.clear();
        self.learning.clear();
        self.day_learning.clear();
        self.review.clear();
        self.new_card_modulus = 0;
    }

    pub fn learn_ahead_cutoff(&self) -> i64 {
        self.learn_ahead_cutoff
    }

    pub fn new_card_modulus(&self) -> usize {
        self.new_card_modulus
    }

    /// Current contents of one queue, in pop order reversed
    pub fn queued(&self, kind: QueueKind) -> &[CardId] {
        match kind {
            QueueKind::New => &self.new,
            QueueKind::Learning => &self.learning,
            QueueKind::DayLearning => &self.day_learning,
            QueueKind::Review => &self.review,
            QueueKind::Suspended => &[],
        }
    }

    /// Move the learn-ahead cutoff if it would advance by more than a minute,
    /// or unconditionally when forced. Returns whether it moved.
    pub fn update_learn_ahead_cutoff(&mut self, now: i64, learn_ahead_secs: i64, force: bool) -> bool {
        let next = now + learn_ahead_secs;
        if next - self.learn_ahead_cutoff > LEARN_CUTOFF_REFRESH_SECS || force {
            self.learn_ahead_cutoff = next;
            return true;
        }
        false
    }

    // ==================== Learning ====================

    /// Next sub-day learning card. `collapse` forces the cutoff refresh even
    /// inside the one-minute guard.
    pub fn next_learning<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        now: i64,
        learn_ahead_secs: i64,
        collapse: bool,
    ) -> Option<CardId> {
        if self.update_learn_ahead_cutoff(now, learn_ahead_secs, collapse) {
            self.learning.clear();
        }
        for _ in 0..2 {
            if !self.fill_learning(cards) {
                return None;
            }
            let cutoff = self.learn_ahead_cutoff;
            if let Some(id) = pop_matching(&mut self.learning, cards, |c| learning_due(c, cutoff)) {
                return Some(id);
            }
        }
        None
    }

    fn fill_learning<S: CardSource + ?Sized>(&mut self, cards: &S) -> bool {
        if !self.learning.is_empty() {
            return true;
        }
        let cutoff = self.learn_ahead_cutoff;
        let mut due: Vec<&Card> = cards.all_cards().iter().filter(|c| learning_due(c, cutoff)).collect();
        due.sort_by_key(|c| c.id);
        due.truncate(REPORT_LIMIT);
        self.learning = due.into_iter().map(|c| c.id).collect();
        if !self.learning.is_empty() {
            log::debug!("Filled learning queue with {} card(s)", self.learning.len());
        }
        !self.learning.is_empty()
    }

    // ==================== New ====================

    pub fn next_new<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        config: &SchedulerConfig,
        today: i64,
        usage: DailyUsage,
    ) -> Option<CardId> {
        for _ in 0..2 {
            if !self.fill_new(cards, config, today, usage) {
                return None;
            }
            if let Some(id) = pop_matching(&mut self.new, cards, is_new) {
                return Some(id);
            }
        }
        None
    }

    /// Whether the ordering policy wants a new card now, given how many cards
    /// were already shown today.
    pub fn time_for_new_card<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        config: &SchedulerConfig,
        today: i64,
        usage: DailyUsage,
        shown_today: usize,
    ) -> bool {
        if !self.fill_new(cards, config, today, usage) {
            return false;
        }
        match config.collection.new_card_order {
            NewCardOrder::Last => false,
            NewCardOrder::First => true,
            NewCardOrder::Distribute => {
                let modulus = self.new_card_modulus;
                modulus != 0 && shown_today != 0 && shown_today % modulus == 0
            }
        }
    }

    fn fill_new<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        config: &SchedulerConfig,
        today: i64,
        usage: DailyUsage,
    ) -> bool {
        if !self.new.is_empty() {
            return true;
        }
        let limit = QUEUE_LIMIT.min(config.deck.new.per_day.saturating_sub(usage.new));
        let mut pending: Vec<&Card> = cards.all_cards().iter().filter(|c| is_new(c)).collect();
        pending.sort_by_key(|c| (c.queue.due(), c.id));
        pending.truncate(limit);
        // smallest position is popped first
        self.new = pending.into_iter().rev().map(|c| c.id).collect();

        self.fill_review(cards, config, today, usage);
        self.update_new_card_modulus(config);

        if !self.new.is_empty() {
            log::debug!(
                "Filled new queue with {} card(s), modulus {}",
                self.new.len(),
                self.new_card_modulus
            );
        }
        !self.new.is_empty()
    }

    fn update_new_card_modulus(&mut self, config: &SchedulerConfig) {
        if config.collection.new_card_order != NewCardOrder::Distribute || self.new.is_empty() {
            self.new_card_modulus = 0;
            return;
        }
        let new_count = self.new.len();
        let review_count = self.review.len();
        let mut modulus = (new_count + review_count) / new_count;
        // with reviews pending, never show two new cards in a row
        if review_count > 0 {
            modulus = modulus.max(2);
        }
        self.new_card_modulus = modulus;
    }

    // ==================== Day learning ====================

    pub fn next_day_learning<S: CardSource + ?Sized>(&mut self, cards: &S, today: i64) -> Option<CardId> {
        for _ in 0..2 {
            if !self.fill_day_learning(cards, today) {
                return None;
            }
            if let Some(id) = pop_matching(&mut self.day_learning, cards, |c| day_learning_due(c, today)) {
                return Some(id);
            }
        }
        None
    }

    fn fill_day_learning<S: CardSource + ?Sized>(&mut self, cards: &S, today: i64) -> bool {
        if !self.day_learning.is_empty() {
            return true;
        }
        self.day_learning = cards
            .all_cards()
            .iter()
            .filter(|c| day_learning_due(c, today))
            .take(QUEUE_LIMIT)
            .map(|c| c.id)
            .collect();
        if self.day_learning.is_empty() {
            return false;
        }
        self.day_learning.shuffle(&mut day_rng(today));
        log::debug!("Filled day learning queue with {} card(s)", self.day_learning.len());
        true
    }

    // ==================== Review ====================

    pub fn next_review<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        config: &SchedulerConfig,
        today: i64,
        usage: DailyUsage,
    ) -> Option<CardId> {
        for _ in 0..2 {
            if !self.fill_review(cards, config, today, usage) {
                return None;
            }
            if let Some(id) = pop_matching(&mut self.review, cards, |c| review_due(c, today)) {
                return Some(id);
            }
        }
        None
    }

    fn fill_review<S: CardSource + ?Sized>(
        &mut self,
        cards: &S,
        config: &SchedulerConfig,
        today: i64,
        usage: DailyUsage,
    ) -> bool {
        if !self.review.is_empty() {
            return true;
        }
        let limit = QUEUE_LIMIT.min(config.deck.review.per_day.saturating_sub(usage.review));
        let mut due: Vec<&Card> = cards.all_cards().iter().filter(|c| review_due(c, today)).collect();
        due.sort_by_key(|c| (c.queue.due(), c.id));
        due.truncate(limit);
        self.review = due.into_iter().map(|c| c.id).collect();
        if self.review.is_empty() {
            return false;
        }
        self.review.shuffle(&mut day_rng(today));
        log::debug!("Filled review queue with {} card(s)", self.review.len());
        true
    }
}

/// Shuffle order is reproducible for a given day
fn day_rng(today: i64) -> StdRng {
    StdRng::seed_from_u64(today as u64)
}

/// Pop ids until one still belongs to the queue. Ids of cards answered out of
/// band since the fill are dropped.
fn pop_matching<S: CardSource + ?Sized>(
    queue: &mut Vec<CardId>,
    cards: &S,
    belongs: impl Fn(&Card) -> bool,
) -> Option<CardId> {
    while let Some(id) = queue.pop() {
        if cards.find_card(id).is_some_and(&belongs) {
            return Some(id);
        }
        log::debug!("Skipping stale queue entry {}", id);
    }
    None
}

fn is_new(card: &Card) -> bool {
    matches!(card.queue, CardQueue::New { .. })
}

fn learning_due(card: &Card, cutoff: i64) -> bool {
    matches!(card.queue, CardQueue::Learning { due } if due < cutoff)
}

fn day_learning_due(card: &Card, today: i64) -> bool {
    matches!(card.queue, CardQueue::DayLearning { due_day } if due_day <= today)
}

fn review_due(card: &Card, today: i64) -> bool {
    matches!(card.queue, CardQueue::Review { due_day } if due_day <= today)
}

/// Cards that would be served today from each queue if nothing were capped
pub fn count_due(cards: &[Card], today: i64, learn_ahead_cutoff: i64) -> QueueCounts {
    let mut counts = QueueCounts::default();
    for card in cards {
        match card.queue {
            CardQueue::New { .. } => counts.new += 1,
            CardQueue::Learning { due } if due < learn_ahead_cutoff => counts.learning += 1,
            CardQueue::DayLearning { due_day } if due_day <= today => counts.day_learning += 1,
            CardQueue::Review { due_day } if due_day <= today => counts.review += 1,
            CardQueue::Suspended => counts.suspended += 1,
            _ => {}
        }
    }
    counts
}
