//! The scheduler
//!
//! Picks the next card across the four queues and moves cards through the
//! answer state machine:
//!
//! ```text
//!   New ──answer──▶ Learning ──graduate──▶ Review ──fail──▶ Relearning
//!                     │  ▲                   ▲                 │
//!                     ▼  │                   └────graduate─────┘
//!                 DayLearning                 (fail too often: Suspended)
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    adjusted_ease, graduating_interval, lapse_interval, learning_jitter_bound, next_review_interval,
    repeat_step_delay_secs, starting_steps, step_delay_secs, steps_today,
};
use super::clock::{days_between, next_day_cutoff, Clock, SystemClock, SECS_PER_DAY};
use super::collection::Collection;
use super::config::{DeckConfig, SchedulerConfig};
use super::error::Result;
use super::models::{Card, CardId, CardQueue, CardType, Grade, LearningSteps, Note, QueueCounts, QueueKind};
use super::queues::{count_due, DailyUsage, QueueSet};

/// Tag added to notes whose cards lapse too often
pub const LEECH_TAG: &str = "leech";

/// Where an answered card ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnswerOutcome {
    /// Next step later today, at a Unix timestamp
    Learning { due: i64 },
    /// Next step on a later day
    DayLearning {
        #[serde(rename = "dueDay")]
        due_day: i64,
    },
    /// Left the step ladder for the review queue
    Graduated { interval: i32 },
    /// Review card rescheduled
    Review { interval: i32 },
    /// Leech: removed from circulation
    Suspended,
}

/// Spaced repetition scheduler over one collection
pub struct Scheduler<C: Clock = SystemClock> {
    col: Collection,
    clock: C,
    queues: QueueSet,
    rng: StdRng,
    /// Days since the collection was created
    today: i64,
    /// Local midnight ending `today`
    day_cutoff: i64,
    /// Cards handed out today
    shown_today: usize,
    usage: DailyUsage,
}

impl<C: Clock> Scheduler<C> {
    /// Start a session over `col`. Fails if the collection's configuration
    /// does not validate, e.g. after being deserialized.
    pub fn new(col: Collection, clock: C) -> Result<Self> {
        col.config().validate()?;
        let mut scheduler = Self {
            col,
            clock,
            queues: QueueSet::new(),
            rng: StdRng::from_entropy(),
            today: i64::MIN,
            day_cutoff: 0,
            shown_today: 0,
            usage: DailyUsage::default(),
        };
        scheduler.reset();
        Ok(scheduler)
    }

    /// Use a fixed seed for fuzz and jitter
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.col
    }

    /// Direct access to the cards. Queues treat the cards as the source of
    /// truth, so edits made here are picked up on the next fill.
    pub fn collection_mut(&mut self) -> &mut Collection {
        &mut self.col
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.col.card(id)
    }

    pub fn today(&self) -> i64 {
        self.today
    }

    pub fn day_cutoff(&self) -> i64 {
        self.day_cutoff
    }

    pub fn shown_today(&self) -> usize {
        self.shown_today
    }

    pub fn add_note(&mut self, note: Note) -> usize {
        self.col.add_note(note, &self.clock)
    }

    /// Swap the configuration and rebuild the queues
    pub fn set_config(&mut self, config: SchedulerConfig) -> Result<()> {
        self.col.set_config(config)?;
        self.reset();
        Ok(())
    }

    /// Recompute the day and drop every queue
    pub fn reset(&mut self) {
        self.update_cutoff();
        let learn_ahead = self.col.config().collection.learn_ahead_secs;
        self.queues.clear(self.clock.now(), learn_ahead);
    }

    fn update_cutoff(&mut self) {
        let now = self.clock.now();
        let today = days_between(self.col.created_at(), now);
        if today != self.today {
            self.shown_today = 0;
            self.usage = DailyUsage::default();
        }
        self.today = today;
        self.day_cutoff = next_day_cutoff(now);
    }

    fn check_day(&mut self) {
        if self.clock.now() >= self.day_cutoff {
            self.reset();
            log::info!("Day rolled over, now on day {}", self.today);
        }
    }

    // ==================== Selection ====================

    /// Next card to study, or `None` when nothing is left for now
    pub fn get_next_card(&mut self) -> Option<Card> {
        self.check_day();
        let id = self.next_card_id()?;
        self.shown_today += 1;
        self.col.card(id).ok().cloned()
    }

    fn next_card_id(&mut self) -> Option<CardId> {
        let now = self.clock.now();
        let today = self.today;
        let cards = &self.col;
        let config = self.col.config();
        let learn_ahead = config.collection.learn_ahead_secs;

        if let Some(id) = self.queues.next_learning(cards, now, learn_ahead, false) {
            return Some(id);
        }

        if self
            .queues
            .time_for_new_card(cards, config, today, self.usage, self.shown_today)
        {
            if let Some(id) = self.queues.next_new(cards, config, today, self.usage) {
                self.usage.new += 1;
                return Some(id);
            }
        }

        if let Some(id) = self.queues.next_review(cards, config, today, self.usage) {
            self.usage.review += 1;
            return Some(id);
        }

        if let Some(id) = self.queues.next_day_learning(cards, today) {
            return Some(id);
        }

        if let Some(id) = self.queues.next_new(cards, config, today, self.usage) {
            self.usage.new += 1;
            return Some(id);
        }

        // nothing else to do: show whatever learning card comes up soonest
        self.queues.next_learning(cards, now, learn_ahead, true)
    }

    /// Cards available today per queue, after daily limits
    pub fn counts(&self) -> QueueCounts {
        let deck = &self.col.config().deck;
        let mut counts = count_due(self.col.cards(), self.today, self.queues.learn_ahead_cutoff());
        counts.new = counts.new.min(deck.new.per_day.saturating_sub(self.usage.new));
        counts.review = counts
            .review
            .min(deck.review.per_day.saturating_sub(self.usage.review));
        counts
    }

    // ==================== Answering ====================

    /// Grade a card and reschedule it.
    ///
    /// # Panics
    /// If the card is suspended; suspended cards are never handed out.
    pub fn answer(&mut self, id: CardId, grade: Grade) -> Result<AnswerOutcome> {
        let now = self.clock.now();
        // resolve the note up front so a failed lookup leaves the card as is
        let note_id = self.col.card(id)?.note_id;
        self.col.note(note_id)?;
        let (card, config) = self.col.card_with_config_mut(id)?;

        let mut ctx = AnswerContext {
            deck: &config.deck,
            today: self.today,
            day_cutoff: self.day_cutoff,
            now,
            rng: &mut self.rng,
        };
        let outcome = ctx.answer(card, grade);

        if outcome == AnswerOutcome::Suspended {
            self.col.tag_note(note_id, LEECH_TAG)?;
        }
        log::debug!("Answered card {} with {}: {:?}", id, grade, outcome);
        Ok(outcome)
    }

    /// Seconds until the card would be due again if answered with `grade`.
    /// Fuzz is not applied and nothing is modified.
    pub fn preview_next_interval(&self, id: CardId, grade: Grade) -> Result<i64> {
        let card = self.col.card(id)?;
        let deck = &self.col.config().deck;
        assert!(
            !card.is_suspended(),
            "cannot preview suspended card {}",
            card.id
        );

        let secs = match card.queue_kind() {
            QueueKind::Review => match grade {
                Grade::Again => step_delay_secs(&deck.lapse.delays, deck.lapse.delays.len() as u32),
                _ => {
                    let days = next_review_interval(
                        card.interval,
                        card.ease_factor,
                        self.days_late(card),
                        grade,
                        &deck.review,
                        None,
                    );
                    days as i64 * SECS_PER_DAY
                }
            },
            _ => self.preview_learning(card, deck, grade),
        };
        Ok(secs)
    }

    fn preview_learning(&self, card: &Card, deck: &DeckConfig, grade: Grade) -> i64 {
        let lapsed = card.card_type.is_lapsed_ladder();
        let delays = deck.learning_delays(lapsed);
        let steps = match card.queue {
            CardQueue::New { .. } => starting_steps(delays, self.clock.now(), self.day_cutoff),
            _ => card.steps,
        };
        let graduating_secs = |early: bool| {
            let days = if lapsed {
                card.interval
            } else {
                graduating_interval(&deck.new, early, deck.review.fuzz, None)
            };
            days as i64 * SECS_PER_DAY
        };

        match grade {
            Grade::Again => step_delay_secs(delays, delays.len() as u32),
            Grade::Hard => repeat_step_delay_secs(delays, steps.remaining),
            Grade::Easy => graduating_secs(true),
            Grade::Good => {
                if steps.remaining <= 1 {
                    graduating_secs(false)
                } else {
                    step_delay_secs(delays, steps.remaining - 1)
                }
            }
        }
    }

    fn days_late(&self, card: &Card) -> i64 {
        match card.queue {
            CardQueue::Review { due_day } => (self.today - due_day).max(0),
            _ => 0,
        }
    }

    // ==================== Debug ====================

    /// Plain-text table of every card followed by the queue contents
    pub fn dump(&self) -> String {
        let rule = "+---------------+------------+--------+-------+-------+--------+------+--------+------+------------+";
        let mut out = String::new();
        out.push_str(rule);
        out.push('\n');
        out.push_str("| id            | crt        | type   | queue | ivl   | factor | reps | lapses | left | due        |\n");
        out.push_str(rule);
        out.push('\n');
        for c in self.col.cards() {
            let due = c
                .queue
                .due()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "| {:>13} | {:>10} | {:>6} | {:>5} | {:>5} | {:>6} | {:>4} | {:>6} | {:>4} | {:>10} |\n",
                c.id,
                c.created_at,
                c.card_type.code(),
                c.queue_kind().code(),
                c.interval,
                c.ease_factor,
                c.reps,
                c.lapses,
                c.steps.packed(),
                due
            ));
        }
        out.push_str(rule);
        out.push_str("\n\nQueues:\n");
        for (name, kind) in [
            ("New", QueueKind::New),
            ("Lrn", QueueKind::Learning),
            ("LrnDay", QueueKind::DayLearning),
            ("Rev", QueueKind::Review),
        ] {
            let ids: Vec<String> = self
                .queues
                .queued(kind)
                .iter()
                .map(|id| id.to_string())
                .collect();
            out.push_str(&format!("\t{:<7} [{}]\n", name, ids.join(", ")));
        }
        out
    }
}

/// Everything the answer state machine reads besides the card itself
struct AnswerContext<'a> {
    deck: &'a DeckConfig,
    today: i64,
    day_cutoff: i64,
    now: i64,
    rng: &'a mut StdRng,
}

impl AnswerContext<'_> {
    fn answer(&mut self, card: &mut Card, grade: Grade) -> AnswerOutcome {
        assert!(
            !card.is_suspended(),
            "cannot answer suspended card {}",
            card.id
        );

        card.reps += 1;

        if let CardQueue::New { .. } = card.queue {
            // came from the new queue, move to learning
            card.card_type = CardType::Learning;
            card.queue = CardQueue::Learning { due: self.now };
            card.ease_factor = self.deck.new.initial_factor;
            card.steps = starting_steps(&self.deck.new.delays, self.now, self.day_cutoff);
        }

        match card.queue {
            CardQueue::Learning { .. } | CardQueue::DayLearning { .. } => {
                self.answer_learning(card, grade)
            }
            CardQueue::Review { due_day } => self.answer_review(card, grade, due_day),
            CardQueue::New { .. } | CardQueue::Suspended => {
                unreachable!("card {} cannot be answered from {:?}", card.id, card.queue)
            }
        }
    }

    fn delays(&self, card: &Card) -> &[f64] {
        self.deck.learning_delays(card.card_type.is_lapsed_ladder())
    }

    // ==================== Learning ====================

    fn answer_learning(&mut self, card: &mut Card, grade: Grade) -> AnswerOutcome {
        match grade {
            Grade::Easy => self.reschedule_as_review(card, true),
            Grade::Good if card.steps.remaining <= 1 => self.reschedule_as_review(card, false),
            Grade::Good => self.move_to_next_step(card),
            Grade::Hard => self.repeat_step(card),
            Grade::Again => self.move_to_first_step(card),
        }
    }

    fn move_to_first_step(&mut self, card: &mut Card) -> AnswerOutcome {
        card.steps = starting_steps(self.delays(card), self.now, self.day_cutoff);
        if card.card_type == CardType::Relearning {
            card.interval = lapse_interval(card.interval, &self.deck.lapse);
        }
        self.reschedule_learning(card, None)
    }

    fn move_to_next_step(&mut self, card: &mut Card) -> AnswerOutcome {
        let remaining = card.steps.remaining.saturating_sub(1);
        let today = steps_today(self.delays(card), remaining, self.now, self.day_cutoff);
        card.steps = LearningSteps::new(remaining, today);
        self.reschedule_learning(card, None)
    }

    fn repeat_step(&mut self, card: &mut Card) -> AnswerOutcome {
        let delay = repeat_step_delay_secs(self.delays(card), card.steps.remaining);
        self.reschedule_learning(card, Some(delay))
    }

    /// Put the card on its current step, `delay` seconds from now (the
    /// step's own delay by default).
    fn reschedule_learning(&mut self, card: &mut Card, delay: Option<i64>) -> AnswerOutcome {
        let delay =
            delay.unwrap_or_else(|| step_delay_secs(self.delays(card), card.steps.remaining));
        let due = self.now + delay;

        if due < self.day_cutoff {
            // add some randomness, up to 5 minutes or 25%
            let bound = learning_jitter_bound(delay);
            let jitter = if bound > 0 {
                self.rng.gen_range(0..bound)
            } else {
                0
            };
            let due = (due + jitter).min(self.day_cutoff - 1);
            card.queue = CardQueue::Learning { due };
            AnswerOutcome::Learning { due }
        } else {
            let ahead = (due - self.day_cutoff).div_euclid(SECS_PER_DAY) + 1;
            let due_day = self.today + ahead;
            card.queue = CardQueue::DayLearning { due_day };
            AnswerOutcome::DayLearning { due_day }
        }
    }

    fn reschedule_as_review(&mut self, card: &mut Card, early: bool) -> AnswerOutcome {
        if !card.card_type.is_lapsed_ladder() {
            card.interval = graduating_interval(
                &self.deck.new,
                early,
                self.deck.review.fuzz,
                Some(&mut *self.rng),
            );
            card.ease_factor = self.deck.new.initial_factor;
        }
        // relearning cards keep the interval set when they lapsed
        card.card_type = CardType::Review;
        card.queue = CardQueue::Review {
            due_day: self.today + card.interval as i64,
        };
        card.steps = LearningSteps::default();
        AnswerOutcome::Graduated {
            interval: card.interval,
        }
    }

    // ==================== Review ====================

    fn answer_review(&mut self, card: &mut Card, grade: Grade, due_day: i64) -> AnswerOutcome {
        if grade == Grade::Again {
            return self.reschedule_lapse(card);
        }

        let days_late = (self.today - due_day).max(0);
        let interval = next_review_interval(
            card.interval,
            card.ease_factor,
            days_late,
            grade,
            &self.deck.review,
            Some(&mut *self.rng),
        );
        card.interval = interval;
        card.ease_factor = adjusted_ease(card.ease_factor, grade);
        card.queue = CardQueue::Review {
            due_day: self.today + interval as i64,
        };
        AnswerOutcome::Review { interval }
    }

    fn reschedule_lapse(&mut self, card: &mut Card) -> AnswerOutcome {
        card.lapses += 1;
        card.ease_factor = adjusted_ease(card.ease_factor, Grade::Again);

        if self.is_leech(card) {
            // no relearning steps
            card.interval = lapse_interval(card.interval, &self.deck.lapse);
            card.queue = CardQueue::Suspended;
            log::info!(
                "Card {} suspended as a leech after {} lapses",
                card.id,
                card.lapses
            );
            return AnswerOutcome::Suspended;
        }

        card.card_type = CardType::Relearning;
        self.move_to_first_step(card)
    }

    fn is_leech(&self, card: &Card) -> bool {
        let threshold = self.deck.lapse.leech_fails;
        threshold != 0 && card.lapses >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::algorithm::fuzz_range;
    use crate::scheduler::clock::ManualClock;
    use crate::scheduler::error::SchedulerError;
    use chrono::NaiveDate;

    fn noon_clock() -> ManualClock {
        let noon = NaiveDate::from_ymd_opt(2024, 3, 14)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        ManualClock::at_local(noon)
    }

    fn scheduler() -> Scheduler<ManualClock> {
        let clock = noon_clock();
        let col = Collection::with_defaults(&clock);
        Scheduler::new(col, clock).unwrap().with_rng_seed(11)
    }

    fn review_card(sched: &mut Scheduler<ManualClock>) -> CardId {
        sched.add_note(Note::basic("one", "two"));
        let today = sched.today();
        let card = &mut sched.collection_mut().cards_mut()[0];
        card.card_type = CardType::Review;
        card.queue = CardQueue::Review { due_day: today - 8 };
        card.interval = 100;
        card.ease_factor = 2500;
        card.reps = 3;
        card.lapses = 1;
        card.id
    }

    #[test]
    fn test_empty_collection_has_nothing() {
        let mut sched = scheduler();
        assert!(sched.get_next_card().is_none());
        assert_eq!(sched.shown_today(), 0);
    }

    #[test]
    fn test_new_card_promoted_on_answer() {
        let mut sched = scheduler();
        sched.add_note(Note::basic("one", "two"));
        let card = sched.get_next_card().unwrap();
        assert_eq!(card.queue_kind(), QueueKind::New);
        assert_eq!(sched.shown_today(), 1);

        let now = sched.clock().now();
        let outcome = sched.answer(card.id, Grade::Again).unwrap();
        let card = sched.card(card.id).unwrap();
        assert_eq!(card.card_type, CardType::Learning);
        assert_eq!(card.queue_kind(), QueueKind::Learning);
        assert_eq!(card.reps, 1);
        assert_eq!(card.ease_factor, 2500);
        match outcome {
            AnswerOutcome::Learning { due } => assert!((now + 60..now + 75).contains(&due)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_review_intervals_by_grade() {
        for (grade, target, ease) in [
            (Grade::Hard, 120, 2350),
            (Grade::Good, 260, 2500),
            (Grade::Easy, 351, 2650),
        ] {
            let mut sched = scheduler();
            let id = review_card(&mut sched);
            let outcome = sched.answer(id, grade).unwrap();
            let card = sched.card(id).unwrap();
            let (min, max) = fuzz_range(target, 0.05);
            assert!((min..=max).contains(&card.interval), "{} -> {}", grade, card.interval);
            assert_eq!(card.queue, CardQueue::Review { due_day: sched.today() + card.interval as i64 });
            assert_eq!(card.ease_factor, ease);
            assert_eq!(card.reps, 4);
            assert_eq!(card.lapses, 1);
            assert_eq!(outcome, AnswerOutcome::Review { interval: card.interval });
        }
    }

    #[test]
    fn test_lapse_enters_relearning() {
        let mut sched = scheduler();
        let id = review_card(&mut sched);
        sched.answer(id, Grade::Again).unwrap();
        let card = sched.card(id).unwrap();
        assert_eq!(card.card_type, CardType::Relearning);
        assert_eq!(card.queue_kind(), QueueKind::Learning);
        assert_eq!(card.lapses, 2);
        assert_eq!(card.ease_factor, 2300);
        assert_eq!(card.interval, 1);
        assert_eq!(card.steps.remaining, 1);
    }

    #[test]
    fn test_leech_is_suspended_and_tagged() {
        let mut sched = scheduler();
        let id = review_card(&mut sched);
        sched.collection_mut().cards_mut()[0].lapses = 7;
        let outcome = sched.answer(id, Grade::Again).unwrap();
        assert_eq!(outcome, AnswerOutcome::Suspended);

        let card = sched.card(id).unwrap();
        assert!(card.is_suspended());
        assert_eq!(card.interval, 1);
        let note = sched.collection().note(card.note_id).unwrap();
        assert!(note.has_tag(LEECH_TAG));
    }

    #[test]
    fn test_leech_detection_can_be_disabled() {
        let mut sched = scheduler();
        let mut config = SchedulerConfig::default();
        config.deck.lapse.leech_fails = 0;
        sched.set_config(config).unwrap();
        let id = review_card(&mut sched);
        sched.collection_mut().cards_mut()[0].lapses = 50;
        sched.answer(id, Grade::Again).unwrap();
        assert_eq!(sched.card(id).unwrap().card_type, CardType::Relearning);
    }

    #[test]
    #[should_panic(expected = "suspended")]
    fn test_answering_suspended_card_panics() {
        let mut sched = scheduler();
        sched.add_note(Note::basic("a", "b"));
        let id = sched.collection().cards()[0].id;
        sched.collection_mut().cards_mut()[0].queue = CardQueue::Suspended;
        let _ = sched.answer(id, Grade::Good);
    }

    #[test]
    fn test_unknown_card_is_an_error() {
        let mut sched = scheduler();
        assert!(sched.answer(CardId(5), Grade::Good).is_err());
        assert!(sched.preview_next_interval(CardId(5), Grade::Good).is_err());
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut sched = scheduler();
        sched.add_note(Note::basic("a", "b"));
        let id = sched.collection().cards()[0].id;
        assert_eq!(sched.preview_next_interval(id, Grade::Again).unwrap(), 60);
        assert_eq!(sched.preview_next_interval(id, Grade::Hard).unwrap(), 330);
        assert_eq!(sched.preview_next_interval(id, Grade::Good).unwrap(), 600);
        assert_eq!(sched.preview_next_interval(id, Grade::Easy).unwrap(), 4 * 86_400);
        let card = sched.card(id).unwrap();
        assert_eq!(card.queue_kind(), QueueKind::New);
        assert_eq!(card.reps, 0);
    }

    #[test]
    fn test_preview_review_card() {
        let mut sched = scheduler();
        let id = review_card(&mut sched);
        assert_eq!(sched.preview_next_interval(id, Grade::Again).unwrap(), 600);
        assert_eq!(sched.preview_next_interval(id, Grade::Hard).unwrap(), 120 * 86_400);
        assert_eq!(sched.preview_next_interval(id, Grade::Good).unwrap(), 260 * 86_400);
        assert_eq!(sched.preview_next_interval(id, Grade::Easy).unwrap(), 351 * 86_400);
    }

    #[test]
    fn test_counts_respect_daily_limits() {
        let mut sched = scheduler();
        let mut config = SchedulerConfig::default();
        config.deck.new.per_day = 3;
        sched.set_config(config).unwrap();
        for i in 0..5 {
            sched.add_note(Note::basic(i.to_string(), i.to_string()));
        }
        assert_eq!(sched.counts().new, 3);
        let card = sched.get_next_card().unwrap();
        sched.answer(card.id, Grade::Good).unwrap();
        let counts = sched.counts();
        assert_eq!(counts.new, 2);
        assert_eq!(counts.learning, 1);
    }

    #[test]
    fn test_session_starting_at_midnight_keeps_same_day_steps() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let clock = ManualClock::at_local(midnight);
        let col = Collection::with_defaults(&clock);
        let mut sched = Scheduler::new(col, clock).unwrap().with_rng_seed(11);
        assert!(sched.day_cutoff() > sched.clock().now());

        sched.add_note(Note::basic("one", "two"));
        let card = sched.get_next_card().unwrap();
        let now = sched.clock().now();
        match sched.answer(card.id, Grade::Again).unwrap() {
            AnswerOutcome::Learning { due } => assert!((now + 60..now + 75).contains(&due)),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sched.today(), 0);

        sched.clock().advance(120);
        assert_eq!(sched.get_next_card().map(|c| c.id), Some(card.id));
        assert_eq!(sched.today(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_stored_config() {
        let clock = noon_clock();
        let col = Collection::with_defaults(&clock);
        let mut value = serde_json::to_value(&col).unwrap();
        value["config"]["deck"]["new"]["ints"] = serde_json::json!([1]);
        let col: Collection = serde_json::from_value(value).unwrap();

        assert!(matches!(
            Scheduler::new(col, clock),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_answer_with_missing_note_leaves_card_untouched() {
        let mut sched = scheduler();
        sched.add_note(Note::basic("a", "b"));
        let id = sched.collection().cards()[0].id;

        let mut value = serde_json::to_value(sched.collection()).unwrap();
        value["notes"] = serde_json::json!({});
        let col: Collection = serde_json::from_value(value).unwrap();
        let mut sched = Scheduler::new(col, noon_clock()).unwrap();

        assert!(matches!(
            sched.answer(id, Grade::Good),
            Err(SchedulerError::NoteNotFound(_))
        ));
        let card = sched.card(id).unwrap();
        assert_eq!(card.reps, 0);
        assert_eq!(card.queue_kind(), QueueKind::New);
    }

    #[test]
    fn test_dump_lists_cards_and_queues() {
        let mut sched = scheduler();
        sched.add_note(Note::basic("a", "b"));
        let id = sched.collection().cards()[0].id;
        let dump = sched.dump();
        assert!(dump.contains(&id.to_string()));
        assert!(dump.contains("Queues:"));
        assert!(dump.contains("LrnDay"));
    }
}
