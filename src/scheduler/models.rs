//! Data models for the scheduling engine

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SchedulerError;

/// Creation-ordered card identifier (epoch milliseconds at creation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Note identifier; `NoteId::UNASSIGNED` until the note joins a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl NoteId {
    pub const UNASSIGNED: NoteId = NoteId(0);
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Long-lived classification of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardType {
    /// Never answered
    #[default]
    New,
    /// Climbing the step ladder for the first time
    Learning,
    /// Graduated, scheduled in days
    Review,
    /// Lapsed review card back on the step ladder
    Relearning,
}

impl CardType {
    pub fn code(self) -> i8 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearning => 3,
        }
    }

    /// Review and relearning cards learn with the lapse ladder
    pub fn is_lapsed_ladder(self) -> bool {
        matches!(self, Self::Review | Self::Relearning)
    }
}

/// Payload-free discriminant of [`CardQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueKind {
    Suspended,
    New,
    Learning,
    Review,
    DayLearning,
}

impl QueueKind {
    /// Legacy integer code of the queue
    pub fn code(self) -> i8 {
        match self {
            Self::Suspended => -1,
            Self::New => 0,
            Self::Learning => 1,
            Self::Review => 2,
            Self::DayLearning => 3,
        }
    }
}

/// The scheduling bucket a card currently sits in, together with the due
/// value that bucket understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CardQueue {
    /// Removed from circulation (leech)
    Suspended,
    /// Waiting to be introduced; lower positions come first
    New { position: i64 },
    /// Due at a Unix timestamp (seconds), later today
    Learning { due: i64 },
    /// Learning step deferred to a day offset from collection creation
    DayLearning {
        #[serde(rename = "dueDay")]
        due_day: i64,
    },
    /// Due on a day offset from collection creation
    Review {
        #[serde(rename = "dueDay")]
        due_day: i64,
    },
}

impl CardQueue {
    pub fn kind(&self) -> QueueKind {
        match self {
            Self::Suspended => QueueKind::Suspended,
            Self::New { .. } => QueueKind::New,
            Self::Learning { .. } => QueueKind::Learning,
            Self::DayLearning { .. } => QueueKind::DayLearning,
            Self::Review { .. } => QueueKind::Review,
        }
    }

    /// The raw due value, whatever its unit
    pub fn due(&self) -> Option<i64> {
        match *self {
            Self::Suspended => None,
            Self::New { position } => Some(position),
            Self::Learning { due } => Some(due),
            Self::DayLearning { due_day } | Self::Review { due_day } => Some(due_day),
        }
    }
}

/// Progress through the learning step ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSteps {
    /// Steps left before graduation
    pub remaining: u32,
    /// Of those, how many fit before the day cutoff
    pub today: u32,
}

impl LearningSteps {
    pub fn new(remaining: u32, today: u32) -> Self {
        Self { remaining, today }
    }

    /// Legacy `today * 1000 + remaining` form
    pub fn packed(&self) -> u32 {
        self.today * 1000 + self.remaining
    }

    pub fn from_packed(left: u32) -> Self {
        Self {
            remaining: left % 1000,
            today: left / 1000,
        }
    }
}

/// How well the user recalled a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            other => Err(SchedulerError::InvalidGrade(other)),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        };
        f.write_str(label)
    }
}

/// A card template of a note; each template yields one card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTemplate {
    pub name: String,
    pub question_format: String,
    pub answer_format: String,
}

impl Default for CardTemplate {
    fn default() -> Self {
        Self {
            name: "Card 1".to_string(),
            question_format: "{{Front}}".to_string(),
            answer_format: "{{FrontSide}}\n\n<hr id=answer>\n\n{{Back}}".to_string(),
        }
    }
}

/// A content unit that generates one card per template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub front: String,
    pub back: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "default_templates")]
    pub templates: Vec<CardTemplate>,
}

fn default_templates() -> Vec<CardTemplate> {
    vec![CardTemplate::default()]
}

impl Note {
    /// A front/back note with the single default template
    pub fn basic(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: NoteId::UNASSIGNED,
            front: front.into(),
            back: back.into(),
            tags: Vec::new(),
            templates: default_templates(),
        }
    }

    pub fn with_id(mut self, id: NoteId) -> Self {
        self.id = id;
        self
    }

    /// Add a tag unless it is already present; insertion order is kept
    pub fn add_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// The unit the scheduler manages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    /// Owning note, resolved through the collection
    pub note_id: NoteId,
    /// Index of the template this card was generated from
    #[serde(default)]
    pub ord: usize,
    #[serde(default)]
    pub card_type: CardType,
    pub queue: CardQueue,
    /// Current interval in days
    #[serde(default)]
    pub interval: i32,
    /// Ease in permille (2500 = x2.5); 0 until first graduation
    #[serde(default)]
    pub ease_factor: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub lapses: u32,
    #[serde(default)]
    pub steps: LearningSteps,
    /// Creation time in Unix seconds
    pub created_at: i64,
}

impl Card {
    pub fn new(id: CardId, note_id: NoteId, ord: usize, created_at: i64) -> Self {
        Self {
            id,
            note_id,
            ord,
            card_type: CardType::New,
            queue: CardQueue::New {
                position: note_id.0,
            },
            interval: 0,
            ease_factor: 0,
            reps: 0,
            lapses: 0,
            steps: LearningSteps::default(),
            created_at,
        }
    }

    pub fn queue_kind(&self) -> QueueKind {
        self.queue.kind()
    }

    pub fn is_suspended(&self) -> bool {
        self.queue == CardQueue::Suspended
    }
}

/// Number of cards per queue, for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub new: usize,
    pub learning: usize,
    pub day_learning: usize,
    pub review: usize,
    pub suspended: usize,
}

impl QueueCounts {
    /// Cards that can still be shown today
    pub fn due_total(&self) -> usize {
        self.new + self.learning + self.day_learning + self.review
    }
}
