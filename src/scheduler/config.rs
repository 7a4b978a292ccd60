//! Scheduler configuration
//!
//! Collection-level and deck-level options. A [`SchedulerConfig`] is a plain
//! value owned by the collection; swapping it resets the scheduler's queues.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Result, SchedulerError};

/// The initial ease factor a card gets when it first graduates
pub const STARTING_FACTOR: u32 = 2500;

/// The lowest ease factor a card can reach
pub const MIN_EASE_FACTOR: u32 = 1300;

/// Where new cards go relative to reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewCardOrder {
    /// Mix new cards in between reviews
    #[default]
    Distribute,
    /// Show new cards after all reviews
    Last,
    /// Show new cards before reviews
    First,
}

/// Options shared by the whole collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    #[serde(default)]
    pub new_card_order: NewCardOrder,
    /// If nothing else is due, learning cards due within this many seconds
    /// are shown early.
    #[serde(default = "default_learn_ahead_secs")]
    pub learn_ahead_secs: i64,
}

fn default_learn_ahead_secs() -> i64 {
    1200
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            new_card_order: NewCardOrder::default(),
            learn_ahead_secs: default_learn_ahead_secs(),
        }
    }
}

/// Options for cards that have never graduated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardConfig {
    /// Learning step delays in minutes
    #[serde(default = "default_new_delays")]
    pub delays: Vec<f64>,
    /// Graduating intervals in days: [good, easy]
    #[serde(default = "default_graduating_ints")]
    pub ints: Vec<i32>,
    #[serde(default = "default_initial_factor")]
    pub initial_factor: u32,
    #[serde(default = "default_new_per_day")]
    pub per_day: usize,
}

fn default_new_delays() -> Vec<f64> {
    vec![1.0, 10.0]
}

fn default_graduating_ints() -> Vec<i32> {
    vec![1, 4]
}

fn default_initial_factor() -> u32 {
    STARTING_FACTOR
}

fn default_new_per_day() -> usize {
    20
}

impl Default for NewCardConfig {
    fn default() -> Self {
        Self {
            delays: default_new_delays(),
            ints: default_graduating_ints(),
            initial_factor: default_initial_factor(),
            per_day: default_new_per_day(),
        }
    }
}

/// Options for review cards that were forgotten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapseConfig {
    /// Relearning step delays in minutes
    #[serde(default = "default_lapse_delays")]
    pub delays: Vec<f64>,
    /// Multiplier applied to the interval on a lapse
    #[serde(default)]
    pub mult: f64,
    /// Minimum interval in days after a lapse
    #[serde(default = "default_min_int")]
    pub min_int: i32,
    /// Lapses before a card is suspended as a leech; 0 disables
    #[serde(default = "default_leech_fails")]
    pub leech_fails: u32,
}

fn default_lapse_delays() -> Vec<f64> {
    vec![10.0]
}

fn default_min_int() -> i32 {
    1
}

fn default_leech_fails() -> u32 {
    8
}

impl Default for LapseConfig {
    fn default() -> Self {
        Self {
            delays: default_lapse_delays(),
            mult: 0.0,
            min_int: default_min_int(),
            leech_fails: default_leech_fails(),
        }
    }
}

/// Options for graduated cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConfig {
    #[serde(default = "default_reviews_per_day")]
    pub per_day: usize,
    /// Extra multiplier for "easy" answers
    #[serde(default = "default_easy_bonus")]
    pub easy_bonus: f64,
    /// Fuzz ratio for intervals of 30 days and more
    #[serde(default = "default_fuzz")]
    pub fuzz: f64,
    /// Global multiplier applied to every review interval
    #[serde(default = "default_ivl_fct")]
    pub ivl_fct: f64,
    /// Longest interval in days
    #[serde(default = "default_max_ivl")]
    pub max_ivl: i32,
    /// Multiplier for "hard" answers
    #[serde(default = "default_hard_factor")]
    pub hard_factor: f64,
}

fn default_reviews_per_day() -> usize {
    200
}

fn default_easy_bonus() -> f64 {
    1.3
}

fn default_fuzz() -> f64 {
    0.05
}

fn default_ivl_fct() -> f64 {
    1.0
}

fn default_max_ivl() -> i32 {
    36500
}

fn default_hard_factor() -> f64 {
    1.2
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            per_day: default_reviews_per_day(),
            easy_bonus: default_easy_bonus(),
            fuzz: default_fuzz(),
            ivl_fct: default_ivl_fct(),
            max_ivl: default_max_ivl(),
            hard_factor: default_hard_factor(),
        }
    }
}

/// Per-deck options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckConfig {
    #[serde(default)]
    pub new: NewCardConfig,
    #[serde(default)]
    pub lapse: LapseConfig,
    #[serde(default, rename = "rev")]
    pub review: ReviewConfig,
}

impl DeckConfig {
    /// Step delays for a card on the ladder: lapse delays for cards that
    /// already graduated once, new-card delays otherwise.
    pub fn learning_delays(&self, lapsed: bool) -> &[f64] {
        if lapsed {
            &self.lapse.delays
        } else {
            &self.new.delays
        }
    }
}

/// Everything a scheduling session needs to know
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub deck: DeckConfig,
}

impl SchedulerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: SchedulerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; `.json` files are read as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        log::debug!("Loaded scheduler config from {:?}", path);
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        let deck = &self.deck;
        check_delays("new.delays", &deck.new.delays)?;
        check_delays("lapse.delays", &deck.lapse.delays)?;

        if deck.new.ints.len() < 2 {
            return invalid("new.ints needs a good and an easy interval");
        }
        if deck.new.ints.iter().any(|&ivl| ivl < 1) {
            return invalid("new.ints must be at least one day");
        }
        if deck.new.initial_factor < MIN_EASE_FACTOR {
            return invalid(format!(
                "new.initialFactor must be at least {}",
                MIN_EASE_FACTOR
            ));
        }
        if !(deck.lapse.mult >= 0.0 && deck.lapse.mult.is_finite()) {
            return invalid("lapse.mult must be a non-negative number");
        }
        if deck.review.max_ivl < 1 {
            return invalid("rev.maxIvl must be at least one day");
        }
        for (name, value) in [
            ("rev.easyBonus", deck.review.easy_bonus),
            ("rev.ivlFct", deck.review.ivl_fct),
            ("rev.hardFactor", deck.review.hard_factor),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return invalid(format!("{} must be positive", name));
            }
        }
        if !(0.0..1.0).contains(&deck.review.fuzz) {
            return invalid("rev.fuzz must be in [0, 1)");
        }
        if self.collection.learn_ahead_secs < 0 {
            return invalid("learnAheadSecs must not be negative");
        }
        Ok(())
    }
}

fn check_delays(name: &str, delays: &[f64]) -> Result<()> {
    if delays.is_empty() {
        return invalid(format!("{} must not be empty", name));
    }
    if delays.iter().any(|d| !(d.is_finite() && *d >= 0.0)) {
        return invalid(format!("{} must be non-negative minutes", name));
    }
    Ok(())
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(SchedulerError::InvalidConfig(message.into()))
}
