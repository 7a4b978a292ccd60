//! Spaced repetition scheduler for Nous
//!
//! This module provides:
//! - Card, note and collection models
//! - Deck and collection configuration
//! - Lazily filled new / learning / day-learning / review queues
//! - The answer state machine with fuzzed intervals and leech detection

pub mod algorithm;
pub mod clock;
pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod queues;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::Collection;
pub use config::*;
pub use engine::{AnswerOutcome, Scheduler, LEECH_TAG};
pub use error::{Result, SchedulerError};
pub use models::*;
