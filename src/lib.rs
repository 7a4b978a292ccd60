//! Nous spaced repetition: an Anki-style card scheduler with learning steps,
//! fuzzed review intervals, daily limits and leech detection.

pub mod scheduler;
