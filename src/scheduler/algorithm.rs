//! Interval arithmetic
//!
//! Pure functions behind the answer state machine: learning step delays,
//! graduating intervals, review interval growth and fuzz.
//!
//! Review growth, for interval `I`, ease `F` and `L` days late:
//! - hard: `I * hardFactor`
//! - good: `(I + L/2) * F`
//! - easy: `(I + L) * F * easyBonus`
//!
//! Each result is floored at the previous one plus a day, so
//! hard <= good <= easy holds by construction.

use rand::{Rng, RngCore};

use super::config::{LapseConfig, NewCardConfig, ReviewConfig, MIN_EASE_FACTOR};
use super::models::{Grade, LearningSteps};

/// Largest random delay added to a same-day learning step, in seconds
const MAX_LEARNING_JITTER_SECS: i64 = 300;

/// Closed range of acceptable fuzzed values for an interval in days.
///
/// `long_ratio` is the fuzz ratio used from 30 days up.
pub fn fuzz_range(ivl: i32, long_ratio: f64) -> (i32, i32) {
    if ivl < 2 {
        return (1, 1);
    }
    if ivl == 2 {
        return (2, 3);
    }
    let fuzz = if ivl < 7 {
        (ivl as f64 * 0.25) as i32
    } else if ivl < 30 {
        ((ivl as f64 * 0.15) as i32).max(2)
    } else {
        ((ivl as f64 * long_ratio) as i32).max(4)
    };
    // at least a day either way
    let fuzz = fuzz.max(1);
    (ivl - fuzz, ivl + fuzz)
}

/// Pick a uniformly random interval inside the fuzz range
pub fn fuzzed_interval(ivl: i32, long_ratio: f64, rng: &mut dyn RngCore) -> i32 {
    let (min, max) = fuzz_range(ivl, long_ratio);
    rng.gen_range(min..=max)
}

/// Apply the interval multiplier, optional fuzz, then clamp to
/// `[max(prev + 1, 1), maxIvl]`.
pub fn constrained_interval(
    raw: f64,
    conf: &ReviewConfig,
    prev: i32,
    rng: Option<&mut dyn RngCore>,
) -> i32 {
    let mut ivl = (raw * conf.ivl_fct) as i32;
    if let Some(rng) = rng {
        ivl = fuzzed_interval(ivl, conf.fuzz, rng);
    }
    ivl.max(prev + 1).max(1).min(conf.max_ivl)
}

/// Next interval of a review card answered with hard, good or easy
pub fn next_review_interval(
    ivl: i32,
    ease_factor: u32,
    days_late: i64,
    grade: Grade,
    conf: &ReviewConfig,
    mut rng: Option<&mut dyn RngCore>,
) -> i32 {
    let factor = ease_factor as f64 / 1000.0;
    let days_late = days_late.max(0);
    let hard_min = if conf.hard_factor > 1.0 { ivl } else { 0 };

    let hard = constrained_interval(
        ivl as f64 * conf.hard_factor,
        conf,
        hard_min,
        reborrow(&mut rng),
    );
    if grade <= Grade::Hard {
        return hard;
    }

    let good = constrained_interval(
        (ivl as i64 + days_late / 2) as f64 * factor,
        conf,
        hard,
        reborrow(&mut rng),
    );
    if grade == Grade::Good {
        return good;
    }

    constrained_interval(
        (ivl as i64 + days_late) as f64 * factor * conf.easy_bonus,
        conf,
        good,
        rng,
    )
}

fn reborrow<'a>(rng: &'a mut Option<&mut dyn RngCore>) -> Option<&'a mut dyn RngCore> {
    rng.as_mut().map(|r| &mut **r as &mut dyn RngCore)
}

/// Ease factor after a review answer
pub fn adjusted_ease(ease_factor: u32, grade: Grade) -> u32 {
    let delta: i64 = match grade {
        Grade::Again => -200,
        Grade::Hard => -150,
        Grade::Good => 0,
        Grade::Easy => 150,
    };
    (ease_factor as i64 + delta).max(MIN_EASE_FACTOR as i64) as u32
}

/// Review interval after a lapse, in days
pub fn lapse_interval(ivl: i32, conf: &LapseConfig) -> i32 {
    let scaled = (ivl as f64 * conf.mult) as i32;
    1.max(conf.min_int).max(scaled)
}

/// Interval a never-graduated card gets on graduation
pub fn graduating_interval(
    conf: &NewCardConfig,
    early: bool,
    long_ratio: f64,
    rng: Option<&mut dyn RngCore>,
) -> i32 {
    let ideal = if early { conf.ints[1] } else { conf.ints[0] };
    match rng {
        Some(rng) => fuzzed_interval(ideal, long_ratio, rng),
        None => ideal,
    }
}

/// Delay in seconds of the step reached with `remaining` steps left
pub fn step_delay_secs(delays: &[f64], remaining: u32) -> i64 {
    let index = delays
        .len()
        .checked_sub(remaining as usize)
        .filter(|&i| i < delays.len())
        .unwrap_or(0);
    delays
        .get(index)
        .map(|minutes| (minutes * 60.0) as i64)
        .unwrap_or(0)
}

/// Delay for repeating the current step: halfway between it and the next one
pub fn repeat_step_delay_secs(delays: &[f64], remaining: u32) -> i64 {
    let current = step_delay_secs(delays, remaining);
    let next = step_delay_secs(delays, remaining.saturating_sub(1));
    (current + current.max(next)) / 2
}

/// How many of the last `remaining` steps can be completed before the day
/// cutoff, starting from `now`. Never less than one.
pub fn steps_today(delays: &[f64], remaining: u32, now: i64, day_cutoff: i64) -> u32 {
    let start = if remaining == 0 {
        0
    } else {
        delays.len().saturating_sub(remaining as usize)
    };
    let mut at = now;
    let mut ok = 0;
    for (i, minutes) in delays[start..].iter().enumerate() {
        at += (minutes * 60.0) as i64;
        if at > day_cutoff {
            break;
        }
        ok = i;
    }
    ok as u32 + 1
}

/// Ladder position of a card entering its first step
pub fn starting_steps(delays: &[f64], now: i64, day_cutoff: i64) -> LearningSteps {
    let total = delays.len() as u32;
    LearningSteps::new(total, steps_today(delays, total, now, day_cutoff))
}

/// Upper bound (exclusive) of the random delay added to a same-day step
pub fn learning_jitter_bound(delay_secs: i64) -> i64 {
    MAX_LEARNING_JITTER_SECS.min((delay_secs as f64 * 0.25) as i64)
}

/// Format an interval in seconds to a short human-readable string
pub fn format_interval(secs: i64) -> String {
    if secs < 60 {
        return format!("{}s", secs.max(0));
    }
    if secs < 3600 {
        return format!("{}m", secs / 60);
    }
    if secs < 86_400 {
        return format!("{}h", secs / 3600);
    }

    let days = secs / 86_400;
    if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        let years = days as f64 / 365.0;
        if days % 365 == 0 {
            format!("{}y", days / 365)
        } else {
            format!("{:.1}y", years)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn in_range(ivl: i32, target: i32) -> bool {
        let (min, max) = fuzz_range(target, 0.05);
        min <= ivl && ivl <= max
    }

    #[test]
    fn test_fuzz_range_bands() {
        assert_eq!(fuzz_range(0, 0.05), (1, 1));
        assert_eq!(fuzz_range(1, 0.05), (1, 1));
        assert_eq!(fuzz_range(2, 0.05), (2, 3));
        assert_eq!(fuzz_range(4, 0.05), (3, 5));
        assert_eq!(fuzz_range(6, 0.05), (5, 7));
        assert_eq!(fuzz_range(10, 0.05), (8, 12));
        assert_eq!(fuzz_range(20, 0.05), (17, 23));
        assert_eq!(fuzz_range(100, 0.05), (95, 105));
        assert_eq!(fuzz_range(40, 0.05), (36, 44));
        assert_eq!(fuzz_range(260, 0.05), (247, 273));
    }

    #[test]
    fn test_fuzzed_interval_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for ivl in [1, 2, 5, 12, 45, 400] {
            for _ in 0..50 {
                assert!(in_range(fuzzed_interval(ivl, 0.05, &mut rng), ivl));
            }
        }
    }

    #[test]
    fn test_review_intervals_unfuzzed() {
        let conf = ReviewConfig::default();
        // (100) * 1.2
        assert_eq!(next_review_interval(100, 2500, 8, Grade::Hard, &conf, None), 120);
        // (100 + 8/2) * 2.5
        assert_eq!(next_review_interval(100, 2500, 8, Grade::Good, &conf, None), 260);
        // (100 + 8) * 2.5 * 1.3
        assert_eq!(next_review_interval(100, 2500, 8, Grade::Easy, &conf, None), 351);
    }

    #[test]
    fn test_review_intervals_fuzzed_in_range() {
        let conf = ReviewConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let good = next_review_interval(100, 2500, 8, Grade::Good, &conf, Some(&mut rng));
            assert!(in_range(good, 260));
        }
    }

    #[test]
    fn test_easy_fuzz_threads_one_rng_through_the_chain() {
        let conf = ReviewConfig::default();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let easy = next_review_interval(100, 2500, 8, Grade::Easy, &conf, Some(&mut a));
            assert!(in_range(easy, 351));
            assert_eq!(
                easy,
                next_review_interval(100, 2500, 8, Grade::Easy, &conf, Some(&mut b))
            );
        }
    }

    #[test]
    fn test_intervals_are_ordered() {
        let conf = ReviewConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        for ivl in [1, 2, 3, 10, 50, 300] {
            for ease in [1300, 2000, 2500, 3100] {
                for late in [0, 1, 10] {
                    let hard = next_review_interval(ivl, ease, late, Grade::Hard, &conf, None);
                    let good = next_review_interval(ivl, ease, late, Grade::Good, &conf, None);
                    let easy = next_review_interval(ivl, ease, late, Grade::Easy, &conf, None);
                    assert!(hard <= good && good <= easy, "{} {} {}", hard, good, easy);

                    // fuzzed values still respect the floors of one chain
                    let easy_fuzzed =
                        next_review_interval(ivl, ease, late, Grade::Easy, &conf, Some(&mut rng));
                    assert!(easy_fuzzed >= 1);
                }
            }
        }
    }

    #[test]
    fn test_max_interval_caps_everything() {
        let conf = ReviewConfig {
            max_ivl: 50,
            ..ReviewConfig::default()
        };
        assert_eq!(next_review_interval(100, 2500, 0, Grade::Hard, &conf, None), 50);
        assert_eq!(next_review_interval(100, 2500, 0, Grade::Easy, &conf, None), 50);
    }

    #[test]
    fn test_hard_factor_below_one_drops_floor() {
        let conf = ReviewConfig {
            hard_factor: 0.5,
            ..ReviewConfig::default()
        };
        assert_eq!(next_review_interval(10, 2500, 0, Grade::Hard, &conf, None), 5);
    }

    #[test]
    fn test_ease_adjustment_is_floored() {
        assert_eq!(adjusted_ease(2500, Grade::Hard), 2350);
        assert_eq!(adjusted_ease(2500, Grade::Good), 2500);
        assert_eq!(adjusted_ease(2500, Grade::Easy), 2650);
        assert_eq!(adjusted_ease(1400, Grade::Again), 1300);
        assert_eq!(adjusted_ease(1300, Grade::Hard), 1300);
    }

    #[test]
    fn test_lapse_interval() {
        let mut conf = LapseConfig::default();
        assert_eq!(lapse_interval(100, &conf), 1);
        conf.mult = 0.5;
        assert_eq!(lapse_interval(100, &conf), 50);
        conf.min_int = 60;
        assert_eq!(lapse_interval(100, &conf), 60);
    }

    #[test]
    fn test_graduating_interval() {
        let conf = NewCardConfig::default();
        assert_eq!(graduating_interval(&conf, false, 0.05, None), 1);
        assert_eq!(graduating_interval(&conf, true, 0.05, None), 4);
        let mut rng = StdRng::seed_from_u64(1);
        let early = graduating_interval(&conf, true, 0.05, Some(&mut rng));
        assert!((3..=5).contains(&early));
    }

    #[test]
    fn test_step_delays() {
        let delays = [0.5, 3.0, 10.0];
        assert_eq!(step_delay_secs(&delays, 3), 30);
        assert_eq!(step_delay_secs(&delays, 2), 180);
        assert_eq!(step_delay_secs(&delays, 1), 600);
        // out-of-range counts fall back to the first step
        assert_eq!(step_delay_secs(&delays, 0), 30);
        assert_eq!(step_delay_secs(&delays, 9), 30);
    }

    #[test]
    fn test_repeat_step_delay() {
        let delays = [1.0, 10.0];
        // halfway between 1m and 10m
        assert_eq!(repeat_step_delay_secs(&delays, 2), 330);
        // last step repeats itself
        assert_eq!(repeat_step_delay_secs(&delays, 1), 600);
    }

    #[test]
    fn test_steps_today() {
        let delays = [1.0, 10.0, 1440.0, 2880.0];
        let cutoff = 10 * 3600;
        assert_eq!(steps_today(&delays, 4, 0, cutoff), 2);
        assert_eq!(steps_today(&delays, 3, 0, cutoff), 1);
        assert_eq!(steps_today(&[1.0, 10.0], 2, 0, cutoff), 2);
        // first step already crosses the cutoff
        assert_eq!(steps_today(&[1.0], 1, cutoff, cutoff), 1);
    }

    #[test]
    fn test_starting_steps() {
        let steps = starting_steps(&[0.5, 3.0, 10.0], 0, 86_400);
        assert_eq!(steps, LearningSteps::new(3, 3));
        assert_eq!(steps.packed(), 3003);
    }

    #[test]
    fn test_learning_jitter_bound() {
        assert_eq!(learning_jitter_bound(30), 7);
        assert_eq!(learning_jitter_bound(600), 150);
        assert_eq!(learning_jitter_bound(86_400), 300);
        assert_eq!(learning_jitter_bound(0), 0);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "0s");
        assert_eq!(format_interval(30), "30s");
        assert_eq!(format_interval(600), "10m");
        assert_eq!(format_interval(7200), "2h");
        assert_eq!(format_interval(86_400), "1d");
        assert_eq!(format_interval(5 * 86_400), "5d");
        assert_eq!(format_interval(14 * 86_400), "2w");
        assert_eq!(format_interval(90 * 86_400), "3mo");
        assert_eq!(format_interval(365 * 86_400), "1y");
        assert_eq!(format_interval(438 * 86_400), "1.2y");
    }
}
