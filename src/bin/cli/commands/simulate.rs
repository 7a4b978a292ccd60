use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use nous_srs::scheduler::clock::SECS_PER_DAY;
use nous_srs::scheduler::{Clock, Grade, ManualClock, QueueCounts, Scheduler};

use crate::app::App;
use crate::render::terminal::{paint, rule, Color};
use crate::OutputFormat;

/// Seconds spent on each answer
const SECS_PER_ANSWER: i64 = 20;

/// Stop a day's session after this many answers
const MAX_ANSWERS_PER_DAY: usize = 2000;

pub struct SimulateOptions {
    pub notes: usize,
    pub days: u32,
    pub seed: u64,
    pub dump: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayReport {
    day: i64,
    /// Due at the start of the session
    due: QueueCounts,
    answered: usize,
    /// Answer counts, Again through Easy
    grades: [usize; 4],
    leeches: usize,
}

pub fn run(app: &App, options: &SimulateOptions, format: &OutputFormat, use_color: bool) -> Result<()> {
    let clock = app.morning_clock()?;
    let mut sched = app.scheduler(clock, options.notes, options.seed)?;
    let mut grader = StdRng::seed_from_u64(options.seed.wrapping_add(1));

    let mut reports = Vec::with_capacity(options.days as usize);
    for _ in 0..options.days {
        let next_morning = sched.clock().now() + SECS_PER_DAY;
        reports.push(study_day(&mut sched, &mut grader)?);
        sched.clock().set(next_morning.max(sched.clock().now()));
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "notes": options.notes,
                "seed": options.seed,
                "days": reports,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => print_table(&reports, use_color),
    }

    if options.dump {
        println!();
        print!("{}", sched.dump());
    }
    Ok(())
}

fn study_day(sched: &mut Scheduler<ManualClock>, grader: &mut StdRng) -> Result<DayReport> {
    let due = sched.counts();
    let suspended_before = due.suspended;
    let mut report = DayReport {
        day: sched.today(),
        due,
        answered: 0,
        grades: [0; 4],
        leeches: 0,
    };

    while report.answered < MAX_ANSWERS_PER_DAY {
        let Some(card) = sched.get_next_card() else {
            break;
        };
        let grade = pick_grade(grader);
        sched.answer(card.id, grade)?;
        report.answered += 1;
        report.grades[grade.as_u8() as usize - 1] += 1;
        sched.clock().advance(SECS_PER_ANSWER);
    }
    if report.answered == MAX_ANSWERS_PER_DAY {
        log::warn!("Day {} stopped after {} answers", report.day, report.answered);
    }

    report.leeches = sched.counts().suspended.saturating_sub(suspended_before);
    log::debug!("Day {}: {} answers", report.day, report.answered);
    Ok(report)
}

/// Mostly Good, with some misses and the occasional Hard or Easy
fn pick_grade(rng: &mut StdRng) -> Grade {
    match rng.gen_range(0..100) {
        0..=14 => Grade::Again,
        15..=29 => Grade::Hard,
        30..=84 => Grade::Good,
        _ => Grade::Easy,
    }
}

fn print_table(reports: &[DayReport], use_color: bool) {
    let header = format!(
        "{:>4} {:>5} {:>5} {:>6} {:>6} {:>8} {:>6} {:>6}",
        "Day", "New", "Lrn", "Review", "Total", "Answered", "Again", "Leech"
    );
    println!("{}", paint(&header, Color::BOLD, use_color));
    println!("{}", rule(&[4, 5, 5, 6, 6, 8, 6, 6]));

    for r in reports {
        let line = format!(
            "{:>4} {:>5} {:>5} {:>6} {:>6} {:>8} {:>6} {:>6}",
            r.day,
            r.due.new,
            r.due.learning + r.due.day_learning,
            r.due.review,
            r.due.due_total(),
            r.answered,
            r.grades[0],
            r.leeches
        );
        if r.answered == 0 {
            println!("{}", paint(&line, Color::DIM, use_color));
        } else {
            println!("{}", line);
        }
    }

    let answered: usize = reports.iter().map(|r| r.answered).sum();
    let again: usize = reports.iter().map(|r| r.grades[0]).sum();
    let retention = if answered == 0 {
        0.0
    } else {
        100.0 * (answered - again) as f64 / answered as f64
    };
    println!(
        "\n{} answers over {} days, {:.1}% passed",
        answered,
        reports.len(),
        retention
    );
}
