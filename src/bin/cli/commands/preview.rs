use anyhow::{bail, Context, Result};

use nous_srs::scheduler::algorithm::format_interval;
use nous_srs::scheduler::{CardQueue, CardType, Grade};

use crate::app::App;
use crate::render::terminal::{grade_color, paint, rule, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    interval: Option<i32>,
    ease: u32,
    days_late: i64,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    if interval.is_some_and(|ivl| ivl < 1) {
        bail!("Interval must be at least one day");
    }
    if days_late < 0 {
        bail!("Days late cannot be negative");
    }

    let clock = app.morning_clock()?;
    let mut sched = app.scheduler(clock, 1, 0)?;
    let today = sched.today();
    let card = sched
        .collection_mut()
        .cards_mut()
        .first_mut()
        .context("Failed to create a card")?;
    if let Some(ivl) = interval {
        card.card_type = CardType::Review;
        card.queue = CardQueue::Review {
            due_day: today - days_late,
        };
        card.interval = ivl;
        card.ease_factor = ease;
    }
    let id = card.id;

    let mut rows = Vec::with_capacity(Grade::ALL.len());
    for grade in Grade::ALL {
        let secs = sched.preview_next_interval(id, grade)?;
        rows.push((grade, secs));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(grade, secs)| {
                    serde_json::json!({
                        "grade": grade.as_u8(),
                        "label": grade.to_string(),
                        "seconds": secs,
                        "display": format_interval(*secs),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let title = match interval {
                Some(ivl) => format!(
                    "Review card: {}d interval, ease {:.2}, {}d late",
                    ivl,
                    ease as f64 / 1000.0,
                    days_late
                ),
                None => "New card".to_string(),
            };
            println!("{}", paint(&title, Color::BOLD, use_color));
            println!("{:<6} {:>8}", "Answer", "Next");
            println!("{}", rule(&[6, 8]));
            for (grade, secs) in &rows {
                let label = format!("{:<6}", grade.to_string());
                println!(
                    "{} {:>8}",
                    paint(&label, grade_color(*grade), use_color),
                    format_interval(*secs)
                );
            }
        }
    }

    Ok(())
}
