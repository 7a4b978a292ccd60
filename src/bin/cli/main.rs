mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nous-srs", about = "Spaced repetition scheduler tools", version)]
struct Cli {
    /// Scheduler config file (TOML, or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Study a generated deck for a number of days on a simulated clock
    Simulate {
        /// Number of basic notes in the deck
        #[arg(long, default_value = "100")]
        notes: usize,
        /// Number of days to study
        #[arg(long, default_value = "30")]
        days: u32,
        /// Seed for grading and interval fuzz
        #[arg(long, default_value = "1")]
        seed: u64,
        /// Print every card and queue after the last day
        #[arg(long)]
        dump: bool,
    },

    /// Show when a card would come back for each answer
    Preview {
        /// Current interval in days (omit to preview a new card)
        #[arg(long)]
        interval: Option<i32>,
        /// Ease factor in permille
        #[arg(long, default_value = "2500")]
        ease: u32,
        /// Days past the due date
        #[arg(long, default_value = "0")]
        days_late: i64,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Simulate { notes, days, seed, dump } => {
            let options = commands::simulate::SimulateOptions { notes, days, seed, dump };
            commands::simulate::run(&app, &options, &cli.format, use_color)?;
        }
        Command::Preview { interval, ease, days_late } => {
            commands::preview::run(&app, interval, ease, days_late, &cli.format, use_color)?;
        }
        Command::Config => {
            commands::config::run(&app, &cli.format)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
