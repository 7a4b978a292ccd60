use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};

use nous_srs::scheduler::{Collection, ManualClock, Note, Scheduler, SchedulerConfig};

/// Shared state for CLI commands
pub struct App {
    pub config: SchedulerConfig,
    pub config_path: Option<PathBuf>,
}

impl App {
    /// Load the config file if one was given, defaults otherwise
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => SchedulerConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => SchedulerConfig::default(),
        };
        config.validate().context("Invalid scheduler config")?;

        Ok(Self {
            config,
            config_path: config_path.map(Path::to_path_buf),
        })
    }

    /// A clock at 09:00 local time today
    pub fn morning_clock(&self) -> Result<ManualClock> {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).context("Invalid start time")?;
        Ok(ManualClock::at_local(Local::now().date_naive().and_time(nine)))
    }

    /// A scheduler over `notes` numbered basic notes
    pub fn scheduler(&self, clock: ManualClock, notes: usize, seed: u64) -> Result<Scheduler<ManualClock>> {
        let mut col = Collection::new(&clock, self.config.clone())
            .context("Failed to create collection")?;
        for i in 1..=notes {
            col.add_note(Note::basic(format!("Question {}", i), format!("Answer {}", i)), &clock);
        }
        let sched = Scheduler::new(col, clock).context("Failed to start scheduler")?;
        Ok(sched.with_rng_seed(seed))
    }
}
