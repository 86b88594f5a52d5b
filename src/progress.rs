use std::{
    cell::Cell,
    fmt::Display,
    time::{Duration, Instant},
};

use num_format::{Locale, ToFormattedString};
use tracing::info;

const LOG_INTERVAL: Duration = Duration::from_secs(1);

/// `[d]d hh:mm:ss`
#[derive(Debug)]
pub struct Elapsed(pub Duration);

impl Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.0.as_secs();
        let (days, rest) = (total / 86_400, total % 86_400);
        let (hours, minutes, seconds) = (rest / 3_600, rest % 3_600 / 60, rest % 60);
        if days > 0 {
            write!(f, "{days}d ")?;
        }
        return write!(f, "{hours:02}:{minutes:02}:{seconds:02}");
    }
}

/// Rows read from one source table. Logged at most once per second while
/// the copy runs and once more when dropped.
pub struct CopyProgress {
    table: String,
    expected: Option<u64>,
    rows: Cell<u64>,
    started: Instant,
    last_logged: Cell<Option<Instant>>,
    quiet: bool,
}

impl CopyProgress {
    pub fn new(table: &str, expected: Option<u64>, quiet: bool) -> Self {
        return Self {
            table: table.to_string(),
            expected,
            rows: Cell::new(0),
            started: Instant::now(),
            last_logged: Cell::new(None),
            quiet,
        };
    }

    pub fn add_rows(&self, count: u64) {
        self.rows.set(self.rows.get() + count);
        let now = Instant::now();
        let due = self
            .last_logged
            .get()
            .is_none_or(|last| now.duration_since(last) >= LOG_INTERVAL);
        if due {
            self.last_logged.set(Some(now));
            self.log();
        }
    }

    pub fn rows(&self) -> u64 {
        return self.rows.get();
    }

    fn rows_per_sec(&self) -> u64 {
        return self.rows() / self.started.elapsed().as_secs().max(1);
    }

    fn log(&self) {
        if !self.quiet {
            info!("Copying table {} {self}", self.table);
        }
    }
}

impl Display for CopyProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = self.rows();
        let speed = self.rows_per_sec();
        write!(f, "[{}] ", Elapsed(self.started.elapsed()))?;
        match self.expected {
            Some(expected) if expected > 0 => {
                let basis_points = rows.min(expected) * 10_000 / expected;
                let eta = Elapsed(Duration::from_secs(
                    expected.saturating_sub(rows) / speed.max(1),
                ));
                write!(
                    f,
                    "{}.{:02}% ({}/{}) rows/s: {speed} ETA: {eta}",
                    basis_points / 100,
                    basis_points % 100,
                    rows.to_formatted_string(&Locale::en),
                    expected.to_formatted_string(&Locale::en),
                )
            }
            _ => write!(f, "{} rows, rows/s: {speed}", rows.to_formatted_string(&Locale::en)),
        }
    }
}

impl Drop for CopyProgress {
    fn drop(&mut self) {
        self.log();
    }
}
