//! Terminal progress bar fed by batch events.
//!
//! # Examples
//!
//! ```
//! use rakupdf::batch::BatchEvent;
//! use rakupdf::output::progress::ProgressBar;
//!
//! let mut progress = ProgressBar::disabled();
//! progress.observe(&BatchEvent::Started { total: 2 });
//! progress.observe(&BatchEvent::Progress {
//!     completed: 1,
//!     total: 2,
//!     message: "a.pdf".into(),
//! });
//! assert_eq!(progress.percent(), 50.0);
//! ```

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

use crate::batch::BatchEvent;

const BAR_WIDTH: usize = 30;

/// Progress bar drawn on stderr.
///
/// Only draws when stderr is a terminal, so piped output and JSON mode stay
/// clean.
#[derive(Debug)]
pub struct ProgressBar {
    total: usize,
    current: usize,
    message: Option<String>,
    start_time: Instant,
    last_draw: Option<Instant>,
    draw_interval: Duration,
    enabled: bool,
}

impl ProgressBar {
    /// Create a bar for `total` steps.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            message: None,
            start_time: Instant::now(),
            last_draw: None,
            draw_interval: Duration::from_millis(80),
            enabled: io::stderr().is_terminal(),
        }
    }

    /// Create a bar that tracks progress without drawing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0)
        }
    }

    /// Create a bar that draws only if `show` and stderr is a terminal.
    pub fn when(show: bool) -> Self {
        if show { Self::new(0) } else { Self::disabled() }
    }

    /// Text shown after the bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Update the bar from a batch event.
    pub fn observe(&mut self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { total } => {
                self.total = *total;
                self.current = 0;
                self.start_time = Instant::now();
                self.draw(true);
            }
            BatchEvent::Progress {
                completed,
                total,
                message,
            } => {
                self.total = *total;
                self.current = (*completed).max(self.current);
                self.message = Some(message.clone());
                self.draw(self.current >= self.total);
            }
            BatchEvent::TaskFinished { .. } => {}
            BatchEvent::Finished(_) => self.clear(),
        }
    }

    /// Percentage of completed steps.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    /// Estimated time left, once at least one step has finished.
    pub fn eta(&self) -> Option<Duration> {
        if self.current == 0 || self.current >= self.total {
            return None;
        }
        let per_step = self.start_time.elapsed().as_secs_f64() / self.current as f64;
        Some(Duration::from_secs_f64(
            per_step * (self.total - self.current) as f64,
        ))
    }

    /// Erase the bar from the terminal.
    pub fn clear(&self) {
        if self.enabled {
            eprint!("\r\x1b[K");
            io::stderr().flush().ok();
        }
    }

    fn draw(&mut self, force: bool) {
        if !self.enabled {
            return;
        }
        if !force
            && let Some(last) = self.last_draw
            && last.elapsed() < self.draw_interval
        {
            return;
        }
        self.last_draw = Some(Instant::now());
        eprint!("\r\x1b[K{}", self.line());
        io::stderr().flush().ok();
    }

    fn line(&self) -> String {
        let filled = BAR_WIDTH * self.current.min(self.total) / self.total.max(1);
        let mut line = format!(
            "[{}{}] {}/{} {}",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            self.current,
            self.total,
            format_duration(self.start_time.elapsed()),
        );
        if let Some(eta) = self.eta() {
            line.push_str(&format!(" (eta {})", format_duration(eta)));
        }
        if let Some(message) = &self.message {
            line.push(' ');
            line.push_str(message);
        }
        line
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}
