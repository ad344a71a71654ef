//! Human-readable summary.
//!
//! ```text
//! _Start 2026-10-16 09:30:00
//! _Levels=4 Dup=120 Diff=2 Miss=5 Skip=0 Files=127
//! _End 2026-10-16 09:30:01
//! _Elapsed 0.84 (sec)
//! ```

use chrono::Local;
use yansi::{Color, Paint};

use crate::compare::ScanSummary;

/// Text summary writer.
#[derive(Debug)]
pub struct TextSummary<'a> {
    summary: &'a ScanSummary,
    color: bool,
}

impl<'a> TextSummary<'a> {
    /// Colored summary for `summary`.
    #[must_use]
    pub fn new(summary: &'a ScanSummary) -> Self {
        Self {
            summary,
            color: true,
        }
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Render all summary lines, each terminated by a newline.
    #[must_use]
    pub fn render(&self) -> String {
        let s = self.summary;
        let started = s.started_at.with_timezone(&Local);
        let ended = started
            + chrono::Duration::from_std(s.duration).unwrap_or_else(|_| chrono::Duration::zero());

        let mut out = String::new();
        out.push_str(&format!("_Start {}\n", started.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!(
            "_Levels={} Dup={} Diff={} Miss={} Skip={} Files={}\n",
            s.depths_visited,
            self.paint(s.duplicates, Color::Green),
            self.paint(s.differences, warn_color(s.differences)),
            self.paint(s.missing, warn_color(s.missing)),
            s.skipped,
            s.total_files(),
        ));
        if s.unreadable_dirs > 0 {
            out.push_str(&format!(
                "_Unreadable={}\n",
                self.paint(s.unreadable_dirs, Color::Red)
            ));
        }
        if s.interrupted {
            out.push_str(&format!("{}\n", self.paint("_Interrupted", Color::Yellow)));
        }
        out.push_str(&format!("_End {}\n", ended.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!(
            "_Elapsed {:.2} (sec)\n",
            s.duration.as_secs_f64()
        ));
        out
    }

    fn paint<T: std::fmt::Display>(&self, value: T, color: Color) -> String {
        if self.color {
            value.paint(color).bold().to_string()
        } else {
            value.to_string()
        }
    }
}

fn warn_color(count: u64) -> Color {
    if count == 0 {
        Color::Green
    } else {
        Color::Yellow
    }
}
