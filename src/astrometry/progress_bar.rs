//! Progress bar over the outer object loop of [`calc_amx`](super::calc_amx).
//!
//! The message shows the number of pair samples collected so far and the time spent on the
//! last object next to a smoothed per-object time. Objects early in the loop have more
//! partners left to test, so the smoothed time decreases as the loop advances.
//!
//! This module is enabled only with the `progress` feature.
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise} | {msg}";

/// Weight of the latest object in the smoothed time.
const SMOOTHING: f64 = 0.2;

/// Render a per-object duration with a unit suited to its magnitude.
fn fmt_object_time(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{:.1}ms", us as f64 / 1e3),
        _ => format!("{:.2}s", d.as_secs_f64()),
    }
}

pub(crate) struct ObjectProgress {
    bar: ProgressBar,
    started: Instant,
    /// Smoothed per-object time in seconds, `None` before the first object.
    smoothed: Option<f64>,
}

impl ObjectProgress {
    pub(crate) fn new(total: usize) -> Self {
        let bar = ProgressBar::new((total as u64).max(1));
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(200));
        Self {
            bar,
            started: Instant::now(),
            smoothed: None,
        }
    }

    /// Fold the time of one object into the smoothed per-object time.
    fn record(&mut self, elapsed: Duration) -> Duration {
        let secs = elapsed.as_secs_f64();
        let smoothed = match self.smoothed {
            None => secs,
            Some(prev) => SMOOTHING * secs + (1.0 - SMOOTHING) * prev,
        };
        self.smoothed = Some(smoothed);
        Duration::from_secs_f64(smoothed)
    }

    /// Close one object, with `samples` pair samples collected so far.
    pub(crate) fn tick(&mut self, samples: usize) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.started);
        self.started = now;
        let smoothed = self.record(elapsed);

        self.bar.set_message(format!(
            "samples: {samples} | object: {} (~{})",
            fmt_object_time(elapsed),
            fmt_object_time(smoothed)
        ));
        self.bar.inc(1);
    }

    pub(crate) fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;

    #[test]
    fn test_fmt_object_time() {
        assert_eq!(fmt_object_time(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_object_time(Duration::from_micros(42_500)), "42.5ms");
        assert_eq!(fmt_object_time(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn test_smoothed_object_time() {
        let mut progress = ObjectProgress::new(3);
        progress.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());

        let first = progress.record(Duration::from_millis(100));
        assert!((first.as_secs_f64() - 0.1).abs() < 1e-9);

        // 0.2 · 200ms + 0.8 · 100ms
        let second = progress.record(Duration::from_millis(200));
        assert!((second.as_secs_f64() - 0.12).abs() < 1e-9);
        progress.finish();
    }
}
