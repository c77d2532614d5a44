// src/ingest/progress.rs
// Page-level completion fraction and a naive remaining-time estimate,
// extrapolated from elapsed wall time.

use chrono::{DateTime, Utc};
use tracing::info;

pub struct Progress {
    started: DateTime<Utc>,
}

impl Progress {
    pub fn start() -> Self {
        Self { started: Utc::now() }
    }

    pub fn report(&self, label: &str, done: u32, total: u32) {
        if total == 0 {
            return;
        }
        let fraction = f64::from(done) / f64::from(total);
        if done == 0 {
            info!("{label}: 0/{total} (0.0%)");
            return;
        }
        let elapsed = (Utc::now() - self.started).num_seconds().max(0) as f64;
        let remaining = (elapsed / fraction - elapsed).round() as i64;
        info!(
            "{label}: {done}/{total} ({:.1}%), about {}m{}s remaining",
            fraction * 100.0,
            remaining / 60,
            remaining % 60
        );
    }
}
