use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Outcome and wall-clock duration of one reload attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub duration: Duration,
    pub ok: bool,
}

impl LatencySample {
    pub fn new(duration: Duration, ok: bool) -> Self {
        Self { duration, ok }
    }

    pub fn success(duration: Duration) -> Self {
        Self::new(duration, true)
    }

    pub fn failure(duration: Duration) -> Self {
        Self::new(duration, false)
    }
}

/// Summary of a reloader's samples. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadStats {
    pub reloads: usize,
    pub errors: usize,
    /// Percentage of failed reloads
    pub error_rate: f64,
    pub avg_time: f64,
    pub med_time: f64,
    pub min_time: f64,
    pub max_time: f64,
}

impl ReloadStats {
    /// Computes the summary, or `None` when there are no samples.
    ///
    /// The input is left untouched; durations are sorted in a copy.
    pub fn from_samples(samples: &[LatencySample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut times: Vec<f64> = samples.iter().map(|s| s.duration.as_secs_f64()).collect();
        times.sort_by(f64::total_cmp);

        let reloads = times.len();
        let errors = samples.iter().filter(|s| !s.ok).count();

        let mid = reloads / 2;
        let med_time = if reloads % 2 == 1 {
            times[mid]
        } else {
            (times[mid - 1] + times[mid]) / 2.0
        };

        let min_time = times[0];
        let max_time = times[reloads - 1];
        // Summation error must not push the mean outside the sample range.
        let avg_time = (times.iter().sum::<f64>() / reloads as f64).clamp(min_time, max_time);

        Some(Self {
            reloads,
            errors,
            error_rate: errors as f64 / reloads as f64 * 100.0,
            avg_time,
            med_time,
            min_time,
            max_time,
        })
    }
}

impl fmt::Display for ReloadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reloads={} errors={} error_rate={:.2}% avg_time={:.3} med_time={:.3} min_time={:.3} max_time={:.3}",
            self.reloads,
            self.errors,
            self.error_rate,
            self.avg_time,
            self.med_time,
            self.min_time,
            self.max_time
        )
    }
}
