// Running statistics over processed catalog events
//
// A plain mutable accumulator with the lifetime of one batch run: the
// driver records every catalog event it sees, and the final report prints
// counts, duration extremes and per-class averages. Classes that never
// occurred report "n/a" instead of dividing by zero.

use serde::Serialize;

use crate::metadata::EventLabel;

/// Events shorter than this are counted separately per class, seconds
pub const SHORT_EVENT_THRESHOLD: f64 = 0.3;

/// Per-class aggregates
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClassStats {
    pub count: u64,
    pub duration_sum: f64,
    /// Events shorter than [`SHORT_EVENT_THRESHOLD`]
    pub short_count: u64,
}

impl ClassStats {
    /// Average event duration, or `None` when the class never occurred
    pub fn average_duration(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.duration_sum / self.count as f64)
        }
    }
}

/// Aggregate counters over all recorded events
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventStats {
    total_count: u64,
    duration_sum: f64,
    min_duration: Option<f64>,
    max_duration: Option<f64>,
    glass: ClassStats,
    gunshot: ClassStats,
    scream: ClassStats,
    other: ClassStats,
}

impl EventStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event's label and duration
    pub fn record(&mut self, label: EventLabel, duration_seconds: f64) {
        self.total_count += 1;
        self.duration_sum += duration_seconds;

        self.min_duration = Some(match self.min_duration {
            Some(min) => min.min(duration_seconds),
            None => duration_seconds,
        });
        self.max_duration = Some(match self.max_duration {
            Some(max) => max.max(duration_seconds),
            None => duration_seconds,
        });

        let class = self.class_mut(label);
        class.count += 1;
        class.duration_sum += duration_seconds;
        if duration_seconds < SHORT_EVENT_THRESHOLD {
            class.short_count += 1;
        }
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn min_duration(&self) -> Option<f64> {
        self.min_duration
    }

    pub fn max_duration(&self) -> Option<f64> {
        self.max_duration
    }

    /// Average duration over all events, or `None` when nothing was recorded
    pub fn average_duration(&self) -> Option<f64> {
        if self.total_count == 0 {
            None
        } else {
            Some(self.duration_sum / self.total_count as f64)
        }
    }

    pub fn class(&self, label: EventLabel) -> &ClassStats {
        match label {
            EventLabel::Glass => &self.glass,
            EventLabel::Gunshot => &self.gunshot,
            EventLabel::Scream => &self.scream,
            EventLabel::Other => &self.other,
        }
    }

    fn class_mut(&mut self, label: EventLabel) -> &mut ClassStats {
        match label {
            EventLabel::Glass => &mut self.glass,
            EventLabel::Gunshot => &mut self.gunshot,
            EventLabel::Scream => &mut self.scream,
            EventLabel::Other => &mut self.other,
        }
    }

    /// Render the aggregates as a multi-line report
    pub fn summary(&self) -> String {
        fn seconds(value: Option<f64>) -> String {
            match value {
                Some(v) => format!("{:.3}s", v),
                None => "n/a".to_string(),
            }
        }

        let mut out = String::new();
        out.push_str(&format!("Total events: {}\n", self.total_count));
        out.push_str(&format!(
            "Duration min: {}, max: {}, avg: {}\n",
            seconds(self.min_duration),
            seconds(self.max_duration),
            seconds(self.average_duration()),
        ));

        for label in EventLabel::all() {
            let class = self.class(label);
            out.push_str(&format!(
                "{:>8}: count {}, avg length {}, under {:.1}s: {}\n",
                label.display_name(),
                class.count,
                seconds(class.average_duration()),
                SHORT_EVENT_THRESHOLD,
                class.short_count,
            ));
        }

        out
    }
}
