// Segmentation engine - sliding-window event labeling
//
// Slides a fixed-size, fixed-step window across a decoded recording and
// labels each window against the recording's chronological event list:
// a window overlapping the current event by more than the tolerance
// fraction on both edges becomes a positive frame inheriting the event's
// label and id; everything else becomes a background frame (or, under the
// strict policy, is dropped when the overlap is ambiguous).
//
// The scan keeps a single event index that only moves forward. Window
// classification itself is a pure function of (cursor, event_index,
// events): it returns the outcome together with the next event index, so
// the branch table has no hidden side effects on the scan state.

use serde::{Deserialize, Serialize};

use crate::audio::Recording;
use crate::config::SegmenterConfig;
use crate::metadata::{CatalogEvent, EventLabel, SegmentedFrame};

pub mod background;

/// Branch predicate table used to classify each window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Three-way partition: background, positive, or dropped.
    ///
    /// Windows that overlap an event partially but clear neither edge by
    /// the tolerance fraction are dropped instead of being forced into a
    /// class. The event index advances only once a window lies past the
    /// current event.
    Strict,

    /// Two-way partition: every window is labeled, none are dropped.
    ///
    /// Faithful to the historical stream segmentation: the advance test
    /// runs only on the negative branch, so an event can be skipped while
    /// windows overlapping it are still being consumed. Kept as observed
    /// behavior; prefer `Strict` when that matters.
    Permissive,
}

impl Policy {
    /// Tolerance fraction the policy was tuned with
    pub fn default_tolerance(&self) -> f64 {
        match self {
            Policy::Strict => 0.2,
            Policy::Permissive => 0.0,
        }
    }
}

/// Classification outcome for one window position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// Positive frame inheriting the current event's label and id
    Event,
    /// Background frame labeled `Other`
    Background,
    /// Ambiguous overlap, no frame emitted (strict policy only)
    Dropped,
}

/// Sliding-window segmenter for one recording
pub struct Segmenter {
    window_samples: usize,
    step_samples: usize,
    tolerance: f64,
    policy: Policy,
    sample_rate: u32,
}

impl Segmenter {
    /// Create a segmenter for the given sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Recording sample rate in Hz
    /// * `config` - Window geometry, tolerance, and policy
    pub fn new(sample_rate: u32, config: &SegmenterConfig) -> Self {
        let window_samples =
            ((config.frame_size_seconds * sample_rate as f64).round() as usize).max(1);
        let step_samples = ((config.step_seconds * sample_rate as f64).round() as usize).max(1);

        Self {
            window_samples,
            step_samples,
            tolerance: config.tolerance,
            policy: config.policy,
            sample_rate,
        }
    }

    /// Window length in samples
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    /// Advance between consecutive windows in samples
    pub fn step_samples(&self) -> usize {
        self.step_samples
    }

    /// Classify the window starting at `cursor` against the current event
    ///
    /// Pure: returns the outcome plus the event index the scan should use
    /// for the next window. The returned index is never smaller than
    /// `event_index` and never past the last event.
    pub fn classify(
        &self,
        cursor: usize,
        event_index: usize,
        events: &[CatalogEvent],
    ) -> (WindowOutcome, usize) {
        let event = &events[event_index];
        let event_start = event.start_seconds * self.sample_rate as f64;
        let event_stop = event.stop_seconds * self.sample_rate as f64;
        let at_last = event_index + 1 >= events.len();

        let window = self.window_samples as f64;
        // Overlap test points: the window start pushed in by the tolerance
        // fraction, and the window end pulled back by it.
        let lead = cursor as f64 + window * self.tolerance;
        let tail = cursor as f64 + window * (1.0 - self.tolerance);

        match self.policy {
            Policy::Strict => {
                if tail < event_start {
                    (WindowOutcome::Background, event_index)
                } else if lead >= event_start && tail <= event_stop {
                    (WindowOutcome::Event, event_index)
                } else if lead > event_stop {
                    let next = if at_last { event_index } else { event_index + 1 };
                    (WindowOutcome::Background, next)
                } else {
                    (WindowOutcome::Dropped, event_index)
                }
            }
            Policy::Permissive => {
                if lead > event_start && tail < event_stop {
                    (WindowOutcome::Event, event_index)
                } else {
                    let next = if tail > event_stop && !at_last {
                        event_index + 1
                    } else {
                        event_index
                    };
                    (WindowOutcome::Background, next)
                }
            }
        }
    }

    /// Scan one recording and produce labeled frames
    ///
    /// # Arguments
    /// * `recording` - Decoded audio (must match the segmenter's sample rate)
    /// * `events` - Chronological catalog events for the recording
    /// * `background_id` - Id assigned to background frames
    /// * `background_tag` - The recording's ambient category tag
    ///
    /// Every emitted frame owns a copy of exactly one window of samples;
    /// nothing borrows from the recording after this returns.
    pub fn segment(
        &self,
        recording: &Recording,
        events: &[CatalogEvent],
        background_id: &str,
        background_tag: &str,
    ) -> Vec<SegmentedFrame> {
        let samples = &recording.samples;
        let mut frames = Vec::new();
        let mut cursor = 0usize;
        let mut event_index = 0usize;

        if events.is_empty() {
            tracing::warn!("[Segmenter] No events in recording; labeling every window background");
        }

        while cursor + self.window_samples - 1 < samples.len() {
            let (outcome, next_index) = if events.is_empty() {
                (WindowOutcome::Background, 0)
            } else {
                self.classify(cursor, event_index, events)
            };

            match outcome {
                WindowOutcome::Event => {
                    let event = &events[event_index];
                    frames.push(SegmentedFrame {
                        id: event.id.clone(),
                        label: event.label,
                        background: background_tag.to_string(),
                        samples: samples[cursor..cursor + self.window_samples].to_vec(),
                    });
                }
                WindowOutcome::Background => {
                    frames.push(SegmentedFrame {
                        id: background_id.to_string(),
                        label: EventLabel::Other,
                        background: background_tag.to_string(),
                        samples: samples[cursor..cursor + self.window_samples].to_vec(),
                    });
                }
                WindowOutcome::Dropped => {}
            }

            event_index = next_index;
            cursor += self.step_samples;
        }

        tracing::debug!(
            "[Segmenter] Produced {} frames ({} windows scanned)",
            frames.len(),
            if samples.len() >= self.window_samples {
                (samples.len() - self.window_samples) / self.step_samples + 1
            } else {
                0
            }
        );

        frames
    }
}

#[cfg(test)]
#[path = "segmenter_tests.rs"]
mod tests;
