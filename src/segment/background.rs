// Background synthesis - whole-event extraction path
//
// The sliding-window scan labels windows; this path instead extracts the
// events themselves. Silent gaps between consecutive catalog events are
// filled with synthetic `Other` intervals, kept clear of their neighbors
// by a guard distance and skipped entirely when too short. One shared
// extraction routine then collects the raw samples for original and
// synthetic events alike.

use crate::audio::Recording;
use crate::config::BackgroundConfig;
use crate::metadata::{CatalogEvent, EventLabel, RecordingMetadata};

/// Fill silent gaps between events with synthetic `Other` intervals
///
/// # Arguments
/// * `events` - Chronological catalog events of one recording
/// * `suffix` - Recording suffix used to build synthetic ids
/// * `background_tag` - The recording's ambient category tag
/// * `config` - Guard distance and minimum interval length
///
/// The gap before the first event is measured from time 0; each remaining
/// gap runs from one event's stop to the next event's start. A gap only
/// yields an interval when, after insetting both ends by
/// `inter_event_distance`, at least `min_event_duration` seconds remain;
/// shorter gaps produce nothing rather than a truncated interval.
pub fn synthesize_background(
    events: &[CatalogEvent],
    suffix: &str,
    background_tag: &str,
    config: &BackgroundConfig,
) -> Vec<CatalogEvent> {
    let mut synthetic = Vec::new();
    let mut previous_stop = 0.0f64;

    for event in events {
        let start = previous_stop + config.inter_event_distance;
        let stop = event.start_seconds - config.inter_event_distance;

        if stop - start >= config.min_event_duration {
            synthetic.push(CatalogEvent {
                id: format!("other{}_{}", suffix, synthetic.len()),
                label: EventLabel::Other,
                start_seconds: start,
                stop_seconds: stop,
                background: background_tag.to_string(),
                samples: None,
            });
        }

        previous_stop = event.stop_seconds;
    }

    tracing::debug!(
        "[Background] Synthesized {} intervals from {} events",
        synthetic.len(),
        events.len()
    );

    synthetic
}

/// Fill `samples` for every event by scanning the sample array once
///
/// Collects the samples whose index-derived time lies strictly inside
/// `(start, stop)`; exact boundary samples are excluded. The scan index
/// only moves forward, which requires `events` to be chronological and
/// non-overlapping, the invariant both the descriptor loader and
/// `synthesize_background` maintain.
pub fn extract_event_samples(recording: &Recording, events: &mut [CatalogEvent]) {
    let dt = 1.0 / recording.sample_rate as f64;
    let samples = &recording.samples;
    let mut index = 0usize;

    for event in events.iter_mut() {
        let mut collected = Vec::new();
        while index < samples.len() && (index as f64) * dt < event.stop_seconds {
            let t = index as f64 * dt;
            if t > event.start_seconds && t < event.stop_seconds {
                collected.push(samples[index]);
            }
            index += 1;
        }
        event.samples = Some(collected);
    }
}

/// Whole-event extraction for one recording
///
/// Extracts raw samples for the descriptor's events, synthesizes
/// background intervals for the gaps, extracts those too, and returns the
/// combined list (originals first, synthetics after).
pub fn extract_events(
    metadata: RecordingMetadata,
    recording: &Recording,
    suffix: &str,
    config: &BackgroundConfig,
) -> Vec<CatalogEvent> {
    let RecordingMetadata {
        mut events,
        background,
    } = metadata;

    extract_event_samples(recording, &mut events);

    let mut synthetic = synthesize_background(&events, suffix, &background, config);
    extract_event_samples(recording, &mut synthetic);

    events.append(&mut synthetic);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_event(start: f64, stop: f64) -> CatalogEvent {
        CatalogEvent {
            id: "glass".to_string(),
            label: EventLabel::Glass,
            start_seconds: start,
            stop_seconds: stop,
            background: "rain".to_string(),
            samples: None,
        }
    }

    fn ramp_recording(sample_rate: u32, total_samples: usize) -> Recording {
        Recording {
            sample_rate,
            samples: (0..total_samples).map(|i| i as f32).collect(),
        }
    }

    #[test]
    fn test_leading_gap_measured_from_zero() {
        let events = vec![catalog_event(2.0, 3.0)];
        let config = BackgroundConfig::default();

        let synthetic = synthesize_background(&events, "00001_1", "rain", &config);

        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].id, "other00001_1_0");
        assert_eq!(synthetic[0].label, EventLabel::Other);
        assert_eq!(synthetic[0].start_seconds, 0.5);
        assert_eq!(synthetic[0].stop_seconds, 1.5);
        assert_eq!(synthetic[0].background, "rain");
    }

    #[test]
    fn test_short_gaps_are_skipped_entirely() {
        // Gap between the events is 1.2 s; after the 0.5 s guard on each
        // side only 0.2 s remain, below the 0.5 s minimum.
        let events = vec![catalog_event(0.6, 1.0), catalog_event(2.2, 2.8)];
        let config = BackgroundConfig::default();

        let synthetic = synthesize_background(&events, "00001_1", "rain", &config);
        assert!(
            synthetic.is_empty(),
            "short gaps must be skipped, not truncated: {:?}",
            synthetic
                .iter()
                .map(|e| (e.start_seconds, e.stop_seconds))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_synthetic_ids_use_sequential_counter() {
        let events = vec![catalog_event(2.0, 2.5), catalog_event(5.0, 5.5)];
        let config = BackgroundConfig::default();

        let synthetic = synthesize_background(&events, "00042_3", "crowd", &config);

        assert_eq!(synthetic.len(), 2);
        assert_eq!(synthetic[0].id, "other00042_3_0");
        assert_eq!(synthetic[1].id, "other00042_3_1");
    }

    #[test]
    fn test_synthetic_intervals_never_overlap_events() {
        let events = vec![
            catalog_event(1.5, 2.0),
            catalog_event(4.0, 4.4),
            catalog_event(7.0, 8.0),
        ];
        let config = BackgroundConfig::default();

        let synthetic = synthesize_background(&events, "00001_1", "rain", &config);
        assert!(!synthetic.is_empty());

        for interval in &synthetic {
            assert!(
                interval.stop_seconds - interval.start_seconds >= config.min_event_duration,
                "interval shorter than the minimum: [{}, {}]",
                interval.start_seconds,
                interval.stop_seconds
            );
            for event in &events {
                let disjoint = interval.stop_seconds <= event.start_seconds
                    || interval.start_seconds >= event.stop_seconds;
                assert!(
                    disjoint,
                    "synthetic [{}, {}] overlaps event [{}, {}]",
                    interval.start_seconds,
                    interval.stop_seconds,
                    event.start_seconds,
                    event.stop_seconds
                );
            }
        }
    }

    #[test]
    fn test_no_events_yields_no_synthetics() {
        let config = BackgroundConfig::default();
        assert!(synthesize_background(&[], "00001_1", "", &config).is_empty());
    }

    #[test]
    fn test_extraction_excludes_boundary_samples() {
        // 10 Hz: sample i sits at t = i / 10.
        let recording = ramp_recording(10, 10);
        let mut events = vec![catalog_event(0.2, 0.5)];

        extract_event_samples(&recording, &mut events);

        // t = 0.2 and t = 0.5 fall exactly on the boundary and are excluded
        let samples = events[0].samples.as_ref().unwrap();
        assert_eq!(samples, &vec![3.0, 4.0]);
    }

    #[test]
    fn test_extraction_is_monotonic_across_events() {
        let recording = ramp_recording(10, 40);
        let mut events = vec![catalog_event(0.2, 0.5), catalog_event(1.0, 1.4)];

        extract_event_samples(&recording, &mut events);

        assert_eq!(events[0].samples.as_ref().unwrap(), &vec![3.0, 4.0]);
        assert_eq!(events[1].samples.as_ref().unwrap(), &vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_extraction_stops_at_end_of_audio() {
        // Event extends past the recording; extraction must not run off
        // the sample array.
        let recording = ramp_recording(10, 5);
        let mut events = vec![catalog_event(0.2, 2.0)];

        extract_event_samples(&recording, &mut events);
        assert_eq!(events[0].samples.as_ref().unwrap(), &vec![3.0, 4.0]);
    }

    #[test]
    fn test_extract_events_combines_originals_and_synthetics() {
        let recording = ramp_recording(100, 1000); // 10 s
        let metadata = RecordingMetadata {
            events: vec![catalog_event(2.0, 3.0), catalog_event(6.0, 7.0)],
            background: "rain".to_string(),
        };
        let config = BackgroundConfig::default();

        let events = extract_events(metadata, &recording, "00001_1", &config);

        // 2 originals + leading gap [0.5, 1.5] + middle gap [3.5, 5.5]
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.samples.is_some()));

        let originals = events
            .iter()
            .filter(|e| e.label == EventLabel::Glass)
            .count();
        let synthetics = events
            .iter()
            .filter(|e| e.label == EventLabel::Other)
            .count();
        assert_eq!(originals, 2);
        assert_eq!(synthetics, 2);

        // Synthetic sample content comes from the same shared extraction:
        // strictly inside (0.5, 1.5) at 100 Hz is indices 51..=149.
        let leading = events
            .iter()
            .find(|e| e.id == "other00001_1_0")
            .expect("leading synthetic interval");
        let samples = leading.samples.as_ref().unwrap();
        assert_eq!(samples.first().copied(), Some(51.0));
        assert_eq!(samples.last().copied(), Some(149.0));
        assert_eq!(samples.len(), 99);
    }
}
