// Metadata loader - per-recording event descriptors
//
// Each recording ships with an XML descriptor: a `background` list naming
// the ambient sound categories mixed into the recording, and an `events`
// list of labeled time intervals. This module parses one descriptor into
// an ordered sequence of catalog events plus the recording's background
// tag, verifying the chronological ordering the segmentation engine
// relies on.

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// Event class labels
///
/// The source catalogs carry three recorded classes; `Other` is reserved
/// for synthesized background intervals and background-labeled windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLabel {
    /// Glass breaking
    Glass,
    /// Gun shot
    Gunshot,
    /// Scream
    Scream,
    /// Ambient background (no target event)
    Other,
}

impl EventLabel {
    /// Map a raw class name onto a label by prefix
    ///
    /// Source quirk preserved: the descriptors have no explicit background
    /// class, so anything that is neither glass nor gunshots is a scream.
    pub fn from_class_name(name: &str) -> Self {
        if name.starts_with("glass") {
            EventLabel::Glass
        } else if name.starts_with("gunshots") {
            EventLabel::Gunshot
        } else {
            EventLabel::Scream
        }
    }

    /// Numeric class string used in the output table's target column
    pub fn class_index(&self) -> &'static str {
        match self {
            EventLabel::Glass => "0",
            EventLabel::Gunshot => "1",
            EventLabel::Scream => "2",
            EventLabel::Other => "3",
        }
    }

    /// Human-readable name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            EventLabel::Glass => "glass",
            EventLabel::Gunshot => "gunshot",
            EventLabel::Scream => "scream",
            EventLabel::Other => "other",
        }
    }

    /// All labels, in target-column order
    pub fn all() -> [EventLabel; 4] {
        [
            EventLabel::Glass,
            EventLabel::Gunshot,
            EventLabel::Scream,
            EventLabel::Other,
        ]
    }
}

/// A labeled time interval within one recording
///
/// Catalog events come either from the descriptor (recorded target events)
/// or from background synthesis (gap-filling `Other` intervals). `samples`
/// stays empty until whole-event extraction fills it.
#[derive(Debug, Clone)]
pub struct CatalogEvent {
    /// Identifier used to recover the original file from an output row
    pub id: String,
    pub label: EventLabel,
    /// Interval start, seconds from the beginning of the recording
    pub start_seconds: f64,
    /// Interval end, seconds from the beginning of the recording
    pub stop_seconds: f64,
    /// `+`-joined ambient categories, shared by all events of the recording
    pub background: String,
    /// Raw samples covering `(start, stop)`, filled by extraction
    pub samples: Option<Vec<f32>>,
}

impl CatalogEvent {
    pub fn duration(&self) -> f64 {
        self.stop_seconds - self.start_seconds
    }
}

/// One fixed-length window produced by the sliding-window scan
///
/// Unlike a catalog event, a segmented frame has no interval of its own:
/// it carries the extracted window samples and inherits `label`/`id` from
/// the event it was classified against (or the synthetic background id).
#[derive(Debug, Clone)]
pub struct SegmentedFrame {
    pub id: String,
    pub label: EventLabel,
    pub background: String,
    /// Exactly one window of samples
    pub samples: Vec<f32>,
}

/// Parsed descriptor for one recording
#[derive(Debug, Clone)]
pub struct RecordingMetadata {
    /// Recorded target events, chronological by start time
    pub events: Vec<CatalogEvent>,
    /// `+`-joined ambient categories, order as listed in the descriptor
    pub background: String,
}

/// Length of the fixed counter suffix on raw class names
const CLASS_SUFFIX_LEN: usize = 4;

/// Strip the fixed 4-character counter suffix from a raw class name
fn event_id_from_class_name(name: &str) -> String {
    if name.len() > CLASS_SUFFIX_LEN && name.is_char_boundary(name.len() - CLASS_SUFFIX_LEN) {
        name[..name.len() - CLASS_SUFFIX_LEN].to_string()
    } else {
        name.to_string()
    }
}

/// Fetch the text of a required child element
fn child_text<'a>(
    node: roxmltree::Node<'a, '_>,
    element: &'static str,
) -> Result<&'a str, MetadataError> {
    node.children()
        .find(|child| child.has_tag_name(element))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(MetadataError::MissingField { element })
}

/// Parse a time field as a non-negative number of seconds
fn parse_seconds(element: &'static str, value: &str) -> Result<f64, MetadataError> {
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(MetadataError::BadTime {
            element,
            value: value.to_string(),
        }),
    }
}

/// Parse one recording's XML descriptor
///
/// # Arguments
/// * `xml` - Full text of the descriptor document
///
/// # Returns
/// The recording's events in file order plus its background tag.
///
/// The descriptor's file order is required to already be chronological by
/// start time; the segmentation engine's monotonic event-index advancement
/// depends on it, so out-of-order descriptors are rejected here instead of
/// being re-sorted.
pub fn parse_descriptor(xml: &str) -> Result<RecordingMetadata, MetadataError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();

    let mut categories = Vec::new();
    for list in root.children().filter(|n| n.has_tag_name("background")) {
        for item in list.children().filter(|n| n.has_tag_name("item")) {
            categories.push(child_text(item, "SUBCLASS")?.to_string());
        }
    }
    let background = categories.join("+");

    let mut events: Vec<CatalogEvent> = Vec::new();
    for list in root.children().filter(|n| n.has_tag_name("events")) {
        for item in list.children().filter(|n| n.has_tag_name("item")) {
            let class_name = child_text(item, "CLASS_NAME")?;
            let start_seconds =
                parse_seconds("STARTSECOND", child_text(item, "STARTSECOND")?)?;
            let stop_seconds = parse_seconds("ENDSECOND", child_text(item, "ENDSECOND")?)?;

            let index = events.len();
            if stop_seconds < start_seconds {
                return Err(MetadataError::InvertedSpan { index });
            }
            if let Some(previous) = events.last() {
                if start_seconds < previous.start_seconds {
                    return Err(MetadataError::Unordered { index });
                }
            }

            events.push(CatalogEvent {
                id: event_id_from_class_name(class_name),
                label: EventLabel::from_class_name(class_name),
                start_seconds,
                stop_seconds,
                background: background.clone(),
                samples: None,
            });
        }
    }

    Ok(RecordingMetadata { events, background })
}
