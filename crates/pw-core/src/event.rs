//! Recorded events.

use serde::Serialize;

use crate::types::Tags;

/// One point on the timeline: when it happened, absolute and relative.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Stamp {
    pub readable: String,
    pub unix: f64,
    pub relative: Option<f64>,
}

/// A timed interval, produced by `start`/`stop` and `loop`/`end_loop`.
///
/// Every time field is always serialized, as `null` until it is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Interval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub readable_start_time: Option<String>,
    pub unix_start_time: Option<f64>,
    pub start_time: Option<f64>,
    pub readable_end_time: Option<String>,
    pub unix_end_time: Option<f64>,
    pub end_time: Option<f64>,
    pub run_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Interval {
    pub(crate) fn started(key: Option<String>, at: Stamp) -> Self {
        Self {
            key,
            readable_start_time: Some(at.readable),
            unix_start_time: Some(at.unix),
            start_time: at.relative,
            ..Self::default()
        }
    }

    pub(crate) fn stopped_only(key: Option<String>, at: Stamp) -> Self {
        Self {
            key,
            readable_end_time: Some(at.readable),
            unix_end_time: Some(at.unix),
            end_time: at.relative,
            ..Self::default()
        }
    }

    /// Fills the end side. `run_time` stays `null` when the start is unknown.
    pub(crate) fn finish(&mut self, at: Stamp, precision: i32) {
        self.run_time = self
            .unix_start_time
            .map(|start| crate::clock::round_to(at.unix - start, precision));
        self.readable_end_time = Some(at.readable);
        self.unix_end_time = Some(at.unix);
        self.end_time = at.relative;
    }
}

/// A single instant, produced by `detect`. It never has end fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instant {
    pub readable_start_time: String,
    pub unix_start_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Instant {
    pub(crate) fn at(at: Stamp) -> Self {
        Self {
            readable_start_time: at.readable,
            unix_start_time: at.unix,
            start_time: at.relative,
            tags: None,
        }
    }
}

/// An entry in a group's event list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    Interval(Interval),
    Instant(Instant),
}

impl Event {
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Interval(i) => i.key.as_deref(),
            Self::Instant(_) => None,
        }
    }

    pub fn readable_start_time(&self) -> Option<&str> {
        match self {
            Self::Interval(i) => i.readable_start_time.as_deref(),
            Self::Instant(i) => Some(i.readable_start_time.as_str()),
        }
    }

    pub const fn unix_start_time(&self) -> Option<f64> {
        match self {
            Self::Interval(i) => i.unix_start_time,
            Self::Instant(i) => Some(i.unix_start_time),
        }
    }

    pub const fn start_time(&self) -> Option<f64> {
        match self {
            Self::Interval(i) => i.start_time,
            Self::Instant(i) => i.start_time,
        }
    }

    pub fn readable_end_time(&self) -> Option<&str> {
        match self {
            Self::Interval(i) => i.readable_end_time.as_deref(),
            Self::Instant(_) => None,
        }
    }

    pub const fn unix_end_time(&self) -> Option<f64> {
        match self {
            Self::Interval(i) => i.unix_end_time,
            Self::Instant(_) => None,
        }
    }

    pub const fn end_time(&self) -> Option<f64> {
        match self {
            Self::Interval(i) => i.end_time,
            Self::Instant(_) => None,
        }
    }

    pub const fn run_time(&self) -> Option<f64> {
        match self {
            Self::Interval(i) => i.run_time,
            Self::Instant(_) => None,
        }
    }

    pub const fn tags(&self) -> Option<&Tags> {
        match self {
            Self::Interval(i) => i.tags.as_ref(),
            Self::Instant(i) => i.tags.as_ref(),
        }
    }

    /// Merges `tags` over whatever the event already carries.
    /// `None` and empty maps leave the event untouched.
    pub(crate) fn add_tags(&mut self, tags: Option<Tags>) {
        let Some(tags) = tags.filter(|t| !t.is_empty()) else {
            return;
        };
        let slot = match self {
            Self::Interval(i) => &mut i.tags,
            Self::Instant(i) => &mut i.tags,
        };
        slot.get_or_insert_with(Tags::new).merge(tags);
    }
}
