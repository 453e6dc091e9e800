//! The recorder.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{self, Clock, SystemClock};
use crate::document::{Document, EventRef, InitMetadata, RESERVED_KEYS};
use crate::event::{Event, Instant, Interval, Stamp};
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::types::{TagValue, Tags};

/// Errors produced while rendering a document.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to serialize records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recorder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Decimal places kept on every recorded time.
    pub precision: i32,
    /// Render readable timestamps in local time instead of UTC.
    pub local_time: bool,
    /// Version string written to `init.version`.
    pub version: String,
}

impl WatchOptions {
    /// Precisions a microsecond-resolution unix time can carry.
    pub const PRECISION_RANGE: RangeInclusive<i32> = 0..=15;
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            precision: 4,
            local_time: false,
            version: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Records named, optionally keyed and tagged timing events.
///
/// Start/stop pairs are matched by `(group, key)`, falling back to the group
/// name when no key is given. Only the most recent `start` for a pair can be
/// stopped; an earlier one stays open in the output forever.
///
/// A `Watch` is plain mutable state. Share it across threads through
/// [`crate::SharedWatch`] or keep one per task.
#[derive(Debug)]
pub struct Watch<C = SystemClock, M = ProcessMemory> {
    clock: C,
    memory: M,
    options: WatchOptions,
    document: Document,
    open: HashMap<(String, String), EventRef>,
    loops: HashMap<String, EventRef>,
    epoch: Option<f64>,
}

impl Watch {
    /// A recorder on the system clock and this process's memory.
    pub fn new() -> Self {
        Self::with_options(WatchOptions::default())
    }

    pub fn with_options(options: WatchOptions) -> Self {
        Self::with_sources(SystemClock, ProcessMemory::new(), options)
    }
}

impl Default for Watch {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, M: MemoryProbe> Watch<C, M> {
    pub fn with_sources(clock: C, memory: M, options: WatchOptions) -> Self {
        Self {
            clock,
            memory,
            options,
            document: Document::default(),
            open: HashMap::new(),
            loops: HashMap::new(),
            epoch: None,
        }
    }

    /// Time base for relative fields, set by [`Watch::init`].
    pub const fn epoch(&self) -> Option<f64> {
        self.epoch
    }

    /// Current unix time in seconds, rounded to `round_digits` places.
    ///
    /// With a non-zero `since`, returns the seconds elapsed since it instead.
    pub fn get_time(&self, round_digits: i32, since: Option<f64>) -> f64 {
        let now = clock::unix_seconds(self.clock.now());
        match since {
            Some(since) if since != 0.0 => clock::round_to(now - since, round_digits),
            _ => clock::round_to(now, round_digits),
        }
    }

    /// Seconds since [`Watch::init`], or absolute unix time before it.
    pub fn get_runtime(&self, round_digits: i32) -> f64 {
        self.get_time(round_digits, self.epoch)
    }

    /// Sets the epoch and records process metadata under `init`.
    ///
    /// Meant to be called once, first thing. Calling it again moves the epoch
    /// and replaces the metadata.
    pub fn init(&mut self) {
        let start = self.now_rounded();
        self.epoch = Some(start);

        let start_memory = self.memory.current();
        self.document.set_init(InitMetadata {
            version: Some(self.options.version.clone()),
            readable_start_time: Some(clock::readable(start, self.options.local_time)),
            start_time: Some(start),
            start_memory: Some(start_memory),
            ..InitMetadata::default()
        });
        tracing::debug!(epoch = start, "watch initialized");
    }

    /// Records end-of-process metadata under `init`.
    pub fn finalize(&mut self) {
        let end = self.now_rounded();
        let end_memory = self.memory.current();
        let max_memory = self.memory.peak();
        let precision = self.options.precision;
        let readable = clock::readable(end, self.options.local_time);

        let init = self.document.init_mut();
        init.readable_end_time = Some(readable);
        init.end_time = Some(end);
        if let Some(start) = init.start_time {
            init.run_time = Some(clock::round_to(end - start, precision));
        }
        init.end_memory = Some(end_memory);
        init.max_memory = Some(max_memory);

        if !self.open.is_empty() || !self.loops.is_empty() {
            tracing::debug!(
                open = self.open.len(),
                loops = self.loops.len(),
                "finalized with unterminated events"
            );
        }
    }

    /// Drops everything: records, open events, loops and the epoch.
    pub fn reset(&mut self) {
        self.document = Document::default();
        self.open.clear();
        self.loops.clear();
        self.epoch = None;
        tracing::debug!("watch reset");
    }

    /// Sets a document-level tag, replacing any previous value.
    pub fn tag(&mut self, key: &str, value: impl Into<TagValue>) {
        self.document.tags_mut().insert(key, value);
    }

    /// Appends to a document-level tag.
    ///
    /// A scalar appends one value and a list appends each of its elements.
    /// The stored value always ends up a list.
    pub fn tag_append(&mut self, key: &str, values: impl Into<TagValue>) {
        let values = values.into().into_scalars();
        let tags = self.document.tags_mut();
        match tags.entry_mut(key) {
            Some(existing) => existing.extend(values),
            None => tags.insert(key, TagValue::List(values)),
        }
    }

    /// Opens a new event in `group`.
    ///
    /// Always appends. If `(group, key)` already had an open event, that one
    /// can no longer be stopped.
    pub fn start(&mut self, group: &str, key: Option<&str>, tags: Option<Tags>) {
        if is_reserved(group) {
            return;
        }
        let key = non_empty(key);
        let mut event = Event::Interval(Interval::started(key.map(str::to_string), self.stamp()));
        event.add_tags(tags);

        let at = self.document.append(group, event);
        let slot = (group.to_string(), key.unwrap_or(group).to_string());
        if self.open.insert(slot, at).is_some() {
            tracing::trace!(group, ?key, "replaced open event");
        }
    }

    /// Closes the open event for `(group, key)`.
    ///
    /// Without a matching open event, appends an event carrying only the
    /// end side. Its `key` is the caller's key, or the group name when the
    /// caller passed an empty key. Tags merge into whichever event was touched.
    pub fn stop(&mut self, group: &str, key: Option<&str>, tags: Option<Tags>) {
        if is_reserved(group) {
            return;
        }
        let explicit_key = key.map(|k| if k.is_empty() { group } else { k });
        let key = non_empty(key);
        let slot = (group.to_string(), key.unwrap_or(group).to_string());
        let stamp = self.stamp();
        let precision = self.options.precision;

        let open = self
            .open
            .remove(&slot)
            .and_then(|at| self.document.get_mut(at));
        match open {
            Some(event) => {
                if let Event::Interval(interval) = &mut *event {
                    interval.finish(stamp, precision);
                }
                event.add_tags(tags);
            }
            None => {
                tracing::debug!(group, ?key, "stop without matching start");
                let mut event = Event::Interval(Interval::stopped_only(
                    explicit_key.map(str::to_string),
                    stamp,
                ));
                event.add_tags(tags);
                self.document.append(group, event);
            }
        }
    }

    /// Closes the group's current iteration, if any, and opens the next one.
    pub fn r#loop(&mut self, group: &str, tags: Option<Tags>) {
        if is_reserved(group) {
            return;
        }
        self.end_loop(group);

        let mut event = Event::Interval(Interval::started(None, self.stamp()));
        event.add_tags(tags);
        let at = self.document.append(group, event);
        self.loops.insert(group.to_string(), at);
    }

    /// Closes the group's current iteration. Does nothing if none is open.
    pub fn end_loop(&mut self, group: &str) {
        let Some(at) = self.loops.remove(group) else {
            return;
        };
        let stamp = self.stamp();
        let precision = self.options.precision;
        if let Some(Event::Interval(interval)) = self.document.get_mut(at) {
            interval.finish(stamp, precision);
        }
    }

    /// Records a single instant in `group`.
    pub fn detect(&mut self, group: &str, tags: Option<Tags>) {
        if is_reserved(group) {
            return;
        }
        let mut event = Event::Instant(Instant::at(self.stamp()));
        event.add_tags(tags);
        self.document.append(group, event);
    }

    /// Read-only view of everything recorded so far.
    pub const fn records(&self) -> &Document {
        &self.document
    }

    /// Renders the records as JSON, indented when `pretty` is set.
    pub fn serialize(&self, pretty: bool) -> Result<String, WatchError> {
        let json = if pretty {
            serde_json::to_string_pretty(&self.document)?
        } else {
            serde_json::to_string(&self.document)?
        };
        Ok(json)
    }

    fn now_rounded(&self) -> f64 {
        clock::round_to(clock::unix_seconds(self.clock.now()), self.options.precision)
    }

    /// Readable text is rendered from the rounded unix time.
    fn stamp(&self) -> Stamp {
        let unix = self.now_rounded();
        Stamp {
            readable: clock::readable(unix, self.options.local_time),
            unix,
            relative: self
                .epoch
                .map(|epoch| clock::round_to(unix - epoch, self.options.precision)),
        }
    }
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.is_empty())
}

fn is_reserved(group: &str) -> bool {
    let reserved = RESERVED_KEYS.contains(&group);
    if reserved {
        tracing::warn!(group, "group name is reserved, event ignored");
    }
    reserved
}
