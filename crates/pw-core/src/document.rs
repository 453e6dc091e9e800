//! The recorded document: process metadata, global tags and event groups.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::event::Event;
use crate::types::Tags;

/// Document keys that cannot be used as group names.
pub const RESERVED_KEYS: [&str; 2] = ["init", "tags"];

/// Process-level metadata written by `init` and `finalize`.
///
/// Fields are omitted from the output until they are set, so a document
/// finalized without `init` only carries the end side.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct InitMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_memory: Option<u64>,
    /// Spelled this way in the output format consumers already parse.
    #[serde(rename = "readble_end_time", skip_serializing_if = "Option::is_none")]
    pub readable_end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<u64>,
}

/// Position of an event inside a [`Document`].
///
/// Events are only ever appended, so a position stays valid until the
/// document is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EventRef {
    group: usize,
    index: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Group {
    name: String,
    events: Vec<Event>,
}

/// Everything recorded so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    init: Option<InitMetadata>,
    tags: Option<Tags>,
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Document {
    pub const fn init(&self) -> Option<&InitMetadata> {
        self.init.as_ref()
    }

    pub const fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    /// Events recorded under `name`, in recording order.
    pub fn group(&self, name: &str) -> Option<&[Event]> {
        self.index
            .get(name)
            .map(|&i| self.groups[i].events.as_slice())
    }

    /// All groups in the order they were first used.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Event])> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.events.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.init.is_none() && self.tags.is_none() && self.groups.is_empty()
    }

    pub(crate) fn init_mut(&mut self) -> &mut InitMetadata {
        self.init.get_or_insert_with(InitMetadata::default)
    }

    pub(crate) fn set_init(&mut self, init: InitMetadata) {
        self.init = Some(init);
    }

    pub(crate) fn tags_mut(&mut self) -> &mut Tags {
        self.tags.get_or_insert_with(Tags::new)
    }

    pub(crate) fn append(&mut self, group: &str, event: Event) -> EventRef {
        let slot = match self.index.get(group) {
            Some(&slot) => slot,
            None => {
                self.groups.push(Group {
                    name: group.to_string(),
                    events: Vec::new(),
                });
                let slot = self.groups.len() - 1;
                self.index.insert(group.to_string(), slot);
                slot
            }
        };
        let events = &mut self.groups[slot].events;
        events.push(event);
        EventRef {
            group: slot,
            index: events.len() - 1,
        }
    }

    pub(crate) fn get_mut(&mut self, at: EventRef) -> Option<&mut Event> {
        self.groups.get_mut(at.group)?.events.get_mut(at.index)
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = usize::from(self.init.is_some())
            + usize::from(self.tags.is_some())
            + self.groups.len();
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(init) = &self.init {
            map.serialize_entry("init", init)?;
        }
        if let Some(tags) = &self.tags {
            map.serialize_entry("tags", tags)?;
        }
        for group in &self.groups {
            map.serialize_entry(&group.name, &group.events)?;
        }
        map.end()
    }
}
