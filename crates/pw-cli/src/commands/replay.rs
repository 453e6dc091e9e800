//! Replay command: apply a JSON-lines script of recorder operations.
//!
//! Each non-blank line is one operation, for example:
//!
//! ```text
//! {"op":"init"}
//! {"op":"start","group":"db","key":"users","tags":{"rows":3}}
//! {"op":"sleep","ms":20}
//! {"op":"stop","group":"db","key":"users"}
//! {"op":"finalize"}
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use pw_core::{Clock, MemoryProbe, TagValue, Tags, Watch};

use super::util::{OutputArgs, emit};
use crate::Config;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script file, one JSON operation per line.
    pub script: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// One recorder operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Init,
    Finalize,
    Reset,
    Tag {
        key: String,
        value: TagValue,
    },
    TagAppend {
        key: String,
        value: TagValue,
    },
    Start {
        group: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        tags: Option<Tags>,
    },
    Stop {
        group: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        tags: Option<Tags>,
    },
    Loop {
        group: String,
        #[serde(default)]
        tags: Option<Tags>,
    },
    EndLoop {
        group: String,
    },
    Detect {
        group: String,
        #[serde(default)]
        tags: Option<Tags>,
    },
    /// Let time pass between operations.
    Sleep {
        ms: u64,
    },
}

pub fn run<W: Write>(writer: &mut W, args: &ReplayArgs, config: &Config) -> Result<()> {
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read {}", args.script.display()))?;
    let ops = parse_script(&text)?;
    tracing::debug!(ops = ops.len(), "loaded script");

    let mut watch = Watch::with_options(config.watch_options());
    apply(&mut watch, ops, std::thread::sleep);
    for (group, events) in watch.records().groups() {
        tracing::debug!(group, events = events.len(), "replayed group");
    }

    let (pretty, output) = args.output.resolve(config);
    emit(writer, &watch.serialize(pretty)?, output)
}

/// Parses a script, skipping blank lines.
pub fn parse_script(text: &str) -> Result<Vec<Op>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid operation on line {}", i + 1))
        })
        .collect()
}

/// Applies `ops` in order. `pause` is called for every `sleep`.
pub fn apply<C: Clock, M: MemoryProbe>(
    watch: &mut Watch<C, M>,
    ops: impl IntoIterator<Item = Op>,
    mut pause: impl FnMut(Duration),
) {
    for op in ops {
        match op {
            Op::Init => watch.init(),
            Op::Finalize => watch.finalize(),
            Op::Reset => watch.reset(),
            Op::Tag { key, value } => watch.tag(&key, value),
            Op::TagAppend { key, value } => watch.tag_append(&key, value),
            Op::Start { group, key, tags } => watch.start(&group, key.as_deref(), tags),
            Op::Stop { group, key, tags } => watch.stop(&group, key.as_deref(), tags),
            Op::Loop { group, tags } => watch.r#loop(&group, tags),
            Op::EndLoop { group } => watch.end_loop(&group),
            Op::Detect { group, tags } => watch.detect(&group, tags),
            Op::Sleep { ms } => pause(Duration::from_millis(ms)),
        }
    }
}
