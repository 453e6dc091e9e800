//! Run command: time a child process and print its records.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use clap::Args;

use pw_core::{Clock, MemoryProbe, Tags, Watch};

use super::util::{OutputArgs, emit, parse_tags};
use crate::Config;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Group to record the command under.
    #[arg(short, long, default_value = "command")]
    pub group: String,

    /// Tag the run, as key=value. Repeatable.
    #[arg(short, long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Command to run, after `--`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Runs the command and returns the exit code `pw` should exit with.
pub fn run<W: Write>(writer: &mut W, args: &RunArgs, config: &Config) -> Result<i32> {
    let tags = parse_tags(&args.tags)?;
    let mut watch = Watch::with_options(config.watch_options());

    let code = time_command(&mut watch, &args.group, tags, &args.command, spawn)?;

    let (pretty, output) = args.output.resolve(config);
    emit(writer, &watch.serialize(pretty)?, output)?;

    // Killed by a signal: no code to forward.
    Ok(code.unwrap_or(1))
}

/// Records one execution of `command` as a single event in `group`.
///
/// The event carries the caller's tags plus `command`, and `exit_code` once
/// the child has finished.
pub fn time_command<C: Clock, M: MemoryProbe>(
    watch: &mut Watch<C, M>,
    group: &str,
    tags: Tags,
    command: &[String],
    exec: impl FnOnce(&[String]) -> Result<Option<i32>>,
) -> Result<Option<i32>> {
    watch.init();
    watch.start(group, None, Some(tags.with("command", command.join(" "))));

    let code = exec(command)?;
    tracing::debug!(?code, "command finished");

    let stop_tags = match code {
        Some(code) => Tags::new().with("exit_code", code),
        None => Tags::new().with("signaled", true),
    };
    watch.stop(group, None, Some(stop_tags));
    watch.finalize();
    Ok(code)
}

/// Spawns the child with its stdout on our stderr, keeping stdout for JSON.
fn spawn(command: &[String]) -> Result<Option<i32>> {
    let (program, rest) = command.split_first().context("no command given")?;
    let status = Command::new(program)
        .args(rest)
        .stdout(Stdio::from(std::io::stderr()))
        .status()
        .with_context(|| format!("failed to run {program}"))?;
    Ok(status.code())
}
