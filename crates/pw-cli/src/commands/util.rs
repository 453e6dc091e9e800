//! Shared utilities for CLI commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use pw_core::{Scalar, Tags};

use crate::Config;

/// Output flags shared by every recording command.
#[derive(Debug, Default, Args)]
pub struct OutputArgs {
    /// Pretty-print the JSON records.
    #[arg(long)]
    pub pretty: bool,

    /// Write the records to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl OutputArgs {
    /// Command-line flags win over configuration.
    pub fn resolve<'a>(&'a self, config: &'a Config) -> (bool, Option<&'a Path>) {
        let pretty = self.pretty || config.pretty;
        let output = self.output.as_deref().or(config.output.as_deref());
        (pretty, output)
    }
}

/// Parse a `key=value` tag argument.
///
/// The value is typed with [`Scalar::infer`].
pub fn parse_tag(arg: &str) -> Result<(String, Scalar)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("Invalid tag: {arg}. Use key=value (e.g., env=prod)");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid tag: {arg}. Tag key cannot be empty");
    }
    Ok((key.to_string(), Scalar::infer(value)))
}

/// Parse every `key=value` argument into one tag map.
pub fn parse_tags(args: &[String]) -> Result<Tags> {
    args.iter()
        .map(|arg| parse_tag(arg))
        .collect::<Result<Vec<_>>>()
        .map(Tags::from_iter)
}

/// Write `json` to `output` if given, otherwise to `writer`.
pub fn emit<W: Write>(writer: &mut W, json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = json.len(), "records written");
        }
        None => writeln!(writer, "{json}")?,
    }
    Ok(())
}
