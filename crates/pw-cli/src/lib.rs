//! Command-line front end for the timing recorder.
//!
//! `pw run` times a child process; `pw replay` drives the recorder from a
//! script. Both print the recorded document as JSON.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
