//! Waveform dumps produced by simulation testbenches.
//!
//! Parses Value Change Dump files into per-signal change lists, renders them
//! as text or JSON, and rewrites a dump down to a chosen set of signals so it
//! opens quickly in GTKWave.

mod error;
mod format;
mod parser;

pub use error::{VcdError, VcdResult};
pub use format::{format_json, format_text, write_filtered};
pub use parser::{Signal, ValueChange, VcdFile, DEFAULT_TIMESCALE};
