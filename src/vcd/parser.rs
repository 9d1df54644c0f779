//! Value Change Dump reader.

use super::error::{VcdError, VcdResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Default timescale when the header does not declare one.
pub const DEFAULT_TIMESCALE: &str = "1ns";

/// A declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Identifier code used in the value-change section.
    pub symbol: String,
    /// Reference name with any bit range removed.
    pub name: String,
    pub width: u32,
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange {
    pub time: u64,
    /// Raw value text: a single `0 1 x z` character for scalars, the bit
    /// string without its `b` prefix for vectors.
    pub value: String,
}

/// A parsed dump.
#[derive(Debug, Clone)]
pub struct VcdFile {
    pub timescale: String,
    signals: Vec<Signal>,
    by_symbol: HashMap<String, usize>,
    values: BTreeMap<String, Vec<ValueChange>>,
}

impl Default for VcdFile {
    fn default() -> Self {
        Self {
            timescale: DEFAULT_TIMESCALE.to_string(),
            signals: Vec::new(),
            by_symbol: HashMap::new(),
            values: BTreeMap::new(),
        }
    }
}

enum Section {
    Definitions,
    Timescale,
    Changes,
}

impl VcdFile {
    /// Read and parse a dump from disk.
    pub fn open(path: impl AsRef<Path>) -> VcdResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                VcdError::NotFound(path.to_path_buf())
            } else {
                VcdError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&text)
    }

    /// Parse dump text.
    pub fn parse(text: &str) -> VcdResult<Self> {
        let mut vcd = VcdFile::default();
        let mut section = Section::Definitions;
        let mut current_time: u64 = 0;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match section {
                Section::Definitions => {
                    if let Some(rest) = line.strip_prefix("$timescale") {
                        match rest.split_whitespace().next() {
                            Some(token) if token != "$end" => vcd.timescale = token.to_string(),
                            _ => section = Section::Timescale,
                        }
                    } else if line.starts_with("$var") {
                        vcd.declare(line, line_no)?;
                    } else if line == "$enddefinitions $end" {
                        debug!(signals = vcd.signals.len(), "header parsed");
                        section = Section::Changes;
                    }
                }
                Section::Timescale => {
                    // `$timescale` on its own line, the unit follows.
                    if line != "$end" {
                        vcd.timescale = line
                            .split_whitespace()
                            .filter(|t| *t != "$end")
                            .collect::<Vec<_>>()
                            .join("");
                    }
                    section = Section::Definitions;
                }
                Section::Changes => {
                    if let Some(stamp) = line.strip_prefix('#') {
                        current_time =
                            stamp
                                .trim()
                                .parse()
                                .map_err(|_| VcdError::InvalidTimestamp {
                                    line: line_no,
                                    text: line.to_string(),
                                })?;
                    } else if let Some((value, symbol)) = scalar_change(line) {
                        vcd.record(symbol, current_time, value);
                    } else if let Some((value, symbol)) = vector_change(line) {
                        vcd.record(symbol, current_time, value);
                    }
                }
            }
        }

        Ok(vcd)
    }

    fn declare(&mut self, line: &str, line_no: usize) -> VcdResult<()> {
        // $var type width symbol name [range] $end
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            warn!(line = line_no, "ignoring truncated $var declaration");
            return Ok(());
        }

        let width = parts[2].parse().map_err(|_| VcdError::InvalidWidth {
            line: line_no,
            text: parts[2].to_string(),
        })?;
        let symbol = parts[3].to_string();
        let name = match parts[4].split_once('[') {
            Some((base, _)) => base.to_string(),
            None => parts[4].to_string(),
        };

        let signal = Signal {
            symbol: symbol.clone(),
            name,
            width,
        };
        match self.by_symbol.get(&symbol) {
            Some(&index) => self.signals[index] = signal,
            None => {
                self.by_symbol.insert(symbol, self.signals.len());
                self.signals.push(signal);
            }
        }
        Ok(())
    }

    fn record(&mut self, symbol: &str, time: u64, value: &str) {
        if let Some(&index) = self.by_symbol.get(symbol) {
            let name = self.signals[index].name.clone();
            self.values.entry(name).or_default().push(ValueChange {
                time,
                value: value.to_string(),
            });
        }
    }

    /// All declared signals, in declaration order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Names of all declared signals, in declaration order.
    pub fn signal_names(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.name.as_str()).collect()
    }

    /// Distinct signal names in sorted order.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names = self.signal_names();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Value changes of one signal, in file order. Unknown names yield an
    /// empty slice.
    pub fn signal_values(&self, name: &str) -> &[ValueChange] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols still declared, used when rewriting the dump.
    pub fn symbols(&self) -> HashSet<&str> {
        self.signals.iter().map(|s| s.symbol.as_str()).collect()
    }

    /// Keep only the named signals. Names that are not declared are dropped.
    pub fn filter_signals<S: AsRef<str>>(&mut self, keep: &[S]) {
        let wanted: HashSet<&str> = keep.iter().map(|s| s.as_ref()).collect();
        for name in &wanted {
            if !self.signals.iter().any(|s| s.name == *name) {
                warn!(signal = %name, "requested signal not found in dump");
            }
        }

        self.signals.retain(|s| wanted.contains(s.name.as_str()));
        self.by_symbol = self
            .signals
            .iter()
            .enumerate()
            .map(|(i, s)| (s.symbol.clone(), i))
            .collect();
        self.values.retain(|name, _| wanted.contains(name.as_str()));
    }
}

/// `<value><symbol>` with a one-character value.
pub(crate) fn scalar_change(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    if !matches!(first, '0' | '1' | 'x' | 'z' | 'X' | 'Z') {
        return None;
    }
    Some(line.split_at(1))
}

/// `b<bits> <symbol>`.
pub(crate) fn vector_change(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('b')?;
    let mut parts = rest.split_whitespace();
    let value = parts.next()?;
    let symbol = parts.next()?;
    Some((value, symbol))
}
