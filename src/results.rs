//! Test records shared by the runners and the report generator.
//!
//! Suite results are stored as JSON:
//!
//! ```json
//! {
//!   "suite": "simulation",
//!   "run_id": "6f0c…",
//!   "started_at": "2026-10-18T09:12:44+02:00",
//!   "tests": [
//!     { "name": "tb_uart.v", "passed": true, "duration": 0.412 }
//!   ]
//! }
//! ```
//!
//! Only `tests` is interpreted. Any other top-level field is carried through
//! untouched so results produced by other tools keep their metadata. A loaded
//! file also keeps its JSON exactly as read; that is what reports embed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed results in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// `null` reads as absent.
fn name_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_name))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Outcome of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default = "unknown_name", deserialize_with = "name_or_unknown")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: bool,
    /// Seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Ignored tests count as passed, like Unity does.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "is_false"
    )]
    pub skipped: bool,
}

impl TestRecord {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            duration: 0.0,
            error: None,
            skipped: false,
        }
    }

    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            duration: 0.0,
            error: Some(error.into()),
            skipped: false,
        }
    }

    pub fn skip(name: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            duration: 0.0,
            error: reason,
            skipped: true,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }
}

/// Results of one suite run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<TestRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The document as loaded; dropped once the records change.
    #[serde(skip)]
    raw: Option<Value>,
}

impl PartialEq for SuiteResults {
    fn eq(&self, other: &Self) -> bool {
        self.tests == other.tests && self.extra == other.extra
    }
}

impl SuiteResults {
    /// Start a new run of `suite`, stamped with a run id and start time.
    pub fn new(suite: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("suite".to_string(), Value::from(suite));
        extra.insert(
            "run_id".to_string(),
            Value::from(uuid::Uuid::new_v4().to_string()),
        );
        extra.insert(
            "started_at".to_string(),
            Value::from(chrono::Local::now().to_rfc3339()),
        );
        Self {
            tests: Some(Vec::new()),
            extra,
            raw: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ResultsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |source: serde_json::Error| ResultsError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let raw: Value = serde_json::from_str(&text).map_err(parse_error)?;
        let mut results: Self = serde_json::from_value(raw.clone()).map_err(parse_error)?;
        results.raw = Some(raw);
        Ok(results)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ResultsError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ResultsError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ResultsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn push(&mut self, record: TestRecord) {
        self.raw = None;
        self.tests.get_or_insert_with(Vec::new).push(record);
    }

    pub fn records(&self) -> &[TestRecord] {
        self.tests.as_deref().unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.records().len()
    }

    pub fn passed(&self) -> usize {
        self.records().iter().filter(|t| t.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Nothing was loaded: neither tests nor metadata.
    pub fn is_empty(&self) -> bool {
        self.tests.is_none() && self.extra.is_empty()
    }

    /// The loaded document unchanged, or the records serialized.
    pub fn to_value(&self) -> Value {
        match self.raw {
            Some(ref raw) => raw.clone(),
            None => serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new())),
        }
    }
}

/// The closing `<n> Tests <f> Failures <i> Ignored` line of a Unity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitySummary {
    pub tests: u32,
    pub failures: u32,
    pub ignored: u32,
}

impl UnitySummary {
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// One interpreted line of runner output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Record(TestRecord),
    Summary(UnitySummary),
    /// Unity's trailing `OK` / `FAIL`.
    Verdict(bool),
}

static UNITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<file>[^:\s][^:]*):(?P<line>\d+):(?P<name>[A-Za-z_]\w*):(?P<status>PASS|FAIL|IGNORE)(?::\s?(?P<msg>.*))?$",
    )
    .expect("valid regex")
});

static PIO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<file>[^:\s][^:]*):(?P<line>\d+):\s*(?P<name>[A-Za-z_]\w*)(?::\s*(?P<msg>.*?))?\s+\[(?P<status>PASSED|FAILED|SKIPPED|IGNORED)\]$",
    )
    .expect("valid regex")
});

static LIBTEST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^test\s+(?P<name>\S+)\s+\.\.\.\s+(?P<status>ok|FAILED|ignored)\b")
        .expect("valid regex")
});

static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<tests>\d+)\s+Tests\s+(?P<failures>\d+)\s+Failures\s+(?P<ignored>\d+)\s+Ignored")
        .expect("valid regex")
});

fn message(caps: &regex::Captures<'_>) -> Option<String> {
    caps.name("msg")
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Interpret one line of Unity, PlatformIO or libtest-style output.
pub fn parse_line(line: &str) -> Option<OutputLine> {
    let line = line.trim_matches(|c: char| c.is_whitespace() || c.is_control());
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = UNITY_RE.captures(line) {
        let name = caps["name"].to_string();
        let record = match &caps["status"] {
            "PASS" => TestRecord::pass(name),
            "FAIL" => TestRecord::fail(
                name,
                message(&caps).unwrap_or_else(|| "Test failed".to_string()),
            ),
            _ => TestRecord::skip(name, message(&caps)),
        };
        return Some(OutputLine::Record(record));
    }

    if let Some(caps) = PIO_RE.captures(line) {
        let name = caps["name"].to_string();
        let record = match &caps["status"] {
            "PASSED" => TestRecord::pass(name),
            "FAILED" => TestRecord::fail(
                name,
                message(&caps).unwrap_or_else(|| "Test failed".to_string()),
            ),
            _ => TestRecord::skip(name, message(&caps)),
        };
        return Some(OutputLine::Record(record));
    }

    if let Some(caps) = LIBTEST_RE.captures(line) {
        let name = caps["name"].to_string();
        let record = match &caps["status"] {
            "ok" => TestRecord::pass(name),
            "FAILED" => TestRecord::fail(name, "Test failed"),
            _ => TestRecord::skip(name, None),
        };
        return Some(OutputLine::Record(record));
    }

    if let Some(caps) = SUMMARY_RE.captures(line) {
        // The pattern only admits digits; overflow falls back to zero.
        return Some(OutputLine::Summary(UnitySummary {
            tests: caps["tests"].parse().unwrap_or(0),
            failures: caps["failures"].parse().unwrap_or(0),
            ignored: caps["ignored"].parse().unwrap_or(0),
        }));
    }

    match line {
        "OK" => Some(OutputLine::Verdict(true)),
        "FAIL" => Some(OutputLine::Verdict(false)),
        _ => None,
    }
}

/// Records and summary found in a block of runner output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    pub records: Vec<TestRecord>,
    pub summary: Option<UnitySummary>,
    pub verdict: Option<bool>,
}

pub fn parse_output(text: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();
    for line in text.lines() {
        match parse_line(line) {
            Some(OutputLine::Record(record)) => parsed.records.push(record),
            Some(OutputLine::Summary(summary)) => parsed.summary = Some(summary),
            Some(OutputLine::Verdict(ok)) => parsed.verdict = Some(ok),
            None => {}
        }
    }
    parsed
}
