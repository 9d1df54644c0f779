//! Renderings of a parsed dump.

use super::error::VcdResult;
use super::parser::{scalar_change, vector_change, VcdFile};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

/// Human-readable listing of every signal that changed.
pub fn format_text(vcd: &VcdFile) -> String {
    let unit = match vcd.timescale.as_str() {
        "1ps" => "ps",
        "1ns" => "ns",
        "1us" => "us",
        _ => "",
    };

    let mut output = vec![format!("Timescale: {}", vcd.timescale), String::new()];

    for name in vcd.sorted_names() {
        let values = vcd.signal_values(name);
        if values.is_empty() {
            continue;
        }

        output.push(format!("Signal: {}", name));
        for change in values {
            output.push(format!("  {}{}: {}", change.time, unit, change.value));
        }
        output.push(String::new());
    }

    output.join("\n")
}

#[derive(Serialize)]
struct JsonChange<'a> {
    time: u64,
    value: &'a str,
}

#[derive(Serialize)]
struct JsonDump<'a> {
    timescale: &'a str,
    signals: BTreeMap<&'a str, Vec<JsonChange<'a>>>,
}

/// Machine-readable dump: `{"timescale": .., "signals": {name: [{time, value}]}}`.
pub fn format_json(vcd: &VcdFile) -> VcdResult<String> {
    let signals = vcd
        .sorted_names()
        .into_iter()
        .map(|name| {
            let changes = vcd
                .signal_values(name)
                .iter()
                .map(|c| JsonChange {
                    time: c.time,
                    value: &c.value,
                })
                .collect();
            (name, changes)
        })
        .collect();

    let dump = JsonDump {
        timescale: &vcd.timescale,
        signals,
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}

/// Re-emit `source` keeping only the variables whose symbol is in `keep`.
///
/// Header lines pass through untouched apart from dropped `$var`
/// declarations. In the change section timestamps always pass, changes pass
/// only for kept symbols, and blank lines are dropped. Line endings of the
/// source are preserved.
pub fn write_filtered<W: Write>(source: &str, keep: &HashSet<&str>, out: &mut W) -> VcdResult<()> {
    let mut in_definitions = true;

    for line in source.split_inclusive('\n') {
        let stripped = line.trim();

        if in_definitions {
            let keep_line = if stripped.starts_with("$var") {
                let parts: Vec<&str> = stripped.split_whitespace().collect();
                parts.len() >= 4 && keep.contains(parts[3])
            } else {
                true
            };
            if keep_line {
                out.write_all(line.as_bytes())?;
            }
            if stripped == "$enddefinitions $end" {
                in_definitions = false;
            }
            continue;
        }

        if stripped.is_empty() {
            continue;
        }

        let keep_line = if stripped.starts_with('#') {
            true
        } else if let Some((_, symbol)) = scalar_change(stripped) {
            !symbol.is_empty() && keep.contains(symbol)
        } else if stripped.starts_with('b') {
            vector_change(stripped).is_some_and(|(_, symbol)| keep.contains(symbol))
        } else {
            true
        };

        if keep_line {
            out.write_all(line.as_bytes())?;
        }
    }

    out.flush()?;
    Ok(())
}
