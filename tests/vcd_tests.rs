//! VCD parsing, rendering and filtering against a small counter dump.

mod common;

use assert_json_diff::assert_json_eq;
use common::SAMPLE_VCD;
use fpga_testkit::vcd::{format_json, format_text, write_filtered, VcdError, VcdFile};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn test_text_listing() {
    let vcd = VcdFile::parse(SAMPLE_VCD).unwrap();
    let expected = "Timescale: 1ns

Signal: clk
  0ns: 0
  5ns: 1
  10ns: 0
  15ns: 1

Signal: count
  0ns: 0000
  10ns: 0001

Signal: rst
  0ns: 1
  10ns: 0
";
    assert_eq!(format_text(&vcd), expected);
}

#[test]
fn test_json_listing() {
    let vcd = VcdFile::parse(SAMPLE_VCD).unwrap();
    let value: serde_json::Value = serde_json::from_str(&format_json(&vcd).unwrap()).unwrap();
    assert_json_eq!(
        value,
        json!({
            "timescale": "1ns",
            "signals": {
                "clk": [
                    {"time": 0, "value": "0"},
                    {"time": 5, "value": "1"},
                    {"time": 10, "value": "0"},
                    {"time": 15, "value": "1"}
                ],
                "count": [
                    {"time": 0, "value": "0000"},
                    {"time": 10, "value": "0001"}
                ],
                "rst": [
                    {"time": 0, "value": "1"},
                    {"time": 10, "value": "0"}
                ]
            }
        })
    );
}

#[test]
fn test_filter_then_rewrite() {
    let mut vcd = VcdFile::parse(SAMPLE_VCD).unwrap();
    vcd.filter_signals(&["clk", "not_a_signal"]);
    assert_eq!(vcd.signal_names(), vec!["clk"]);

    let mut out = Vec::new();
    write_filtered(SAMPLE_VCD, &vcd.symbols(), &mut out).unwrap();
    let filtered = String::from_utf8(out).unwrap();

    assert!(filtered.contains("$var wire 1 ! clk $end"));
    assert!(!filtered.contains(" count "));
    assert!(!filtered.contains("# rst"));
    assert!(!filtered.contains("1#"));
    assert!(!filtered.contains("b0001"));
    assert!(filtered.contains("#10\n0!\n"));

    // The rewritten dump parses to the same single signal.
    let reparsed = VcdFile::parse(&filtered).unwrap();
    assert_eq!(reparsed.signal_names(), vec!["clk"]);
    assert_eq!(reparsed.signal_values("clk").len(), 4);
}

#[test]
fn test_open_reports_missing_file() {
    let err = VcdFile::open("/no/such/dump.vcd").unwrap_err();
    assert!(matches!(err, VcdError::NotFound(_)));
    assert_eq!(err.to_string(), "File not found: /no/such/dump.vcd");
}

#[test]
fn test_open_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "tb_counter.vcd", SAMPLE_VCD);
    let vcd = VcdFile::open(dir.path().join("tb_counter.vcd")).unwrap();
    assert_eq!(vcd.signal_values("count").len(), 2);
}

fn clock_dump(toggles: &[u64]) -> String {
    let mut text = String::from("$timescale 1ps $end\n$var wire 1 ! clk $end\n$enddefinitions $end\n");
    for (i, time) in toggles.iter().enumerate() {
        text.push_str(&format!("#{}\n{}!\n", time, i % 2));
    }
    text
}

proptest! {
    #[test]
    fn prop_every_change_is_kept_in_order(mut toggles in prop::collection::vec(0u64..1_000_000, 0..64)) {
        toggles.sort_unstable();
        let vcd = VcdFile::parse(&clock_dump(&toggles)).unwrap();

        let times: Vec<u64> = vcd.signal_values("clk").iter().map(|c| c.time).collect();
        prop_assert_eq!(times, toggles);
        prop_assert_eq!(vcd.timescale.as_str(), "1ps");
    }

    #[test]
    fn prop_parser_never_panics(text in "[#$a-z01xzb !\"\n ]{0,200}") {
        let _ = VcdFile::parse(&text);
    }
}
