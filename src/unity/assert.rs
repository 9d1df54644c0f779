//! Assertions in the style of Unity's `TEST_ASSERT_*` macros.
//!
//! Each returns a [`TestResult`] so tests chain them with `?`. A failure
//! carries the caller's line number and Unity's message text.

use std::fmt::Display;
use std::panic::Location;

/// Why a test stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    Fail { line: u32, message: String },
    Ignore { line: u32, message: Option<String> },
}

impl Abort {
    #[track_caller]
    fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            line: Location::caller().line(),
            message: message.into(),
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Self::Fail { line, .. } | Self::Ignore { line, .. } => *line,
        }
    }
}

pub type TestResult = Result<(), Abort>;

/// `TEST_ASSERT_EQUAL`
#[track_caller]
pub fn assert_equal<T: PartialEq + Display>(expected: T, actual: T) -> TestResult {
    if expected == actual {
        Ok(())
    } else {
        Err(Abort::fail(format!("Expected {} Was {}", expected, actual)))
    }
}

/// `TEST_ASSERT_GREATER_THAN`: passes when `actual > threshold`.
#[track_caller]
pub fn assert_greater_than<T: PartialOrd + Display>(threshold: T, actual: T) -> TestResult {
    if actual > threshold {
        Ok(())
    } else {
        Err(Abort::fail(format!(
            "Expected greater than {} Was {}",
            threshold, actual
        )))
    }
}

/// `TEST_ASSERT_LESS_THAN`: passes when `actual < threshold`.
#[track_caller]
pub fn assert_less_than<T: PartialOrd + Display>(threshold: T, actual: T) -> TestResult {
    if actual < threshold {
        Ok(())
    } else {
        Err(Abort::fail(format!(
            "Expected less than {} Was {}",
            threshold, actual
        )))
    }
}

/// `TEST_ASSERT_TRUE`
#[track_caller]
pub fn assert_true(condition: bool) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Abort::fail("Expected TRUE Was FALSE"))
    }
}

/// `TEST_ASSERT_EQUAL_HEX8`
#[track_caller]
pub fn assert_equal_hex8(expected: u8, actual: u8) -> TestResult {
    if expected == actual {
        Ok(())
    } else {
        Err(Abort::fail(format!(
            "Expected 0x{:02X} Was 0x{:02X}",
            expected, actual
        )))
    }
}

/// `TEST_ASSERT_EQUAL_HEX8_ARRAY`: compares the first `len` bytes.
#[track_caller]
pub fn assert_equal_hex8_array(expected: &[u8], actual: &[u8], len: usize) -> TestResult {
    if len == 0 {
        return Err(Abort::fail(
            "You asked me to compare nothing, which was pointless.",
        ));
    }
    if expected.len() < len || actual.len() < len {
        return Err(Abort::fail(format!(
            "Expected {} elements Was {}",
            len,
            expected.len().min(actual.len())
        )));
    }

    match expected[..len]
        .iter()
        .zip(&actual[..len])
        .position(|(e, a)| e != a)
    {
        None => Ok(()),
        Some(i) => Err(Abort::fail(format!(
            "Element {} Expected 0x{:02X} Was 0x{:02X}",
            i, expected[i], actual[i]
        ))),
    }
}

/// `TEST_FAIL_MESSAGE`
#[track_caller]
pub fn fail(message: impl Into<String>) -> TestResult {
    Err(Abort::fail(message))
}

/// `TEST_IGNORE` / `TEST_IGNORE_MESSAGE`
#[track_caller]
pub fn ignore(message: Option<&str>) -> TestResult {
    Err(Abort::Ignore {
        line: Location::caller().line(),
        message: message.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: TestResult) -> String {
        match result {
            Err(Abort::Fail { message, .. }) => message,
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn test_passing_assertions() {
        assert!(assert_equal(42, 42).is_ok());
        assert!(assert_greater_than(90_000u32, 100_000).is_ok());
        assert!(assert_less_than(110_000u32, 100_000).is_ok());
        assert!(assert_true(true).is_ok());
        assert!(assert_equal_hex8(0xAA, 0xAA).is_ok());
        assert!(assert_equal_hex8_array(&[1, 2, 3, 4], &[1, 2, 3, 4], 4).is_ok());
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(message(assert_equal(42, 43)), "Expected 42 Was 43");
        assert_eq!(
            message(assert_greater_than(90_000u32, 85_000)),
            "Expected greater than 90000 Was 85000"
        );
        assert_eq!(
            message(assert_less_than(110_000u32, 120_000)),
            "Expected less than 110000 Was 120000"
        );
        assert_eq!(message(assert_true(false)), "Expected TRUE Was FALSE");
        assert_eq!(message(assert_equal_hex8(0xAA, 0xAB)), "Expected 0xAA Was 0xAB");
        assert_eq!(
            message(assert_equal_hex8_array(&[1, 2, 3, 4], &[1, 2, 5, 4], 4)),
            "Element 2 Expected 0x03 Was 0x05"
        );
        assert_eq!(
            message(assert_equal_hex8_array(&[], &[], 0)),
            "You asked me to compare nothing, which was pointless."
        );
    }

    #[test]
    fn test_bounds_are_strict() {
        assert!(assert_greater_than(90_000u32, 90_000).is_err());
        assert!(assert_less_than(110_000u32, 110_000).is_err());
    }

    #[test]
    fn test_array_only_compares_prefix() {
        assert!(assert_equal_hex8_array(&[1, 2, 9], &[1, 2, 7], 2).is_ok());
        assert!(assert_equal_hex8_array(&[1, 2], &[1, 2], 3).is_err());
    }

    #[test]
    fn test_failure_records_caller_line() {
        let expected_line = line!() + 1;
        let result = assert_equal(1, 2);
        assert_eq!(result.unwrap_err().line(), expected_line);
    }

    #[test]
    fn test_ignore() {
        let expected_line = line!() + 1;
        let result = ignore(Some("needs a scope"));
        assert_eq!(
            result,
            Err(Abort::Ignore {
                line: expected_line,
                message: Some("needs a scope".to_string())
            })
        );
    }
}
