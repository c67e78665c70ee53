//! Data checks: line schemas on raw data and expectation suites on curated data

pub mod expectations;
pub mod json_lines;

pub use expectations::{
    validate_curated_flat_structure, Expectation, ExpectationResult, ExpectationSuite,
    ValidationReport, VALIDATION_RESULTS_FOLDER,
};
pub use json_lines::{
    check_json_lines, float_value, quarantine_table, BrokenContent, BrokenLine, CheckSummary, CheckedLines,
};
