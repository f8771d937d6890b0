//! Line-level helpers shared by the TSPLIB problem and tour parsers.

use std::str::FromStr;

use crate::{LkhError, LkhResult};

pub(crate) const EOF_MARKER: &str = "EOF";
pub(crate) const SECTION_END_MARKER: &str = "-1";

/// Splits `KEY : value` or `KEY = value` header lines. Keys are uppercased.
pub(crate) fn split_header(line: &str) -> Option<(String, &str)> {
    line.split_once(':')
        .or_else(|| line.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim()))
}

/// Parses a header value, naming the key in the error.
pub(crate) fn parse_value<T>(key: &str, value: &str) -> LkhResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| LkhError::invalid_data(format!("Bad {key} value '{value}': {e}")))
}

/// Whether a trimmed line starts a data section, e.g. `NODE_COORD_SECTION`.
pub(crate) fn is_section_header(line: &str) -> bool {
    let upper = line.trim_end_matches(':').trim().to_ascii_uppercase();
    upper.ends_with("_SECTION") && !upper.contains(char::is_whitespace)
}
