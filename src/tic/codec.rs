//! TIC response parsing
//!
//! Every server reply starts with a status line, `DDD text`, where the
//! first digit of the code classifies it. Listings and details follow their
//! status line with body lines up to a terminating `202` line.

use super::record::{DetailRecord, ListingRecord};
use super::transport::LineIo;
use super::{Error, Result};
use std::fmt;

/// Parsed status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    code: String,
    message: String,
}

impl StatusLine {
    /// The three-digit status code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Free text following the code
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the code reports success (first digit '2')
    pub fn is_success(&self) -> bool {
        self.code.starts_with('2')
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// The leading three characters of a line, used to spot terminators
pub fn line_code(line: &str) -> &str {
    line.get(..3).unwrap_or(line)
}

/// Parse a status line
///
/// Format: DDD message
/// Example: 200 SixXS TIC Service ready
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let bytes = line.as_bytes();

    if bytes.len() < 4 {
        return Err(Error::Malformed(format!("status line too short: {:?}", line)));
    }

    if bytes[3] != b' ' {
        return Err(Error::Malformed(format!(
            "status line missing separator: {:?}",
            line
        )));
    }

    if !bytes[..3].iter().all(u8::is_ascii_digit) || !(b'2'..=b'5').contains(&bytes[0]) {
        return Err(Error::Malformed(format!("invalid status code: {:?}", line)));
    }

    Ok(StatusLine {
        code: line[..3].to_string(),
        message: line[4..].to_string(),
    })
}

/// Reject a caller-supplied argument that would split a command in two
pub fn check_argument(what: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidArgument(format!(
            "{} contains a line terminator: {:?}",
            what, value
        )));
    }
    Ok(())
}

/// Send one command line, logging it
pub fn send_command<T: LineIo + ?Sized>(io: &mut T, line: &str) -> Result<()> {
    tracing::debug!("--> {}", line);
    io.send_line(line)
}

/// Read exactly one reply line and require it to be a success
pub fn read_single_reply<T: LineIo + ?Sized>(io: &mut T) -> Result<StatusLine> {
    let line = io.read_line()?.ok_or(Error::ConnectionClosed)?;
    tracing::debug!("<-- {}", line);

    let status = parse_status_line(&line)?;
    if !status.is_success() {
        return Err(Error::Protocol {
            code: status.code,
            message: status.message,
        });
    }

    Ok(status)
}

/// Read body lines until one whose code satisfies `is_terminal`
///
/// The terminal line is consumed but not returned. Running out of input
/// before the terminal line is an error, never a short result.
pub fn read_block<T, F>(io: &mut T, is_terminal: F) -> Result<Vec<String>>
where
    T: LineIo + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut lines = Vec::new();

    loop {
        let line = io.read_line()?.ok_or_else(|| {
            Error::Malformed(format!(
                "connection closed after {} lines without block terminator",
                lines.len()
            ))
        })?;
        tracing::debug!("<-- {}", line);

        if is_terminal(line_code(&line)) {
            return Ok(lines);
        }
        lines.push(line);
    }
}

/// Split each line into exactly `field_names.len()` whitespace-separated fields
///
/// One bad line fails the whole listing.
pub fn parse_fixed_field_listing(
    lines: &[String],
    field_names: &[&'static str],
) -> Result<Vec<ListingRecord>> {
    lines
        .iter()
        .map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != field_names.len() {
                return Err(Error::Malformed(format!(
                    "wrong field format: expected {} fields, got {} in {:?}",
                    field_names.len(),
                    tokens.len(),
                    line
                )));
            }

            Ok(ListingRecord::new(
                field_names
                    .iter()
                    .zip(tokens)
                    .map(|(name, value)| (*name, value.to_string()))
                    .collect(),
            ))
        })
        .collect()
}

/// Parse `key:value` lines into a detail record
///
/// Splits on the first colon only and trims leading whitespace from the
/// value. A repeated key keeps its first position but takes the last value.
pub fn parse_key_value_block(lines: &[String]) -> Result<DetailRecord> {
    let mut record = DetailRecord::new();

    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| Error::Malformed(format!("expected key:value, got {:?}", line)))?;
        record.insert(key, value.trim());
    }

    Ok(record)
}
