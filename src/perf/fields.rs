//! Parsers for the individual log line shapes the collectors rely on.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{Result, WorkbenchError};

fn parse_number(text: &str, what: &'static str, line: &str) -> Result<f64> {
    text.trim()
        .trim_end_matches('s')
        .trim()
        .parse::<f64>()
        .map_err(|_| WorkbenchError::Parse {
            what,
            line: line.to_string(),
        })
}

fn after_last_comma(line: &str) -> &str {
    line.rsplit_once(',').map_or(line, |(_, tail)| tail)
}

/// `... ,<milliseconds>`
pub fn stopwatch_millis(line: &str) -> Result<f64> {
    parse_number(after_last_comma(line), "stopwatch milliseconds", line)
}

/// `... ,<kilobytes>`
pub fn file_size_kilobytes(line: &str) -> Result<f64> {
    parse_number(after_last_comma(line), "file size", line)
}

/// Tab separated, duration in milliseconds in the fifth column.
pub fn perf_column_millis(line: &str) -> Result<f64> {
    let column = line.split('\t').nth(4).ok_or_else(|| WorkbenchError::Parse {
        what: "perf column duration",
        line: line.to_string(),
    })?;
    parse_number(column, "perf column duration", line)
}

/// `...: <seconds>[s] (<splits>)`
pub fn total_seconds(line: &str) -> Result<f64> {
    let (_, tail) = line.rsplit_once(':').ok_or_else(|| WorkbenchError::Parse {
        what: "total time",
        line: line.to_string(),
    })?;
    let time = tail.split('(').next().unwrap_or(tail);
    parse_number(time, "total time", line)
}

pub fn search_perf_column_millis<'a>(
    lines: &'a [String],
    needle: &str,
) -> Option<(&'a str, Result<f64>)> {
    lines
        .iter()
        .find(|line| line.contains(needle))
        .map(|line| (line.as_str(), perf_column_millis(line)))
}

lazy_static::lazy_static! {
    static ref TIMESTAMP: Regex = Regex::new(
        r"^\s*(?:(?P<iso>\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?)|(?P<dmy>\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}))",
    )
    .expect("timestamp regex is valid");
}

/// Leading timestamp of a log line, interpreted as local time.
pub fn line_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let captures = TIMESTAMP.captures(line)?;

    let naive = if let Some(iso) = captures.name("iso") {
        let text = iso.as_str().replacen('T', " ", 1);
        NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").ok()?
    } else {
        let dmy = captures.name("dmy")?;
        NaiveDateTime::parse_from_str(dmy.as_str(), "%d/%m/%Y %H:%M:%S").ok()?
    };

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
