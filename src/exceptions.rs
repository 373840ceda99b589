//! Compares two exception-report exports and tracks what changed per Id.

use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
struct ExceptionRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Region", default)]
    region: String,
    #[serde(rename = "VersionShort", default)]
    version_short: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Owner", default)]
    owner: String,
    #[serde(rename = "Exception Hash", default)]
    hash: String,
}

impl ExceptionRow {
    /// The same rows the exception report itself leaves out.
    fn is_excluded(&self) -> bool {
        self.region == "IGNORE"
            || self.version_short == "1"
            || self.version_short == "1.0"
            || self.date.contains("09/2014")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionStats {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub hash: Option<String>,
    pub count: usize,
}

impl ExceptionStats {
    fn record(&mut self, row: ExceptionRow) {
        self.status = Some(row.status);
        self.owner = Some(row.owner);
        self.hash = Some(row.hash);
        self.count += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExceptionDiff {
    pub previous: ExceptionStats,
    pub current: ExceptionStats,
}

impl ExceptionDiff {
    pub fn status_changed(&self) -> bool {
        self.previous.status != self.current.status
    }
}

#[derive(Debug, Serialize)]
struct DiffRow<'a> {
    id: &'a str,
    old_owner: Option<&'a str>,
    old_status: Option<&'a str>,
    old_count: usize,
    old_hash: Option<&'a str>,
    new_owner: Option<&'a str>,
    new_status: Option<&'a str>,
    new_count: usize,
    new_hash: Option<&'a str>,
    status_changed: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffTotals {
    pub previous: usize,
    pub current: usize,
    /// Current occurrences of exceptions whose status changed.
    pub changed: usize,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Previous,
    Current,
}

/// Exceptions by Id, in the order each Id was first seen.
#[derive(Debug, Default)]
pub struct ExceptionTable {
    entries: IndexMap<String, ExceptionDiff>,
}

impl ExceptionTable {
    fn read<R: Read>(&mut self, reader: R, side: Side) -> Result<()> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        for row in csv_reader.deserialize::<ExceptionRow>() {
            let row = row?;
            if row.is_excluded() {
                continue;
            }
            let diff = self.entries.entry(row.id.clone()).or_default();
            match side {
                Side::Previous => diff.previous.record(row),
                Side::Current => diff.current.record(row),
            }
        }
        Ok(())
    }

    pub fn from_readers<P: Read, C: Read>(previous: P, current: C) -> Result<Self> {
        let mut table = Self::default();
        table.read(previous, Side::Previous)?;
        table.read(current, Side::Current)?;
        Ok(table)
    }

    pub fn get(&self, id: &str) -> Option<&ExceptionDiff> {
        self.entries.get(id)
    }

    pub fn totals(&self) -> DiffTotals {
        self.entries
            .values()
            .fold(DiffTotals::default(), |mut totals, diff| {
                totals.previous += diff.previous.count;
                totals.current += diff.current.count;
                if diff.status_changed() {
                    totals.changed += diff.current.count;
                }
                totals
            })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (id, diff) in &self.entries {
            csv_writer.serialize(DiffRow {
                id,
                old_owner: diff.previous.owner.as_deref(),
                old_status: diff.previous.status.as_deref(),
                old_count: diff.previous.count,
                old_hash: diff.previous.hash.as_deref(),
                new_owner: diff.current.owner.as_deref(),
                new_status: diff.current.status.as_deref(),
                new_count: diff.current.count,
                new_hash: diff.current.hash.as_deref(),
                status_changed: diff.status_changed(),
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

pub fn diff_files(previous: &Path, current: &Path, out: &Path) -> Result<DiffTotals> {
    info!(
        "Comparing {} with {} into {}",
        previous.display(),
        current.display(),
        out.display()
    );

    let table = ExceptionTable::from_readers(
        std::fs::File::open(previous)?,
        std::fs::File::open(current)?,
    )?;
    table.write_csv(std::fs::File::create(out)?)?;

    Ok(table.totals())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIOUS: &str = "\
Id,Region,VersionShort,Date,Status,Owner,Exception Hash,Message
100,UK,4.2,01/05/2017,New,ann,h1,boom
100,UK,4.2,02/05/2017,New,bob,h1,boom
200,UK,4.2,03/05/2017,Fixed,cat,h2,bang
300,IGNORE,4.2,03/05/2017,New,dan,h3,x
400,UK,1.0,03/05/2017,New,dan,h4,x
500,UK,4.2,12/09/2014,New,dan,h5,x
";

    const CURRENT: &str = "\
Id,Region,VersionShort,Date,Status,Owner,Exception Hash,Message
200,FR,4.3,01/06/2017,Fixed,cat,h2,bang
100,UK,4.3,02/06/2017,Assigned,bob,h1b,boom
100,UK,4.3,03/06/2017,Assigned,bob,h1b,boom
100,UK,4.3,04/06/2017,Assigned,eve,h1c,boom
600,UK,4.3,04/06/2017,New,fay,h6,new
";

    fn table() -> ExceptionTable {
        ExceptionTable::from_readers(PREVIOUS.as_bytes(), CURRENT.as_bytes()).unwrap()
    }

    #[test]
    fn test_excluded_rows_are_skipped() {
        let table = table();

        assert!(table.get("300").is_none());
        assert!(table.get("400").is_none());
        assert!(table.get("500").is_none());
    }

    #[test]
    fn test_last_row_wins_and_counts_accumulate() {
        let table = table();
        let diff = table.get("100").unwrap();

        assert_eq!(diff.previous.count, 2);
        assert_eq!(diff.previous.owner.as_deref(), Some("bob"));
        assert_eq!(diff.current.count, 3);
        assert_eq!(diff.current.owner.as_deref(), Some("eve"));
        assert_eq!(diff.current.hash.as_deref(), Some("h1c"));
        assert!(diff.status_changed());
        assert!(!table.get("200").unwrap().status_changed());
    }

    #[test]
    fn test_totals() {
        assert_eq!(
            table().totals(),
            DiffTotals {
                previous: 3,
                current: 5,
                changed: 4,
            }
        );
    }

    #[test]
    fn test_write_csv_first_seen_order() {
        let mut out = Vec::new();
        table().write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,old_owner,old_status,old_count,old_hash,new_owner,new_status,new_count,new_hash,status_changed"
        );
        assert_eq!(lines[1], "100,bob,New,2,h1,eve,Assigned,3,h1c,true");
        assert_eq!(lines[2], "200,cat,Fixed,1,h2,cat,Fixed,1,h2,false");
        assert_eq!(lines[3], "600,,,0,,fay,New,1,h6,true");
    }
}
