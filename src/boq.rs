//! Expands a cut-bill BOQ export into a human readable report.
//!
//! Each BOQ line is a colon-delimited record whose first field is a tag.
//! `KAP` records (one per cut member) have fixed field positions and are
//! expanded; everything else is echoed as-is.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Result, WorkbenchError};

pub const DEFAULT_BOQ_FILE: &str = "CUTBILL.BOQ";
pub const DEFAULT_OUT_FILE: &str = "CUTBILL.XBOQ.TXT";

const MEMBER_MARK: usize = 29;
const CHAMFER_COUNT: usize = 31;
const FIRST_CHAMFER: usize = 32;
const CHAMFER_FIELDS: usize = 6;
const TRUSS_MARKS: usize = 56;
const PIECES_RIGHT: usize = 58;
const UPPER_SIDE: usize = 59;
const TREATMENT: usize = 60;
const OFFSET_8_1: usize = 62;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Verbatim,
    Kap,
}

impl RecordKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "KAP" => RecordKind::Kap,
            // VERSION, PRO_SIGN, PRO_ID and anything unrecognised
            _ => RecordKind::Verbatim,
        }
    }
}

/// Latin-1 maps each byte straight to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn field<'a>(parts: &[&'a str], index: usize, line_number: usize) -> Result<&'a str> {
    parts.get(index).copied().ok_or_else(|| WorkbenchError::Boq {
        line_number,
        reason: format!("KAP record has {} fields, expected field {index}", parts.len()),
    })
}

fn upper_side_hint(upper_side: &str) -> &'static str {
    match upper_side {
        "1" => "(4-5)",
        "2" => "(8-1)",
        _ => "(n/a)",
    }
}

fn expand_kap(parts: &[&str], line_number: usize, out: &mut String) -> Result<()> {
    let f = |index: usize| field(parts, index, line_number);

    let _ = writeln!(out, "\nKAP for {}:{}", f(TRUSS_MARKS)?, f(MEMBER_MARK)?);
    let _ = writeln!(
        out,
        "  CutID: {} | Joints: {} -> {} | Series: {} | Grade: {} | Size: {}x{}",
        f(1)?,
        f(2)?,
        f(3)?,
        f(4)?,
        f(5)?,
        f(6)?,
        f(7)?
    );
    let _ = writeln!(
        out,
        "  Total length: {} | Centre length: {} | Area: {}",
        f(8)?,
        f(9)?,
        f(10)?
    );
    for (title, first) in [("1-4", 11), ("5-8", 19)] {
        let mut points = String::new();
        for i in 0..4 {
            let _ = write!(points, "({}, {}) ", f(first + i * 2)?, f(first + i * 2 + 1)?);
        }
        let _ = writeln!(out, "  Points {title}: {points}");
    }
    let _ = writeln!(
        out,
        "  Name: {} | Pieces: {} | Mark: {} | Gross length: {}",
        f(27)?,
        f(28)?,
        f(MEMBER_MARK)?,
        f(30)?
    );

    let count_text = f(CHAMFER_COUNT)?;
    let _ = writeln!(out, "  No of Chamfers: {count_text}");
    let chamfers: usize = count_text.parse().map_err(|_| WorkbenchError::Boq {
        line_number,
        reason: format!("chamfer count '{count_text}' is not a number"),
    })?;
    if chamfers > (TRUSS_MARKS - FIRST_CHAMFER) / CHAMFER_FIELDS {
        return Err(WorkbenchError::Boq {
            line_number,
            reason: format!("{chamfers} chamfers overrun the truss mark fields"),
        });
    }

    for k in 0..chamfers {
        let start = FIRST_CHAMFER + k * CHAMFER_FIELDS;
        let _ = writeln!(
            out,
            "    [Chamfer {}] From->To: {} -> {} | Front angle: {} | Back angle: {} | Dim active: {} | Dim from centre: {}",
            k + 1,
            f(start)?,
            f(start + 1)?,
            f(start + 2)?,
            f(start + 3)?,
            f(start + 4)?,
            f(start + 5)?
        );
    }

    let _ = writeln!(
        out,
        "  Trussmarks: {} | Pieces L: {} | Pieces R: {}",
        f(TRUSS_MARKS)?,
        f(TRUSS_MARKS + 1)?,
        f(PIECES_RIGHT)?
    );

    if parts.len() <= TREATMENT {
        return Ok(());
    }
    let upper_side = f(UPPER_SIDE)?;
    let _ = writeln!(
        out,
        "  Upper side: {upper_side} {} | Treatment: {}",
        upper_side_hint(upper_side),
        f(TREATMENT)?
    );

    if parts.len() <= OFFSET_8_1 {
        return Ok(());
    }
    let _ = writeln!(
        out,
        "  Reduce height => Offset 4-5: {} | Offset 8-1: {}",
        f(OFFSET_8_1 - 1)?,
        f(OFFSET_8_1)?
    );

    Ok(())
}

/// Expands BOQ text; line numbers in errors count from 1.
pub fn expand(input: &str) -> Result<String> {
    let mut out = String::new();

    for (i, line) in input.lines().enumerate() {
        let parts: Vec<&str> = line.split(':').map(str::trim).collect();
        match RecordKind::from_tag(parts[0]) {
            RecordKind::Kap => expand_kap(&parts, i + 1, &mut out)?,
            RecordKind::Verbatim => {
                out.push_str(&parts.join(":"));
                out.push('\n');
            }
        }
    }

    Ok(out)
}

pub fn expand_file(boq_file: &Path, out_file: &Path) -> Result<()> {
    info!(
        "Using {} to create expanded file {}",
        boq_file.display(),
        out_file.display()
    );

    let bytes = fs::read(boq_file)?;
    let expanded = expand(&decode_latin1(&bytes))?;
    fs::write(out_file, expanded)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kap_record(chamfers: usize, extra: &[&str]) -> String {
        let mut fields: Vec<String> = vec!["KAP".to_string()];
        fields.extend((1..CHAMFER_COUNT).map(|i| format!("f{i}")));
        fields.push(chamfers.to_string());
        for k in 0..4 {
            for j in 0..CHAMFER_FIELDS {
                fields.push(format!("c{}_{j}", k + 1));
            }
        }
        fields.extend(["T1".to_string(), "2".to_string(), "3".to_string()]);
        fields.extend(extra.iter().map(|s| (*s).to_string()));
        fields.join(" : ")
    }

    #[test]
    fn test_chamfer_lines_match_count_in_order() {
        let expanded = expand(&kap_record(3, &[])).unwrap();

        let chamfers: Vec<&str> = expanded
            .lines()
            .filter(|l| l.contains("[Chamfer"))
            .collect();
        assert_eq!(chamfers.len(), 3);
        for (k, line) in chamfers.iter().enumerate() {
            assert!(line.contains(&format!("[Chamfer {}] From->To: c{}_0", k + 1, k + 1)));
        }
    }

    #[test]
    fn test_kap_header_uses_truss_and_member_marks() {
        let expanded = expand(&kap_record(0, &[])).unwrap();

        assert!(expanded.starts_with("\nKAP for T1:f29\n"));
        assert!(expanded.contains("  Trussmarks: T1 | Pieces L: 2 | Pieces R: 3\n"));
        assert!(!expanded.contains("Upper side"));
    }

    #[test]
    fn test_kap_optional_tail_fields() {
        let expanded = expand(&kap_record(1, &["2", "Green", "10", "20"])).unwrap();

        assert!(expanded.contains("  Upper side: 2 (8-1) | Treatment: Green\n"));
        assert!(expanded.contains("  Reduce height => Offset 4-5: 10 | Offset 8-1: 20\n"));
    }

    #[test]
    fn test_other_records_are_verbatim() {
        let expanded = expand("VERSION : 3.1\nPRO_ID:42\n\nFOO: bar :baz").unwrap();

        assert_eq!(expanded, "VERSION:3.1\nPRO_ID:42\n\nFOO:bar:baz\n");
    }

    #[test]
    fn test_truncated_kap_reports_line_number() {
        let err = expand("VERSION:1\nKAP:1:2:3").unwrap_err();

        assert!(matches!(err, WorkbenchError::Boq { line_number: 2, .. }));
    }

    #[test]
    fn test_bad_chamfer_count() {
        let record = kap_record(0, &[]).replacen(" : 0 : ", " : many : ", 1);
        let err = expand(&record).unwrap_err();

        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn test_chamfer_count_past_truss_marks_is_an_error() {
        for count in [5, 3_074_457_345_618_258_603] {
            let err = expand(&kap_record(count, &[])).unwrap_err();

            assert!(matches!(err, WorkbenchError::Boq { line_number: 1, .. }));
            assert!(err.to_string().contains("overrun"));
        }
    }

    #[test]
    fn test_expand_file_decodes_latin1() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CUTBILL.BOQ");
        let output = dir.path().join("out.txt");
        fs::write(&input, b"PRO_SIGN:Gr\xfcn\n").unwrap();

        expand_file(&input, &output).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "PRO_SIGN:Grün\n");
    }
}
