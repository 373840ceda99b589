//! Bank statement CSV to ledger-cli journal conversion.

mod bank_csv;
mod substitutions;

use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::Path;

use log::info;

pub use bank_csv::{read_transactions, BankTransaction, DATE_FORMAT};
pub use substitutions::SubstitutionEngine;

use crate::error::Result;

pub const DEFAULT_CSV_FILE: &str = "./statement.csv";
pub const DEFAULT_SUBSTITUTIONS_FILE: &str = "./substitutions.json";
pub const DEFAULT_LEDGER_FILE: &str = "./ledger.dat";

const INDENT: &str = "    ";

/// One journal entry block per transaction, separated by blank lines.
pub fn render(transactions: &[BankTransaction], engine: &SubstitutionEngine) -> String {
    let mut out = String::new();

    for t in transactions {
        let _ = writeln!(out, "{} {}", t.date.format(DATE_FORMAT), t.description);
        let _ = writeln!(
            out,
            "{INDENT}{}  {:.2}",
            engine.source_account(&t.bank_account),
            t.amount
        );
        let _ = writeln!(
            out,
            "{INDENT}{}",
            engine.target_account(&t.description, t.amount)
        );
        out.push('\n');
    }

    out
}

pub fn convert_file(csv_path: &Path, substitutions_path: &Path, ledger_path: &Path) -> Result<usize> {
    info!(
        "Converting {} into {}",
        csv_path.display(),
        ledger_path.display()
    );

    let engine = SubstitutionEngine::load(substitutions_path)?;
    let transactions = read_transactions(File::open(csv_path)?)?;
    fs::write(ledger_path, render(&transactions, &engine))?;

    info!("Wrote {} transactions", transactions.len());
    Ok(transactions.len())
}
