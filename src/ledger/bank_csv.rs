use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::debug;

use crate::error::{Result, WorkbenchError};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

const DATE: usize = 0;
const SORT_CODE: usize = 2;
const ACCOUNT: usize = 3;
const DESCRIPTION: usize = 4;
const DEBIT: usize = 5;
const CREDIT: usize = 6;

/// One row of a bank statement export.
#[derive(Debug, Clone, PartialEq)]
pub struct BankTransaction {
    pub date: NaiveDate,
    pub bank_account: String,
    pub description: String,
    pub amount: f64,
}

fn column(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or_default()
}

fn parse_amount(text: &str, record: &StringRecord) -> Result<f64> {
    text.parse().map_err(|_| WorkbenchError::Parse {
        what: "amount",
        line: record.iter().collect::<Vec<_>>().join(","),
    })
}

/// Statements prefix the sort code with a quote mark to stop spreadsheets
/// treating it as a number.
pub fn bank_account(sort_code: &str, account: &str) -> String {
    let sort_code = sort_code.strip_prefix('\'').unwrap_or(sort_code);
    format!("{sort_code} {account}")
}

/// Debit wins over credit; an empty pair is a zero amount.
pub fn signed_amount(debit: &str, credit: &str, record: &StringRecord) -> Result<f64> {
    if !debit.is_empty() {
        Ok(-parse_amount(debit, record)?)
    } else if !credit.is_empty() {
        parse_amount(credit, record)
    } else {
        Ok(0.0)
    }
}

fn parse_record(record: &StringRecord) -> Result<Option<BankTransaction>> {
    let Ok(date) = NaiveDate::parse_from_str(column(record, DATE), DATE_FORMAT) else {
        debug!("Dropping row without a valid date: {record:?}");
        return Ok(None);
    };

    Ok(Some(BankTransaction {
        date,
        bank_account: bank_account(column(record, SORT_CODE), column(record, ACCOUNT)),
        description: column(record, DESCRIPTION).to_string(),
        amount: signed_amount(column(record, DEBIT), column(record, CREDIT), record)?,
    }))
}

/// Reads every dated row, oldest first. Rows sharing a date keep file order.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<BankTransaction>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();
    for record in csv_reader.records() {
        if let Some(transaction) = parse_record(&record?)? {
            transactions.push(transaction);
        }
    }

    transactions.sort_by_key(|t| t.date);
    Ok(transactions)
}
