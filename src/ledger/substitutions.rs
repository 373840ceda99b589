use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_DEBIT_ACCOUNT: &str = "Expenses:no match";
pub const DEFAULT_CREDIT_ACCOUNT: &str = "Income:no match";

#[derive(Debug, Clone, Default, Deserialize)]
struct NoMatch {
    debit: Option<String>,
    credit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Substitution {
    #[serde(rename = "match")]
    pub pattern: String,
    pub account: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SubstitutionFile {
    #[serde(rename = "no match", default)]
    no_match: Option<NoMatch>,
    #[serde(default)]
    substitutions: Vec<Substitution>,
}

/// Picks ledger accounts for the two sides of a bank transaction.
#[derive(Debug, Clone)]
pub struct SubstitutionEngine {
    substitutions: Vec<Substitution>,
    no_match_debit: String,
    no_match_credit: String,
}

impl Default for SubstitutionEngine {
    fn default() -> Self {
        Self {
            substitutions: Vec::new(),
            no_match_debit: DEFAULT_DEBIT_ACCOUNT.to_string(),
            no_match_credit: DEFAULT_CREDIT_ACCOUNT.to_string(),
        }
    }
}

impl SubstitutionEngine {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SubstitutionFile = serde_json::from_str(json)?;
        let no_match = file.no_match.unwrap_or_default();
        let defaults = Self::default();

        Ok(Self {
            substitutions: file.substitutions,
            no_match_debit: no_match.debit.unwrap_or(defaults.no_match_debit),
            no_match_credit: no_match.credit.unwrap_or(defaults.no_match_credit),
        })
    }

    /// A missing file means no substitutions, only the no-match accounts.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No substitutions file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let engine = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(
            "Loaded {} substitutions from {}",
            engine.substitutions.len(),
            path.display()
        );
        Ok(engine)
    }

    pub fn source_account<'a>(&self, bank_account: &'a str) -> &'a str {
        bank_account
    }

    pub fn target_account(&self, payee: &str, amount: f64) -> &str {
        let payee = payee.to_lowercase();

        self.substitutions
            .iter()
            .find(|s| payee.contains(&s.pattern.to_lowercase()))
            .map(|s| s.account.as_str())
            .unwrap_or(if amount < 0.0 {
                self.no_match_debit.as_str()
            } else {
                self.no_match_credit.as_str()
            })
    }
}
