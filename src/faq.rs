//! Banking FAQ table
//!
//! Questions are matched verbatim after lower-casing. There is no trimming,
//! punctuation stripping or stemming: "what are the bank working hours?"
//! does not match "what are the bank working hours".

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// Answer given when a question has no entry
pub const FALLBACK_ANSWER: &str = "I'm sorry, I don't have an answer to that question. Please contact our customer service for more assistance.";

/// Built-in banking questions and answers
const BUILTIN_FAQ: &[(&str, &str)] = &[
    (
        "what is the procedure to open a bank account",
        "To open a bank account, you need to visit the bank with your ID proof, address proof, and passport-sized photographs. Fill out the account opening form and submit the necessary documents.",
    ),
    (
        "what are the bank working hours",
        "Our bank operates from 9 AM to 5 PM, Monday to Friday. On Saturdays, we are open from 9 AM to 1 PM.",
    ),
    (
        "how can i apply for a loan",
        "To apply for a loan, visit our bank and fill out the loan application form. Provide the necessary documents, such as income proof and ID proof. Our representative will guide you through the process.",
    ),
    (
        "what is the interest rate on savings account",
        "The interest rate on savings accounts varies. Please visit our bank or check our website for the latest rates.",
    ),
    (
        "how can i get a new checkbook",
        "To get a new checkbook, you can request one online through our banking portal, visit the bank, or contact our customer service.",
    ),
    (
        "what is the minimum balance required in savings account",
        "The minimum balance required for a savings account varies by account type. Please refer to our website or visit the bank for specific details.",
    ),
    (
        "how can i update my contact information",
        "To update your contact information, you can log in to our online banking portal, visit the bank, or call our customer service.",
    ),
    (
        "how can i block my lost debit card",
        "If you have lost your debit card, immediately contact our customer service or use our mobile app to block the card.",
    ),
    (
        "how can i activate internet banking",
        "To activate internet banking, visit our website, click on the 'Register' link, and follow the instructions. You will need your account number and registered mobile number.",
    ),
    (
        "what documents are required for a home loan",
        "Documents required for a home loan include proof of identity, proof of address, income proof, bank statements, and property documents.",
    ),
    (
        "how can i check my account balance",
        "You can check your account balance through our mobile app, internet banking, by visiting an ATM, or calling our customer service.",
    ),
    (
        "what are the charges for an international money transfer",
        "Charges for international money transfers vary based on the amount and destination. Please refer to our website or visit the bank for specific details.",
    ),
    (
        "how can i change my atm pin",
        "To change your ATM PIN, visit any of our ATMs, log in with your card and current PIN, and follow the instructions to change your PIN.",
    ),
    (
        "how can i open a fixed deposit account",
        "To open a fixed deposit account, visit our bank or use our online banking portal. You will need your account details and the amount you wish to deposit.",
    ),
    (
        "how can i close my bank account",
        "To close your bank account, visit the bank with your ID proof and account details. Fill out the account closure form and submit it to the bank representative.",
    ),
    (
        "what is the process to update kyc details",
        "To update your KYC details, visit the bank with your ID proof, address proof, and passport-sized photographs. Fill out the KYC update form and submit the documents.",
    ),
    (
        "how can i get a bank statement",
        "You can get a bank statement through our mobile app, internet banking, or by visiting the bank.",
    ),
    (
        "what are the different types of accounts available",
        "We offer various types of accounts including savings accounts, current accounts, fixed deposits, and recurring deposits.",
    ),
    (
        "how can i apply for a credit card",
        "To apply for a credit card, visit our bank or apply online through our website. You will need your ID proof, address proof, and income proof.",
    ),
    (
        "what is the overdraft facility",
        "An overdraft facility allows you to withdraw more money than you have in your account up to a specified limit. This is subject to approval and interest charges.",
    ),
];

/// A single question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqEntry {
    /// Question text, lower-cased once loaded into a table
    pub question: String,
    /// Answer spoken back to the caller
    pub answer: String,
}

/// On-disk FAQ schema
#[derive(Debug, Deserialize)]
struct FaqFile {
    #[serde(default, rename = "entry")]
    entries: Vec<FaqEntry>,
}

/// Ordered, immutable question → answer table
#[derive(Debug, Clone)]
pub struct FaqTable {
    entries: Vec<FaqEntry>,
    index: HashMap<String, usize>,
}

impl FaqTable {
    /// The built-in banking table
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN_FAQ
            .iter()
            .map(|(q, a)| FaqEntry {
                question: (*q).to_string(),
                answer: (*a).to_string(),
            })
            .collect();

        // Built-in keys are already lower-case and unique
        Self::index_entries(entries)
    }

    /// Build a table from entries, lower-casing every question
    ///
    /// # Errors
    ///
    /// Returns error if two questions collide after lower-casing or an answer
    /// is blank
    pub fn from_entries(entries: Vec<FaqEntry>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut normalized = Vec::with_capacity(entries.len());

        for entry in entries {
            let question = entry.question.to_lowercase();
            if !seen.insert(question.clone()) {
                return Err(Error::Config(format!("duplicate FAQ question: {question}")));
            }
            if entry.answer.trim().is_empty() {
                return Err(Error::Config(format!("FAQ question has no answer: {question}")));
            }
            normalized.push(FaqEntry {
                question,
                answer: entry.answer,
            });
        }

        Ok(Self::index_entries(normalized))
    }

    /// Load a table from a TOML file of `[[entry]]` tables
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or holds duplicates
    /// or blank answers
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: FaqFile = toml::from_str(&content)?;

        if file.entries.is_empty() {
            return Err(Error::Config(format!(
                "FAQ file has no entries: {}",
                path.display()
            )));
        }

        let table = Self::from_entries(file.entries)?;
        tracing::info!(path = %path.display(), entries = table.len(), "loaded FAQ file");
        Ok(table)
    }

    fn index_entries(entries: Vec<FaqEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.question.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// Look up the answer for a question
    #[must_use]
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.index
            .get(&question.to_lowercase())
            .map(|&i| self.entries[i].answer.as_str())
    }

    /// Answer a question, falling back to the customer-service message
    #[must_use]
    pub fn answer(&self, question: &str) -> &str {
        self.lookup(question).unwrap_or_else(|| {
            tracing::debug!(question, "no FAQ entry");
            FALLBACK_ANSWER
        })
    }

    /// Entries in table order
    #[must_use]
    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FaqTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys_are_lowercase() {
        let table = FaqTable::builtin();
        assert_eq!(table.len(), 20);
        for entry in table.entries() {
            assert_eq!(entry.question, entry.question.to_lowercase());
        }
    }

    #[test]
    fn test_from_entries_rejects_case_duplicates() {
        let result = FaqTable::from_entries(vec![
            FaqEntry {
                question: "Where is the branch".to_string(),
                answer: "Main street".to_string(),
            },
            FaqEntry {
                question: "where is the branch".to_string(),
                answer: "Elsewhere".to_string(),
            },
        ]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_entries_rejects_blank_answer() {
        let result = FaqTable::from_entries(vec![FaqEntry {
            question: "where is the branch".to_string(),
            answer: "  ".to_string(),
        }]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("where is the branch"));
    }
}
