//! Bulk question import.
//!
//! One question per line, no header:
//! `question,option 1,option 2,...,option N,correct option number`
//! where the number is 1-based. Lines that cannot become a valid question are
//! skipped and counted, never fatal.

use std::io;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use quiz_core::model::QuestionRecord;

/// Counts reported back after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CsvImportSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Questions parsed from a CSV source, before they are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuestions {
    pub records: Vec<QuestionRecord>,
    pub skipped: usize,
}

/// Parse every line of `reader` into question records.
///
/// # Errors
///
/// Returns `csv::Error` only when the underlying reader fails. Malformed lines
/// are counted in `skipped`.
pub fn parse_questions<R: io::Read>(reader: R) -> Result<ParsedQuestions, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut parsed = ParsedQuestions::default();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                tracing::warn!(line = line + 1, error = %err, "unreadable csv line skipped");
                parsed.skipped += 1;
                continue;
            }
        };

        match question_from_row(&record) {
            Some(question) => parsed.records.push(question),
            None => {
                tracing::warn!(line = line + 1, fields = record.len(), "invalid csv question skipped");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn question_from_row(record: &StringRecord) -> Option<QuestionRecord> {
    // question, at least two options, answer number
    if record.len() < 4 {
        return None;
    }
    let fields: Vec<&str> = record.iter().collect();
    let (question, rest) = fields.split_first()?;
    let (number, options) = rest.split_last()?;

    let number: i64 = number.parse().ok()?;
    let record = QuestionRecord::new(
        *question,
        options.iter().map(|option| (*option).to_owned()).collect(),
        number - 1,
    );
    record.validate().ok().map(|_| record)
}
