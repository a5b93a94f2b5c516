//! Outcome recording and the end-of-run CSV report.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jiff::Timestamp;

use crate::model::{Outcome, OutcomeStatus};

/// Errors that can occur while writing the report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

const HEADER: [&str; 9] = [
    "status",
    "rule_id",
    "rule_name",
    "rule_payload",
    "old_mention",
    "new_mention",
    "old_message",
    "new_message",
    "error",
];

/// Append-only log of outcomes for one run.
#[derive(Debug, Default)]
pub struct Recorder {
    outcomes: Vec<Outcome>,
}

impl Recorder {
    pub fn record(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Count of outcomes per status.
    pub fn summary(&self) -> Summary {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.status).or_insert(0) += 1;
        }
        Summary(counts)
    }

    /// Write every outcome as CSV, quoting every field.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(writer);

        csv.write_record(HEADER)?;
        for o in &self.outcomes {
            csv.write_record([
                o.status.as_str(),
                o.rule.id.as_str(),
                o.rule.name.as_str(),
                o.rule.raw.to_string().as_str(),
                o.old_mention.as_deref().unwrap_or_default(),
                o.new_mention.as_deref().unwrap_or_default(),
                o.old_message.as_str(),
                o.new_message.as_deref().unwrap_or_default(),
                o.error.as_deref().unwrap_or_default(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the report to `<dir>/migration-<timestamp>.csv`.
    pub fn write_file(&self, dir: &Path, at: Timestamp) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(report_file_name(at));
        let file = fs::File::create(&path)?;
        self.write_to(io::BufWriter::new(file))?;
        Ok(path)
    }
}

impl Extend<Outcome> for Recorder {
    fn extend<I: IntoIterator<Item = Outcome>>(&mut self, iter: I) {
        self.outcomes.extend(iter);
    }
}

/// `migration-20261019T142501Z.csv`
pub fn report_file_name(at: Timestamp) -> String {
    format!("migration-{}.csv", at.strftime("%Y%m%dT%H%M%SZ"))
}

/// Outcome counts, displayed as `migrated=3 failed=1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary(BTreeMap<OutcomeStatus, usize>);

impl Summary {
    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no outcomes");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(status, n)| format!("{status}={n}"))
            .collect();
        f.write_str(&parts.join(" "))
    }
}
