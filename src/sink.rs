//! Append-only result stream consumed by the downstream analyzer.
//!
//! The CSV layout is the legacy 24-column format (Method, Iteration, ATTR
//! plus the 21 metric columns); the analyzer keys on the header, so column
//! names, order, and count are load-bearing.

use crate::model::{QualityResult, METRIC_COLUMNS};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// The fixed header row, Method,Iteration,ATTR + the 21 metric columns.
pub fn result_header() -> String {
    let mut header = String::from("Method,Iteration,ATTR");
    for col in &METRIC_COLUMNS {
        header.push(',');
        header.push_str(col);
    }
    header
}

/// Append contract for exploration results. `method` tags the strategy
/// ("FU", "PRG", "ANT") and `label` is the human-readable configuration
/// encoding ("L2:M1:S1", "unconstrained", or the option digit string).
pub trait ResultSink {
    fn append(
        &mut self,
        method: &str,
        iteration: u32,
        label: &str,
        result: &QualityResult,
    ) -> io::Result<()>;
}

/// CSV file sink. Rows are flushed as they arrive so intermediate results
/// survive a killed run. Raw metrics are written verbatim; a short record
/// produces a short row, which the analyzer already tolerates.
pub struct CsvSink<W: Write> {
    out: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", result_header())?;
        out.flush()?;
        Ok(CsvSink { out })
    }
}

impl CsvSink<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        CsvSink::new(File::create(path)?)
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn append(
        &mut self,
        method: &str,
        iteration: u32,
        label: &str,
        result: &QualityResult,
    ) -> io::Result<()> {
        let mut row = format!("{},{},{}", method, iteration, label);
        for metric in &result.metrics {
            row.push(',');
            row.push_str(metric);
        }
        writeln!(self.out, "{}", row)?;
        self.out.flush()
    }
}

/// One appended row, kept in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub method: String,
    pub iteration: u32,
    pub label: String,
    pub result: QualityResult,
}

/// In-memory sink for tests and programmatic consumers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<Row>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }
}

impl ResultSink for MemorySink {
    fn append(
        &mut self,
        method: &str,
        iteration: u32,
        label: &str,
        result: &QualityResult,
    ) -> io::Result<()> {
        self.rows.push(Row {
            method: method.to_string(),
            iteration,
            label: label.to_string(),
            result: result.clone(),
        });
        Ok(())
    }
}
