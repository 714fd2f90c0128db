use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::Builder;

use crate::app::{ProgressEvent, ProgressSink, RunResult};
use crate::domain::EnrichedRecord;
use crate::error::KiraError;
use crate::outfmt6::COLUMNS;

pub const ORGANISM_COLUMN: &str = "organism_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Writes the summary table through a sibling temp file so a failed run
/// never leaves a truncated CSV behind.
pub fn write_matches_csv(path: &Path, rows: &[EnrichedRecord]) -> Result<(), KiraError> {
    let write_err = |message: String| KiraError::OutputWrite {
        path: path.to_path_buf(),
        message,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| write_err(err.to_string()))?;

    let tmp = Builder::new()
        .prefix(".kira-bt-")
        .suffix(".csv.tmp")
        .tempfile_in(parent)
        .map_err(|err| write_err(err.to_string()))?;

    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        let header = COLUMNS.iter().copied().chain([ORGANISM_COLUMN]);
        writer
            .write_record(header)
            .map_err(|err| write_err(err.to_string()))?;
        for row in rows {
            writer
                .write_record(csv_fields(row))
                .map_err(|err| write_err(err.to_string()))?;
        }
        writer.flush().map_err(|err| write_err(err.to_string()))?;
    }

    tmp.persist(path)
        .map_err(|err| write_err(err.error.to_string()))?;
    Ok(())
}

fn csv_fields(row: &EnrichedRecord) -> [String; 9] {
    let record = &row.record;
    [
        record.query_id.clone(),
        record.subject_id.to_string(),
        format_float(record.percent_identity),
        format_float(record.query_coverage),
        record.alignment_length.to_string(),
        format_float(record.bit_score),
        format_float(record.evalue),
        record.taxonomy_ids.clone(),
        row.organism_name_or_placeholder().to_string(),
    ]
}

/// Shortest text that parses back to `value`; scientific notation for very
/// small or very large magnitudes such as e-values.
fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        format!("{value:e}")
    } else {
        value.to_string()
    }
}

/// Batch failure notices, which are printed whatever the output mode.
pub fn failure_notice(event: &ProgressEvent) -> Option<&str> {
    event
        .message
        .starts_with("[ERROR]")
        .then_some(event.message.as_str())
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, event: ProgressEvent) {
        if let Some(notice) = failure_notice(&event) {
            eprintln!("{notice}");
        }
    }
}

/// Prints progress to stderr; batch failures always surface here.
pub struct StderrProgress {
    pub verbose: bool,
}

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        if self.verbose || failure_notice(&event).is_some() {
            eprintln!("{}", event.message);
        }
    }
}

pub fn print_text_summary(result: &RunResult) {
    println!(
        "[DONE] Saved top {} matches to {}",
        result.rows_written, result.output
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlignmentRecord;

    #[test]
    fn tiny_evalues_use_scientific_notation() {
        assert_eq!(format_float(1e-180), "1e-180");
        assert_eq!(format_float(2.5e-50), "2.5e-50");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(99.5), "99.5");
        assert_eq!(format_float(0.001), "0.001");
        let parsed: f64 = format_float(3.7e-123).parse().unwrap();
        assert_eq!(parsed, 3.7e-123);
    }

    #[test]
    fn only_failures_are_notices() {
        let failed = ProgressEvent {
            message: "[ERROR] failed batch 2/3 [A.1, B.1]: NCBI request failed: timeout".to_string(),
            elapsed: None,
        };
        let progress = ProgressEvent {
            message: "phase=Enrich; batch 1/3 resolved 20/20".to_string(),
            elapsed: None,
        };
        assert_eq!(failure_notice(&failed), Some(failed.message.as_str()));
        assert_eq!(failure_notice(&progress), None);
    }

    #[test]
    fn header_only_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_matches_csv(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "qseqid,sseqid,pident,qcovs,length,bitscore,evalue,staxids,organism_name\n"
        );
    }

    #[test]
    fn titles_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let row = EnrichedRecord {
            record: AlignmentRecord {
                query_id: "q1".to_string(),
                subject_id: "NC_012920.1".parse().unwrap(),
                percent_identity: 99.5,
                query_coverage: 100.0,
                alignment_length: 16_569,
                bit_score: 30_000.0,
                evalue: 0.0,
                taxonomy_ids: "9606".to_string(),
            },
            organism_name: Some("Homo sapiens mitochondrion, complete genome".to_string()),
        };
        write_matches_csv(&path, &[row]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let line = content.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "q1,NC_012920.1,99.5,100,16569,30000,0,9606,\"Homo sapiens mitochondrion, complete genome\""
        );
    }
}
