use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::domain::AlignmentRecord;
use crate::error::KiraError;

/// Column order of `-outfmt "6 qseqid sseqid pident qcovs length bitscore evalue staxids"`.
pub const COLUMNS: [&str; 8] = [
    "qseqid", "sseqid", "pident", "qcovs", "length", "bitscore", "evalue", "staxids",
];

pub fn read_alignments(path: &Path) -> Result<Vec<AlignmentRecord>, KiraError> {
    let file = File::open(path).map_err(|err| KiraError::InputRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    parse_alignments(file)
}

pub fn parse_alignments<R: Read>(reader: R) -> Result<Vec<AlignmentRecord>, KiraError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| KiraError::InputFormat {
            line: err.position().map(|pos| pos.line()).unwrap_or(0),
            message: err.to_string(),
        })?;
        let line = row.position().map(|pos| pos.line()).unwrap_or(0);
        if row.len() != COLUMNS.len() {
            return Err(KiraError::InputFormat {
                line,
                message: format!("expected {} columns, found {}", COLUMNS.len(), row.len()),
            });
        }
        let record: AlignmentRecord = row
            .deserialize(None)
            .map_err(|err| KiraError::InputFormat {
                line,
                message: err.to_string(),
            })?;
        check_ranges(&record).map_err(|message| KiraError::InputFormat { line, message })?;
        records.push(record);
    }
    Ok(records)
}

fn check_ranges(record: &AlignmentRecord) -> Result<(), String> {
    let percent = |name: &str, value: f64| {
        if (0.0..=100.0).contains(&value) {
            Ok(())
        } else {
            Err(format!("{name} must be within 0-100, got {value}"))
        }
    };
    let non_negative = |name: &str, value: f64| {
        if value >= 0.0 {
            Ok(())
        } else {
            Err(format!("{name} must be a non-negative number, got {value}"))
        }
    };
    percent("pident", record.percent_identity)?;
    percent("qcovs", record.query_coverage)?;
    non_negative("bitscore", record.bit_score)?;
    non_negative("evalue", record.evalue)
}
