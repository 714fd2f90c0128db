use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("failed to read BLAST input at {path}: {message}")]
    #[diagnostic(help("expected a tab-separated BLAST outfmt 6 file"))]
    InputRead { path: PathBuf, message: String },

    #[error("malformed BLAST record at line {line}: {message}")]
    #[diagnostic(help(
        "columns must be: qseqid sseqid pident qcovs length bitscore evalue staxids"
    ))]
    InputFormat { line: u64, message: String },

    #[error("invalid accession: {0}")]
    InvalidAccession(String),

    #[error("contact email is required by NCBI (pass --email or set it in the config file)")]
    MissingEmail,

    #[error("invalid contact email: {0}")]
    InvalidEmail(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("unexpected esummary payload: {0}")]
    NcbiPayload(String),

    #[error("failed to write output at {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },
}
