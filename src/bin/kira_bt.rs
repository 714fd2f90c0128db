use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_blast_topmatches::app::App;
use kira_blast_topmatches::config::{CliOverrides, ConfigLoader, api_key_from_env};
use kira_blast_topmatches::entrez::EntrezHttpClient;
use kira_blast_topmatches::output::{JsonOutput, OutputMode, StderrProgress, print_text_summary};
use kira_blast_topmatches::pacing::FixedInterval;

#[derive(Parser)]
#[command(name = "kira-bt")]
#[command(about = "Filter BLAST outfmt 6 hits and annotate the top matches with NCBI nucleotide titles")]
#[command(version, author)]
struct Cli {
    #[arg(help = "BLAST outfmt 6 file (qseqid sseqid pident qcovs length bitscore evalue staxids)")]
    blast_file: Utf8PathBuf,

    #[arg(long, help = "Contact e-mail sent to NCBI Entrez (required by NCBI usage policy)")]
    email: Option<String>,

    #[arg(
        long,
        value_name = "N",
        allow_negative_numbers = true,
        help = "Number of top-scoring hits to keep [default: 100]"
    )]
    top: Option<i64>,

    #[arg(long, value_name = "FILE.csv", help = "Output CSV path [default: top_matches.csv]")]
    out: Option<Utf8PathBuf>,

    #[arg(long, help = "JSON settings file [default: ./kira-bt.json if present]")]
    config: Option<String>,

    #[arg(long, value_name = "N", help = "Accessions per esummary request [default: 20]")]
    batch_size: Option<usize>,

    #[arg(long, value_name = "MS", help = "Pause between esummary requests [default: 340]")]
    delay_ms: Option<u64>,

    #[arg(long, help = "Print the run summary as JSON")]
    json: bool,

    #[arg(short, long, help = "Print progress for every phase and batch")]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::load(cli.config.as_deref()).into_diagnostic()?;
    let overrides = CliOverrides {
        email: cli.email,
        top: cli.top,
        output: cli.out,
        batch_size: cli.batch_size,
        delay_ms: cli.delay_ms,
    };
    let options =
        ConfigLoader::resolve_options(config, cli.blast_file, overrides, api_key_from_env())
            .into_diagnostic()?;

    let client = EntrezHttpClient::new(options.contact.clone()).into_diagnostic()?;
    let app = App::new(client, FixedInterval::new(options.delay));

    match output_mode {
        OutputMode::Json => {
            let result = app.run(&options, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        OutputMode::Text => {
            let sink = StderrProgress {
                verbose: cli.verbose,
            };
            let result = app.run(&options, &sink).into_diagnostic()?;
            print_text_summary(&result);
        }
    }
    Ok(())
}
