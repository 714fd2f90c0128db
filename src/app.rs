use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::config::RunOptions;
use crate::domain::AccessionSet;
use crate::enrich::{BatchOutcome, TitleResolver};
use crate::entrez::SummaryClient;
use crate::error::KiraError;
use crate::filter::{limit_from_top, select_top};
use crate::merge::merge_titles;
use crate::outfmt6::read_alignments;
use crate::output::write_matches_csv;
use crate::pacing::Pacer;

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub input: String,
    pub output: String,
    pub rows_total: usize,
    pub rows_passing: usize,
    pub rows_written: usize,
    pub accessions: usize,
    pub batches: usize,
    pub resolved_titles: usize,
    pub unresolved: Vec<String>,
    pub failed_batches: Vec<BatchOutcome>,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: SummaryClient, P: Pacer> {
    client: C,
    pacer: P,
}

impl<C: SummaryClient, P: Pacer> App<C, P> {
    pub fn new(client: C, pacer: P) -> Self {
        Self { client, pacer }
    }

    /// Read, filter, enrich and write one BLAST result file.
    ///
    /// Only input and output failures abort the run; lookup failures are
    /// reported per batch in the returned `RunResult`.
    pub fn run(
        &self,
        options: &RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, KiraError> {
        let resolver = TitleResolver::new(&self.client, &self.pacer, options.batch_size)?;

        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Read; parsing {}", options.input),
            elapsed: None,
        });
        let records = read_alignments(options.input.as_std_path())?;
        let rows_passing = records
            .iter()
            .filter(|record| options.thresholds.passes(record))
            .count();
        let ranked = select_top(&records, &options.thresholds, limit_from_top(options.top));
        info!(
            total = records.len(),
            passing = rows_passing,
            kept = ranked.len(),
            "filtered BLAST hits"
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Filter; {} of {} rows pass, keeping {}",
                rows_passing,
                records.len(),
                ranked.len()
            ),
            elapsed: Some(started.elapsed()),
        });

        let accessions = AccessionSet::from_records(&ranked);
        let enrichment = resolver.resolve(&accessions, sink);
        let merged = merge_titles(&ranked, &enrichment.titles);

        sink.event(ProgressEvent {
            message: format!("phase=Write; {} rows to {}", merged.len(), options.output),
            elapsed: Some(started.elapsed()),
        });
        write_matches_csv(options.output.as_std_path(), &merged)?;

        let unresolved = accessions
            .as_slice()
            .iter()
            .filter(|acc| !enrichment.titles.contains(acc.as_str()))
            .map(|acc| acc.to_string())
            .collect();

        Ok(RunResult {
            input: options.input.to_string(),
            output: options.output.to_string(),
            rows_total: records.len(),
            rows_passing,
            rows_written: merged.len(),
            accessions: accessions.len(),
            batches: enrichment.batches.len(),
            resolved_titles: enrichment.titles.len(),
            unresolved,
            failed_batches: enrichment.failed_batches().cloned().collect(),
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
