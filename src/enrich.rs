use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{Accession, AccessionSet, TitleMapping};
use crate::entrez::{NUCLEOTIDE_DB, SummaryClient};
use crate::error::KiraError;
use crate::pacing::Pacer;

pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Resolved {
        index: usize,
        accessions: Vec<String>,
        resolved: usize,
    },
    Failed {
        index: usize,
        accessions: Vec<String>,
        reason: String,
    },
}

impl BatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            BatchOutcome::Resolved { index, .. } | BatchOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn accessions(&self) -> &[String] {
        match self {
            BatchOutcome::Resolved { accessions, .. } | BatchOutcome::Failed { accessions, .. } => {
                accessions
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enrichment {
    pub titles: TitleMapping,
    pub batches: Vec<BatchOutcome>,
}

impl Enrichment {
    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|batch| batch.is_failed())
    }
}

/// Resolves nucleotide titles batch by batch, pausing between requests.
pub struct TitleResolver<C: SummaryClient, P: Pacer> {
    client: C,
    pacer: P,
    batch_size: usize,
}

impl<C: SummaryClient, P: Pacer> TitleResolver<C, P> {
    pub fn new(client: C, pacer: P, batch_size: usize) -> Result<Self, KiraError> {
        if batch_size == 0 {
            return Err(KiraError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            client,
            pacer,
            batch_size,
        })
    }

    /// Never fails: a batch that errors is recorded as `BatchOutcome::Failed`
    /// and its accessions stay absent from the mapping.
    pub fn resolve(&self, accessions: &AccessionSet, sink: &dyn ProgressSink) -> Enrichment {
        let mut enrichment = Enrichment::default();
        if accessions.is_empty() {
            return enrichment;
        }

        let total = accessions.len().div_ceil(self.batch_size);
        info!(
            accessions = accessions.len(),
            batches = total,
            "resolving nucleotide titles"
        );

        for (index, batch) in accessions.batches(self.batch_size).enumerate() {
            if index > 0 {
                self.pacer.pause();
            }
            let outcome = self.resolve_batch(index, total, batch, &mut enrichment.titles, sink);
            enrichment.batches.push(outcome);
        }

        info!(
            resolved = enrichment.titles.len(),
            failed = enrichment.failed_batches().count(),
            "title resolution finished"
        );
        enrichment
    }

    fn resolve_batch(
        &self,
        index: usize,
        total: usize,
        batch: &[Accession],
        titles: &mut TitleMapping,
        sink: &dyn ProgressSink,
    ) -> BatchOutcome {
        let started = Instant::now();
        let ids: Vec<String> = batch.iter().map(|acc| acc.as_str().to_string()).collect();
        debug!(batch = index + 1, size = ids.len(), "esummary request");

        match self.client.summaries(NUCLEOTIDE_DB, batch) {
            Ok(summaries) => {
                let resolved = summaries.len();
                titles.extend(
                    summaries
                        .into_iter()
                        .map(|doc| (doc.accession_version, doc.title)),
                );
                sink.event(ProgressEvent {
                    message: format!(
                        "phase=Enrich; batch {}/{total} resolved {resolved}/{}",
                        index + 1,
                        ids.len()
                    ),
                    elapsed: Some(started.elapsed()),
                });
                BatchOutcome::Resolved {
                    index,
                    accessions: ids,
                    resolved,
                }
            }
            Err(err) => {
                warn!(batch = index + 1, ids = ?ids, error = %err, "esummary batch failed");
                sink.event(ProgressEvent {
                    message: format!(
                        "[ERROR] failed batch {}/{total} [{}]: {err}",
                        index + 1,
                        ids.join(", ")
                    ),
                    elapsed: Some(started.elapsed()),
                });
                BatchOutcome::Failed {
                    index,
                    accessions: ids,
                    reason: err.to_string(),
                }
            }
        }
    }
}
