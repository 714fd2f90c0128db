use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Mutex;

use kira_blast_topmatches::app::{ProgressEvent, ProgressSink};
use kira_blast_topmatches::domain::{Accession, AccessionSet};
use kira_blast_topmatches::enrich::{BatchOutcome, DEFAULT_BATCH_SIZE, TitleResolver};
use kira_blast_topmatches::entrez::{DocumentSummary, SummaryClient};
use kira_blast_topmatches::error::KiraError;
use kira_blast_topmatches::pacing::{NoDelay, Pacer};

#[derive(Default)]
struct MockEntrez {
    calls: Mutex<Vec<Vec<String>>>,
    fail_on_call: Option<usize>,
    skip: HashSet<String>,
}

impl SummaryClient for MockEntrez {
    fn summaries(&self, db: &str, ids: &[Accession]) -> Result<Vec<DocumentSummary>, KiraError> {
        assert_eq!(db, "nucleotide");
        let mut calls = self.calls.lock().unwrap();
        calls.push(ids.iter().map(|id| id.to_string()).collect());
        if self.fail_on_call == Some(calls.len() - 1) {
            return Err(KiraError::NcbiStatus {
                status: 429,
                message: "Too Many Requests".to_string(),
            });
        }
        Ok(ids
            .iter()
            .filter(|id| !self.skip.contains(id.as_str()))
            .map(|id| DocumentSummary {
                accession_version: id.to_string(),
                title: format!("Organism for {id}"),
            })
            .collect())
    }
}

#[derive(Default)]
struct CountingPacer {
    pauses: Cell<usize>,
}

impl Pacer for CountingPacer {
    fn pause(&self) {
        self.pauses.set(self.pauses.get() + 1);
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn accessions(count: usize) -> AccessionSet {
    (0..count)
        .map(|i| format!("MN{i:06}.1").parse().unwrap())
        .collect()
}

#[test]
fn forty_five_ids_make_three_calls_and_two_pauses() {
    let client = MockEntrez::default();
    let pacer = CountingPacer::default();
    let resolver = TitleResolver::new(&client, &pacer, DEFAULT_BATCH_SIZE).unwrap();

    let enrichment = resolver.resolve(&accessions(45), &RecordingSink::default());

    let sizes: Vec<usize> = client.calls.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(pacer.pauses.get(), 2);
    assert_eq!(enrichment.batches.len(), 3);
    assert_eq!(enrichment.titles.len(), 45);
}

#[test]
fn batch_count_is_ceil_and_ids_appear_once() {
    for count in [1usize, 19, 20, 21, 40, 61] {
        let client = MockEntrez::default();
        let resolver = TitleResolver::new(&client, NoDelay, 20).unwrap();
        let set = accessions(count);
        resolver.resolve(&set, &RecordingSink::default());

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), count.div_ceil(20));
        let flattened: Vec<&String> = calls.iter().flatten().collect();
        assert_eq!(flattened.len(), count);
        let unique: HashSet<&String> = flattened.iter().copied().collect();
        assert_eq!(unique.len(), count);
        let expected: Vec<&str> = set.as_slice().iter().map(Accession::as_str).collect();
        let actual: Vec<&str> = flattened.iter().map(|s| s.as_str()).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn failed_batch_is_isolated() {
    let client = MockEntrez {
        fail_on_call: Some(1),
        ..MockEntrez::default()
    };
    let sink = RecordingSink::default();
    let pacer = CountingPacer::default();
    let resolver = TitleResolver::new(&client, &pacer, 20).unwrap();
    let set = accessions(45);

    let enrichment = resolver.resolve(&set, &sink);

    assert_eq!(enrichment.batches.len(), 3);
    assert_eq!(pacer.pauses.get(), 2);
    assert_eq!(enrichment.titles.len(), 25);
    for (i, acc) in set.as_slice().iter().enumerate() {
        let in_failed_batch = (20..40).contains(&i);
        assert_eq!(enrichment.titles.contains(acc.as_str()), !in_failed_batch);
    }

    let failed: Vec<&BatchOutcome> = enrichment.failed_batches().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index(), 1);
    assert_eq!(failed[0].accessions().len(), 20);

    let messages = sink.messages.lock().unwrap();
    assert!(
        messages
            .iter()
            .any(|m| m.starts_with("[ERROR] failed batch 2/3") && m.contains("MN000020.1"))
    );
}

#[test]
fn short_response_leaves_ids_absent() {
    let client = MockEntrez {
        skip: ["MN000003.1".to_string()].into_iter().collect(),
        ..MockEntrez::default()
    };
    let resolver = TitleResolver::new(&client, NoDelay, 20).unwrap();
    let enrichment = resolver.resolve(&accessions(5), &RecordingSink::default());

    assert_eq!(enrichment.titles.len(), 4);
    assert!(!enrichment.titles.contains("MN000003.1"));
    assert_eq!(
        enrichment.batches,
        vec![BatchOutcome::Resolved {
            index: 0,
            accessions: (0..5).map(|i| format!("MN{i:06}.1")).collect(),
            resolved: 4,
        }]
    );
}
