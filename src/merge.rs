use crate::domain::{AlignmentRecord, EnrichedRecord, TitleMapping};

/// Attaches resolved titles to ranked rows by subject accession, keeping row order.
pub fn merge_titles(records: &[AlignmentRecord], titles: &TitleMapping) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|record| EnrichedRecord {
            organism_name: titles
                .get(record.subject_id.as_str())
                .map(str::to_string),
            record: record.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNKNOWN_ORGANISM;

    fn record(subject: &str) -> AlignmentRecord {
        AlignmentRecord {
            query_id: "contig_1".to_string(),
            subject_id: subject.parse().unwrap(),
            percent_identity: 98.2,
            query_coverage: 97.0,
            alignment_length: 16_569,
            bit_score: 29_000.0,
            evalue: 0.0,
            taxonomy_ids: "9606".to_string(),
        }
    }

    #[test]
    fn unresolved_rows_get_placeholder() {
        let mut titles = TitleMapping::new();
        titles.insert("NC_012920.1", "Homo sapiens mitochondrion, complete genome");
        let merged = merge_titles(&[record("NC_012920.1"), record("MT000001.1")], &titles);

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged[0].organism_name_or_placeholder(),
            "Homo sapiens mitochondrion, complete genome"
        );
        assert_eq!(merged[1].organism_name, None);
        assert_eq!(merged[1].organism_name_or_placeholder(), UNKNOWN_ORGANISM);
    }
}
