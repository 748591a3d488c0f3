use std::collections::HashSet;

use pairgen::{
    ColumnSpec, NegativeSetBuilder, PairKey, PairLabel, PositiveCorpus, ReferenceCorpus,
    RetryLimits, SamplerConfig, SamplerError, SamplingMode, transport,
};

fn pairs(rows: &[(&str, &str)]) -> Vec<PairKey> {
    rows.iter()
        .map(|(source, target)| (source.to_string(), target.to_string()))
        .collect()
}

fn build_config(seed: u64, mode: SamplingMode) -> SamplerConfig {
    SamplerConfig {
        seed,
        mode,
        retry: RetryLimits::default(),
    }
}

fn run(
    positives: &[(&str, &str)],
    reference: &[(&str, &str)],
    mode: SamplingMode,
) -> pairgen::AugmentedSet {
    let builder = NegativeSetBuilder::new(build_config(42, mode)).unwrap();
    builder
        .build_negatives(
            &PositiveCorpus::from_pairs(pairs(positives)),
            &ReferenceCorpus::from_pairs(pairs(reference)),
            None,
        )
        .unwrap()
}

const CORPUS: &[(&str, &str)] = &[
    ("CASSA", "GILGF"),
    ("CASSB", "NLVPM"),
    ("CASSC", "GILGF"),
    ("CASSD", "ELAGI"),
    ("CASSE", "NLVPM"),
    ("CASSF", "ELAGI"),
];

#[test]
fn no_false_negatives_in_either_recombination_mode() {
    let forbidden: HashSet<PairKey> = pairs(CORPUS).into_iter().collect();
    for mode in [SamplingMode::PerSourceItem, SamplingMode::PerTargetGroup] {
        let augmented = run(CORPUS, CORPUS, mode);
        for row in &augmented.rows {
            if row.label == PairLabel::Negative {
                assert!(
                    !forbidden.contains(&row.key()),
                    "negative ({}, {}) recreates a positive pair",
                    row.source,
                    row.target
                );
            }
        }
    }
}

#[test]
fn no_duplicate_keys_in_either_recombination_mode() {
    for mode in [SamplingMode::PerSourceItem, SamplingMode::PerTargetGroup] {
        let augmented = run(CORPUS, CORPUS, mode);
        let keys: HashSet<PairKey> = augmented.rows.iter().map(|row| row.key()).collect();
        assert_eq!(keys.len(), augmented.rows.len());
    }
}

#[test]
fn positives_precede_negatives() {
    let augmented = run(CORPUS, CORPUS, SamplingMode::PerSourceItem);
    for (idx, row) in augmented.rows.iter().enumerate() {
        if idx < CORPUS.len() {
            assert_eq!(row.label, PairLabel::Positive);
            assert_eq!(row.source, CORPUS[idx].0);
            assert_eq!(row.target, CORPUS[idx].1);
        } else {
            assert_eq!(row.label, PairLabel::Negative);
        }
    }
}

#[test]
fn identical_inputs_and_seed_are_row_for_row_identical() {
    for mode in [SamplingMode::PerSourceItem, SamplingMode::PerTargetGroup] {
        let first = run(CORPUS, CORPUS, mode.clone());
        let second = run(CORPUS, CORPUS, mode);
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.report.generated, second.report.generated);
        assert_eq!(first.report.rounds, second.report.rounds);
    }
}

#[test]
fn recombination_scenario_respects_exclusions() {
    // A and C may only receive Y; B may only receive X.
    let corpus = &[("A", "X"), ("B", "Y"), ("C", "X")];
    let augmented = run(corpus, corpus, SamplingMode::PerSourceItem);
    let negatives: HashSet<PairKey> = augmented
        .rows
        .iter()
        .filter(|row| row.label == PairLabel::Negative)
        .map(|row| row.key())
        .collect();
    let expected: HashSet<PairKey> = pairs(&[("A", "Y"), ("B", "X"), ("C", "Y")])
        .into_iter()
        .collect();
    assert_eq!(negatives, expected);
    assert_eq!(augmented.report.shortfall(), 0);
}

#[test]
fn single_target_corpus_is_returned_unchanged() {
    let corpus = &[("A", "X"), ("B", "X")];
    let augmented = run(corpus, corpus, SamplingMode::PerSourceItem);
    assert_eq!(augmented.rows.len(), 2);
    assert!(
        augmented
            .rows
            .iter()
            .all(|row| row.label == PairLabel::Positive)
    );
    assert_eq!(augmented.report.generated, 0);
    assert_eq!(augmented.report.requested, 0);
}

#[test]
fn duplicate_positive_pair_aborts_loudly() {
    let builder = NegativeSetBuilder::new(build_config(42, SamplingMode::PerSourceItem)).unwrap();
    let err = builder
        .build_negatives(
            &PositiveCorpus::from_pairs(pairs(&[("A", "X"), ("A", "X"), ("B", "Y")])),
            &ReferenceCorpus::from_pairs(pairs(&[("A", "X"), ("B", "Y")])),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, SamplerError::InvariantViolation(_)));
}

#[test]
fn external_positive_rows_are_merged_into_exclusions() {
    // (D, GILGF) only exists in the working positives, not the reference; it
    // must still never reappear as a negative.
    let positives = &[("CASSA", "GILGF"), ("CASSB", "NLVPM"), ("D", "GILGF")];
    let reference = &[("CASSA", "GILGF"), ("CASSB", "NLVPM")];
    let augmented = run(positives, reference, SamplingMode::PerSourceItem);
    for row in &augmented.rows {
        if row.label == PairLabel::Negative {
            assert!(!(row.source == "D" && row.target == "GILGF"));
        }
    }
}

#[test]
fn delimited_round_trip_through_the_builder() {
    let temp = tempfile::tempdir().unwrap();
    let positives_path = temp.path().join("positives.csv");
    let reference_path = temp.path().join("reference.csv");
    let output_path = temp.path().join("augmented.csv");

    std::fs::write(
        &positives_path,
        "source_item;target_item\nCASSA;GILGF\nCASSB;NLVPM\nCASSC;GILGF\n",
    )
    .unwrap();
    std::fs::write(
        &reference_path,
        "source_item;target_item\nCASSA;GILGF\nCASSB;NLVPM\nCASSC;GILGF\n",
    )
    .unwrap();

    let columns = ColumnSpec::default();
    let positives = PositiveCorpus::from_table(
        &transport::read_delimited(&positives_path, ';').unwrap(),
        &columns,
    )
    .unwrap();
    let reference = ReferenceCorpus::from_table(
        &transport::read_delimited(&reference_path, ';').unwrap(),
        &columns,
    )
    .unwrap();

    let builder = NegativeSetBuilder::new(build_config(7, SamplingMode::PerSourceItem)).unwrap();
    let augmented = builder.build_negatives(&positives, &reference, None).unwrap();
    transport::write_delimited(&output_path, &augmented.rows, &columns, ';').unwrap();

    let table = transport::read_delimited(&output_path, ';').unwrap();
    assert_eq!(table.columns, vec!["source_item", "target_item", "label"]);
    assert_eq!(table.rows.len(), augmented.rows.len());
    assert!(table.rows[..3].iter().all(|cells| cells[2] == "1"));
    assert!(table.rows[3..].iter().all(|cells| cells[2] == "0"));
}
