use pairgen::{
    ConvergenceLoop, ExclusionIndex, PairRecord, PairSamplingStrategy, PositiveCorpus,
    ReferenceCorpus, RetryLimits, SampleRequest, SamplerError, SamplingContext, SamplingReport,
    WorkingSet,
};

fn pairs(rows: &[(&str, &str)]) -> Vec<(String, String)> {
    rows.iter()
        .map(|(source, target)| (source.to_string(), target.to_string()))
        .collect()
}

fn fixtures() -> (PositiveCorpus, ReferenceCorpus) {
    let rows = pairs(&[("A", "X"), ("B", "Y")]);
    (
        PositiveCorpus::from_pairs(rows.clone()),
        ReferenceCorpus::from_pairs(rows),
    )
}

/// Draws the same pair twice every round: one copy merges on the first pass,
/// the other collides forever, forcing the loop through every retry phase.
struct CollidingStrategy;

impl PairSamplingStrategy for CollidingStrategy {
    fn label(&self) -> &'static str {
        "colliding_stub"
    }

    fn initial_request(&self, _ctx: &SamplingContext<'_>) -> SampleRequest {
        SampleRequest::Items(vec!["N".to_string(), "N".to_string()])
    }

    fn draw(
        &self,
        _ctx: &SamplingContext<'_>,
        _request: &SampleRequest,
        _round: u32,
        _report: &mut SamplingReport,
    ) -> Vec<PairRecord> {
        vec![
            PairRecord::negative("N".into(), "X".into()),
            PairRecord::negative("N".into(), "X".into()),
        ]
    }

    fn retry_request(&self, rejected: &[PairRecord], _outstanding: usize) -> SampleRequest {
        SampleRequest::Items(rejected.iter().map(|record| record.source.clone()).collect())
    }
}

/// Emits a copy of an already-seeded positive row, which the duplicate check
/// must refuse to swallow.
struct PositiveDuplicateStrategy;

impl PairSamplingStrategy for PositiveDuplicateStrategy {
    fn label(&self) -> &'static str {
        "positive_duplicate_stub"
    }

    fn initial_request(&self, _ctx: &SamplingContext<'_>) -> SampleRequest {
        SampleRequest::Items(vec!["A".to_string()])
    }

    fn draw(
        &self,
        _ctx: &SamplingContext<'_>,
        _request: &SampleRequest,
        _round: u32,
        _report: &mut SamplingReport,
    ) -> Vec<PairRecord> {
        vec![PairRecord::positive("A".into(), "X".into())]
    }

    fn retry_request(&self, _rejected: &[PairRecord], _outstanding: usize) -> SampleRequest {
        SampleRequest::Done
    }
}

#[test]
fn persistent_collisions_walk_every_phase_and_exhaust() {
    let (positives, reference) = fixtures();
    let exclusions = ExclusionIndex::build(&reference, &positives);
    let mut working = WorkingSet::seed(&positives).unwrap();
    let ctx = SamplingContext::from_working(&working, &exclusions, None, 42);
    let limits = RetryLimits { soft: 2, hard: 4 };
    let report = ConvergenceLoop::new(limits)
        .run(&mut working, &CollidingStrategy, &ctx)
        .unwrap();

    assert_eq!(report.requested, 2);
    assert_eq!(report.generated, 1);
    assert_eq!(report.shortfall(), 1);
    assert_eq!(report.rounds, limits.hard + 1);
    assert!(report.reseeded);
    assert!(!report.unresolved.is_empty());
    // The one merged copy is in the working set, behind the positives.
    assert_eq!(working.negative_count(), 1);
    assert_eq!(working.rows().last().unwrap().source, "N");
}

#[test]
fn label_one_duplicate_is_an_invariant_violation() {
    let (positives, reference) = fixtures();
    let exclusions = ExclusionIndex::build(&reference, &positives);
    let mut working = WorkingSet::seed(&positives).unwrap();
    let ctx = SamplingContext::from_working(&working, &exclusions, None, 42);
    let err = ConvergenceLoop::new(RetryLimits::default())
        .run(&mut working, &PositiveDuplicateStrategy, &ctx)
        .unwrap_err();
    assert!(matches!(err, SamplerError::InvariantViolation(_)));
}

#[test]
fn empty_initial_request_converges_immediately() {
    struct IdleStrategy;
    impl PairSamplingStrategy for IdleStrategy {
        fn label(&self) -> &'static str {
            "idle_stub"
        }
        fn initial_request(&self, _ctx: &SamplingContext<'_>) -> SampleRequest {
            SampleRequest::Done
        }
        fn draw(
            &self,
            _ctx: &SamplingContext<'_>,
            _request: &SampleRequest,
            _round: u32,
            _report: &mut SamplingReport,
        ) -> Vec<PairRecord> {
            Vec::new()
        }
        fn retry_request(&self, _rejected: &[PairRecord], _outstanding: usize) -> SampleRequest {
            SampleRequest::Done
        }
    }

    let (positives, reference) = fixtures();
    let exclusions = ExclusionIndex::build(&reference, &positives);
    let mut working = WorkingSet::seed(&positives).unwrap();
    let ctx = SamplingContext::from_working(&working, &exclusions, None, 42);
    let report = ConvergenceLoop::new(RetryLimits::default())
        .run(&mut working, &IdleStrategy, &ctx)
        .unwrap();
    assert_eq!(report.rounds, 0);
    assert_eq!(report.generated, 0);
    assert_eq!(working.negative_count(), 0);
}
