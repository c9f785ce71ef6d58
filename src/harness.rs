//! Timing runner, error aggregation and the fixed measurement pipeline.

use std::hint::black_box;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::generate::{OperandBatch, generate_batch};
use crate::reference::{Reference, evaluate_reference};
use crate::types::Precision;

/// The four implementations being compared, one per (program, domain) pair.
///
/// "input" is the baseline program and "output" the rewritten one.
pub struct Candidates<const N: usize> {
    pub input_f32: fn(&[f32; N]) -> f32,
    pub input_f64: fn(&[f64; N]) -> f64,
    pub output_f32: fn(&[f32; N]) -> f32,
    pub output_f64: fn(&[f64; N]) -> f64,
}

/// Outputs of one candidate over a batch and the wall-clock cost of the pass.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub outputs: Vec<T>,
    pub elapsed_ns: u64,
}

/// Evaluate `candidate` once per tuple, in batch order, under a single
/// monotonic clock bracket. No warm-up and no repetition.
pub fn time_batch<T, F, const N: usize>(candidate: F, batch: &OperandBatch<T, N>) -> Timed<T>
where
    T: Precision,
    F: Fn(&[T; N]) -> T,
{
    let mut outputs = Vec::with_capacity(batch.len());

    let start = Instant::now();
    for tuple in batch.tuples() {
        outputs.push(candidate(black_box(tuple)));
    }
    let elapsed = start.elapsed();

    Timed {
        outputs,
        elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
    }
}

/// `log2(error + 1)`, finite even for the saturated sentinel.
pub fn log2_error(error: u64) -> f64 {
    (error as f64 + 1.0).log2()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorStats {
    /// Largest ULP distance over every sample.
    pub max_error: u64,
    /// Sum of `log2(error + 1)` over samples with an ordinary reference.
    pub total_log_error: f64,
    /// Number of samples with an ordinary reference.
    pub ordinary_count: usize,
}

impl ErrorStats {
    pub fn max_bits(&self) -> f64 {
        log2_error(self.max_error)
    }

    /// Average bits of error; 0 when no reference value was ordinary.
    pub fn average_bits(&self) -> f64 {
        if self.ordinary_count == 0 {
            0.0
        } else {
            self.total_log_error / self.ordinary_count as f64
        }
    }
}

/// Score a candidate's outputs against the reference of the same domain.
pub fn measure_error<T: Precision>(outputs: &[T], reference: &[T]) -> ErrorStats {
    debug_assert_eq!(outputs.len(), reference.len());

    let mut stats = ErrorStats::default();
    for (&out, &truth) in outputs.iter().zip(reference) {
        let error = out.ulp_distance(truth);
        stats.max_error = stats.max_error.max(error);
        if truth.is_ordinary() {
            stats.total_log_error += log2_error(error);
            stats.ordinary_count += 1;
        }
    }
    stats
}

/// How often the input program beats the output program in one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Samples where the output program is strictly less accurate.
    pub wins: u64,
    /// Largest `output_error - input_error` among those samples.
    pub max_improvement: u64,
}

impl Comparison {
    pub fn improvement_bits(&self) -> f64 {
        log2_error(self.max_improvement)
    }
}

pub fn compare_candidates<T: Precision>(
    input_outputs: &[T],
    output_outputs: &[T],
    reference: &[T],
) -> Comparison {
    let mut cmp = Comparison::default();
    for ((&input, &output), &truth) in input_outputs.iter().zip(output_outputs).zip(reference) {
        if !truth.is_ordinary() {
            continue;
        }
        let input_error = input.ulp_distance(truth);
        let output_error = output.ulp_distance(truth);
        if input_error < output_error {
            cmp.wins += 1;
            cmp.max_improvement = cmp.max_improvement.max(output_error - input_error);
        }
    }
    cmp
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateReport {
    pub label: &'static str,
    pub elapsed_ns: u64,
    pub stats: ErrorStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub label: &'static str,
    pub comparison: Comparison,
}

/// Everything one run measured, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub subject: &'static str,
    pub iterations: usize,
    pub seed: u64,
    pub ordinary_f32: usize,
    pub ordinary_f64: usize,
    /// `if`, `id`, `of`, `od`.
    pub candidates: Vec<CandidateReport>,
    /// `df`, `dd`.
    pub comparisons: Vec<ComparisonReport>,
}

fn score<T: Precision>(label: &'static str, timed: &Timed<T>, truth: &[T]) -> CandidateReport {
    debug!(candidate = label, elapsed_ns = timed.elapsed_ns, "candidate timed");
    CandidateReport {
        label,
        elapsed_ns: timed.elapsed_ns,
        stats: measure_error(&timed.outputs, truth),
    }
}

/// Run the fixed measurement sequence once.
///
/// Narrow and wide operands come from one PRNG seeded with `seed`, so a run
/// is reproducible apart from its timings.
pub fn run<R, const N: usize>(
    subject: &'static str,
    candidates: &Candidates<N>,
    reference: &mut R,
    iterations: usize,
    seed: u64,
) -> Report
where
    R: Reference<N> + ?Sized,
{
    info!(subject, iterations, seed, arity = N, "starting run");

    let mut rng = SmallRng::seed_from_u64(seed);
    let narrow = generate_batch::<f32, _, N>(iterations, &mut rng);
    let wide = generate_batch::<f64, _, N>(iterations, &mut rng);

    reference.setup();
    let start = Instant::now();
    let truth_f32 = evaluate_reference(reference, &narrow);
    let truth_f64 = evaluate_reference(reference, &wide);
    debug!(
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "reference evaluated"
    );

    let ordinary_f32 = truth_f32.iter().filter(|x| x.is_ordinary()).count();
    let ordinary_f64 = truth_f64.iter().filter(|x| x.is_ordinary()).count();

    let input_f32 = time_batch(candidates.input_f32, &narrow);
    let input_f64 = time_batch(candidates.input_f64, &wide);
    let output_f32 = time_batch(candidates.output_f32, &narrow);
    let output_f64 = time_batch(candidates.output_f64, &wide);

    let scored = vec![
        score("if", &input_f32, &truth_f32),
        score("id", &input_f64, &truth_f64),
        score("of", &output_f32, &truth_f32),
        score("od", &output_f64, &truth_f64),
    ];

    let comparisons = vec![
        ComparisonReport {
            label: "df",
            comparison: compare_candidates(&input_f32.outputs, &output_f32.outputs, &truth_f32),
        },
        ComparisonReport {
            label: "dd",
            comparison: compare_candidates(&input_f64.outputs, &output_f64.outputs, &truth_f64),
        },
    ];

    Report {
        subject,
        iterations,
        seed,
        ordinary_f32,
        ordinary_f64,
        candidates: scored,
        comparisons,
    }
}
