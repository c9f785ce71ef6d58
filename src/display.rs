use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::harness::{CandidateReport, ComparisonReport, Report};

/// Column header printed above the per-candidate lines.
pub const COLUMN_HEADER: &str = "test,         time,            max,            avg";

/// `<label>,<elapsed_ns>,<log2 max+1>,<avg log2 error+1>`
pub fn format_candidate(candidate: &CandidateReport) -> String {
    format!(
        "{},{:>15},{:>15.6},{:>15.6}",
        candidate.label,
        candidate.elapsed_ns,
        candidate.stats.max_bits(),
        candidate.stats.average_bits()
    )
}

/// `<label>,<log2 max improvement+1>,<win count>`
pub fn format_comparison(cmp: &ComparisonReport) -> String {
    format!(
        "{},{:>15.6},{:>15}",
        cmp.label,
        cmp.comparison.improvement_bits(),
        cmp.comparison.wins
    )
}

/// Plain line-oriented report, comma separated.
pub fn format_text(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(report.subject);
    out.push('\n');
    out.push_str(&format!("pf,{:>11}\n", report.ordinary_f32));
    out.push_str(&format!("pd,{:>11}\n", report.ordinary_f64));
    out.push_str(COLUMN_HEADER);
    out.push('\n');

    for candidate in &report.candidates {
        out.push_str(&format_candidate(candidate));
        out.push('\n');
    }
    for cmp in &report.comparisons {
        out.push_str(&format_comparison(cmp));
        out.push('\n');
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    subject: &'a str,
    iterations: usize,
    seed: u64,
    ordinary_f32: usize,
    ordinary_f64: usize,
    candidates: Vec<JsonCandidate<'a>>,
    comparisons: Vec<JsonComparison<'a>>,
}

#[derive(Serialize)]
struct JsonCandidate<'a> {
    label: &'a str,
    elapsed_ns: u64,
    max_error: u64,
    max_bits: f64,
    total_log_error: f64,
    ordinary_count: usize,
    average_bits: f64,
}

#[derive(Serialize)]
struct JsonComparison<'a> {
    label: &'a str,
    wins: u64,
    max_improvement: u64,
    improvement_bits: f64,
}

/// JSON output with raw counters next to the derived bit figures.
pub fn format_json(report: &Report, now: DateTime<Utc>) -> String {
    let json = JsonReport {
        generated_at: now,
        subject: report.subject,
        iterations: report.iterations,
        seed: report.seed,
        ordinary_f32: report.ordinary_f32,
        ordinary_f64: report.ordinary_f64,
        candidates: report
            .candidates
            .iter()
            .map(|c| JsonCandidate {
                label: c.label,
                elapsed_ns: c.elapsed_ns,
                max_error: c.stats.max_error,
                max_bits: c.stats.max_bits(),
                total_log_error: c.stats.total_log_error,
                ordinary_count: c.stats.ordinary_count,
                average_bits: c.stats.average_bits(),
            })
            .collect(),
        comparisons: report
            .comparisons
            .iter()
            .map(|c| JsonComparison {
                label: c.label,
                wins: c.comparison.wins,
                max_improvement: c.comparison.max_improvement,
                improvement_bits: c.comparison.improvement_bits(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{Comparison, ErrorStats};

    fn candidate(label: &'static str, elapsed_ns: u64, max_error: u64) -> CandidateReport {
        CandidateReport {
            label,
            elapsed_ns,
            stats: ErrorStats {
                max_error,
                total_log_error: 6.0,
                ordinary_count: 4,
            },
        }
    }

    fn sample_report() -> Report {
        Report {
            subject: "sqrt-diff",
            iterations: 5,
            seed: 42,
            ordinary_f32: 4,
            ordinary_f64: 5,
            candidates: vec![
                candidate("if", 1234, 3),
                candidate("id", 2345, 0),
                candidate("of", 3456, u64::from(u32::MAX)),
                candidate("od", 4567, u64::MAX),
            ],
            comparisons: vec![
                ComparisonReport {
                    label: "df",
                    comparison: Comparison {
                        wins: 2,
                        max_improvement: 7,
                    },
                },
                ComparisonReport {
                    label: "dd",
                    comparison: Comparison::default(),
                },
            ],
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-18T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn text_report_has_ten_lines() {
        let text = format_text(&sample_report());
        assert_eq!(text.lines().count(), 10);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn text_report_line_order() {
        let text = format_text(&sample_report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sqrt-diff");
        assert_eq!(lines[1], "pf,          4");
        assert_eq!(lines[2], "pd,          5");
        assert_eq!(lines[3], COLUMN_HEADER);
        assert!(lines[4].starts_with("if,"));
        assert!(lines[5].starts_with("id,"));
        assert!(lines[6].starts_with("of,"));
        assert!(lines[7].starts_with("od,"));
        assert!(lines[8].starts_with("df,"));
        assert!(lines[9].starts_with("dd,"));
    }

    #[test]
    fn candidate_line_columns() {
        assert_eq!(
            format_candidate(&candidate("if", 1234, 3)),
            "if,           1234,       2.000000,       1.500000"
        );
    }

    #[test]
    fn saturated_errors_stay_finite() {
        assert_eq!(
            format_candidate(&candidate("od", 1, u64::MAX)),
            "od,              1,      64.000000,       1.500000"
        );
        assert!(!format_text(&sample_report()).contains("NaN"));
    }

    #[test]
    fn comparison_line_columns() {
        let cmp = ComparisonReport {
            label: "df",
            comparison: Comparison {
                wins: 2,
                max_improvement: 7,
            },
        };
        assert_eq!(format_comparison(&cmp), "df,       3.000000,              2");
    }

    #[test]
    fn empty_comparison_reports_zero() {
        let cmp = ComparisonReport {
            label: "dd",
            comparison: Comparison::default(),
        };
        assert_eq!(format_comparison(&cmp), "dd,       0.000000,              0");
    }

    #[test]
    fn json_contains_raw_and_derived_fields() {
        let json = format_json(&sample_report(), fixed_now());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["generated_at"], "2026-02-18T00:00:00Z");
        assert_eq!(parsed["subject"], "sqrt-diff");
        assert_eq!(parsed["seed"], 42);
        assert_eq!(parsed["ordinary_f64"], 5);

        let candidates = parsed["candidates"].as_array().unwrap();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0]["label"], "if");
        assert_eq!(candidates[0]["max_error"], 3);
        assert_eq!(candidates[0]["max_bits"], 2.0);
        assert_eq!(candidates[3]["max_error"], u64::MAX);

        let comparisons = parsed["comparisons"].as_array().unwrap();
        assert_eq!(comparisons[0]["wins"], 2);
        assert_eq!(comparisons[0]["improvement_bits"], 3.0);
    }
}
