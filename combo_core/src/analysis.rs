//! # Analysis Integration
//!
//! Bridges stored combinations to an external structural solver and
//! post-processes the results: factor application, batch runs, critical
//! combination selection, and report export.
//!
//! The solver itself is behind the [`Solver`] trait; this crate never
//! assembles stiffness matrices. A combination's formula is parsed, each
//! term's factor is applied to the matching solver load category, the
//! solver executes, and the numeric results land back on the combination.
//!
//! ## Example
//!
//! ```no_run
//! use combo_core::analysis::{find_critical, Criterion};
//! use combo_core::combination::Combination;
//!
//! let mut combos = vec![
//!     Combination::new("A", "1.4DL"),
//!     Combination::new("B", "1.2DL + 1.6LL"),
//! ];
//! combos[0].results.max_moment = 100.0;
//! combos[1].results.max_moment = 150.0;
//!
//! let winner = find_critical(&mut combos, Criterion::Moment).unwrap();
//! assert_eq!(winner, 1);
//! assert!(combos[1].is_critical);
//! ```

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::combination::{AnalysisResults, Combination};
use crate::errors::{ComboError, ComboResult};
use crate::formula::{LoadCategory, ValidationOptions};
use crate::registry::write_atomic;

/// Interface to the external structural solver.
///
/// Implementations own the structural model. `scale_category` applies a
/// combination factor to every load of the given category; `execute` runs
/// the solution; `results` reads back the envelope values. Any stage may
/// fail, and failures abort the run without partial result writes.
pub trait Solver {
    /// Apply a combination factor to all loads of one category
    fn scale_category(&mut self, category: LoadCategory, factor: f64) -> ComboResult<()>;

    /// Run the structural solution with the currently applied factors
    fn execute(&mut self) -> ComboResult<()>;

    /// Envelope results from the most recent execution
    fn results(&self) -> AnalysisResults;
}

/// Parse a combination's formula and apply each term's factor to the
/// solver, validating with the default options.
///
/// Combinations stored under non-default validation options (e.g. a
/// registry that allows negative factors) must go through
/// [`apply_factors_with`] with the same options, or parsing here will
/// reject formulas the registry accepted.
pub fn apply_factors(combo: &Combination, solver: &mut dyn Solver) -> ComboResult<()> {
    apply_factors_with(combo, solver, &ValidationOptions::default())
}

/// Parse a combination's formula with explicit validation options and
/// apply each term's factor to the solver.
///
/// Load codes with no solver category (roof live, thermal, crane) are
/// skipped. Duplicate codes apply once, last occurrence winning. The
/// first solver failure aborts; remaining terms are not applied.
pub fn apply_factors_with(
    combo: &Combination,
    solver: &mut dyn Solver,
    options: &ValidationOptions,
) -> ComboResult<()> {
    let formula = combo.parsed_with(options)?;
    let factors = formula.factors();

    let mut applied = Vec::new();
    for term in formula.terms() {
        if applied.contains(&term.code) {
            continue;
        }
        applied.push(term.code);
        let category = match term.code.category() {
            Some(c) => c,
            None => continue,
        };
        solver.scale_category(category, factors[&term.code])?;
    }
    Ok(())
}

/// Run a full analysis for one combination with the default validation
/// options.
pub fn run_analysis(combo: &mut Combination, solver: &mut dyn Solver) -> ComboResult<()> {
    run_analysis_with(combo, solver, &ValidationOptions::default())
}

/// Run a full analysis for one combination, validating its formula with
/// the given options.
///
/// Pass the owning registry's options so that anything the registry
/// accepted stays analyzable. Factors are applied, the solver executes,
/// and the results are written onto the combination. If any stage fails
/// the combination's stored results are left untouched.
pub fn run_analysis_with(
    combo: &mut Combination,
    solver: &mut dyn Solver,
    options: &ValidationOptions,
) -> ComboResult<()> {
    apply_factors_with(combo, solver, options)?;
    solver.execute()?;
    combo.results = solver.results();
    Ok(())
}

/// Which envelope value governs critical-combination selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Criterion {
    /// Maximum bending moment
    #[default]
    Moment,
    /// Maximum shear force
    Shear,
    /// Maximum deflection
    Deflection,
}

impl Criterion {
    /// The governing value this criterion reads from a result record
    pub fn value(&self, results: &AnalysisResults) -> f64 {
        match self {
            Criterion::Moment => results.max_moment,
            Criterion::Shear => results.max_shear,
            Criterion::Deflection => results.max_deflection,
        }
    }
}

/// Select the governing combination by the given criterion.
///
/// Scans in order against a running maximum that starts at zero, taking
/// strictly greater values only, so ties go to the first combination
/// seen. On success the winner's `is_critical` flag is set and every
/// other combination's flag is cleared.
///
/// Errors: an empty slice, or no combination with a governing value
/// above zero.
pub fn find_critical(combos: &mut [Combination], criterion: Criterion) -> ComboResult<usize> {
    if combos.is_empty() {
        return Err(ComboError::NoCombinations);
    }

    let mut best: Option<usize> = None;
    let mut best_value = 0.0_f64;
    for (i, combo) in combos.iter().enumerate() {
        let value = criterion.value(&combo.results);
        if value > best_value {
            best_value = value;
            best = Some(i);
        }
    }

    let winner = best.ok_or(ComboError::NoCriticalFound)?;
    for (i, combo) in combos.iter_mut().enumerate() {
        combo.is_critical = i == winner;
    }
    Ok(winner)
}

#[derive(Serialize)]
struct Report<'a> {
    project: &'a str,
    date: String,
    analysis_summary: ReportSummary,
    combinations: Vec<ReportEntry<'a>>,
    critical_analysis: CriticalAnalysis<'a>,
}

#[derive(Serialize)]
struct ReportSummary {
    total_combinations: usize,
    analyzed_combinations: usize,
}

#[derive(Serialize)]
struct ReportEntry<'a> {
    name: &'a str,
    formula: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    results: &'a AnalysisResults,
    is_critical: bool,
}

#[derive(Serialize, Default)]
struct CriticalAnalysis<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    critical_combination: Option<&'a str>,
}

/// Export an analysis report for a set of combinations as JSON.
///
/// The report carries the project name, an ISO-8601 timestamp, summary
/// counts, every combination with its results, and the name of the
/// critical combination when one has been flagged. Written atomically
/// like registry exports.
pub fn export_report(
    path: &Path,
    project: &str,
    combos: &[Combination],
) -> ComboResult<()> {
    let report = Report {
        project,
        date: Utc::now().to_rfc3339(),
        analysis_summary: ReportSummary {
            total_combinations: combos.len(),
            analyzed_combinations: combos.iter().filter(|c| c.include_in_analysis).count(),
        },
        combinations: combos
            .iter()
            .map(|c| ReportEntry {
                name: &c.name,
                formula: &c.formula,
                kind: if c.is_custom { "Custom" } else { "Standard" },
                results: &c.results,
                is_critical: c.is_critical,
            })
            .collect(),
        critical_analysis: CriticalAnalysis {
            critical_combination: combos
                .iter()
                .find(|c| c.is_critical)
                .map(|c| c.name.as_str()),
        },
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| {
        ComboError::SerializationError {
            reason: e.to_string(),
        }
    })?;
    write_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;

    /// Scripted solver: records applied factors, returns canned results,
    /// and can be told to fail at either stage.
    #[derive(Default)]
    struct MockSolver {
        applied: Vec<(LoadCategory, f64)>,
        executed: bool,
        canned: AnalysisResults,
        fail_scale: bool,
        fail_execute: bool,
    }

    impl Solver for MockSolver {
        fn scale_category(&mut self, category: LoadCategory, factor: f64) -> ComboResult<()> {
            if self.fail_scale {
                return Err(ComboError::solver("factor application", "model rejected load"));
            }
            self.applied.push((category, factor));
            Ok(())
        }

        fn execute(&mut self) -> ComboResult<()> {
            if self.fail_execute {
                return Err(ComboError::solver("execution", "singular stiffness matrix"));
            }
            self.executed = true;
            Ok(())
        }

        fn results(&self) -> AnalysisResults {
            self.canned.clone()
        }
    }

    fn with_moment(name: &str, moment: f64) -> Combination {
        let mut combo = Combination::new(name, "1.4DL");
        combo.results.max_moment = moment;
        combo
    }

    #[test]
    fn test_apply_factors() {
        let combo = Combination::new("S1", "1.2DL + 1.6LL + 0.5SL");
        let mut solver = MockSolver::default();
        apply_factors(&combo, &mut solver).unwrap();

        assert_eq!(
            solver.applied,
            vec![
                (LoadCategory::Dead, 1.2),
                (LoadCategory::Live, 1.6),
                (LoadCategory::Snow, 0.5),
            ]
        );
    }

    #[test]
    fn test_apply_factors_skips_uncategorized_codes() {
        // TL has no solver category
        let combo = Combination::new("T1", "1.2DL + 1.0TL");
        let mut solver = MockSolver::default();
        apply_factors(&combo, &mut solver).unwrap();
        assert_eq!(solver.applied, vec![(LoadCategory::Dead, 1.2)]);
    }

    #[test]
    fn test_apply_factors_duplicate_code_last_wins() {
        let combo = Combination::new("D1", "1.2DL + 1.4DL");
        let mut solver = MockSolver::default();
        apply_factors(&combo, &mut solver).unwrap();
        assert_eq!(solver.applied, vec![(LoadCategory::Dead, 1.4)]);
    }

    #[test]
    fn test_run_analysis_success() {
        let mut combo = Combination::new("S1", "1.2DL + 1.6LL");
        let mut solver = MockSolver {
            canned: AnalysisResults {
                max_moment: 1500.0,
                max_shear: 800.0,
                critical_member: "B1".to_string(),
                ..AnalysisResults::default()
            },
            ..MockSolver::default()
        };

        run_analysis(&mut combo, &mut solver).unwrap();
        assert!(solver.executed);
        assert_eq!(combo.results.max_moment, 1500.0);
        assert_eq!(combo.results.critical_member, "B1");
    }

    #[test]
    fn test_run_analysis_scale_failure_leaves_results() {
        let mut combo = Combination::new("S1", "1.2DL + 1.6LL");
        combo.results.max_moment = 42.0;
        let mut solver = MockSolver {
            fail_scale: true,
            ..MockSolver::default()
        };

        let err = run_analysis(&mut combo, &mut solver).unwrap_err();
        assert_eq!(err.error_code(), "SOLVER_ERROR");
        assert_eq!(combo.results.max_moment, 42.0);
    }

    #[test]
    fn test_run_analysis_execute_failure_leaves_results() {
        let mut combo = Combination::new("S1", "1.4DL");
        combo.results.max_moment = 42.0;
        let mut solver = MockSolver {
            fail_execute: true,
            ..MockSolver::default()
        };

        assert!(run_analysis(&mut combo, &mut solver).is_err());
        assert_eq!(combo.results.max_moment, 42.0);
    }

    #[test]
    fn test_run_analysis_with_registry_options() {
        use crate::registry::CombinationRegistry;

        // a registry that allows negative factors accepts an uplift
        // combination; analysis under the same options must accept it too
        let options = ValidationOptions {
            allow_negative_factors: true,
            ..ValidationOptions::default()
        };
        let mut registry = CombinationRegistry::with_options(options);
        registry.add("Uplift", "0.9DL - 1.0WL", "wind uplift").unwrap();

        let mut combo = registry.get("Uplift").unwrap().clone();
        let mut solver = MockSolver {
            canned: AnalysisResults {
                max_moment: 120.0,
                ..AnalysisResults::default()
            },
            ..MockSolver::default()
        };
        run_analysis_with(&mut combo, &mut solver, registry.options()).unwrap();
        assert_eq!(
            solver.applied,
            vec![(LoadCategory::Dead, 0.9), (LoadCategory::Wind, -1.0)]
        );
        assert_eq!(combo.results.max_moment, 120.0);

        // the default-options path still rejects the negative factor
        let mut strict = MockSolver::default();
        let err = run_analysis(&mut combo, &mut strict).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_FORMULA");
    }

    #[test]
    fn test_run_analysis_invalid_formula() {
        let mut combo = Combination::new("Bad", "1.2DL +");
        let mut solver = MockSolver::default();
        let err = run_analysis(&mut combo, &mut solver).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_FORMULA");
        assert!(!solver.executed);
    }

    #[test]
    fn test_find_critical_by_moment() {
        let mut combos = vec![
            with_moment("A", 100.0),
            with_moment("B", 150.0),
            with_moment("C", 120.0),
        ];
        let winner = find_critical(&mut combos, Criterion::Moment).unwrap();
        assert_eq!(winner, 1);
        assert!(combos[1].is_critical);
        assert!(!combos[0].is_critical);
        assert!(!combos[2].is_critical);
    }

    #[test]
    fn test_find_critical_tie_goes_to_first() {
        let mut combos = vec![with_moment("A", 150.0), with_moment("B", 150.0)];
        let winner = find_critical(&mut combos, Criterion::Moment).unwrap();
        assert_eq!(winner, 0);
    }

    #[test]
    fn test_find_critical_by_deflection() {
        let mut combos = vec![with_moment("A", 999.0), with_moment("B", 1.0)];
        combos[0].results.max_deflection = 0.01;
        combos[1].results.max_deflection = 0.05;

        let winner = find_critical(&mut combos, Criterion::Deflection).unwrap();
        assert_eq!(winner, 1);
    }

    #[test]
    fn test_find_critical_empty() {
        let mut combos: Vec<Combination> = Vec::new();
        let err = find_critical(&mut combos, Criterion::Moment).unwrap_err();
        assert_eq!(err.to_string(), "No combinations provided");
    }

    #[test]
    fn test_find_critical_all_zero() {
        let mut combos = vec![with_moment("A", 0.0), with_moment("B", 0.0)];
        let err = find_critical(&mut combos, Criterion::Moment).unwrap_err();
        assert_eq!(err.to_string(), "No critical combination found");
    }

    #[test]
    fn test_find_critical_reassigns_flag() {
        let mut combos = vec![with_moment("A", 200.0), with_moment("B", 100.0)];
        combos[1].is_critical = true; // stale flag from an earlier run

        find_critical(&mut combos, Criterion::Moment).unwrap();
        assert!(combos[0].is_critical);
        assert!(!combos[1].is_critical);
    }

    #[test]
    fn test_export_report() {
        let path = temp_dir().join(format!(
            "combo_core_test_report_{}.json",
            std::process::id()
        ));

        let mut combos = vec![
            with_moment("Strength-1", 150.0).custom(),
            with_moment("Service-1", 100.0),
        ];
        combos[1].include_in_analysis = false;
        find_critical(&mut combos, Criterion::Moment).unwrap();
        export_report(&path, "Test Building", &combos).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(report["project"], "Test Building");
        assert_eq!(report["analysis_summary"]["total_combinations"], 2);
        assert_eq!(report["analysis_summary"]["analyzed_combinations"], 1);
        assert_eq!(report["combinations"][0]["name"], "Strength-1");
        assert_eq!(report["combinations"][0]["type"], "Custom");
        assert_eq!(report["combinations"][0]["is_critical"], true);
        assert_eq!(report["combinations"][1]["type"], "Standard");
        assert_eq!(report["combinations"][1]["is_critical"], false);
        assert_eq!(
            report["critical_analysis"]["critical_combination"],
            "Strength-1"
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_export_report_no_critical() {
        let path = temp_dir().join(format!(
            "combo_core_test_report_nc_{}.json",
            std::process::id()
        ));

        let combos = vec![with_moment("A", 0.0)];
        export_report(&path, "P", &combos).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(report["critical_analysis"]
            .as_object()
            .unwrap()
            .is_empty());

        let _ = fs::remove_file(&path);
    }
}
