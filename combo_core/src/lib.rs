//! # combo_core
//!
//! Load-combination management for structural analysis: formula parsing
//! and validation, building-code catalogs, a combination registry with
//! JSON and text-catalog persistence, and solver integration with
//! critical-combination selection.
//!
//! ## Design Philosophy
//!
//! - **Pure logic, no UI**: this crate owns the combination data model
//!   and algorithms; front-ends and solvers sit behind seams
//! - **Errors, not panics**: every fallible operation returns a
//!   [`ComboResult`] with a structured [`ComboError`]
//! - **Predictable parsing**: formulas are scanned in a single pass with
//!   no backtracking, so pathological inputs cost linear time
//! - **Durable persistence**: exports are written atomically (tmp +
//!   fsync + rename), imports are parsed fully before any state changes
//!
//! ## Modules
//!
//! - [`formula`] - Load codes and the formula parser/validator
//! - [`standards`] - Building-code standards and their catalogs
//! - [`combination`] - Combination records and analysis results
//! - [`registry`] - Named-combination CRUD and export/import
//! - [`analysis`] - Solver trait, batch runs, critical selection, reports
//! - [`errors`] - Shared error types
//!
//! ## Quick Start
//!
//! ```
//! use combo_core::{CombinationRegistry, Criterion, find_critical};
//!
//! let mut registry = CombinationRegistry::new();
//! registry.add("Strength-1", "1.2DL + 1.6LL", "Basic strength").unwrap();
//! registry.add("Dead-Only", "1.4DL", "").unwrap();
//!
//! // ... run analyses, then pick the governing combination
//! registry.get_all_mut()[0].results.max_moment = 1500.0;
//! let winner = find_critical(registry.get_all_mut(), Criterion::Moment).unwrap();
//! assert_eq!(winner, 0);
//! ```

pub mod analysis;
pub mod combination;
pub mod errors;
pub mod formula;
pub mod registry;
pub mod standards;

pub use analysis::{
    apply_factors, apply_factors_with, export_report, find_critical, run_analysis,
    run_analysis_with, Criterion, Solver,
};
pub use combination::{AnalysisResults, Combination};
pub use errors::{ComboError, ComboResult, FormulaErrorKind};
pub use formula::{
    validate_formula, Formula, LoadCategory, LoadCode, LoadCodeSet, LoadTerm, ValidationOptions,
};
pub use registry::{CatalogListing, CombinationRegistry, CustomEntry, SharedRegistry};
pub use standards::{catalog_for_name, Standard};
