//! Combination records and analysis results
//!
//! A [`Combination`] is the central entity: a named formula plus metadata
//! and the numeric results attached to it after an analysis run.

use serde::{Deserialize, Serialize};

use crate::errors::ComboResult;
use crate::formula::{Formula, ValidationOptions};
use crate::standards::Standard;

/// Numeric outputs produced by the external solver for one combination.
///
/// Flat record; missing fields default to zero / empty on deserialization
/// so partial result maps from older exports still load.
///
/// # JSON Format
/// ```json
/// {
///   "max_moment": 1500.0,
///   "max_shear": 800.0,
///   "max_axial": 2000.0,
///   "max_deflection": 0.03,
///   "critical_member": "B1",
///   "max_stress": 250.0,
///   "max_displacement": 0.03
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// Maximum bending moment (kN·m)
    #[serde(default)]
    pub max_moment: f64,
    /// Maximum shear force (kN)
    #[serde(default)]
    pub max_shear: f64,
    /// Maximum axial force (kN)
    #[serde(default)]
    pub max_axial: f64,
    /// Maximum deflection (m)
    #[serde(default)]
    pub max_deflection: f64,
    /// Identifier of the member producing the governing result
    #[serde(default)]
    pub critical_member: String,
    /// Maximum stress (MPa)
    #[serde(default)]
    pub max_stress: f64,
    /// Maximum nodal displacement (m)
    #[serde(default)]
    pub max_displacement: f64,
}

/// A named, stored load combination.
///
/// Owned exclusively by the registry that created it; moving a combination
/// between registries goes through export/import (full copy, never a
/// shared reference).
///
/// # Example
/// ```
/// use combo_core::combination::Combination;
///
/// let combo = Combination::new("Strength-1", "1.2DL + 1.6LL")
///     .with_description("Basic strength combination");
///
/// assert!(combo.parsed().is_ok());
/// assert!(combo.include_in_analysis);
/// assert!(!combo.is_critical);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Unique name within the owning registry
    pub name: String,

    /// Combination formula text (e.g. "1.2DL + 1.6LL")
    pub formula: String,

    /// Human description
    #[serde(default)]
    pub description: String,

    /// Which building-code standard this combination belongs to
    #[serde(default)]
    pub standard: Standard,

    /// Whether this is a user-defined combination (vs. catalog-generated)
    #[serde(default)]
    pub is_custom: bool,

    /// Whether analysis runs should include this combination
    #[serde(default = "default_true")]
    pub include_in_analysis: bool,

    /// Results from the most recent analysis run
    #[serde(default)]
    pub results: AnalysisResults,

    /// Whether critical-selection flagged this as the governing combination
    #[serde(default)]
    pub is_critical: bool,
}

fn default_true() -> bool {
    true
}

impl Combination {
    /// Create a new combination. The formula is stored as-is; use the
    /// registry `add` path (or [`Combination::parsed`]) for validation.
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Combination {
            name: name.into(),
            formula: formula.into(),
            description: String::new(),
            standard: Standard::Custom,
            is_custom: false,
            include_in_analysis: true,
            results: AnalysisResults::default(),
            is_critical: false,
        }
    }

    /// Set the description (builder pattern)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the standard (builder pattern)
    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    /// Mark as user-defined (builder pattern)
    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    /// Parse and validate the stored formula with default options
    pub fn parsed(&self) -> ComboResult<Formula> {
        Formula::parse(&self.formula)
    }

    /// Parse and validate the stored formula with explicit options
    pub fn parsed_with(&self, options: &ValidationOptions) -> ComboResult<Formula> {
        Formula::parse_with(&self.formula, options)
    }

    /// Overwrite the stored analysis results
    pub fn set_results(&mut self, results: &AnalysisResults) {
        self.results = results.clone();
    }
}
