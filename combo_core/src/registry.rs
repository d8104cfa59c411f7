//! # Combination Registry
//!
//! CRUD over named [`Combination`] records, per-standard custom lists,
//! and durable export/import.
//!
//! Two persistence formats are supported:
//! - **JSON registry files**: the full registry state (name-keyed
//!   combinations plus per-standard custom lists), written atomically
//!   (tmp + fsync + rename) so an interrupted export never corrupts an
//!   existing file.
//! - **Legacy text catalogs**: one combination per line
//!   (`formula | description | type`), `#` comments ignored. Only
//!   `Custom` lines are re-imported; `Standard` lines are regenerated
//!   from the hard-coded catalog.
//!
//! Registries are plain values owned by the caller. For concurrent use
//! from multiple threads, wrap one in a [`SharedRegistry`].
//!
//! ## Example
//!
//! ```
//! use combo_core::registry::CombinationRegistry;
//!
//! let mut registry = CombinationRegistry::new();
//! registry.add("Strength-1", "1.2DL + 1.6LL", "Basic strength").unwrap();
//!
//! assert_eq!(registry.get_all().len(), 1);
//! assert!(registry.add("Strength-1", "1.4DL", "").is_err()); // duplicate
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::combination::{AnalysisResults, Combination};
use crate::errors::{ComboError, ComboResult};
use crate::formula::{Formula, ValidationOptions};
use crate::standards::Standard;

/// One entry in a per-standard custom combination list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEntry {
    /// Combination formula text
    pub formula: String,
    /// Human description
    #[serde(default)]
    pub description: String,
    /// Always true for entries in a custom list
    #[serde(default)]
    pub is_custom: bool,
}

/// A catalog listing row: either a hard-coded standard combination or a
/// user-added custom one
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogListing {
    pub formula: String,
    pub description: String,
    pub is_custom: bool,
}

/// Serialized shape of a registry export file.
///
/// Combination entries carry only the persisted attribute subset; results
/// live in the analysis report, not the registry file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    custom_combinations: HashMap<String, Vec<CustomEntry>>,
    #[serde(default)]
    combinations: HashMap<String, CombinationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CombinationEntry {
    formula: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_custom: bool,
}

/// Registry of named combinations plus per-standard custom lists.
///
/// Name uniqueness is enforced within a single registry instance only.
/// Insertion order is preserved for [`CombinationRegistry::get_all`].
#[derive(Debug, Default, Clone)]
pub struct CombinationRegistry {
    combinations: Vec<Combination>,
    custom_by_standard: HashMap<Standard, Vec<CustomEntry>>,
    results: HashMap<String, AnalysisResults>,
    options: ValidationOptions,
}

impl CombinationRegistry {
    /// Create an empty registry with default validation options
    pub fn new() -> Self {
        CombinationRegistry::default()
    }

    /// Create an empty registry with explicit validation options
    pub fn with_options(options: ValidationOptions) -> Self {
        CombinationRegistry {
            options,
            ..CombinationRegistry::default()
        }
    }

    /// The validation options this registry applies on `add` and import
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Add a new named combination.
    ///
    /// Rejects a blank name, a duplicate name (exact match), and any
    /// formula the validator refuses. Stored combinations are flagged
    /// `is_custom = true`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        formula: impl Into<String>,
        description: impl Into<String>,
    ) -> ComboResult<()> {
        let name = name.into();
        let formula = formula.into();
        if name.trim().is_empty() {
            return Err(ComboError::invalid_input("name", "Name must not be blank"));
        }
        if self.get(&name).is_some() {
            return Err(ComboError::duplicate_name(name));
        }
        Formula::parse_with(&formula, &self.options)?;

        self.combinations.push(
            Combination::new(name, formula)
                .with_description(description)
                .custom(),
        );
        Ok(())
    }

    /// All combinations in insertion order
    pub fn get_all(&self) -> &[Combination] {
        &self.combinations
    }

    /// Look up a combination by exact name
    pub fn get(&self, name: &str) -> Option<&Combination> {
        self.combinations.iter().find(|c| c.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Combination> {
        self.combinations.iter_mut().find(|c| c.name == name)
    }

    /// Number of named combinations
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Whether the registry holds no named combinations
    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Remove a combination by name, returning it
    pub fn remove(&mut self, name: &str) -> ComboResult<Combination> {
        let idx = self
            .combinations
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ComboError::not_found("Combination", name))?;
        self.results.remove(name);
        Ok(self.combinations.remove(idx))
    }

    /// Mutable access for analysis routines (critical selection flags,
    /// result writes). Order matches [`CombinationRegistry::get_all`].
    pub fn get_all_mut(&mut self) -> &mut [Combination] {
        &mut self.combinations
    }

    // ---- per-standard custom lists (legacy catalog structure) ----

    /// Append a custom combination to a standard's list; returns its index
    pub fn add_custom_to_standard(
        &mut self,
        standard: Standard,
        formula: impl Into<String>,
        description: impl Into<String>,
    ) -> ComboResult<usize> {
        let formula = formula.into();
        Formula::parse_with(&formula, &self.options)?;
        let list = self.custom_by_standard.entry(standard).or_default();
        list.push(CustomEntry {
            formula,
            description: description.into(),
            is_custom: true,
        });
        Ok(list.len() - 1)
    }

    /// Custom combinations recorded for a standard
    pub fn custom_for_standard(&self, standard: Standard) -> &[CustomEntry] {
        self.custom_by_standard
            .get(&standard)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Remove a custom combination by index; false when out of range
    pub fn remove_custom(&mut self, standard: Standard, index: usize) -> bool {
        match self.custom_by_standard.get_mut(&standard) {
            Some(list) if index < list.len() => {
                list.remove(index);
                true
            }
            _ => false,
        }
    }

    /// The full listing for a standard: hard-coded catalog entries first,
    /// then user customs
    pub fn all_for_standard(&self, standard: Standard) -> Vec<CatalogListing> {
        let mut out = Vec::new();
        for (i, formula) in standard.catalog().iter().enumerate() {
            out.push(CatalogListing {
                formula: (*formula).to_string(),
                description: format!("{} Standard {}", standard.key(), i + 1),
                is_custom: false,
            });
        }
        for entry in self.custom_for_standard(standard) {
            out.push(CatalogListing {
                formula: entry.formula.clone(),
                description: entry.description.clone(),
                is_custom: true,
            });
        }
        out
    }

    // ---- analysis results ----

    /// Write analysis results onto the named combination and mirror them
    /// in the side table for later lookup/export.
    pub fn store_results(&mut self, name: &str, results: &AnalysisResults) -> ComboResult<()> {
        let combo = self
            .get_mut(name)
            .ok_or_else(|| ComboError::not_found("Combination", name))?;
        combo.set_results(results);
        self.results.insert(name.to_string(), results.clone());
        Ok(())
    }

    /// Results previously stored for a combination name
    pub fn results_for(&self, name: &str) -> Option<&AnalysisResults> {
        self.results.get(name)
    }

    // ---- JSON export/import ----

    /// Export the full registry state as a JSON document.
    ///
    /// Writes atomically: serialize, write to a `.tmp` sibling, fsync,
    /// rename. Filesystem failures come back as errors, never panics.
    pub fn export_json(&self, path: &Path) -> ComboResult<()> {
        let file = RegistryFile {
            custom_combinations: self
                .custom_by_standard
                .iter()
                .map(|(std, list)| (std.key().to_string(), list.clone()))
                .collect(),
            combinations: self
                .combinations
                .iter()
                .map(|c| {
                    (
                        c.name.clone(),
                        CombinationEntry {
                            formula: c.formula.clone(),
                            description: c.description.clone(),
                            is_custom: c.is_custom,
                        },
                    )
                })
                .collect(),
        };

        let json =
            serde_json::to_string_pretty(&file).map_err(|e| ComboError::SerializationError {
                reason: e.to_string(),
            })?;
        write_atomic(path, &json)
    }

    /// Import a registry export, merging into the current registry.
    ///
    /// The file is parsed completely before anything is merged, so a
    /// malformed file never leaves the registry half-mutated. Named
    /// combinations overwrite on name collision; custom-list entries are
    /// appended. Returns the number of imported items; a file with no
    /// recognized content is an error.
    pub fn import_json(&mut self, path: &Path) -> ComboResult<usize> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ComboError::not_found("Import file", &display),
            _ => ComboError::file_error("read", &display, e.to_string()),
        })?;
        if contents.trim().is_empty() {
            return Err(ComboError::malformed(&display, "File is empty"));
        }

        let value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| ComboError::malformed(&display, e.to_string()))?;
        if !value.is_object() {
            return Err(ComboError::malformed(
                &display,
                "Top-level JSON value must be an object",
            ));
        }
        let file: RegistryFile = serde_json::from_value(value)
            .map_err(|e| ComboError::malformed(&display, e.to_string()))?;

        // stage: resolve standards before touching registry state
        let mut staged_customs: Vec<(Standard, CustomEntry)> = Vec::new();
        for (key, entries) in &file.custom_combinations {
            if let Some(standard) = Standard::from_name(key) {
                for entry in entries {
                    staged_customs.push((standard, entry.clone()));
                }
            }
        }

        let imported = staged_customs.len() + file.combinations.len();
        if imported == 0 {
            return Err(ComboError::malformed(
                &display,
                "No recognized combinations in file",
            ));
        }

        for (standard, entry) in staged_customs {
            self.custom_by_standard
                .entry(standard)
                .or_default()
                .push(entry);
        }

        // sorted for a deterministic insertion order
        let mut names: Vec<&String> = file.combinations.keys().collect();
        names.sort();
        for name in names {
            let entry = &file.combinations[name];
            let record = Combination {
                name: name.clone(),
                formula: entry.formula.clone(),
                description: entry.description.clone(),
                is_custom: entry.is_custom,
                ..Combination::new("", "")
            };
            match self.get_mut(name) {
                Some(existing) => *existing = record,
                None => self.combinations.push(record),
            }
        }

        Ok(imported)
    }

    // ---- legacy line-oriented catalog ----

    /// Export a standard's full listing (catalog + customs) as a text
    /// catalog, one combination per line.
    pub fn export_catalog(&self, standard: Standard, path: &Path) -> ComboResult<()> {
        let mut out = String::new();
        out.push_str(&format!("# {} Load Combinations\n", standard.key()));
        out.push_str("# Format: Formula | Description | Type\n\n");
        for listing in self.all_for_standard(standard) {
            let kind = if listing.is_custom { "Custom" } else { "Standard" };
            out.push_str(&format!(
                "{} | {} | {}\n",
                listing.formula, listing.description, kind
            ));
        }
        write_atomic(path, &out)
    }

    /// Import `Custom` lines from a text catalog into a standard's list.
    ///
    /// `Standard` lines are skipped (they are regenerated from the
    /// hard-coded catalog) and so are lines whose formulas fail
    /// validation. Returns the number of imported entries.
    pub fn import_catalog(&mut self, standard: Standard, path: &Path) -> ComboResult<usize> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ComboError::not_found("Import file", &display),
            _ => ComboError::file_error("read", &display, e.to_string()),
        })?;

        let mut imported = 0usize;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 3 {
                continue;
            }
            let formula = parts[0].trim();
            let description = parts[1].trim();
            let kind = parts[2].trim();
            if kind != "Custom" {
                continue;
            }
            if self
                .add_custom_to_standard(standard, formula, description)
                .is_ok()
            {
                imported += 1;
            }
        }
        Ok(imported)
    }
}

/// Atomic text file write: tmp sibling, fsync, rename
pub(crate) fn write_atomic(path: &Path, contents: &str) -> ComboResult<()> {
    let display = path.display().to_string();
    let tmp_path = {
        let mut p = path.to_path_buf();
        let ext = p
            .extension()
            .map(|e| format!("{}.tmp", e.to_string_lossy()))
            .unwrap_or_else(|| "tmp".to_string());
        p.set_extension(ext);
        p
    };

    let mut tmp = File::create(&tmp_path).map_err(|e| {
        ComboError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp.write_all(contents.as_bytes()).map_err(|e| {
        ComboError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp.sync_all().map_err(|e| {
        ComboError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ComboError::file_error("rename to final", display, e.to_string())
    })
}

/// Thread-safe handle around a [`CombinationRegistry`].
///
/// Explicitly constructed and owned by the caller; there is no implicit
/// process-wide instance. Cloning shares the underlying registry. Writers
/// take the lock one at a time; readers get consistent snapshots.
///
/// # Example
/// ```
/// use combo_core::registry::SharedRegistry;
///
/// let shared = SharedRegistry::new();
/// shared.add("Strength-1", "1.2DL + 1.6LL", "").unwrap();
/// assert_eq!(shared.snapshot().len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<CombinationRegistry>>,
}

impl SharedRegistry {
    /// Create an empty shared registry
    pub fn new() -> Self {
        SharedRegistry::default()
    }

    /// Wrap an existing registry
    pub fn from_registry(registry: CombinationRegistry) -> Self {
        SharedRegistry {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CombinationRegistry> {
        // a poisoned lock means a writer panicked mid-update; the registry
        // data itself is still structurally valid (Vec/HashMap), so recover
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a combination; safe under concurrent callers
    pub fn add(
        &self,
        name: impl Into<String>,
        formula: impl Into<String>,
        description: impl Into<String>,
    ) -> ComboResult<()> {
        self.lock().add(name, formula, description)
    }

    /// A consistent copy of all combinations at a point in time
    pub fn snapshot(&self) -> Vec<Combination> {
        self.lock().get_all().to_vec()
    }

    /// Store analysis results for a named combination
    pub fn store_results(&self, name: &str, results: &AnalysisResults) -> ComboResult<()> {
        self.lock().store_results(name, results)
    }

    /// Number of named combinations
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry holds no named combinations
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run a closure with exclusive access to the registry
    pub fn with<R>(&self, f: impl FnOnce(&mut CombinationRegistry) -> R) -> R {
        f(&mut self.lock())
    }
}
