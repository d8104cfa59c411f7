//! Load code definitions
//!
//! This module defines the short load-category identifiers used in
//! combination formulas ("1.2DL + 1.6LL") and their mapping to the
//! solver-facing load categories.

use serde::{Deserialize, Serialize};

/// Load codes recognized in combination formulas
///
/// Each code is a fixed 2-letter uppercase identifier for a category of
/// structural load. Formulas reference these codes with a numeric factor
/// in front (e.g., "1.2DL").
///
/// # Example
/// ```
/// use combo_core::formula::LoadCode;
///
/// let dead = LoadCode::Dl;
/// assert_eq!(dead.code(), "DL");
/// assert_eq!(dead.description(), "Dead load");
/// assert_eq!(LoadCode::from_code("LL"), Some(LoadCode::Ll));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadCode {
    /// DL - Dead load (self-weight of structure and permanent attachments)
    Dl,
    /// LL - Live load (floor live load, occupancy)
    Ll,
    /// WL - Wind load
    Wl,
    /// EQ - Seismic (earthquake) load
    Eq,
    /// SL - Snow load
    Sl,
    /// RL - Roof live load
    Rl,
    /// TL - Temperature/self-straining load
    Tl,
    /// CL - Crane/construction load
    Cl,
}

impl LoadCode {
    /// All load codes in standard order
    pub const ALL: [LoadCode; 8] = [
        LoadCode::Dl,
        LoadCode::Ll,
        LoadCode::Wl,
        LoadCode::Eq,
        LoadCode::Sl,
        LoadCode::Rl,
        LoadCode::Tl,
        LoadCode::Cl,
    ];

    /// Two-letter uppercase formula code
    pub fn code(&self) -> &'static str {
        match self {
            LoadCode::Dl => "DL",
            LoadCode::Ll => "LL",
            LoadCode::Wl => "WL",
            LoadCode::Eq => "EQ",
            LoadCode::Sl => "SL",
            LoadCode::Rl => "RL",
            LoadCode::Tl => "TL",
            LoadCode::Cl => "CL",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            LoadCode::Dl => "Dead load",
            LoadCode::Ll => "Live load",
            LoadCode::Wl => "Wind load",
            LoadCode::Eq => "Seismic load",
            LoadCode::Sl => "Snow load",
            LoadCode::Rl => "Roof live load",
            LoadCode::Tl => "Temperature load",
            LoadCode::Cl => "Crane load",
        }
    }

    /// Parse an exact uppercase code. Lowercase is rejected, not normalized.
    pub fn from_code(code: &str) -> Option<LoadCode> {
        match code {
            "DL" => Some(LoadCode::Dl),
            "LL" => Some(LoadCode::Ll),
            "WL" => Some(LoadCode::Wl),
            "EQ" => Some(LoadCode::Eq),
            "SL" => Some(LoadCode::Sl),
            "RL" => Some(LoadCode::Rl),
            "TL" => Some(LoadCode::Tl),
            "CL" => Some(LoadCode::Cl),
            _ => None,
        }
    }

    /// The solver load category this code scales, if any.
    ///
    /// Only the five primary categories map onto model loads; RL, TL and
    /// CL are carried through formulas but have no category of their own.
    pub fn category(&self) -> Option<LoadCategory> {
        match self {
            LoadCode::Dl => Some(LoadCategory::Dead),
            LoadCode::Ll => Some(LoadCategory::Live),
            LoadCode::Wl => Some(LoadCategory::Wind),
            LoadCode::Eq => Some(LoadCategory::Seismic),
            LoadCode::Sl => Some(LoadCategory::Snow),
            LoadCode::Rl | LoadCode::Tl | LoadCode::Cl => None,
        }
    }
}

impl std::fmt::Display for LoadCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Load categories exposed to the external solver
///
/// The analysis orchestration scales every model load of a category by
/// the factor parsed for the corresponding [`LoadCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadCategory {
    Dead,
    Live,
    Wind,
    Seismic,
    Snow,
}

impl LoadCategory {
    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoadCategory::Dead => "Dead",
            LoadCategory::Live => "Live",
            LoadCategory::Wind => "Wind",
            LoadCategory::Seismic => "Seismic",
            LoadCategory::Snow => "Snow",
        }
    }
}

/// Which set of load codes a validator accepts
///
/// The full set covers all eight codes. The legacy set matches the older
/// six-code validation path (no TL/CL) and is kept for compatibility with
/// catalogs written against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadCodeSet {
    /// All eight codes: DL, LL, WL, EQ, SL, RL, TL, CL
    #[default]
    Standard,
    /// Six codes: DL, LL, WL, EQ, SL, RL
    Legacy,
}

impl LoadCodeSet {
    /// Whether this set accepts the given code
    pub fn contains(&self, code: LoadCode) -> bool {
        match self {
            LoadCodeSet::Standard => true,
            LoadCodeSet::Legacy => !matches!(code, LoadCode::Tl | LoadCode::Cl),
        }
    }

    /// The codes in this set, in standard order
    pub fn codes(&self) -> Vec<LoadCode> {
        LoadCode::ALL
            .iter()
            .copied()
            .filter(|c| self.contains(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in LoadCode::ALL {
            assert_eq!(LoadCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn test_lowercase_rejected() {
        assert_eq!(LoadCode::from_code("dl"), None);
        assert_eq!(LoadCode::from_code("Ll"), None);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(LoadCode::from_code("XL"), None);
        assert_eq!(LoadCode::from_code("D"), None);
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(LoadCode::Dl.category(), Some(LoadCategory::Dead));
        assert_eq!(LoadCode::Eq.category(), Some(LoadCategory::Seismic));
        assert_eq!(LoadCode::Rl.category(), None);
        assert_eq!(LoadCode::Tl.category(), None);
    }

    #[test]
    fn test_legacy_set() {
        assert!(LoadCodeSet::Legacy.contains(LoadCode::Dl));
        assert!(!LoadCodeSet::Legacy.contains(LoadCode::Tl));
        assert!(!LoadCodeSet::Legacy.contains(LoadCode::Cl));
        assert_eq!(LoadCodeSet::Legacy.codes().len(), 6);
        assert_eq!(LoadCodeSet::Standard.codes().len(), 8);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&LoadCode::Eq).unwrap();
        assert_eq!(json, "\"Eq\"");
        let parsed: LoadCode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LoadCode::Eq);
    }
}
