//! Building-code standards and their combination catalogs
//!
//! Each supported code carries a fixed, versioned table of required load
//! combinations. The tables are the catalog source of truth; they are
//! regenerated on demand and never persisted alongside custom entries.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A building-code standard for load combinations
///
/// Closed set; `Custom` has no catalog of its own. Serialized names match
/// the registry file format ("ACI_318", "AISC_360", ...).
///
/// # Example
/// ```
/// use combo_core::standards::Standard;
///
/// let aci = Standard::Aci318;
/// assert_eq!(aci.display_name(), "ACI 318");
/// assert_eq!(aci.catalog()[0], "1.4DL");
/// assert_eq!(Standard::from_name("ACI_318"), Some(Standard::Aci318));
/// assert_eq!(Standard::from_name("BS_5950"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Standard {
    /// User-defined combinations, no standard catalog
    #[default]
    Custom,
    /// ACI 318 (concrete)
    #[serde(rename = "ACI_318")]
    Aci318,
    /// AISC 360 (steel)
    #[serde(rename = "AISC_360")]
    Aisc360,
    /// Eurocode (EN 1990)
    Eurocode,
    /// IBC 2018
    #[serde(rename = "IBC_2018")]
    Ibc2018,
}

static CATALOGS: Lazy<HashMap<Standard, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<Standard, &'static [&'static str]> = HashMap::new();
    map.insert(Standard::Aci318, ACI_318_CATALOG);
    map.insert(Standard::Aisc360, AISC_360_CATALOG);
    map.insert(Standard::Eurocode, EUROCODE_CATALOG);
    map.insert(Standard::Ibc2018, IBC_2018_CATALOG);
    map
});

const ACI_318_CATALOG: &[&str] = &[
    "1.4DL",
    "1.2DL + 1.6LL",
    "1.2DL + 1.6LL + 0.5SL",
    "1.2DL + 1.0LL + 1.6SL",
    "1.2DL + 1.0LL + 1.0WL",
    "1.2DL + 1.0LL + 1.0EQ",
    "0.9DL + 1.0WL",
    "0.9DL + 1.0EQ",
];

const AISC_360_CATALOG: &[&str] = &[
    "1.4DL",
    "1.2DL + 1.6LL + 0.5SL",
    "1.2DL + 1.6SL + 1.0LL",
    "1.2DL + 1.0LL + 1.0WL + 0.5SL",
    "1.2DL + 1.0LL + 1.0EQ + 0.2SL",
    "0.9DL + 1.0WL",
    "0.9DL + 1.0EQ",
];

const EUROCODE_CATALOG: &[&str] = &[
    "1.35DL",
    "1.35DL + 1.5LL",
    "1.35DL + 1.5LL + 0.9WL",
    "1.0DL + 1.5WL",
    "1.0DL + 1.0EQ",
];

const IBC_2018_CATALOG: &[&str] = &[
    "1.4DL",
    "1.2DL + 1.6LL + 0.5SL",
    "1.2DL + 1.6SL + 1.0LL",
    "1.2DL + 1.0LL + 1.0WL",
    "1.2DL + 1.0LL + 1.0EQ",
    "0.9DL + 1.0WL",
    "0.9DL + 1.0EQ",
];

impl Standard {
    /// All standards, catalog-bearing ones first
    pub const ALL: [Standard; 5] = [
        Standard::Aci318,
        Standard::Aisc360,
        Standard::Eurocode,
        Standard::Ibc2018,
        Standard::Custom,
    ];

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Standard::Custom => "Custom",
            Standard::Aci318 => "ACI 318",
            Standard::Aisc360 => "AISC 360",
            Standard::Eurocode => "Eurocode",
            Standard::Ibc2018 => "IBC 2018",
        }
    }

    /// Registry-file key ("ACI_318" style)
    pub fn key(&self) -> &'static str {
        match self {
            Standard::Custom => "Custom",
            Standard::Aci318 => "ACI_318",
            Standard::Aisc360 => "AISC_360",
            Standard::Eurocode => "Eurocode",
            Standard::Ibc2018 => "IBC_2018",
        }
    }

    /// Parse a standard from either its key or display form
    pub fn from_name(name: &str) -> Option<Standard> {
        match name {
            "Custom" => Some(Standard::Custom),
            "ACI_318" | "ACI 318" => Some(Standard::Aci318),
            "AISC_360" | "AISC 360" => Some(Standard::Aisc360),
            "Eurocode" => Some(Standard::Eurocode),
            "IBC_2018" | "IBC 2018" => Some(Standard::Ibc2018),
            _ => None,
        }
    }

    /// The hard-coded combination formulas for this standard.
    ///
    /// `Custom` has no catalog and returns an empty slice.
    pub fn catalog(&self) -> &'static [&'static str] {
        CATALOGS.get(self).copied().unwrap_or(&[])
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Catalog lookup by arbitrary name; unknown standards yield an empty
/// list rather than an error.
pub fn catalog_for_name(name: &str) -> &'static [&'static str] {
    Standard::from_name(name)
        .map(|s| s.catalog())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(Standard::Aci318.catalog().len(), 8);
        assert_eq!(Standard::Aisc360.catalog().len(), 7);
        assert_eq!(Standard::Eurocode.catalog().len(), 5);
        assert_eq!(Standard::Ibc2018.catalog().len(), 7);
        assert!(Standard::Custom.catalog().is_empty());
    }

    #[test]
    fn test_every_catalog_entry_validates() {
        for standard in Standard::ALL {
            for formula in standard.catalog() {
                assert!(
                    Formula::parse(formula).is_ok(),
                    "{standard}: '{formula}' should validate"
                );
            }
        }
    }

    #[test]
    fn test_unknown_standard_yields_empty() {
        assert!(catalog_for_name("BS_5950").is_empty());
        assert!(catalog_for_name("").is_empty());
        assert_eq!(catalog_for_name("Eurocode").len(), 5);
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(Standard::from_name("ACI 318"), Some(Standard::Aci318));
        assert_eq!(Standard::from_name("IBC_2018"), Some(Standard::Ibc2018));
        assert_eq!(Standard::from_name("aci_318"), None);
    }

    #[test]
    fn test_serde_keys() {
        let json = serde_json::to_string(&Standard::Aci318).unwrap();
        assert_eq!(json, "\"ACI_318\"");
        let parsed: Standard = serde_json::from_str("\"IBC_2018\"").unwrap();
        assert_eq!(parsed, Standard::Ibc2018);
    }
}
