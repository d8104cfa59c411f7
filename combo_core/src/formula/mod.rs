//! Formula engine: load codes, tokenizer/parser, and validation
//!
//! This module turns combination formula strings into validated load
//! terms and defines the load-code vocabulary they draw from.
//!
//! # Overview
//!
//! - [`LoadCode`] - The fixed set of formula identifiers (DL, LL, WL, ...)
//! - [`LoadCategory`] - Solver-facing load categories (Dead, Live, ...)
//! - [`Formula`] - A parsed, validated formula with its load terms
//! - [`ValidationOptions`] - Configurable validation rules
//!
//! # Example
//!
//! ```
//! use combo_core::formula::{Formula, LoadCode};
//!
//! let formula = Formula::parse("1.2DL + 1.6LL + 0.5SL").unwrap();
//! let factors = formula.factors();
//!
//! assert_eq!(factors[&LoadCode::Dl], 1.2);
//! assert_eq!(factors[&LoadCode::Sl], 0.5);
//! ```

pub mod load_codes;
pub mod parser;

pub use load_codes::{LoadCategory, LoadCode, LoadCodeSet};
pub use parser::{validate_formula, Formula, LoadTerm, ValidationOptions};
